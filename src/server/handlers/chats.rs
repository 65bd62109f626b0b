use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::Message;
use crate::error::Error;
use crate::server::extract::Input;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    sender_id: Uuid,
    text: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageParams {
    acting_user_id: Uuid,
    text: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorParams {
    acting_user_id: Uuid,
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Query(params)): Input<Query<ActorParams>>,
) -> Result<StatusCode, Error> {
    api.delete_chat(User::new(params.acting_user_id), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn messages(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Vec<Message>>, Error> {
    let messages = api.list_messages(user, id).await?;

    Ok(messages.into())
}

pub async fn send_message(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Json(params)): Input<Json<SendMessageParams>>,
) -> Result<(StatusCode, Json<Message>), Error> {
    let message = api
        .send_message(User::new(params.sender_id), id, params.text)
        .await?;

    Ok((StatusCode::CREATED, message.into()))
}

pub async fn update_message(
    Extension(api): Extension<DynAPI>,
    Input(Path((id, message_id))): Input<Path<(Uuid, Uuid)>>,
    Input(Json(params)): Input<Json<EditMessageParams>>,
) -> Result<Json<Message>, Error> {
    let message = api
        .update_message(User::new(params.acting_user_id), id, message_id, params.text)
        .await?;

    Ok(message.into())
}

pub async fn delete_message(
    Extension(api): Extension<DynAPI>,
    Input(Path((id, message_id))): Input<Path<(Uuid, Uuid)>>,
    Input(Query(params)): Input<Query<ActorParams>>,
) -> Result<StatusCode, Error> {
    api.delete_message(User::new(params.acting_user_id), id, message_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
