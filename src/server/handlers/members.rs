use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Chat, Inbox, Member, MemberUpdate, NewMember, Notification};
use crate::error::Error;
use crate::server::extract::Input;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenParams {
    push_token: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Json(params)): Input<Json<NewMember>>,
) -> Result<(StatusCode, Json<Member>), Error> {
    let member = api.create_member(user, params).await?;

    Ok((StatusCode::CREATED, member.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Member>, Error> {
    let member = api.find_member(user, id).await?;

    Ok(member.into())
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Json(params)): Input<Json<MemberUpdate>>,
) -> Result<Json<Member>, Error> {
    let member = api.update_member(User::new(id), id, params).await?;

    Ok(member.into())
}

pub async fn update_push_token(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Json(params)): Input<Json<PushTokenParams>>,
) -> Result<Json<Member>, Error> {
    let member = api
        .update_push_token(User::new(id), id, params.push_token)
        .await?;

    Ok(member.into())
}

pub async fn chats(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Vec<Chat>>, Error> {
    let chats = api.list_chats(user, id).await?;

    Ok(chats.into())
}

pub async fn notifications(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Inbox>, Error> {
    let inbox = api.list_notifications(user, id).await?;

    Ok(inbox.into())
}

pub async fn mark_notification_read(
    Extension(api): Extension<DynAPI>,
    Input(Path((id, notification_id))): Input<Path<(Uuid, Uuid)>>,
) -> Result<Json<Notification>, Error> {
    let notification = api
        .mark_notification_read(User::new(id), id, notification_id)
        .await?;

    Ok(notification.into())
}
