use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Booking, NewBooking};
use crate::error::Error;
use crate::server::extract::Input;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptParams {
    acting_driver_id: Uuid,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectParams {
    acting_driver_id: Uuid,
    reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelParams {
    acting_user_id: Uuid,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Input(Json(params)): Input<Json<NewBooking>>,
) -> Result<(StatusCode, Json<Booking>), Error> {
    let booking = api
        .request_booking(User::new(params.passenger_id), params)
        .await?;

    Ok((StatusCode::CREATED, booking.into()))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Booking>, Error> {
    let booking = api.find_booking(user, id).await?;

    Ok(booking.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Json(params)): Input<Json<AcceptParams>>,
) -> Result<Json<Booking>, Error> {
    let booking = api
        .accept_booking(User::new(params.acting_driver_id), id)
        .await?;

    Ok(booking.into())
}

pub async fn reject(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Json(params)): Input<Json<RejectParams>>,
) -> Result<Json<Booking>, Error> {
    let booking = api
        .reject_booking(User::new(params.acting_driver_id), id, params.reason)
        .await?;

    Ok(booking.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Json(params)): Input<Json<CancelParams>>,
) -> Result<Json<Booking>, Error> {
    let booking = api
        .cancel_booking(User::new(params.acting_user_id), id)
        .await?;

    Ok(booking.into())
}
