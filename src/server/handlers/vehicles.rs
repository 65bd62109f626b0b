use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{NewVehicle, Vehicle, VehicleUpdate};
use crate::error::Error;
use crate::server::extract::Input;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleParams {
    acting_driver_id: Uuid,
    #[serde(flatten)]
    update: VehicleUpdate,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Input(Json(params)): Input<Json<NewVehicle>>,
) -> Result<(StatusCode, Json<Vehicle>), Error> {
    let vehicle = api
        .create_vehicle(User::new(params.driver_id), params)
        .await?;

    Ok((StatusCode::CREATED, vehicle.into()))
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Input(Path(id)): Input<Path<Uuid>>,
    Input(Json(params)): Input<Json<UpdateVehicleParams>>,
) -> Result<Json<Vehicle>, Error> {
    let vehicle = api
        .update_vehicle(User::new(params.acting_driver_id), id, params.update)
        .await?;

    Ok(vehicle.into())
}
