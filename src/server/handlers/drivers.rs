use axum::extract::{Extension, Path};
use axum::Json;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Booking, Vehicle};
use crate::error::Error;
use crate::server::extract::Input;
use crate::server::DynAPI;

pub async fn bookings(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Vec<Booking>>, Error> {
    let bookings = api.list_bookings_for_driver(user, id).await?;

    Ok(bookings.into())
}

pub async fn vehicles(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Vec<Vehicle>>, Error> {
    let vehicles = api.list_vehicles(user, id).await?;

    Ok(vehicles.into())
}
