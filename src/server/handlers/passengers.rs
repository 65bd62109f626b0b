use axum::extract::{Extension, Path};
use axum::Json;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::Booking;
use crate::error::Error;
use crate::server::extract::Input;
use crate::server::DynAPI;

pub async fn bookings(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Vec<Booking>>, Error> {
    let bookings = api.list_bookings_for_passenger(user, id).await?;

    Ok(bookings.into())
}

pub async fn active_booking(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path((id, ride_id))): Input<Path<(Uuid, Uuid)>>,
) -> Result<Json<Option<Booking>>, Error> {
    let booking = api.find_active_booking(user, id, ride_id).await?;

    Ok(booking.into())
}
