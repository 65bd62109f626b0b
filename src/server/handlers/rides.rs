use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Booking, NewRide, Ride, RideListing, RideQuery};
use crate::error::Error;
use crate::server::extract::Input;
use crate::server::DynAPI;

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Input(Json(params)): Input<Json<NewRide>>,
) -> Result<(StatusCode, Json<Ride>), Error> {
    let ride = api.create_ride(User::new(params.driver_id), params).await?;

    Ok((StatusCode::CREATED, ride.into()))
}

pub async fn search(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Query(query)): Input<Query<RideQuery>>,
) -> Result<Json<Vec<RideListing>>, Error> {
    let listings = api.search_rides(user, query, Utc::now()).await?;

    Ok(listings.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Ride>, Error> {
    let ride = api.find_ride(user, id).await?;

    Ok(ride.into())
}

pub async fn bookings(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Input(Path(id)): Input<Path<Uuid>>,
) -> Result<Json<Vec<Booking>>, Error> {
    let bookings = api.list_bookings_for_ride(user, id).await?;

    Ok(bookings.into())
}
