use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::BookingAPI,
    auth::User,
    entities::{Booking, BookingStatus, NewBooking, Notification},
    error::Error,
};

#[async_trait]
impl BookingAPI for Engine {
    #[tracing::instrument(skip(self, request), fields(ride_id = %request.ride_id, passenger_id = %request.passenger_id))]
    async fn request_booking(&self, user: User, request: NewBooking) -> Result<Booking, Error> {
        if user.id != request.passenger_id {
            return Err(Error::unauthorized_error());
        }

        let ride = self.fetch_ride(request.ride_id).await?;
        let passenger = self.fetch_member(request.passenger_id).await?;

        if passenger.id == ride.driver_id {
            return Err(Error::invalid_input_error(
                "drivers cannot book their own ride",
            ));
        }

        if ride.is_expired(Utc::now(), &self.settings.timezone) {
            return Err(Error::invalid_input_error("ride has already departed"));
        }

        if request.seats_requested < 1 {
            return Err(Error::invalid_input_error(
                "at least one seat must be requested",
            ));
        }

        if request.seats_requested > ride.available_seats {
            return Err(Error::capacity_error(format!(
                "requested {} seat(s) but only {} available",
                request.seats_requested, ride.available_seats
            )));
        }

        let existing = self
            .bounded(self.store.find_active_booking(passenger.id, ride.id))
            .await?;

        if existing.is_some() {
            return Err(Error::invalid_input_error(
                "passenger already holds an active booking for this ride",
            ));
        }

        let booking = Booking::new(&ride, request);

        self.bounded(self.store.insert_booking(&booking)).await?;

        tracing::info!(booking_id = %booking.id, "booking requested");

        self.notify(Notification::booking_request(&booking, &ride, &passenger.name))
            .await;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let booking = self.fetch_booking(id).await?;

        self.authorize(user, "read", booking.clone())?;

        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let booking = self.fetch_booking(id).await?;

        self.authorize(user, "accept", booking.clone())?;

        let mut accepted = booking.clone();
        accepted.accept()?;

        // status change and seat decrement commit together or not at all
        let ride = self
            .bounded(
                self.store
                    .transition_booking(&booking, &accepted, accepted.reservation()),
            )
            .await?;

        tracing::info!(available_seats = ride.available_seats, "booking accepted");

        self.open_chat(&accepted).await;
        self.notify(Notification::booking_accepted(&accepted, &ride))
            .await;

        Ok(accepted)
    }

    #[tracing::instrument(skip(self))]
    async fn reject_booking(
        &self,
        user: User,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Booking, Error> {
        let booking = self.fetch_booking(id).await?;

        self.authorize(user, "reject", booking.clone())?;

        let mut rejected = booking.clone();
        rejected.reject(reason)?;

        let ride = self
            .bounded(self.store.transition_booking(&booking, &rejected, 0))
            .await?;

        tracing::info!("booking rejected");

        let reason = match &rejected.status {
            BookingStatus::Rejected { reason, .. } => reason.as_deref(),
            _ => None,
        };

        self.notify(Notification::booking_rejected(&rejected, &ride, reason))
            .await;

        Ok(rejected)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<Booking, Error> {
        let booking = self.fetch_booking(id).await?;

        self.authorize(user.clone(), "cancel", booking.clone())?;

        let mut cancelled = booking.clone();
        cancelled.cancel(user.id)?;

        let ride = self
            .bounded(self.store.transition_booking(
                &booking,
                &cancelled,
                cancelled.seats_requested,
            ))
            .await?;

        tracing::info!(available_seats = ride.available_seats, "booking cancelled");

        self.notify(Notification::booking_cancelled(&cancelled, &ride, user.id))
            .await;

        Ok(cancelled)
    }

    #[tracing::instrument(skip(self))]
    async fn find_active_booking(
        &self,
        user: User,
        passenger_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Option<Booking>, Error> {
        let passenger = self.fetch_member(passenger_id).await?;

        self.authorize(user, "read_bookings", passenger)?;

        self.bounded(self.store.find_active_booking(passenger_id, ride_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_bookings_for_ride(
        &self,
        user: User,
        ride_id: Uuid,
    ) -> Result<Vec<Booking>, Error> {
        let ride = self.fetch_ride(ride_id).await?;

        self.authorize(user, "read_bookings", ride)?;

        self.bounded(self.store.list_bookings_for_ride(ride_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_bookings_for_passenger(
        &self,
        user: User,
        passenger_id: Uuid,
    ) -> Result<Vec<Booking>, Error> {
        let passenger = self.fetch_member(passenger_id).await?;

        self.authorize(user, "read_bookings", passenger)?;

        self.bounded(self.store.list_bookings_for_passenger(passenger_id))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_bookings_for_driver(
        &self,
        user: User,
        driver_id: Uuid,
    ) -> Result<Vec<Booking>, Error> {
        let driver = self.fetch_member(driver_id).await?;

        self.authorize(user, "read_bookings", driver)?;

        self.bounded(self.store.list_bookings_for_driver(driver_id))
            .await
    }
}
