//! Persistence for rides, bookings and the collaborator records around them.
//!
//! Every method is a single atomic unit against the backing store. Seat
//! counts only change through [`Store::adjust_seats`] and
//! [`Store::transition_booking`], both of which apply the delta as one
//! conditional update so concurrent callers can never push a ride outside
//! `0..=total_seats`.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Booking, Chat, Member, Message, Notification, Ride, Vehicle};
use crate::error::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_member(&self, member: &Member) -> Result<(), Error>;

    async fn find_member(&self, id: Uuid) -> Result<Option<Member>, Error>;

    async fn update_member(&self, member: &Member) -> Result<(), Error>;

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error>;

    async fn find_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, Error>;

    /// Newest first.
    async fn list_vehicles_for_driver(&self, driver_id: Uuid) -> Result<Vec<Vehicle>, Error>;

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error>;

    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error>;

    async fn find_ride(&self, id: Uuid) -> Result<Option<Ride>, Error>;

    /// Rides with at least one free seat, newest first.
    async fn list_rides_with_seats(&self) -> Result<Vec<Ride>, Error>;

    /// Applies `delta` to the ride's available seats.
    ///
    /// Fails with a capacity error, leaving the ride untouched, when the
    /// result would leave `0..=total_seats`.
    async fn adjust_seats(&self, ride_id: Uuid, delta: i32) -> Result<Ride, Error>;

    /// Inserts a pending booking unless the passenger already holds an
    /// active booking on the same ride.
    async fn insert_booking(&self, booking: &Booking) -> Result<(), Error>;

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, Error>;

    async fn find_active_booking(
        &self,
        passenger_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Option<Booking>, Error>;

    async fn list_bookings_for_ride(&self, ride_id: Uuid) -> Result<Vec<Booking>, Error>;

    async fn list_bookings_for_passenger(&self, passenger_id: Uuid)
        -> Result<Vec<Booking>, Error>;

    async fn list_bookings_for_driver(&self, driver_id: Uuid) -> Result<Vec<Booking>, Error>;

    /// Persists `next` and applies `seat_delta` to its ride as one unit.
    ///
    /// The stored booking must still be in `previous`'s status, otherwise an
    /// invalid state error is returned. If the seat update would break the
    /// ride's bounds nothing is written and a capacity error is returned.
    async fn transition_booking(
        &self,
        previous: &Booking,
        next: &Booking,
        seat_delta: i32,
    ) -> Result<Ride, Error>;

    /// Returns the existing chat between the two participants, or stores `chat`.
    async fn open_chat(&self, chat: &Chat) -> Result<Chat, Error>;

    async fn find_chat(&self, id: Uuid) -> Result<Option<Chat>, Error>;

    async fn list_chats(&self, member_id: Uuid) -> Result<Vec<Chat>, Error>;

    /// Removes the chat together with its messages.
    async fn delete_chat(&self, id: Uuid) -> Result<(), Error>;

    /// Stores `message` and makes it the chat's latest message preview.
    async fn insert_message(&self, message: &Message) -> Result<Chat, Error>;

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>, Error>;

    /// Oldest first.
    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error>;

    async fn update_message(&self, message: &Message) -> Result<(), Error>;

    async fn delete_message(&self, id: Uuid) -> Result<(), Error>;

    async fn insert_notification(&self, notification: &Notification) -> Result<(), Error>;

    /// Newest first, at most `limit` entries.
    async fn list_notifications(
        &self,
        member_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Notification>, Error>;

    async fn count_unread_notifications(&self, member_id: Uuid) -> Result<usize, Error>;

    async fn mark_notification_read(
        &self,
        member_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, Error>;
}

pub(crate) fn seats_error(ride: &Ride, delta: i32) -> Error {
    Error::capacity_error(format!(
        "ride has {} of {} seats available, cannot apply {:+}",
        ride.available_seats, ride.total_seats, delta
    ))
}

pub(crate) fn duplicate_booking_error() -> Error {
    Error::invalid_input_error("passenger already holds an active booking for this ride")
}

pub(crate) fn status_changed_error(current: &Booking, previous: &Booking) -> Error {
    Error::invalid_state_error(format!(
        "booking is {}, expected {}",
        current.status.name(),
        previous.status.name()
    ))
}
