use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{
    Booking, Chat, Inbox, Member, MemberUpdate, Message, NewBooking, NewMember, NewRide,
    NewVehicle, Notification, Ride, RideListing, RideQuery, Vehicle, VehicleUpdate,
};
use crate::error::Error;

#[async_trait]
pub trait MemberAPI {
    async fn create_member(&self, user: User, spec: NewMember) -> Result<Member, Error>;

    async fn find_member(&self, user: User, id: Uuid) -> Result<Member, Error>;

    async fn update_member(
        &self,
        user: User,
        id: Uuid,
        update: MemberUpdate,
    ) -> Result<Member, Error>;

    async fn update_push_token(
        &self,
        user: User,
        id: Uuid,
        push_token: String,
    ) -> Result<Member, Error>;
}

#[async_trait]
pub trait VehicleAPI {
    async fn create_vehicle(&self, user: User, spec: NewVehicle) -> Result<Vehicle, Error>;

    async fn list_vehicles(&self, user: User, driver_id: Uuid) -> Result<Vec<Vehicle>, Error>;

    async fn update_vehicle(
        &self,
        user: User,
        id: Uuid,
        update: VehicleUpdate,
    ) -> Result<Vehicle, Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn create_ride(&self, user: User, spec: NewRide) -> Result<Ride, Error>;

    async fn find_ride(&self, user: User, id: Uuid) -> Result<Ride, Error>;

    async fn adjust_seats(&self, user: User, id: Uuid, delta: i32) -> Result<Ride, Error>;

    async fn list_active_rides(&self, user: User, as_of: DateTime<Utc>)
        -> Result<Vec<Ride>, Error>;
}

#[async_trait]
pub trait BookingAPI {
    async fn request_booking(&self, user: User, request: NewBooking) -> Result<Booking, Error>;

    async fn find_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;

    async fn accept_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;

    async fn reject_booking(
        &self,
        user: User,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Booking, Error>;

    async fn cancel_booking(&self, user: User, id: Uuid) -> Result<Booking, Error>;

    async fn find_active_booking(
        &self,
        user: User,
        passenger_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Option<Booking>, Error>;

    async fn list_bookings_for_ride(&self, user: User, ride_id: Uuid)
        -> Result<Vec<Booking>, Error>;

    async fn list_bookings_for_passenger(
        &self,
        user: User,
        passenger_id: Uuid,
    ) -> Result<Vec<Booking>, Error>;

    async fn list_bookings_for_driver(
        &self,
        user: User,
        driver_id: Uuid,
    ) -> Result<Vec<Booking>, Error>;
}

#[async_trait]
pub trait SearchAPI {
    async fn search_rides(
        &self,
        user: User,
        query: RideQuery,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<RideListing>, Error>;
}

#[async_trait]
pub trait ChatAPI {
    async fn list_chats(&self, user: User, member_id: Uuid) -> Result<Vec<Chat>, Error>;

    async fn delete_chat(&self, user: User, chat_id: Uuid) -> Result<(), Error>;

    async fn send_message(&self, user: User, chat_id: Uuid, text: String)
        -> Result<Message, Error>;

    async fn list_messages(&self, user: User, chat_id: Uuid) -> Result<Vec<Message>, Error>;

    async fn update_message(
        &self,
        user: User,
        chat_id: Uuid,
        message_id: Uuid,
        text: String,
    ) -> Result<Message, Error>;

    async fn delete_message(&self, user: User, chat_id: Uuid, message_id: Uuid)
        -> Result<(), Error>;
}

#[async_trait]
pub trait NotificationAPI {
    async fn list_notifications(&self, user: User, member_id: Uuid) -> Result<Inbox, Error>;

    async fn mark_notification_read(
        &self,
        user: User,
        member_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, Error>;
}

pub trait API:
    MemberAPI + VehicleAPI + RideAPI + BookingAPI + SearchAPI + ChatAPI + NotificationAPI
{
}
