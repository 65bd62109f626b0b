use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Booking, Ride};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub member_id: Uuid,
    pub kind: Kind,
    pub title: String,
    pub message: String,
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    BookingRequest,
    BookingAccepted,
    BookingRejected,
    BookingCancelled,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BookingRequest => "booking_request",
            Self::BookingAccepted => "booking_accepted",
            Self::BookingRejected => "booking_rejected",
            Self::BookingCancelled => "booking_cancelled",
        }
    }
}

/// A member's notifications together with how many are still unread.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl Notification {
    fn new(member_id: Uuid, kind: Kind, title: &str, message: String, booking: &Booking) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            kind,
            title: title.into(),
            message,
            booking_id: booking.id,
            ride_id: booking.ride_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn booking_request(booking: &Booking, ride: &Ride, passenger_name: &str) -> Self {
        let message = format!(
            "{} requested {} seat(s) for your ride from {} to {}",
            passenger_name, booking.seats_requested, ride.pickup_location, ride.destination
        );

        Self::new(
            booking.driver_id,
            Kind::BookingRequest,
            "New Booking Request",
            message,
            booking,
        )
    }

    pub fn booking_accepted(booking: &Booking, ride: &Ride) -> Self {
        let message = format!(
            "Your request for {} seat(s) from {} to {} was accepted",
            booking.seats_requested, ride.pickup_location, ride.destination
        );

        Self::new(
            booking.passenger_id,
            Kind::BookingAccepted,
            "Booking Accepted",
            message,
            booking,
        )
    }

    pub fn booking_rejected(booking: &Booking, ride: &Ride, reason: Option<&str>) -> Self {
        let mut message = format!(
            "Your request for the ride from {} to {} was declined",
            ride.pickup_location, ride.destination
        );

        if let Some(reason) = reason {
            message.push_str(&format!(": {}", reason));
        }

        Self::new(
            booking.passenger_id,
            Kind::BookingRejected,
            "Booking Rejected",
            message,
            booking,
        )
    }

    pub fn booking_cancelled(booking: &Booking, ride: &Ride, cancelled_by: Uuid) -> Self {
        let message = format!(
            "The booking for the ride from {} to {} on {} was cancelled",
            ride.pickup_location, ride.destination, ride.date
        );

        Self::new(
            booking.counterpart(cancelled_by),
            Kind::BookingCancelled,
            "Booking Cancelled",
            message,
            booking,
        )
    }
}
