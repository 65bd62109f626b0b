use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Booking, Message};

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub driver_id: Uuid,
    #[polar(attribute)]
    pub passenger_id: Uuid,
    pub booking_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Preview of the latest message.
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn for_booking(booking: &Booking) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id: booking.driver_id,
            passenger_id: booking.passenger_id,
            booking_id: booking.id,
            created_at: Utc::now(),
            last_message: None,
            last_message_at: None,
        }
    }

    pub fn includes(&self, member_id: Uuid) -> bool {
        self.driver_id == member_id || self.passenger_id == member_id
    }

    pub fn record_message(&mut self, message: &Message) {
        self.last_message = Some(message.text.clone());
        self.last_message_at = Some(message.created_at);
    }

    /// Chats are keyed by the unordered pair of participants.
    pub fn same_participants(&self, other: &Chat) -> bool {
        (self.driver_id == other.driver_id && self.passenger_id == other.passenger_id)
            || (self.driver_id == other.passenger_id && self.passenger_id == other.driver_id)
    }
}
