use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Ride;
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub ride_id: Uuid,
    #[polar(attribute)]
    pub driver_id: Uuid,
    #[polar(attribute)]
    pub passenger_id: Uuid,
    pub seats_requested: i32,
    pub stop_location: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Pending,
    Accepted {
        accepted_at: DateTime<Utc>,
    },
    Rejected {
        reason: Option<String>,
        rejected_at: DateTime<Utc>,
    },
    Cancelled {
        cancelled_by: Uuid,
        cancelled_at: DateTime<Utc>,
    },
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Cancelled { .. })
    }
}

/// Passenger supplied fields for a booking request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub ride_id: Uuid,
    pub passenger_id: Uuid,
    pub seats_requested: i32,
    pub stop_location: Option<String>,
}

impl Booking {
    pub fn new(ride: &Ride, request: NewBooking) -> Self {
        let stop_location = request
            .stop_location
            .map(|stop| stop.trim().to_string())
            .filter(|stop| !stop.is_empty());

        Self {
            id: Uuid::new_v4(),
            ride_id: ride.id,
            driver_id: ride.driver_id,
            passenger_id: request.passenger_id,
            seats_requested: request.seats_requested,
            stop_location,
            status: Status::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, Status::Pending)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, Status::Pending | Status::Accepted { .. })
    }

    /// Seat delta the ride must absorb for this booking to be accepted.
    pub fn reservation(&self) -> i32 {
        -self.seats_requested
    }

    #[tracing::instrument(skip(self), fields(booking_id = %self.id))]
    pub fn accept(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::Accepted {
                    accepted_at: Utc::now(),
                };
                Ok(())
            }
            _ => Err(Error::invalid_state_error(format!(
                "booking is {}, only pending bookings can be accepted",
                self.status.name()
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(booking_id = %self.id))]
    pub fn reject(&mut self, reason: Option<String>) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                let reason = reason
                    .map(|reason| reason.trim().to_string())
                    .filter(|reason| !reason.is_empty());

                self.status = Status::Rejected {
                    reason,
                    rejected_at: Utc::now(),
                };
                Ok(())
            }
            _ => Err(Error::invalid_state_error(format!(
                "booking is {}, only pending bookings can be rejected",
                self.status.name()
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(booking_id = %self.id))]
    pub fn cancel(&mut self, cancelled_by: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Accepted { .. } => {
                self.status = Status::Cancelled {
                    cancelled_by,
                    cancelled_at: Utc::now(),
                };
                Ok(())
            }
            _ => Err(Error::invalid_state_error(format!(
                "booking is {}, only accepted bookings can be cancelled",
                self.status.name()
            ))),
        }
    }

    /// The party on the other side of the booking from `member_id`.
    pub fn counterpart(&self, member_id: Uuid) -> Uuid {
        if member_id == self.passenger_id {
            self.driver_id
        } else {
            self.passenger_id
        }
    }
}
