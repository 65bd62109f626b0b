use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Vehicle;
use crate::error::Error;

pub const MAX_SEATS: i32 = 8;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub driver_id: Uuid,
    pub pickup_location: String,
    pub destination: String,
    pub date: String,
    pub time: String,
    pub available_seats: i32,
    pub total_seats: i32,
    pub cost: f64,
    pub expiry_time: Option<DateTime<Utc>>,
    pub vehicle_id: Option<Uuid>,
    pub vehicle_model: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Driver supplied fields for a new ride posting.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRide {
    pub driver_id: Uuid,
    pub pickup_location: String,
    pub destination: String,
    pub date: String,
    pub time: String,
    pub total_seats: i32,
    pub cost: f64,
    pub expiry_time: Option<DateTime<Utc>>,
    /// One of the driver's registered vehicles. Its label replaces `vehicle_model`.
    pub vehicle_id: Option<Uuid>,
    pub vehicle_model: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

impl NewRide {
    pub fn validate(&self) -> Result<(), Error> {
        if self.pickup_location.trim().is_empty() {
            return Err(Error::invalid_input_error("pickup location is required"));
        }

        if self.destination.trim().is_empty() {
            return Err(Error::invalid_input_error("destination is required"));
        }

        if !(1..=MAX_SEATS).contains(&self.total_seats) {
            return Err(Error::invalid_input_error(format!(
                "total seats must be between 1 and {}",
                MAX_SEATS
            )));
        }

        if !self.cost.is_finite() || self.cost <= 0.0 {
            return Err(Error::invalid_input_error("cost must be a positive number"));
        }

        if NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).is_err() {
            return Err(Error::invalid_input_error("date must be formatted as YYYY-MM-DD"));
        }

        if self.time.trim().is_empty() {
            return Err(Error::invalid_input_error("time is required"));
        }

        Ok(())
    }
}

impl Ride {
    pub fn new(spec: NewRide) -> Result<Self, Error> {
        spec.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            driver_id: spec.driver_id,
            pickup_location: spec.pickup_location.trim().to_string(),
            destination: spec.destination.trim().to_string(),
            date: spec.date.trim().to_string(),
            time: spec.time.trim().to_string(),
            available_seats: spec.total_seats,
            total_seats: spec.total_seats,
            cost: spec.cost,
            expiry_time: spec.expiry_time,
            vehicle_id: spec.vehicle_id,
            vehicle_model: spec.vehicle_model,
            image_url: spec.image_url,
            preferences: spec.preferences,
            created_at: Utc::now(),
        })
    }

    /// Scheduled departure, read in `offset`. `None` when `date`/`time` do not parse.
    pub fn departure(&self, offset: &FixedOffset) -> Option<DateTime<Utc>> {
        // "HH:MM:SS" is accepted by only looking at the "HH:MM" prefix
        let time = self.time.get(..5).unwrap_or(&self.time);

        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()?;
        let time = NaiveTime::parse_from_str(time, TIME_FORMAT).ok()?;

        offset
            .from_local_datetime(&NaiveDateTime::new(date, time))
            .single()
            .map(|local| local.with_timezone(&Utc))
    }

    pub fn is_expired(&self, now: DateTime<Utc>, offset: &FixedOffset) -> bool {
        if let Some(expiry_time) = self.expiry_time {
            return expiry_time <= now;
        }

        match self.departure(offset) {
            Some(departure) => departure <= now,
            None => false,
        }
    }

    pub fn use_vehicle(&mut self, vehicle: &Vehicle) {
        self.vehicle_id = Some(vehicle.id);
        self.vehicle_model = Some(vehicle.label());

        if self.image_url.is_none() {
            self.image_url = vehicle.image_url.clone();
        }
    }

    pub fn has_seats(&self) -> bool {
        self.available_seats > 0
    }

    /// Open for new booking requests at `now`.
    pub fn is_bookable(&self, now: DateTime<Utc>, offset: &FixedOffset) -> bool {
        self.has_seats() && !self.is_expired(now, offset)
    }

    /// Seat count after applying `delta`, if it keeps `0 <= seats <= total`.
    pub fn seats_after(&self, delta: i32) -> Option<i32> {
        let seats = self.available_seats.checked_add(delta)?;

        if seats < 0 || seats > self.total_seats {
            return None;
        }

        Some(seats)
    }
}

#[cfg(test)]
pub(crate) fn new_ride_spec(driver_id: Uuid, date: &str, time: &str, total_seats: i32) -> NewRide {
    NewRide {
        driver_id,
        pickup_location: "Library".into(),
        destination: "Main Gate".into(),
        date: date.into(),
        time: time.into(),
        total_seats,
        cost: 150.0,
        expiry_time: None,
        vehicle_id: None,
        vehicle_model: None,
        image_url: None,
        preferences: vec![],
    }
}
