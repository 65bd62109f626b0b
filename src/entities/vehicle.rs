use chrono::{DateTime, Datelike, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

const OLDEST_MODEL_YEAR: i32 = 1950;

/// A car registered by a driver and offered on their rides.
#[derive(Clone, Debug, Serialize, Deserialize, PolarClass)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[polar(attribute)]
    pub id: Uuid,
    #[polar(attribute)]
    pub driver_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub driver_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub license_plate: String,
    pub image_url: Option<String>,
}

/// Partial update, absent fields are left as they are.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub image_url: Option<String>,
}

impl Vehicle {
    pub fn new(spec: NewVehicle) -> Result<Self, Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            driver_id: spec.driver_id,
            make: required("make", &spec.make)?,
            model: required("model", &spec.model)?,
            year: model_year(spec.year)?,
            color: required("color", &spec.color)?,
            license_plate: required("license plate", &spec.license_plate)?.to_uppercase(),
            image_url: spec.image_url,
            created_at: Utc::now(),
        })
    }

    /// Shown on ride postings, e.g. "Toyota Corolla".
    pub fn label(&self) -> String {
        format!("{} {}", self.make, self.model)
    }

    pub fn apply(&mut self, update: VehicleUpdate) -> Result<(), Error> {
        if update.is_empty() {
            return Err(Error::invalid_input_error("no fields to update"));
        }

        let mut next = self.clone();

        if let Some(make) = update.make {
            next.make = required("make", &make)?;
        }
        if let Some(model) = update.model {
            next.model = required("model", &model)?;
        }
        if let Some(year) = update.year {
            next.year = model_year(year)?;
        }
        if let Some(color) = update.color {
            next.color = required("color", &color)?;
        }
        if let Some(plate) = update.license_plate {
            next.license_plate = required("license plate", &plate)?.to_uppercase();
        }
        if update.image_url.is_some() {
            next.image_url = update.image_url;
        }

        *self = next;
        Ok(())
    }
}

impl VehicleUpdate {
    fn is_empty(&self) -> bool {
        self.make.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.color.is_none()
            && self.license_plate.is_none()
            && self.image_url.is_none()
    }
}

fn required(field: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::invalid_input_error(format!("{} is required", field)));
    }

    Ok(value.to_string())
}

fn model_year(year: i32) -> Result<i32, Error> {
    let newest = Utc::now().year() + 1;

    if !(OLDEST_MODEL_YEAR..=newest).contains(&year) {
        return Err(Error::invalid_input_error(format!(
            "year must be between {} and {}",
            OLDEST_MODEL_YEAR, newest
        )));
    }

    Ok(year)
}

#[cfg(test)]
pub(crate) fn new_vehicle_spec(driver_id: Uuid) -> NewVehicle {
    NewVehicle {
        driver_id,
        make: "Toyota".into(),
        model: "Corolla".into(),
        year: 2018,
        color: "White".into(),
        license_plate: "lea-1234".into(),
        image_url: None,
    }
}
