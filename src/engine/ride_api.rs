use super::Engine;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::User,
    entities::{NewRide, Ride},
    error::Error,
};

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self, spec), fields(driver_id = %spec.driver_id))]
    async fn create_ride(&self, user: User, spec: NewRide) -> Result<Ride, Error> {
        if user.id != spec.driver_id {
            return Err(Error::unauthorized_error());
        }

        let mut ride = Ride::new(spec)?;

        self.fetch_member(ride.driver_id).await?;

        if let Some(vehicle_id) = ride.vehicle_id {
            let vehicle = self.fetch_vehicle(vehicle_id).await?;

            self.authorize(user, "use", vehicle.clone())?;

            ride.use_vehicle(&vehicle);
        }

        self.bounded(self.store.insert_ride(&ride)).await?;

        tracing::info!(ride_id = %ride.id, "ride posted");

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, _user: User, id: Uuid) -> Result<Ride, Error> {
        self.fetch_ride(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn adjust_seats(&self, user: User, id: Uuid, delta: i32) -> Result<Ride, Error> {
        let ride = self.fetch_ride(id).await?;

        self.authorize(user, "adjust_seats", ride)?;

        self.bounded(self.store.adjust_seats(id, delta)).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_active_rides(
        &self,
        _user: User,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Ride>, Error> {
        let rides = self.bounded(self.store.list_rides_with_seats()).await?;

        Ok(rides
            .into_iter()
            .filter(|ride| ride.is_bookable(as_of, &self.settings.timezone))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::harness;
    use chrono::{Duration, TimeZone};
    use tokio_test::{assert_err, assert_ok};

    fn new_ride(driver_id: Uuid, date: &str, time: &str) -> NewRide {
        NewRide {
            driver_id,
            pickup_location: "Library".into(),
            destination: "Main Gate".into(),
            date: date.into(),
            time: time.into(),
            total_seats: 4,
            cost: 150.0,
            expiry_time: None,
            vehicle_id: None,
            vehicle_model: Some("Corolla".into()),
            image_url: None,
            preferences: vec!["no smoking".into()],
        }
    }

    #[tokio::test]
    async fn create_ride_starts_with_every_seat_free() {
        let h = harness();
        let driver = h.member("Dina").await;

        let ride = assert_ok!(
            h.engine
                .create_ride(User::new(driver.id), new_ride(driver.id, "2099-01-01", "09:00"))
                .await
        );

        assert_eq!(ride.available_seats, 4);
        assert_eq!(ride.total_seats, 4);

        let found = h
            .engine
            .find_ride(User::new_system_user(), ride.id)
            .await
            .unwrap();
        assert_eq!(found.id, ride.id);
    }

    #[tokio::test]
    async fn create_ride_requires_a_known_driver_acting_for_themselves() {
        let h = harness();
        let driver = h.member("Dina").await;
        let ghost = Uuid::new_v4();

        let err = h
            .engine
            .create_ride(User::new(ghost), new_ride(ghost, "2099-01-01", "09:00"))
            .await
            .unwrap_err();
        assert!(err.is_not_found_error());

        let err = h
            .engine
            .create_ride(User::new(ghost), new_ride(driver.id, "2099-01-01", "09:00"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized_error());
    }

    #[tokio::test]
    async fn create_ride_rejects_bad_seat_counts() {
        let h = harness();
        let driver = h.member("Dina").await;

        for seats in [0, 9] {
            let mut spec = new_ride(driver.id, "2099-01-01", "09:00");
            spec.total_seats = seats;

            let err = assert_err!(h.engine.create_ride(User::new(driver.id), spec).await);
            assert!(err.is_invalid_input_error());
        }
    }

    #[tokio::test]
    async fn adjust_seats_is_reserved_for_the_system() {
        let h = harness();
        let driver = h.member("Dina").await;
        let ride = h.ride(&driver, "Library", "Main Gate", 4).await;

        let err = h
            .engine
            .adjust_seats(User::new(driver.id), ride.id, -1)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized_error());

        let ride = h
            .engine
            .adjust_seats(User::new_system_user(), ride.id, -1)
            .await
            .unwrap();
        assert_eq!(ride.available_seats, 3);

        let err = h
            .engine
            .adjust_seats(User::new_system_user(), ride.id, 2)
            .await
            .unwrap_err();
        assert!(err.is_capacity_error());
    }

    #[tokio::test]
    async fn create_ride_takes_the_model_from_the_drivers_vehicle() {
        let h = harness();
        let driver = h.member("Dina").await;
        let vehicle = h.vehicle(&driver).await;

        let mut spec = new_ride(driver.id, "2099-01-01", "09:00");
        spec.vehicle_id = Some(vehicle.id);
        spec.vehicle_model = Some("Spaceship".into());

        let ride = h
            .engine
            .create_ride(User::new(driver.id), spec)
            .await
            .unwrap();

        assert_eq!(ride.vehicle_id, Some(vehicle.id));
        assert_eq!(ride.vehicle_model.as_deref(), Some("Toyota Corolla"));
    }

    #[tokio::test]
    async fn create_ride_refuses_unknown_or_foreign_vehicles() {
        let h = harness();
        let driver = h.member("Dina").await;
        let other = h.member("Omar").await;
        let foreign = h.vehicle(&other).await;

        let mut spec = new_ride(driver.id, "2099-01-01", "09:00");
        spec.vehicle_id = Some(Uuid::new_v4());
        let err = assert_err!(h.engine.create_ride(User::new(driver.id), spec).await);
        assert!(err.is_not_found_error());

        let mut spec = new_ride(driver.id, "2099-01-01", "09:00");
        spec.vehicle_id = Some(foreign.id);
        let err = assert_err!(h.engine.create_ride(User::new(driver.id), spec).await);
        assert!(err.is_unauthorized_error());

        let active = h
            .engine
            .list_active_rides(User::new_system_user(), Utc::now())
            .await
            .unwrap();
        assert!(active.is_empty());
    }

    // ride on 2025-01-01 09:00 looked at from 2025-06-01
    #[tokio::test]
    async fn list_active_rides_skips_departed_rides() {
        let h = harness();
        let driver = h.member("Dina").await;
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        let departed = h
            .engine
            .create_ride(User::new(driver.id), new_ride(driver.id, "2025-01-01", "09:00"))
            .await
            .unwrap();

        let mut spec = new_ride(driver.id, "2025-01-01", "09:00");
        spec.expiry_time = Some(now + Duration::days(1));
        let extended = h
            .engine
            .create_ride(User::new(driver.id), spec)
            .await
            .unwrap();

        let active = h
            .engine
            .list_active_rides(User::new_system_user(), now)
            .await
            .unwrap();

        let ids: Vec<Uuid> = active.iter().map(|ride| ride.id).collect();
        assert!(!ids.contains(&departed.id));
        assert!(ids.contains(&extended.id));
    }

    #[tokio::test]
    async fn list_active_rides_skips_full_rides() {
        let h = harness();
        let driver = h.member("Dina").await;
        let ride = h.ride(&driver, "Library", "Main Gate", 1).await;

        h.engine
            .adjust_seats(User::new_system_user(), ride.id, -1)
            .await
            .unwrap();

        let active = h
            .engine
            .list_active_rides(User::new_system_user(), Utc::now())
            .await
            .unwrap();

        assert!(active.is_empty());
    }
}
