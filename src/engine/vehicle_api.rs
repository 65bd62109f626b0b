use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::VehicleAPI,
    auth::User,
    entities::{NewVehicle, Vehicle, VehicleUpdate},
    error::Error,
};

#[async_trait]
impl VehicleAPI for Engine {
    #[tracing::instrument(skip(self, spec), fields(driver_id = %spec.driver_id))]
    async fn create_vehicle(&self, user: User, spec: NewVehicle) -> Result<Vehicle, Error> {
        if user.id != spec.driver_id {
            return Err(Error::unauthorized_error());
        }

        let vehicle = Vehicle::new(spec)?;

        self.fetch_member(vehicle.driver_id).await?;

        self.bounded(self.store.insert_vehicle(&vehicle)).await?;

        tracing::info!(vehicle_id = %vehicle.id, "vehicle registered");

        Ok(vehicle)
    }

    #[tracing::instrument(skip(self))]
    async fn list_vehicles(&self, _user: User, driver_id: Uuid) -> Result<Vec<Vehicle>, Error> {
        self.fetch_member(driver_id).await?;

        self.bounded(self.store.list_vehicles_for_driver(driver_id))
            .await
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_vehicle(
        &self,
        user: User,
        id: Uuid,
        update: VehicleUpdate,
    ) -> Result<Vehicle, Error> {
        let mut vehicle = self.fetch_vehicle(id).await?;

        self.authorize(user, "update", vehicle.clone())?;

        vehicle.apply(update)?;

        self.bounded(self.store.update_vehicle(&vehicle)).await?;

        Ok(vehicle)
    }
}
