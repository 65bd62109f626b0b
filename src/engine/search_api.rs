use super::Engine;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::{RideAPI, SearchAPI},
    auth::User,
    entities::{rank, Member, RideListing, RideQuery},
    error::Error,
};

#[async_trait]
impl SearchAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn search_rides(
        &self,
        user: User,
        query: RideQuery,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<RideListing>, Error> {
        let mut rides = self.list_active_rides(user, as_of).await?;

        let mut drivers: HashMap<Uuid, Member> = HashMap::new();
        for ride in &rides {
            if drivers.contains_key(&ride.driver_id) {
                continue;
            }
            if let Some(driver) = self.bounded(self.store.find_member(ride.driver_id)).await? {
                drivers.insert(driver.id, driver);
            }
        }

        // a ride whose driver left the directory is not offered
        rides.retain(|ride| drivers.contains_key(&ride.driver_id));

        let listings: Vec<RideListing> = rank(rides, &query)
            .into_iter()
            .filter_map(|ride| {
                let driver = drivers.get(&ride.driver_id)?;
                Some(RideListing::new(ride, driver))
            })
            .collect();

        tracing::debug!(results = listings.len(), "search complete");

        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemberAPI;
    use crate::db::Store;
    use crate::engine::fixtures::harness;
    use crate::entities::ride::new_ride_spec;
    use crate::entities::{MemberUpdate, Ride};

    fn names(listings: &[RideListing]) -> Vec<(&str, &str)> {
        listings
            .iter()
            .map(|listing| {
                (
                    listing.ride.pickup_location.as_str(),
                    listing.ride.destination.as_str(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn pickup_matches_come_before_unrelated_rides() {
        let h = harness();
        let driver = h.member("Dina").await;

        h.ride(&driver, "Library", "Hostel 4", 3).await;
        h.ride(&driver, "Cafeteria", "Stadium", 3).await;
        h.ride(&driver, "Sports Complex", "Library Annex", 3).await;

        let query = RideQuery {
            pickup: Some("library".into()),
            destination: Some("".into()),
            ..Default::default()
        };

        let rides = h
            .engine
            .search_rides(User::new_system_user(), query, Utc::now())
            .await
            .unwrap();

        assert_eq!(
            names(&rides),
            vec![
                ("Library", "Hostel 4"),
                ("Sports Complex", "Library Annex"),
                ("Cafeteria", "Stadium"),
            ]
        );
    }

    #[tokio::test]
    async fn both_matches_lead_and_limit_truncates() {
        let h = harness();
        let driver = h.member("Dina").await;

        h.ride(&driver, "Library", "Main Gate", 3).await;
        h.ride(&driver, "Hostel 4", "Main Gate", 3).await;
        h.ride(&driver, "Library", "Stadium", 3).await;

        let query = RideQuery {
            pickup: Some("Library".into()),
            destination: Some("gate".into()),
            limit: Some(2),
            ..Default::default()
        };

        let rides = h
            .engine
            .search_rides(User::new_system_user(), query, Utc::now())
            .await
            .unwrap();

        assert_eq!(
            names(&rides),
            vec![("Library", "Main Gate"), ("Library", "Stadium")]
        );
    }

    #[tokio::test]
    async fn empty_store_yields_no_rides() {
        let h = harness();

        let rides = h
            .engine
            .search_rides(User::new_system_user(), RideQuery::default(), Utc::now())
            .await
            .unwrap();

        assert!(rides.is_empty());
    }

    #[tokio::test]
    async fn date_filter_is_exact() {
        let h = harness();
        let driver = h.member("Dina").await;
        h.ride(&driver, "Library", "Main Gate", 3).await;

        let query = RideQuery {
            date: Some("2099-01-02".into()),
            ..Default::default()
        };

        let rides = h
            .engine
            .search_rides(User::new_system_user(), query, Utc::now())
            .await
            .unwrap();

        assert!(rides.is_empty());
    }

    #[tokio::test]
    async fn listings_carry_the_driver_profile() {
        let h = harness();
        let driver = h.member("Dina").await;
        h.engine
            .update_member(
                User::new(driver.id),
                driver.id,
                MemberUpdate {
                    profile_image_url: Some("https://img.example/dina.png".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let ride = h.ride(&driver, "Library", "Main Gate", 3).await;

        let listings = h
            .engine
            .search_rides(User::new_system_user(), RideQuery::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].ride.id, ride.id);
        assert_eq!(listings[0].driver_name, "Dina");
        assert_eq!(
            listings[0].driver_image_url.as_deref(),
            Some("https://img.example/dina.png")
        );

        let json = serde_json::to_value(&listings[0]).unwrap();
        assert_eq!(json["driverName"], "Dina");
        assert_eq!(json["pickupLocation"], "Library");
        assert_eq!(json["availableSeats"], 3);
    }

    #[tokio::test]
    async fn rides_without_a_known_driver_are_left_out() {
        let h = harness();
        let driver = h.member("Dina").await;
        h.ride(&driver, "Library", "Main Gate", 3).await;

        let orphan = Ride::new(new_ride_spec(Uuid::new_v4(), "2099-01-01", "09:00", 2)).unwrap();
        h.store.insert_ride(&orphan).await.unwrap();

        let listings = h
            .engine
            .search_rides(User::new_system_user(), RideQuery::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].driver_name, "Dina");
    }
}
