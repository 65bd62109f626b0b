use serde::{Deserialize, Serialize};

use crate::entities::{Member, Ride};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RideQuery {
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
    pub limit: Option<usize>,
}

/// A search hit with the driver's public profile attached.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideListing {
    #[serde(flatten)]
    pub ride: Ride,
    pub driver_name: String,
    pub driver_image_url: Option<String>,
}

impl RideListing {
    pub fn new(ride: Ride, driver: &Member) -> Self {
        Self {
            ride,
            driver_name: driver.name.clone(),
            driver_image_url: driver.profile_image_url.clone(),
        }
    }
}

impl RideQuery {
    fn pickup(&self) -> Option<String> {
        normalized(&self.pickup)
    }

    fn destination(&self) -> Option<String> {
        normalized(&self.destination)
    }

    fn date(&self) -> Option<&str> {
        self.date
            .as_deref()
            .map(str::trim)
            .filter(|date| !date.is_empty())
    }
}

fn normalized(filter: &Option<String>) -> Option<String> {
    filter
        .as_deref()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
}

/// Orders already newest-first `rides` by how well they match `query`.
///
/// Rides matching both pickup and destination come first, then pickup-only,
/// then destination-only, then the rest. Relative order inside each group is
/// preserved. Without pickup/destination filters the input order is kept.
pub fn rank(rides: Vec<Ride>, query: &RideQuery) -> Vec<Ride> {
    let rides = match query.date() {
        Some(date) => rides.into_iter().filter(|ride| ride.date == date).collect(),
        None => rides,
    };

    let pickup = query.pickup();
    let destination = query.destination();

    let mut ranked = if pickup.is_none() && destination.is_none() {
        rides
    } else {
        let mut both = Vec::new();
        let mut pickup_only = Vec::new();
        let mut destination_only = Vec::new();
        let mut neither = Vec::new();

        for ride in rides {
            let pickup_match = pickup
                .as_deref()
                .map_or(false, |p| ride.pickup_location.to_lowercase().contains(p));
            let destination_match = destination
                .as_deref()
                .map_or(false, |d| ride.destination.to_lowercase().contains(d));

            match (pickup_match, destination_match) {
                (true, true) => both.push(ride),
                (true, false) => pickup_only.push(ride),
                (false, true) => destination_only.push(ride),
                (false, false) => neither.push(ride),
            }
        }

        both.into_iter()
            .chain(pickup_only)
            .chain(destination_only)
            .chain(neither)
            .collect()
    };

    if let Some(limit) = query.limit {
        ranked.truncate(limit);
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ride::new_ride_spec;
    use uuid::Uuid;

    fn ride(pickup: &str, destination: &str) -> Ride {
        let mut spec = new_ride_spec(Uuid::new_v4(), "2030-01-01", "09:00", 3);
        spec.pickup_location = pickup.into();
        spec.destination = destination.into();
        Ride::new(spec).unwrap()
    }

    fn query(pickup: &str, destination: &str) -> RideQuery {
        RideQuery {
            pickup: Some(pickup.into()),
            destination: Some(destination.into()),
            ..RideQuery::default()
        }
    }

    fn pickups(rides: &[Ride]) -> Vec<&str> {
        rides.iter().map(|r| r.pickup_location.as_str()).collect()
    }

    #[test]
    fn pickup_match_precedes_unrelated_rides() {
        let rides = vec![
            ride("Hostel", "Cafeteria"),
            ride("Central Library", "Main Gate"),
            ride("Sports Complex", "Library Annex"),
        ];

        let ranked = rank(rides, &query("Library", ""));

        assert_eq!(
            pickups(&ranked),
            vec!["Central Library", "Hostel", "Sports Complex"]
        );
    }

    #[test]
    fn buckets_are_ordered_by_match_quality() {
        let rides = vec![
            ride("Hostel", "Cafeteria"),
            ride("Hostel", "Main Gate"),
            ride("Library", "Cafeteria"),
            ride("library steps", "main gate"),
        ];

        let ranked = rank(rides, &query("LIBRARY", "gate"));

        assert_eq!(
            ranked
                .iter()
                .map(|r| (r.pickup_location.as_str(), r.destination.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("library steps", "main gate"),
                ("Library", "Cafeteria"),
                ("Hostel", "Main Gate"),
                ("Hostel", "Cafeteria"),
            ]
        );
    }

    #[test]
    fn bucket_keeps_input_order() {
        let rides = vec![ride("Library A", "X"), ride("Library B", "Y")];

        let ranked = rank(rides, &query("library", ""));

        assert_eq!(pickups(&ranked), vec!["Library A", "Library B"]);
    }

    #[test]
    fn no_filters_keeps_order_and_applies_limit() {
        let rides = vec![ride("A", "X"), ride("B", "Y"), ride("C", "Z")];

        let ranked = rank(
            rides,
            &RideQuery {
                pickup: Some("   ".into()),
                limit: Some(2),
                ..RideQuery::default()
            },
        );

        assert_eq!(pickups(&ranked), vec!["A", "B"]);
    }

    #[test]
    fn date_filter_drops_other_days() {
        let mut other_day = ride("B", "Y");
        other_day.date = "2030-01-02".into();
        let rides = vec![ride("A", "X"), other_day];

        let ranked = rank(
            rides,
            &RideQuery {
                date: Some("2030-01-02".into()),
                ..RideQuery::default()
            },
        );

        assert_eq!(pickups(&ranked), vec!["B"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(rank(vec![], &query("Library", "Gate")).is_empty());
    }
}
