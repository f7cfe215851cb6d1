//! Candidate search for trip generation.
//!
//! Both trip types run a bounded, first-fit search: a fixed, ordered list of
//! geometric candidates is probed sequentially against the directions
//! provider, and the first response satisfying the distance constraint wins.
//! A failed provider call skips that candidate only; exhausting the candidate
//! list is a distinct, user-facing condition.

use std::time::Duration;

use shared::{Coordinate, TripType};

use crate::geo;
use crate::ors::{Profile, ProviderError, RouteProvider};
use crate::split;

/// Loop lengths requested from the provider's round-trip mode, in probe order.
/// The preferred mid-range lengths come first.
pub const HIKE_LOOP_LENGTHS_KM: [f64; 7] = [10.0, 12.0, 8.0, 14.0, 6.0, 5.0, 15.0];

/// Acceptance band for the actual (haversine-summed) hike loop distance.
pub const HIKE_MIN_KM: f64 = 5.0;
pub const HIKE_MAX_KM: f64 = 15.0;

/// Start-point offsets probed for the two-day tour, largest first: using the
/// full allowed daily distance is preferred over shrinking it.
pub const BIKE_OFFSETS_KM: [f64; 5] = [60.0, 45.0, 35.0, 25.0, 15.0];

/// Bearings probed per offset, cardinal directions before diagonals.
pub const BIKE_BEARINGS_DEG: [f64; 8] = [0.0, 90.0, 180.0, 270.0, 45.0, 135.0, 225.0, 315.0];

pub const BIKE_MAX_PER_DAY_KM: f64 = 60.0;
pub const BIKE_DAY_TOLERANCE_KM: f64 = 5.0;

/// Fallback acceptance: a tour whose per-day split misses the tolerance band
/// is still acceptable when its total stays under this bound.
pub const BIKE_TOTAL_CAP_KM: f64 = 130.0;

const BIKE_DAYS: usize = 2;
const ROUND_TRIP_WAYPOINTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("destination \"{0}\" could not be resolved")]
    DestinationNotFound(String),

    #[error("geocoding failed: {0}")]
    Geocode(#[source] ProviderError),

    #[error("no suitable loop found near \"{0}\", try another destination")]
    NoLoopFound(String),

    #[error("no suitable two-day route found near \"{0}\", try another destination")]
    NoTourFound(String),

    #[error("route search did not finish within {}s", .0.as_secs())]
    DeadlineExceeded(Duration),
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Upper bound on the whole candidate walk; without it a full sweep costs
    /// candidates × retries sequential provider round-trips.
    pub deadline: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
        }
    }
}

/// A generated trip: the full path plus its per-day partition.
#[derive(Debug, Clone)]
pub struct PlannedTrip {
    pub destination: String,
    pub trip_type: TripType,
    pub path: Vec<Coordinate>,
    pub path_days: Vec<Vec<Coordinate>>,
    pub distance_km: f64,
}

pub struct TripPlanner<P> {
    provider: P,
    config: SearchConfig,
}

impl<P: RouteProvider> TripPlanner<P> {
    pub fn new(provider: P, config: SearchConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve `destination` and search for a route of the requested type.
    pub async fn plan(
        &self,
        destination: &str,
        trip_type: TripType,
    ) -> Result<PlannedTrip, SearchError> {
        let deadline = self.config.deadline;
        match tokio::time::timeout(deadline, self.plan_inner(destination, trip_type)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::DeadlineExceeded(deadline)),
        }
    }

    async fn plan_inner(
        &self,
        destination: &str,
        trip_type: TripType,
    ) -> Result<PlannedTrip, SearchError> {
        let center = self
            .provider
            .geocode(destination)
            .await
            .map_err(|err| match err {
                ProviderError::NoMatch(_) => {
                    SearchError::DestinationNotFound(destination.to_owned())
                }
                other => SearchError::Geocode(other),
            })?;

        tracing::info!(
            destination,
            lon = center.lon,
            lat = center.lat,
            "destination resolved"
        );

        match trip_type {
            TripType::Hike => self.plan_hike(destination, center).await,
            TripType::Bike => self.plan_bike(destination, center).await,
        }
    }

    /// Probe round-trip candidates until one lands in the 5-15 km band.
    async fn plan_hike(
        &self,
        destination: &str,
        center: Coordinate,
    ) -> Result<PlannedTrip, SearchError> {
        for length_km in HIKE_LOOP_LENGTHS_KM {
            let path = match self
                .provider
                .round_trip(
                    center,
                    Profile::FootHiking,
                    length_km * 1_000.0,
                    ROUND_TRIP_WAYPOINTS,
                )
                .await
            {
                Ok(path) => path,
                Err(err) => {
                    tracing::debug!(length_km, error = %err, "loop candidate failed, trying next");
                    continue;
                }
            };

            if path.len() < 2 {
                tracing::debug!(length_km, "loop candidate returned a degenerate path");
                continue;
            }

            let distance_km = geo::path_distance_km(&path);
            if !(HIKE_MIN_KM..=HIKE_MAX_KM).contains(&distance_km) {
                tracing::debug!(length_km, distance_km, "loop candidate outside distance band");
                continue;
            }

            tracing::info!(length_km, distance_km, "loop accepted");
            return Ok(PlannedTrip {
                destination: destination.to_owned(),
                trip_type: TripType::Hike,
                path_days: vec![path.clone()],
                path,
                distance_km,
            });
        }

        Err(SearchError::NoLoopFound(destination.to_owned()))
    }

    /// Probe offset × bearing start points for a two-day point-to-point tour.
    async fn plan_bike(
        &self,
        destination: &str,
        center: Coordinate,
    ) -> Result<PlannedTrip, SearchError> {
        for offset_km in BIKE_OFFSETS_KM {
            for bearing_deg in BIKE_BEARINGS_DEG {
                let start = geo::destination_point(center, offset_km, bearing_deg);
                let path = match self
                    .provider
                    .directions(start, center, Profile::CyclingRegular)
                    .await
                {
                    Ok(path) => path,
                    Err(err) => {
                        tracing::debug!(
                            offset_km,
                            bearing_deg,
                            error = %err,
                            "tour candidate failed, trying next"
                        );
                        continue;
                    }
                };

                if path.len() < 2 {
                    tracing::debug!(offset_km, bearing_deg, "tour candidate returned a degenerate path");
                    continue;
                }

                let distance_km = geo::path_distance_km(&path);
                let days = split::split_by_distance(&path, BIKE_DAYS);
                let day_distances: Vec<f64> =
                    days.iter().map(|day| geo::path_distance_km(day)).collect();

                let within_daily = day_distances
                    .iter()
                    .all(|&d| d <= BIKE_MAX_PER_DAY_KM + BIKE_DAY_TOLERANCE_KM);
                let within_total = distance_km <= BIKE_TOTAL_CAP_KM;

                if !within_daily && !within_total {
                    tracing::debug!(
                        offset_km,
                        bearing_deg,
                        distance_km,
                        ?day_distances,
                        "tour candidate rejected"
                    );
                    continue;
                }

                tracing::info!(
                    offset_km,
                    bearing_deg,
                    distance_km,
                    ?day_distances,
                    "tour accepted"
                );
                return Ok(PlannedTrip {
                    destination: destination.to_owned(),
                    trip_type: TripType::Bike,
                    path_days: days,
                    path,
                    distance_km,
                });
            }
        }

        Err(SearchError::NoTourFound(destination.to_owned()))
    }
}
