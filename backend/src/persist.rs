//! Persistence adapter between in-memory trips and the route store.
//!
//! Saving thins aggressively before encoding (the codec's own transport cap is
//! independent and looser), so stored payloads stay small. Loading decodes
//! every record and degrades a record with malformed encoded data to empty
//! paths instead of failing the batch.

use std::time::Duration;

use shared::SavedTrip;

use crate::codec;
use crate::search::PlannedTrip;
use crate::store::{NewRouteRecord, RouteStore, StoreError, StoredRoute};

/// Point cap applied to the path and each day segment before encoding.
pub const SAVE_MAX_POINTS: usize = 50;

/// Tighter cap used for the single retry after a payload-too-large response.
pub const RETRY_MAX_POINTS: usize = 25;

/// Fixed back-off before the single retry on a busy store.
const STORE_BACKOFF: Duration = Duration::from_millis(500);

pub struct RouteArchive<S> {
    store: S,
}

impl<S: RouteStore> RouteArchive<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Thin, encode and store `trip` for `owner`.
    ///
    /// A payload-too-large response triggers one retry at [`RETRY_MAX_POINTS`];
    /// a rate-limited or unavailable store triggers one retry after a fixed
    /// back-off. Every other error propagates unchanged.
    pub async fn save_route(
        &self,
        owner: &str,
        trip: &PlannedTrip,
        name: &str,
        description: Option<String>,
    ) -> Result<StoredRoute, StoreError> {
        let record = encode_record(trip, name, description.clone(), SAVE_MAX_POINTS);
        match self.submit(owner, record).await {
            Err(StoreError::PayloadTooLarge { size, limit }) => {
                tracing::warn!(
                    size,
                    limit,
                    "encoded route too large, retrying with tighter thinning"
                );
                let record = encode_record(trip, name, description, RETRY_MAX_POINTS);
                self.submit(owner, record).await
            }
            other => other,
        }
    }

    /// One save attempt, retried once after a fixed delay when the store is
    /// rate-limited or unavailable.
    async fn submit(&self, owner: &str, record: NewRouteRecord) -> Result<StoredRoute, StoreError> {
        match self.store.save(owner, record.clone()).await {
            Err(err @ (StoreError::RateLimited | StoreError::Unavailable(_))) => {
                tracing::warn!(error = %err, "route store busy, retrying once");
                tokio::time::sleep(STORE_BACKOFF).await;
                self.store.save(owner, record).await
            }
            other => other,
        }
    }

    /// Load and decode all of `owner`'s stored routes, newest first.
    pub async fn load_routes(&self, owner: &str) -> Result<Vec<SavedTrip>, StoreError> {
        let records = self.store.list(owner).await?;
        Ok(records.into_iter().map(decode_record).collect())
    }

    /// Delete a stored route; the store enforces that `owner` owns it.
    pub async fn delete_route(&self, id: i32, owner: &str) -> Result<(), StoreError> {
        self.store.delete(id, owner).await
    }
}

fn encode_record(
    trip: &PlannedTrip,
    name: &str,
    description: Option<String>,
    max_points: usize,
) -> NewRouteRecord {
    NewRouteRecord {
        name: name.to_owned(),
        description,
        destination: trip.destination.clone(),
        trip_type: trip.trip_type,
        path_encoded: codec::encode(&codec::thin(&trip.path, max_points)),
        path_days_encoded: trip
            .path_days
            .iter()
            .map(|day| codec::encode(&codec::thin(day, max_points)))
            .collect(),
    }
}

fn decode_record(record: StoredRoute) -> SavedTrip {
    let trip_type = record.trip_type.parse().unwrap_or_else(|err: String| {
        tracing::warn!(id = record.id, error = %err, "stored route has unknown type");
        shared::TripType::Hike
    });

    SavedTrip {
        id: record.id,
        name: record.name,
        description: record.description,
        destination: record.destination,
        trip_type,
        path: codec::decode(&record.path_encoded),
        path_days: record
            .path_days_encoded
            .iter()
            .map(|encoded| codec::decode(encoded))
            .collect(),
        created_at: record.created_at,
    }
}
