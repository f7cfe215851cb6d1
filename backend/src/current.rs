//! Single-writer slot for the most recently generated route.
//!
//! Searches run concurrently when a caller changes destination mid-flight;
//! only the most recently begun search may publish its result. `begin` hands
//! out a sequence token and invalidates all earlier ones, so a slow, stale
//! search cannot overwrite a newer result.

use std::sync::{Mutex, PoisonError};

use crate::search::PlannedTrip;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotToken(u64);

#[derive(Default)]
struct SlotState {
    latest: u64,
    current: Option<PlannedTrip>,
}

#[derive(Default)]
pub struct RouteSlot {
    inner: Mutex<SlotState>,
}

impl RouteSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new search; earlier tokens become stale.
    pub fn begin(&self) -> SlotToken {
        let mut state = self.lock();
        state.latest += 1;
        SlotToken(state.latest)
    }

    /// Publish a finished search result. Returns `false` (and leaves the slot
    /// untouched) when a newer search has begun since `token` was issued.
    pub fn publish(&self, token: SlotToken, trip: PlannedTrip) -> bool {
        let mut state = self.lock();
        if token.0 != state.latest {
            return false;
        }
        state.current = Some(trip);
        true
    }

    pub fn current(&self) -> Option<PlannedTrip> {
        self.lock().current.clone()
    }

    /// Drop the current route and invalidate in-flight searches (logout).
    pub fn clear(&self) {
        let mut state = self.lock();
        state.latest += 1;
        state.current = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
