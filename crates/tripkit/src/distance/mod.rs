//! # Distance Matrix Engine
//!
//! Turns a trip's day-by-day stop order into one batched routing request and
//! merges the answer into a keyed cache on [`PlannerState`].
//!
//! ## Lifecycle
//!
//! Each travel mode runs its own little state machine:
//!
//! ```text
//! Idle ──begin──▶ Loading ──complete(Ok)──▶ Ready
//!                    │
//!                    └──complete(Err)──▶ Failed(message)
//! ```
//!
//! Any state can be re-entered with another `begin`.
//!
//! ## Two Halves
//!
//! The request is split so the store is never borrowed across the network
//! call:
//!
//! 1. [`begin_request`] reads the adjacency, allocates a sequence number,
//!    marks the mode `Loading` and hands back the [`MatrixRequest`].
//! 2. The caller awaits the routing port, editing the trip in the meantime
//!    if it likes.
//! 3. [`complete_request`] merges (or records the failure).
//!
//! [`request_distance_matrix_for_trip`] chains the three for callers that do
//! not need to interleave edits.
//!
//! ## Ordering
//!
//! Sequence numbers are issued per store, and each mode remembers the latest
//! one it issued. A response carrying an older number is discarded, so an
//! out-of-order reply can never overwrite the result of a newer request.
//!
//! ## Invalidation
//!
//! Keys are `(trip, from item, to item)`. Nothing is ever evicted: readers
//! (see [`crate::selectors::select_day_routes`]) look entries up through the
//! current adjacency, so keys for deleted or reordered items are simply never
//! read again. A failed request leaves the cache as it was.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::geo::LatLng;
use crate::ids::{ItemId, TripId};
use crate::model::TravelMode;
use crate::routing::{MatrixRequest, MatrixResponse, RoutingError, RoutingMode, RoutingPort};
use crate::state::PlannerState;

pub mod adjacency;

pub use adjacency::{day_legs, trip_legs, Leg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistanceKey {
    pub trip_id: TripId,
    pub from_item_id: ItemId,
    pub to_item_id: ItemId,
}

impl DistanceKey {
    pub fn new(trip_id: TripId, from_item_id: ItemId, to_item_id: ItemId) -> Self {
        Self {
            trip_id,
            from_item_id,
            to_item_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceEntry {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub path: Vec<LatLng>,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeStatus {
    pub phase: RequestPhase,
    /// Sequence number of the most recently issued request for this mode.
    pub latest_seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DistanceMatrixState {
    entries: HashMap<DistanceKey, DistanceEntry>,
    modes: HashMap<TravelMode, ModeStatus>,
    issued: u64,
}

impl DistanceMatrixState {
    pub fn entry(&self, key: &DistanceKey) -> Option<&DistanceEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &HashMap<DistanceKey, DistanceEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self, mode: TravelMode) -> ModeStatus {
        self.modes.get(&mode).cloned().unwrap_or_default()
    }

    pub fn phase(&self, mode: TravelMode) -> RequestPhase {
        self.status(mode).phase
    }

    /// True while any mode has a request in flight.
    pub fn is_loading(&self) -> bool {
        self.modes.values().any(|s| s.phase == RequestPhase::Loading)
    }

    /// Message of the newest failure that has not been superseded by a later
    /// request for the same mode.
    pub fn error(&self) -> Option<&str> {
        self.modes
            .values()
            .filter_map(|s| match &s.phase {
                RequestPhase::Failed(message) => Some((s.latest_seq, message.as_str())),
                _ => None,
            })
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, message)| message)
    }

    fn issue(&mut self, mode: TravelMode) -> u64 {
        self.issued += 1;
        let status = self.modes.entry(mode).or_default();
        status.latest_seq = self.issued;
        status.phase = RequestPhase::Loading;
        self.issued
    }

    fn is_latest(&self, ticket: &MatrixTicket) -> bool {
        self.modes
            .get(&ticket.mode)
            .is_some_and(|s| s.latest_seq == ticket.seq)
    }

    fn set_phase(&mut self, mode: TravelMode, phase: RequestPhase) {
        self.modes.entry(mode).or_default().phase = phase;
    }
}

/// Identifies an issued request so its response can be matched up later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixTicket {
    pub trip_id: TripId,
    pub mode: TravelMode,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMatrixRequest {
    pub ticket: MatrixTicket,
    pub request: MatrixRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DistanceOutcome {
    /// No day had two located stops; nothing was requested.
    Skipped,
    /// The response was merged; `entries` hops were written.
    Merged { entries: usize },
    /// The port failed; the cache was left untouched.
    Failed(String),
    /// A newer request for the same mode was issued in the meantime.
    Discarded { seq: u64, latest: u64 },
}

/// First half of a request: builds the batch and marks the mode loading.
///
/// Returns `None` without any state change when the trip is unknown or has no
/// routable leg.
pub fn begin_request(state: &mut PlannerState, trip_id: &TripId, mode: TravelMode) -> Option<PendingMatrixRequest> {
    let legs = trip_legs(state, trip_id);
    if legs.is_empty() {
        debug!(trip = %trip_id, ?mode, "distance matrix: no legs, skipping");
        return None;
    }

    let seq = state.distance_matrix.issue(mode);
    let request = MatrixRequest {
        mode: RoutingMode::from(mode),
        pairs: legs.iter().map(Leg::pair).collect(),
    };
    debug!(trip = %trip_id, ?mode, seq, pairs = request.pairs.len(), "distance matrix requested");
    Some(PendingMatrixRequest {
        ticket: MatrixTicket {
            trip_id: *trip_id,
            mode,
            seq,
        },
        request,
    })
}

/// Second half of a request: merges a response or records a failure.
pub fn complete_request(
    state: &mut PlannerState,
    ticket: MatrixTicket,
    result: Result<MatrixResponse, RoutingError>,
) -> DistanceOutcome {
    let matrix = &mut state.distance_matrix;
    if !matrix.is_latest(&ticket) {
        let latest = matrix.status(ticket.mode).latest_seq;
        debug!(seq = ticket.seq, latest, mode = ?ticket.mode, "distance matrix: stale response discarded");
        return DistanceOutcome::Discarded {
            seq: ticket.seq,
            latest,
        };
    }

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            let message = err.to_string();
            warn!(trip = %ticket.trip_id, mode = ?ticket.mode, error = %message, "distance matrix request failed");
            matrix.set_phase(ticket.mode, RequestPhase::Failed(message.clone()));
            return DistanceOutcome::Failed(message);
        }
    };

    let mut written = 0;
    for segment in response.into_segments() {
        let mode = segment
            .mode
            .map(TravelMode::from)
            .unwrap_or(ticket.mode);
        for (hop, ids) in segment.legs.into_iter().zip(segment.item_ids.windows(2)) {
            if !(hop.distance_meters.is_finite() && hop.duration_seconds.is_finite()) {
                warn!(from = %ids[0], to = %ids[1], "distance matrix: non-finite hop ignored");
                continue;
            }
            matrix.entries.insert(
                DistanceKey::new(ticket.trip_id, ids[0], ids[1]),
                DistanceEntry {
                    distance_meters: hop.distance_meters,
                    duration_seconds: hop.duration_seconds,
                    path: hop.path,
                    mode,
                },
            );
            written += 1;
        }
    }
    matrix.set_phase(ticket.mode, RequestPhase::Ready);
    info!(trip = %ticket.trip_id, mode = ?ticket.mode, entries = written, "distance matrix merged");
    DistanceOutcome::Merged { entries: written }
}

/// Requests and merges the distance matrix for every day of a trip.
///
/// Holds the state for the whole call; use [`begin_request`] and
/// [`complete_request`] directly to keep editing while the port works.
pub async fn request_distance_matrix_for_trip<R>(
    state: &mut PlannerState,
    routing: &R,
    trip_id: &TripId,
    mode: TravelMode,
) -> DistanceOutcome
where
    R: RoutingPort + ?Sized,
{
    let Some(pending) = begin_request(state, trip_id, mode) else {
        return DistanceOutcome::Skipped;
    };
    let result = routing.get_matrix(pending.request).await;
    complete_request(state, pending.ticket, result)
}
