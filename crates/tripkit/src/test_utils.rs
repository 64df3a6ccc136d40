//! Fixture builders and routing stubs shared by the unit tests.
//!
//! Compiled for `cfg(test)` and behind the `test_utils` feature so downstream
//! crates can reuse them in their own tests.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::commands::items::{add_item, ItemInput};
use crate::commands::trips::{create_trip, TripOptions};
use crate::dates;
use crate::geo::LatLng;
use crate::ids::{DayId, ItemId, TripId};
use crate::model::PlaceInput;
use crate::routing::{MatrixRequest, MatrixResponse, RoutingError, RoutingPort};
use crate::selectors;
use crate::state::PlannerState;
use crate::store::TripSnapshot;

/// Parses `YYYY-MM-DD`, panicking on malformed fixtures.
pub fn date(iso: &str) -> NaiveDate {
    dates::parse_iso(iso).unwrap_or_else(|| panic!("bad fixture date {iso}"))
}

/// Hoan Kiem lake.
pub fn hanoi() -> LatLng {
    LatLng { lat: 21.0288, lng: 105.8525 }
}

/// A one-night trip starting 2025-01-01 whose first day holds a note item
/// per title, in order. Returns the first day.
pub fn trip_with_items(titles: &[&str]) -> (PlannerState, DayId) {
    let mut state = PlannerState::new();
    let trip = create_trip(&mut state, "Fixture", date("2025-01-01"), 1, TripOptions::default());
    let day = state.trips[&trip].day_ids[0];
    for title in titles {
        add_item(&mut state, ItemInput::note(day, *title));
    }
    (state, day)
}

pub fn titles_of_day(state: &PlannerState, day: &DayId) -> Vec<String> {
    selectors::select_items_of_day(state, Some(day))
        .iter()
        .map(|item| item.title.clone())
        .collect()
}

/// A one-night trip whose first day holds `n` place items walking north
/// from [`hanoi`] in roughly 110 m steps.
pub fn located_day(n: usize) -> (PlannerState, TripId, Vec<ItemId>) {
    let mut state = PlannerState::new();
    let trip = create_trip(&mut state, "Walk", date("2025-01-01"), 1, TripOptions::default());
    let day = state.trips[&trip].day_ids[0];
    let origin = hanoi();
    let ids = (0..n)
        .map(|i| {
            let here = LatLng {
                lat: origin.lat + 0.001 * i as f64,
                lng: origin.lng,
            };
            add_item(&mut state, ItemInput::place(day, format!("Stop {}", i + 1), here))
        })
        .collect();
    (state, trip, ids)
}

/// Snapshot of a fresh two-night trip with a base accommodation, two located
/// stops and a costed note.
pub fn sample_snapshot() -> TripSnapshot {
    let mut state = PlannerState::new();
    let trip = create_trip(
        &mut state,
        "Snapshot",
        date("2025-01-01"),
        2,
        TripOptions::default().with_base_accommodation(PlaceInput::user("Hotel", hanoi())),
    );
    let days = state.trips[&trip].day_ids.clone();
    add_item(&mut state, ItemInput::place(days[0], "Lake", hanoi()));
    add_item(&mut state, ItemInput::note(days[0], "Lunch").with_cost(80_000));
    add_item(&mut state, ItemInput::place(days[1], "Temple", LatLng { lat: 21.0277, lng: 105.8355 }));
    match TripSnapshot::extract(&state, &trip) {
        Some(snapshot) => snapshot,
        None => unreachable!("fixture trip was just created"),
    }
}

/// A routing port that always fails with a transport error.
pub struct FailingRouter {
    message: String,
}

impl FailingRouter {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
impl RoutingPort for FailingRouter {
    async fn get_matrix(&self, _request: MatrixRequest) -> Result<MatrixResponse, RoutingError> {
        Err(RoutingError::Transport(self.message.clone()))
    }
}
