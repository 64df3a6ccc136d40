use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::commands::trips::{restamp_days, MIN_NIGHTS};
use crate::ids::{DayId, ItemId, PlaceId, TripId};
use crate::model::{Day, Item, Place, Trip};
use crate::state::PlannerState;

pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// The persisted form of one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub trip: Trip,
    pub days: Vec<Day>,
    pub items: Vec<Item>,
    pub places: Vec<Place>,
}

impl TripSnapshot {
    pub fn trip_id(&self) -> TripId {
        self.trip.id
    }

    /// Copies the sub-graph reachable from `trip_id`. `None` for an unknown
    /// trip. Dangling day, item and place references are skipped.
    pub fn extract(state: &PlannerState, trip_id: &TripId) -> Option<Self> {
        let trip = state.trips.get(trip_id)?;
        let days: Vec<Day> = trip.day_ids.iter().filter_map(|id| state.days.get(id)).cloned().collect();
        let items: Vec<Item> = days
            .iter()
            .flat_map(|day| day.item_ids.iter())
            .filter_map(|id| state.items.get(id))
            .cloned()
            .collect();

        let mut seen: HashSet<PlaceId> = HashSet::new();
        let places: Vec<Place> = trip
            .base_accommodation
            .iter()
            .chain(items.iter().filter_map(|item| item.place_id.as_ref()))
            .filter(|id| seen.insert(**id))
            .filter_map(|id| state.places.get(id))
            .cloned()
            .collect();

        Some(Self {
            version: SNAPSHOT_VERSION,
            trip: trip.clone(),
            days,
            items,
            places,
        })
    }
}

/// What [`restore`] had to drop or add to make a snapshot consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Day ids listed by the trip without a day record.
    pub dangling_days: usize,
    /// Item ids listed by a day without an item record (or listed twice).
    pub dangling_items: usize,
    /// Item records no day lists.
    pub orphan_items: usize,
    /// Empty days appended to reach the minimum trip length.
    pub padded_days: usize,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Merges a snapshot into `state`, replacing any in-memory copy of the same
/// trip, and makes it the current trip.
///
/// Places are upserted by id. Ownership fields (`trip_id`, `day_id`) are
/// re-stamped from the list that references a record, and day dates and
/// orders are recomputed from the trip's start date.
pub fn restore(state: &mut PlannerState, snapshot: TripSnapshot) -> RestoreReport {
    let mut report = RestoreReport::default();
    let TripSnapshot {
        trip, days, items, places, ..
    } = snapshot;
    let trip_id = trip.id;

    if let Some(previous) = state.trips.remove(&trip_id) {
        for day_id in &previous.day_ids {
            state.drop_day_cascade(day_id);
        }
    }

    let mut days: HashMap<DayId, Day> = days.into_iter().map(|d| (d.id, d)).collect();
    let mut items: HashMap<ItemId, Item> = items.into_iter().map(|i| (i.id, i)).collect();

    let mut day_ids = Vec::with_capacity(trip.day_ids.len());
    for day_id in &trip.day_ids {
        let Some(mut day) = days.remove(day_id) else {
            report.dangling_days += 1;
            continue;
        };
        day.trip_id = trip_id;

        let mut kept = Vec::with_capacity(day.item_ids.len());
        for item_id in &day.item_ids {
            match items.remove(item_id) {
                Some(mut item) => {
                    item.trip_id = trip_id;
                    item.day_id = day.id;
                    item.order = kept.len() as u32;
                    kept.push(item.id);
                    state.items.insert(item.id, item);
                }
                None => report.dangling_items += 1,
            }
        }
        day.item_ids = kept;
        day_ids.push(day.id);
        state.days.insert(day.id, day);
    }
    report.orphan_items = items.len();

    while day_ids.len() < MIN_NIGHTS as usize + 1 {
        let day = Day {
            id: DayId::new(),
            trip_id,
            date: trip.start_date,
            item_ids: Vec::new(),
            order: 0,
        };
        day_ids.push(day.id);
        state.days.insert(day.id, day);
        report.padded_days += 1;
    }

    for place in places {
        state.places.insert(place.id, place);
    }

    state.trips.insert(trip_id, Trip { day_ids, ..trip });
    restamp_days(state, &trip_id);
    state.current_trip_id = Some(trip_id);

    if report.is_clean() {
        debug!(trip = %trip_id, "snapshot restored");
    } else {
        warn!(trip = %trip_id, ?report, "snapshot repaired while restoring");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::items::{add_item, ItemInput};
    use crate::commands::links::{add_link, LinkInput};
    use crate::commands::places::remove_place;
    use crate::commands::trips::{create_trip, TripOptions};
    use crate::model::PlaceInput;
    use crate::selectors;
    use crate::test_utils::{date, hanoi};

    fn sample() -> (PlannerState, TripId) {
        let mut state = PlannerState::new();
        let trip = create_trip(
            &mut state,
            "Hanoi",
            date("2025-01-01"),
            2,
            TripOptions::default().with_base_accommodation(PlaceInput::user("Hotel", hanoi())),
        );
        let days = state.trip(&trip).unwrap().day_ids.clone();
        let a = add_item(&mut state, ItemInput::place(days[0], "Lake", hanoi()));
        let b = add_item(&mut state, ItemInput::note(days[0], "Lunch").with_cost(80_000));
        add_item(&mut state, ItemInput::place(days[2], "Museum", hanoi()));
        add_link(&mut state, LinkInput::new(a, b));
        (state, trip)
    }

    #[test]
    fn extract_copies_only_the_trip_sub_graph() {
        let (mut state, trip) = sample();
        let other = create_trip(&mut state, "Other", date("2025-05-01"), 1, TripOptions::default());
        let other_day = state.trip(&other).unwrap().day_ids[0];
        add_item(&mut state, ItemInput::place(other_day, "Elsewhere", hanoi()));

        let snapshot = TripSnapshot::extract(&state, &trip).unwrap();
        assert_eq!(snapshot.days.len(), 3);
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.places.len(), 3, "hotel, lake and museum");
        assert!(snapshot.places.iter().all(|p| p.name != "Elsewhere"));
        assert!(TripSnapshot::extract(&state, &TripId::new()).is_none());
    }

    #[test]
    fn extract_skips_dangling_places() {
        let (mut state, trip) = sample();
        let base = state.trip(&trip).unwrap().base_accommodation.unwrap();
        remove_place(&mut state, &base);
        let snapshot = TripSnapshot::extract(&state, &trip).unwrap();
        assert_eq!(snapshot.places.len(), 2);
    }

    #[test]
    fn restore_into_fresh_state_round_trips() {
        let (state, trip) = sample();
        let snapshot = TripSnapshot::extract(&state, &trip).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: TripSnapshot = serde_json::from_str(&json).unwrap();

        let mut fresh = PlannerState::new();
        let report = restore(&mut fresh, decoded);

        assert!(report.is_clean());
        assert_eq!(fresh.current_trip_id, Some(trip));
        assert_eq!(fresh.items.len(), 3);
        assert!(fresh.links.is_empty());
        assert_eq!(selectors::select_total_cost(&fresh, None), 80_000);
        assert!(selectors::check_integrity(&fresh).is_empty());
    }

    #[test]
    fn restore_replaces_in_memory_copy() {
        let (mut state, trip) = sample();
        let snapshot = TripSnapshot::extract(&state, &trip).unwrap();
        let day = state.trip(&trip).unwrap().day_ids[1];
        add_item(&mut state, ItemInput::note(day, "unsaved"));

        restore(&mut state, snapshot);

        assert_eq!(state.items.len(), 3);
        assert!(state.items.values().all(|i| i.title != "unsaved"));
        assert!(selectors::check_integrity(&state).is_empty());
    }

    #[test]
    fn restore_repairs_dangling_references() {
        let (state, trip) = sample();
        let mut snapshot = TripSnapshot::extract(&state, &trip).unwrap();
        snapshot.days[0].item_ids.push(ItemId::new());
        snapshot.trip.day_ids.push(DayId::new());
        let orphan = snapshot.items.pop().unwrap();
        snapshot.days[2].item_ids.clear();
        snapshot.items.push(orphan);

        let mut fresh = PlannerState::new();
        let report = restore(&mut fresh, snapshot);

        assert_eq!(
            report,
            RestoreReport {
                dangling_days: 1,
                dangling_items: 1,
                orphan_items: 1,
                padded_days: 0,
            }
        );
        assert_eq!(fresh.trip(&trip).unwrap().nights, 2);
        assert!(selectors::check_integrity(&fresh).is_empty());
    }

    #[test]
    fn restore_pads_too_short_trips() {
        let (state, trip) = sample();
        let mut snapshot = TripSnapshot::extract(&state, &trip).unwrap();
        snapshot.trip.day_ids.truncate(1);

        let mut fresh = PlannerState::new();
        let report = restore(&mut fresh, snapshot);

        assert_eq!(report.padded_days, 1);
        let days = selectors::select_days_of_trip(&fresh, Some(&trip));
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].date_iso(), "2025-01-02");
        assert!(selectors::check_integrity(&fresh).is_empty());
    }
}
