//! # Selector Layer
//!
//! Pure reads over [`PlannerState`]. Selectors never allocate ids and never
//! mutate; they tolerate whatever the operators leave behind, in particular
//! dangling `place_id` references (treated as "no location") and stale
//! distance-cache keys (never reached, because route lookups go through the
//! current adjacency).
//!
//! Optional id arguments default to the current trip, mirroring how the
//! planner screens call them.

use crate::distance::{day_legs, DistanceEntry, DistanceKey, Leg};
use crate::ids::{DayId, ItemId, TripId};
use crate::model::{Day, Item, Place, Trip};
use crate::state::PlannerState;

pub fn select_current_trip(state: &PlannerState) -> Option<&Trip> {
    state.current_trip_id.as_ref().and_then(|id| state.trips.get(id))
}

fn resolve_trip<'a>(state: &'a PlannerState, trip_id: Option<&TripId>) -> Option<&'a Trip> {
    match trip_id {
        Some(id) => state.trips.get(id),
        None => select_current_trip(state),
    }
}

/// Days of a trip in order. Empty for an unknown trip.
pub fn select_days_of_trip<'a>(state: &'a PlannerState, trip_id: Option<&TripId>) -> Vec<&'a Day> {
    resolve_trip(state, trip_id)
        .map(|trip| trip.day_ids.iter().filter_map(|id| state.days.get(id)).collect())
        .unwrap_or_default()
}

/// Items of a day in order.
///
/// An omitted or unknown `day_id` falls back to the first day of the current
/// trip; with no current trip the result is empty.
pub fn select_items_of_day<'a>(state: &'a PlannerState, day_id: Option<&DayId>) -> Vec<&'a Item> {
    let day = day_id
        .and_then(|id| state.days.get(id))
        .or_else(|| select_days_of_trip(state, None).into_iter().next());
    day.map(|day| day.item_ids.iter().filter_map(|id| state.items.get(id)).collect())
        .unwrap_or_default()
}

/// The item's place, or `None` when it has none or the reference dangles.
pub fn select_item_place<'a>(state: &'a PlannerState, item_id: &ItemId) -> Option<&'a Place> {
    state
        .items
        .get(item_id)
        .and_then(|item| item.place_id.as_ref())
        .and_then(|place_id| state.places.get(place_id))
}

/// Items of a day that resolve to a stored place, paired with it, in order.
pub fn select_located_items_of_day<'a>(state: &'a PlannerState, day_id: &DayId) -> Vec<(&'a Item, &'a Place)> {
    state
        .days
        .get(day_id)
        .map(|day| {
            day.item_ids
                .iter()
                .filter_map(|id| state.items.get(id))
                .filter_map(|item| {
                    let place = item.place_id.as_ref().and_then(|pid| state.places.get(pid))?;
                    Some((item, place))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Sum of item costs over every day of the trip, saturating at the `i64`
/// bounds.
pub fn select_total_cost(state: &PlannerState, trip_id: Option<&TripId>) -> i64 {
    select_days_of_trip(state, trip_id)
        .iter()
        .flat_map(|day| day.item_ids.iter())
        .filter_map(|id| state.items.get(id))
        .filter_map(|item| item.cost)
        .fold(0i64, i64::saturating_add)
}

/// `budget_total - Σ cost`. `None` means no budget is configured (or the trip
/// is unknown), which is different from a budget that is fully spent.
pub fn select_budget_left(state: &PlannerState, trip_id: Option<&TripId>) -> Option<i64> {
    let trip = resolve_trip(state, trip_id)?;
    let budget = trip.budget_total?;
    Some(budget.saturating_sub(select_total_cost(state, Some(&trip.id))))
}

/// A leg of a day together with its cached metrics, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRoute<'a> {
    pub leg: Leg,
    pub entry: Option<&'a DistanceEntry>,
}

/// Cached route metrics between two items of a trip.
pub fn select_route_between<'a>(
    state: &'a PlannerState,
    trip_id: &TripId,
    from: &ItemId,
    to: &ItemId,
) -> Option<&'a DistanceEntry> {
    state
        .distance_matrix
        .entry(&DistanceKey::new(*trip_id, *from, *to))
}

/// Every leg of the day in its current order, with whatever the cache holds
/// for it.
pub fn select_day_routes<'a>(state: &'a PlannerState, day_id: &DayId) -> Vec<DayRoute<'a>> {
    let Some(day) = state.days.get(day_id) else {
        return Vec::new();
    };
    day_legs(state, day_id)
        .into_iter()
        .map(|leg| DayRoute {
            entry: select_route_between(state, &day.trip_id, &leg.from.item_id, &leg.to.item_id),
            leg,
        })
        .collect()
}

/// A broken invariant of the planning graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    DayCountMismatch { trip: TripId, days: usize, nights: u32 },
    MissingDay { trip: TripId, day: DayId },
    DayOwnerMismatch { trip: TripId, day: DayId },
    MissingItem { day: DayId, item: ItemId },
    ItemOwnerMismatch { day: DayId, item: ItemId },
    ItemInSeveralDays { item: ItemId },
    OrphanItem { item: ItemId },
}

/// Checks the structural invariants of every trip. An empty result means
/// the graph is consistent. Dangling place references are legal and not
/// reported.
pub fn check_integrity(state: &PlannerState) -> Vec<IntegrityViolation> {
    use std::collections::HashSet;

    let mut violations = Vec::new();
    let mut seen_items: HashSet<ItemId> = HashSet::new();

    for trip in state.trips.values() {
        if trip.day_ids.len() != trip.nights as usize + 1 {
            violations.push(IntegrityViolation::DayCountMismatch {
                trip: trip.id,
                days: trip.day_ids.len(),
                nights: trip.nights,
            });
        }
        for day_id in &trip.day_ids {
            let Some(day) = state.days.get(day_id) else {
                violations.push(IntegrityViolation::MissingDay {
                    trip: trip.id,
                    day: *day_id,
                });
                continue;
            };
            if day.trip_id != trip.id {
                violations.push(IntegrityViolation::DayOwnerMismatch {
                    trip: trip.id,
                    day: *day_id,
                });
            }
            for item_id in &day.item_ids {
                match state.items.get(item_id) {
                    None => violations.push(IntegrityViolation::MissingItem {
                        day: *day_id,
                        item: *item_id,
                    }),
                    Some(item) if item.day_id != *day_id || item.trip_id != trip.id => {
                        violations.push(IntegrityViolation::ItemOwnerMismatch {
                            day: *day_id,
                            item: *item_id,
                        })
                    }
                    Some(_) => {}
                }
                if !seen_items.insert(*item_id) {
                    violations.push(IntegrityViolation::ItemInSeveralDays { item: *item_id });
                }
            }
        }
    }

    for item_id in state.items.keys() {
        if !seen_items.contains(item_id) {
            violations.push(IntegrityViolation::OrphanItem { item: *item_id });
        }
    }

    violations
}
