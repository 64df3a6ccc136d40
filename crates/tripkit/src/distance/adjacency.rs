use crate::ids::{DayId, TripId};
use crate::routing::{MatrixPair, Waypoint};
use crate::selectors;
use crate::state::PlannerState;

/// One routable hop between two located items of the same day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub day_id: DayId,
    pub from: Waypoint,
    pub to: Waypoint,
}

impl Leg {
    pub fn pair(&self) -> MatrixPair {
        MatrixPair {
            origin: self.from,
            destination: self.to,
        }
    }
}

/// Legs of one day: its located items, in order, paired consecutively.
///
/// Items without a resolvable place (notes, dangling `place_id`) are skipped,
/// so `A, note, B` still yields the leg `A → B`.
pub fn day_legs(state: &PlannerState, day_id: &DayId) -> Vec<Leg> {
    let located = selectors::select_located_items_of_day(state, day_id);
    located
        .windows(2)
        .map(|pair| Leg {
            day_id: *day_id,
            from: Waypoint {
                item_id: pair[0].0.id,
                location: pair[0].1.location,
            },
            to: Waypoint {
                item_id: pair[1].0.id,
                location: pair[1].1.location,
            },
        })
        .collect()
}

/// Legs of every day of a trip, day by day.
pub fn trip_legs(state: &PlannerState, trip_id: &TripId) -> Vec<Leg> {
    selectors::select_days_of_trip(state, Some(trip_id))
        .iter()
        .flat_map(|day| day_legs(state, &day.id))
        .collect()
}
