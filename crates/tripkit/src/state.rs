//! # Planner State
//!
//! [`PlannerState`] is the entity store: five normalized maps, the
//! current-trip pointer, and the distance-matrix cache. It is a plain value.
//! There is no global instance; callers construct one (usually through
//! [`crate::api::PlannerApi`]) and pass it by reference.
//!
//! ## Single Writer
//!
//! Writes go through the operators in [`crate::commands`], which take
//! `&mut PlannerState`. The exclusive borrow is the whole concurrency story:
//! an operator runs to completion before anyone can read again, so the maps
//! are always observed as one consistent snapshot. Operators compute what
//! they need before the first write and never bail out halfway, so there is
//! no partially applied transition to roll back.
//!
//! Reads go through [`crate::selectors`], which only ever see `&PlannerState`.

use std::collections::HashMap;

use crate::distance::DistanceMatrixState;
use crate::ids::{DayId, ItemId, LinkId, PlaceId, TripId};
use crate::model::{Day, Item, Link, Place, Trip};

#[derive(Debug, Clone, Default)]
pub struct PlannerState {
    pub trips: HashMap<TripId, Trip>,
    pub days: HashMap<DayId, Day>,
    pub items: HashMap<ItemId, Item>,
    pub links: HashMap<LinkId, Link>,
    pub places: HashMap<PlaceId, Place>,
    pub current_trip_id: Option<TripId>,
    pub distance_matrix: DistanceMatrixState,
}

impl PlannerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self, id: &TripId) -> Option<&Trip> {
        self.trips.get(id)
    }

    pub fn day(&self, id: &DayId) -> Option<&Day> {
        self.days.get(id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn place(&self, id: &PlaceId) -> Option<&Place> {
        self.places.get(id)
    }

    /// Deletes every link that has `item_id` at either end.
    pub(crate) fn drop_links_touching(&mut self, item_id: &ItemId) -> usize {
        let before = self.links.len();
        self.links
            .retain(|_, link| link.from_item_id != *item_id && link.to_item_id != *item_id);
        before - self.links.len()
    }

    /// Deletes a day record and everything it owns (items, links touching
    /// those items). The caller is responsible for the trip's `day_ids`.
    pub(crate) fn drop_day_cascade(&mut self, day_id: &DayId) -> Option<Day> {
        let day = self.days.remove(day_id)?;
        for item_id in &day.item_ids {
            self.items.remove(item_id);
            self.drop_links_touching(item_id);
        }
        Some(day)
    }

    /// Re-stamps `order` on a day's items from their list position.
    pub(crate) fn renumber_items(&mut self, day_id: &DayId) {
        let Some(day) = self.days.get(day_id) else {
            return;
        };
        for (position, item_id) in day.item_ids.iter().enumerate() {
            if let Some(item) = self.items.get_mut(item_id) {
                item.order = position as u32;
            }
        }
    }
}
