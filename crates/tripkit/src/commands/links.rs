use chrono::Utc;
use tracing::debug;

use crate::ids::{ItemId, LinkId};
use crate::model::{Link, TravelMode};
use crate::state::PlannerState;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkInput {
    pub from_item_id: ItemId,
    pub to_item_id: ItemId,
    /// Falls back to the mode of the destination item.
    pub travel_mode: Option<TravelMode>,
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
}

impl LinkInput {
    pub fn new(from_item_id: ItemId, to_item_id: ItemId) -> Self {
        Self {
            from_item_id,
            to_item_id,
            travel_mode: None,
            distance_meters: None,
            duration_seconds: None,
        }
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.travel_mode = Some(mode);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub travel_mode: Option<TravelMode>,
    pub distance_meters: Option<Option<f64>>,
    pub duration_seconds: Option<Option<f64>>,
}

/// Records an explicit transition between two items.
///
/// Returns `None` without touching state when either endpoint is missing.
pub fn add_link(state: &mut PlannerState, input: LinkInput) -> Option<LinkId> {
    let Some(from) = state.items.get(&input.from_item_id) else {
        debug!(item = %input.from_item_id, "add_link: unknown from item");
        return None;
    };
    let Some(to) = state.items.get(&input.to_item_id) else {
        debug!(item = %input.to_item_id, "add_link: unknown to item");
        return None;
    };

    let now = Utc::now();
    let link = Link {
        id: LinkId::new(),
        trip_id: from.trip_id,
        from_item_id: input.from_item_id,
        to_item_id: input.to_item_id,
        travel_mode: input.travel_mode.unwrap_or(to.travel_mode),
        distance_meters: input.distance_meters,
        duration_seconds: input.duration_seconds,
        created_at: now,
        updated_at: now,
    };
    let id = link.id;
    state.links.insert(id, link);
    Some(id)
}

pub fn update_link(state: &mut PlannerState, link_id: &LinkId, patch: LinkPatch) {
    let Some(link) = state.links.get_mut(link_id) else {
        debug!(link = %link_id, "update_link: unknown link");
        return;
    };
    if let Some(mode) = patch.travel_mode {
        link.travel_mode = mode;
    }
    if let Some(distance) = patch.distance_meters {
        link.distance_meters = distance;
    }
    if let Some(duration) = patch.duration_seconds {
        link.duration_seconds = duration;
    }
    link.updated_at = Utc::now();
}

pub fn remove_link(state: &mut PlannerState, link_id: &LinkId) {
    if state.links.remove(link_id).is_none() {
        debug!(link = %link_id, "remove_link: unknown link");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::items::{add_item, ItemInput};
    use crate::test_utils::trip_with_items;

    #[test]
    fn add_requires_existing_from_item() {
        let (mut state, day) = trip_with_items(&["A"]);
        let a = state.day(&day).unwrap().item_ids[0];
        assert!(add_link(&mut state, LinkInput::new(ItemId::new(), a)).is_none());
        assert!(add_link(&mut state, LinkInput::new(a, ItemId::new())).is_none());
        assert!(state.links.is_empty());
    }

    #[test]
    fn add_defaults_mode_to_destination_item() {
        let (mut state, day) = trip_with_items(&[]);
        let a = add_item(&mut state, ItemInput::note(day, "A"));
        let mut input = ItemInput::note(day, "B");
        input.travel_mode = Some(TravelMode::Car);
        let b = add_item(&mut state, input);

        let link = add_link(&mut state, LinkInput::new(a, b)).unwrap();
        let stored = state.link(&link).unwrap();
        assert_eq!(stored.travel_mode, TravelMode::Car);
        assert_eq!(stored.trip_id, state.item(&a).unwrap().trip_id);

        let explicit = add_link(&mut state, LinkInput::new(a, b).with_mode(TravelMode::Bike)).unwrap();
        assert_eq!(state.link(&explicit).unwrap().travel_mode, TravelMode::Bike);
    }

    #[test]
    fn update_and_remove() {
        let (mut state, day) = trip_with_items(&["A", "B"]);
        let ids = state.day(&day).unwrap().item_ids.clone();
        let link = add_link(&mut state, LinkInput::new(ids[0], ids[1])).unwrap();

        update_link(
            &mut state,
            &link,
            LinkPatch {
                duration_seconds: Some(Some(600.0)),
                ..Default::default()
            },
        );
        assert_eq!(state.link(&link).unwrap().duration_seconds, Some(600.0));

        remove_link(&mut state, &link);
        assert!(state.link(&link).is_none());
        remove_link(&mut state, &link);
    }
}
