use chrono::Utc;
use tracing::{debug, warn};

use crate::commands::places;
use crate::dates::ClockTime;
use crate::geo::LatLng;
use crate::ids::{DayId, ItemId, PlaceId};
use crate::model::{Item, ItemKind, PlaceInput, TravelMode};
use crate::state::PlannerState;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemInput {
    pub day_id: DayId,
    pub kind: ItemKind,
    pub title: String,
    pub note: String,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub cost: Option<i64>,
    /// Falls back to the trip's default mode.
    pub travel_mode: Option<TravelMode>,
    /// An existing place to reference. Wins over `place`.
    pub place_id: Option<PlaceId>,
    /// A new place to create for this item.
    pub place: Option<PlaceInput>,
    /// Insert right after this position instead of appending.
    pub insert_after_index: Option<usize>,
}

impl ItemInput {
    pub fn new(day_id: DayId, kind: ItemKind, title: impl Into<String>) -> Self {
        Self {
            day_id,
            kind,
            title: title.into(),
            note: String::new(),
            start_time: None,
            end_time: None,
            cost: None,
            travel_mode: None,
            place_id: None,
            place: None,
            insert_after_index: None,
        }
    }

    pub fn note(day_id: DayId, title: impl Into<String>) -> Self {
        Self::new(day_id, ItemKind::Note, title)
    }

    /// A place visit with a fresh user-entered place named after the item.
    pub fn place(day_id: DayId, title: impl Into<String>, location: LatLng) -> Self {
        let title = title.into();
        let mut input = Self::new(day_id, ItemKind::Place, title.clone());
        input.place = Some(PlaceInput::user(title, location));
        input
    }

    pub fn with_place_id(mut self, place_id: PlaceId) -> Self {
        self.place_id = Some(place_id);
        self
    }

    pub fn with_cost(mut self, cost: i64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_times(mut self, start: Option<ClockTime>, end: Option<ClockTime>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn insert_after(mut self, index: usize) -> Self {
        self.insert_after_index = Some(index);
        self
    }
}

/// Shallow patch for an item. Outer `None` keeps the current value; for
/// nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub kind: Option<ItemKind>,
    pub title: Option<String>,
    pub note: Option<String>,
    pub start_time: Option<Option<ClockTime>>,
    pub end_time: Option<Option<ClockTime>>,
    pub cost: Option<Option<i64>>,
    pub travel_mode: Option<TravelMode>,
    pub place_id: Option<Option<PlaceId>>,
}

impl ItemPatch {
    pub fn cost(cost: Option<i64>) -> Self {
        Self {
            cost: Some(cost),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// Adds an item to a day and returns its id.
///
/// For an unknown `day_id` the returned id was never linked anywhere and no
/// state changes; check the day's item list to confirm success.
pub fn add_item(state: &mut PlannerState, input: ItemInput) -> ItemId {
    let item_id = ItemId::new();
    let Some(day) = state.days.get(&input.day_id) else {
        debug!(day = %input.day_id, "add_item: unknown day");
        return item_id;
    };
    let trip_id = day.trip_id;
    let len = day.item_ids.len();
    let position = match input.insert_after_index {
        Some(index) => (index + 1).min(len),
        None => len,
    };
    let travel_mode = input
        .travel_mode
        .or_else(|| state.trips.get(&trip_id).map(|t| t.travel_mode))
        .unwrap_or_default();

    let place_id = match (input.place_id, input.place) {
        (Some(existing), _) => Some(existing),
        (None, Some(new_place)) => Some(places::upsert_place(state, None, new_place)),
        (None, None) => None,
    };

    let now = Utc::now();
    let item = Item {
        id: item_id,
        trip_id,
        day_id: input.day_id,
        kind: input.kind,
        title: input.title,
        note: input.note,
        start_time: input.start_time,
        end_time: input.end_time,
        cost: input.cost,
        travel_mode,
        place_id,
        order: position as u32,
        created_at: now,
        updated_at: now,
    };
    state.items.insert(item_id, item);
    if let Some(day) = state.days.get_mut(&input.day_id) {
        day.item_ids.insert(position, item_id);
    }
    state.renumber_items(&input.day_id);
    debug!(item = %item_id, day = %input.day_id, position, "item added");
    item_id
}

pub fn update_item(state: &mut PlannerState, item_id: &ItemId, patch: ItemPatch) {
    let Some(item) = state.items.get_mut(item_id) else {
        debug!(item = %item_id, "update_item: unknown item");
        return;
    };
    if let Some(kind) = patch.kind {
        item.kind = kind;
    }
    if let Some(title) = patch.title {
        item.title = title;
    }
    if let Some(note) = patch.note {
        item.note = note;
    }
    if let Some(start) = patch.start_time {
        item.start_time = start;
    }
    if let Some(end) = patch.end_time {
        item.end_time = end;
    }
    if let Some(cost) = patch.cost {
        item.cost = cost;
    }
    if let Some(mode) = patch.travel_mode {
        item.travel_mode = mode;
    }
    if let Some(place_id) = patch.place_id {
        item.place_id = place_id;
    }
    item.updated_at = Utc::now();
}

/// Removes an item from its day along with every link touching it. The
/// referenced place is left alone.
pub fn remove_item(state: &mut PlannerState, item_id: &ItemId) {
    let Some(item) = state.items.remove(item_id) else {
        debug!(item = %item_id, "remove_item: unknown item");
        return;
    };
    if let Some(day) = state.days.get_mut(&item.day_id) {
        day.item_ids.retain(|id| id != item_id);
    }
    state.renumber_items(&item.day_id);
    state.drop_links_touching(item_id);
}

/// Moves the item at `from_index` to `to_index` within one day.
///
/// Indices must come from the current item list. Out-of-range indices are a
/// caller bug: the call is rejected with a warning rather than clamped.
pub fn move_item_within_day(state: &mut PlannerState, day_id: &DayId, from_index: usize, to_index: usize) {
    let Some(day) = state.days.get_mut(day_id) else {
        debug!(day = %day_id, "move_item_within_day: unknown day");
        return;
    };
    let len = day.item_ids.len();
    if from_index >= len || to_index >= len {
        warn!(day = %day_id, from_index, to_index, len, "move_item_within_day: index out of range");
        return;
    }
    let moved = day.item_ids.remove(from_index);
    day.item_ids.insert(to_index, moved);
    state.renumber_items(day_id);
}

/// Moves an item to another day of the same trip, inserting at `index`
/// (appending when `None` or past the end).
pub fn move_item_to_day(state: &mut PlannerState, item_id: &ItemId, target_day_id: &DayId, index: Option<usize>) {
    let Some(item) = state.items.get(item_id) else {
        debug!(item = %item_id, "move_item_to_day: unknown item");
        return;
    };
    let source_day_id = item.day_id;
    let Some(target) = state.days.get(target_day_id) else {
        debug!(day = %target_day_id, "move_item_to_day: unknown target day");
        return;
    };
    if target.trip_id != item.trip_id {
        warn!(item = %item_id, day = %target_day_id, "move_item_to_day: target day belongs to another trip");
        return;
    }

    if let Some(source) = state.days.get_mut(&source_day_id) {
        source.item_ids.retain(|id| id != item_id);
    }
    if let Some(target) = state.days.get_mut(target_day_id) {
        let position = index.unwrap_or(target.item_ids.len()).min(target.item_ids.len());
        target.item_ids.insert(position, *item_id);
    }
    if let Some(item) = state.items.get_mut(item_id) {
        item.day_id = *target_day_id;
        item.updated_at = Utc::now();
    }
    state.renumber_items(&source_day_id);
    state.renumber_items(target_day_id);
}
