use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::commands::places;
use crate::config::PlannerConfig;
use crate::dates::day_date;
use crate::ids::{DayId, PlaceId, TripId};
use crate::model::{Day, PlaceInput, TemplateMeta, TravelMode, Trip};
use crate::state::PlannerState;

/// Trips are at least one night long (two days).
pub const MIN_NIGHTS: u32 = 1;

pub const DEFAULT_CURRENCY: &str = "KRW";

#[derive(Debug, Clone, PartialEq)]
pub struct TripOptions {
    pub currency: String,
    pub travel_mode: TravelMode,
    pub budget_total: Option<i64>,
    pub base_accommodation: Option<PlaceInput>,
    pub template: Option<TemplateMeta>,
    pub is_sample: bool,
}

impl Default for TripOptions {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            travel_mode: TravelMode::default(),
            budget_total: None,
            base_accommodation: None,
            template: None,
            is_sample: false,
        }
    }
}

impl TripOptions {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            travel_mode: config.travel_mode,
            ..Default::default()
        }
    }

    pub fn with_budget(mut self, budget_total: i64) -> Self {
        self.budget_total = Some(budget_total);
        self
    }

    pub fn with_base_accommodation(mut self, place: PlaceInput) -> Self {
        self.base_accommodation = Some(place);
        self
    }
}

/// Shallow patch for trip-level fields. `None` leaves a field alone; the
/// nested options on nullable fields allow clearing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripPatch {
    pub title: Option<String>,
    pub currency: Option<String>,
    pub travel_mode: Option<TravelMode>,
    pub budget_total: Option<Option<i64>>,
    pub base_accommodation: Option<Option<PlaceId>>,
}

impl TripPatch {
    pub fn budget(budget_total: Option<i64>) -> Self {
        Self {
            budget_total: Some(budget_total),
            ..Default::default()
        }
    }
}

/// Creates a trip with `nights + 1` empty days and makes it current.
///
/// `nights` below [`MIN_NIGHTS`] is clamped. Never fails.
pub fn create_trip(
    state: &mut PlannerState,
    title: impl Into<String>,
    start_date: NaiveDate,
    nights: u32,
    options: TripOptions,
) -> TripId {
    let nights = nights.max(MIN_NIGHTS);
    let trip_id = TripId::new();
    let now = Utc::now();

    let base_accommodation = options
        .base_accommodation
        .map(|input| places::upsert_place(state, None, input));

    let day_ids: Vec<DayId> = (0..=nights as usize)
        .map(|offset| {
            let day = Day {
                id: DayId::new(),
                trip_id,
                date: day_date(start_date, offset),
                item_ids: Vec::new(),
                order: offset as u32,
            };
            let id = day.id;
            state.days.insert(id, day);
            id
        })
        .collect();

    let trip = Trip {
        id: trip_id,
        title: title.into(),
        start_date,
        nights,
        day_ids,
        currency: options.currency,
        travel_mode: options.travel_mode,
        budget_total: options.budget_total,
        base_accommodation,
        template: options.template,
        is_sample: options.is_sample,
        created_at: now,
        updated_at: now,
    };
    info!(trip = %trip_id, nights, "trip created");
    state.trips.insert(trip_id, trip);
    state.current_trip_id = Some(trip_id);
    trip_id
}

/// Re-dates a trip. Existing days keep their ids and are re-stamped in place;
/// growing appends empty days, shrinking drops trailing days with cascade.
pub fn set_trip_dates(state: &mut PlannerState, trip_id: &TripId, start_date: NaiveDate, nights: u32) {
    let Some(trip) = state.trips.get(trip_id) else {
        debug!(trip = %trip_id, "set_trip_dates: unknown trip");
        return;
    };
    let nights = nights.max(MIN_NIGHTS);
    let target = nights as usize + 1;
    let mut day_ids = trip.day_ids.clone();

    if day_ids.len() > target {
        for day_id in day_ids.split_off(target) {
            state.drop_day_cascade(&day_id);
        }
    }
    while day_ids.len() < target {
        let day = Day {
            id: DayId::new(),
            trip_id: *trip_id,
            date: start_date,
            item_ids: Vec::new(),
            order: 0,
        };
        day_ids.push(day.id);
        state.days.insert(day.id, day);
    }

    if let Some(trip) = state.trips.get_mut(trip_id) {
        trip.start_date = start_date;
        trip.day_ids = day_ids;
        trip.touch();
    }
    restamp_days(state, trip_id);
}

/// Appends an empty day to the end of the trip.
pub fn add_day(state: &mut PlannerState, trip_id: &TripId) -> Option<DayId> {
    let Some(trip) = state.trips.get_mut(trip_id) else {
        debug!(trip = %trip_id, "add_day: unknown trip");
        return None;
    };
    let day = Day {
        id: DayId::new(),
        trip_id: *trip_id,
        date: day_date(trip.start_date, trip.day_ids.len()),
        item_ids: Vec::new(),
        order: trip.day_ids.len() as u32,
    };
    let day_id = day.id;
    trip.day_ids.push(day_id);
    trip.touch();
    state.days.insert(day_id, day);
    restamp_days(state, trip_id);
    Some(day_id)
}

/// Removes a day, its items and any link touching them. Places survive.
///
/// Refused when the trip would drop below [`MIN_NIGHTS`].
pub fn remove_day(state: &mut PlannerState, day_id: &DayId) {
    let Some(trip_id) = state.days.get(day_id).map(|d| d.trip_id) else {
        debug!(day = %day_id, "remove_day: unknown day");
        return;
    };
    let Some(trip) = state.trips.get(&trip_id) else {
        debug!(day = %day_id, "remove_day: day has no trip");
        return;
    };
    if trip.day_ids.len() <= MIN_NIGHTS as usize + 1 {
        warn!(trip = %trip_id, "remove_day: refusing to shorten trip below minimum length");
        return;
    }

    state.drop_day_cascade(day_id);
    if let Some(trip) = state.trips.get_mut(&trip_id) {
        trip.day_ids.retain(|id| id != day_id);
        trip.touch();
    }
    restamp_days(state, &trip_id);
}

pub fn update_trip(state: &mut PlannerState, trip_id: &TripId, patch: TripPatch) {
    let Some(trip) = state.trips.get_mut(trip_id) else {
        debug!(trip = %trip_id, "update_trip: unknown trip");
        return;
    };
    if let Some(title) = patch.title {
        trip.title = title;
    }
    if let Some(currency) = patch.currency {
        trip.currency = currency;
    }
    if let Some(mode) = patch.travel_mode {
        trip.travel_mode = mode;
    }
    if let Some(budget) = patch.budget_total {
        trip.budget_total = budget;
    }
    if let Some(base) = patch.base_accommodation {
        trip.base_accommodation = base;
    }
    trip.touch();
}

/// Replaces (or clears) the trip's base accommodation with a new place.
pub fn set_base_accommodation(
    state: &mut PlannerState,
    trip_id: &TripId,
    place: Option<PlaceInput>,
) -> Option<PlaceId> {
    if !state.trips.contains_key(trip_id) {
        debug!(trip = %trip_id, "set_base_accommodation: unknown trip");
        return None;
    }
    let place_id = place.map(|input| places::upsert_place(state, None, input));
    if let Some(trip) = state.trips.get_mut(trip_id) {
        trip.base_accommodation = place_id;
        trip.touch();
    }
    place_id
}

/// Deletes a trip with its days, items and links. Places are shared and stay.
pub fn delete_trip(state: &mut PlannerState, trip_id: &TripId) {
    let Some(trip) = state.trips.remove(trip_id) else {
        debug!(trip = %trip_id, "delete_trip: unknown trip");
        return;
    };
    for day_id in &trip.day_ids {
        state.drop_day_cascade(day_id);
    }
    state.links.retain(|_, link| link.trip_id != *trip_id);
    if state.current_trip_id == Some(*trip_id) {
        state.current_trip_id = None;
    }
    info!(trip = %trip_id, "trip deleted");
}

/// Points the store at another trip. Returns false (and changes nothing) for
/// an unknown id.
pub fn set_current_trip(state: &mut PlannerState, trip_id: &TripId) -> bool {
    if state.trips.contains_key(trip_id) {
        state.current_trip_id = Some(*trip_id);
        true
    } else {
        debug!(trip = %trip_id, "set_current_trip: unknown trip");
        false
    }
}

/// Brings `nights`, day dates and day orders back in line with `day_ids`.
pub(crate) fn restamp_days(state: &mut PlannerState, trip_id: &TripId) {
    let Some(trip) = state.trips.get_mut(trip_id) else {
        return;
    };
    trip.nights = trip.day_ids.len().saturating_sub(1) as u32;
    let start = trip.start_date;
    for (position, day_id) in trip.day_ids.iter().enumerate() {
        if let Some(day) = state.days.get_mut(day_id) {
            day.date = day_date(start, position);
            day.order = position as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::items::{self, ItemInput};
    use crate::commands::links::{self, LinkInput};
    use crate::geo::LatLng;
    use crate::selectors;
    use crate::test_utils::{date, hanoi};

    fn day_dates(state: &PlannerState, trip_id: &TripId) -> Vec<String> {
        selectors::select_days_of_trip(state, Some(trip_id))
            .iter()
            .map(|d| d.date_iso())
            .collect()
    }

    #[test]
    fn create_allocates_one_day_per_night_plus_one() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Jeju", date("2025-01-01"), 2, TripOptions::default());

        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.day_ids.len(), 3);
        assert_eq!(trip.nights, 2);
        assert_eq!(
            day_dates(&state, &trip_id),
            vec!["2025-01-01", "2025-01-02", "2025-01-03"]
        );
        assert_eq!(state.current_trip_id, Some(trip_id));
    }

    #[test]
    fn create_clamps_zero_nights() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Day trip", date("2025-03-01"), 0, TripOptions::default());
        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.nights, 1);
        assert_eq!(trip.day_ids.len(), 2);
    }

    #[test]
    fn create_with_base_accommodation_links_place() {
        let mut state = PlannerState::new();
        let hotel = PlaceInput::user("Hotel", LatLng::new(21.03, 105.85).unwrap());
        let trip_id = create_trip(
            &mut state,
            "Hanoi",
            date("2025-01-01"),
            3,
            TripOptions::default().with_base_accommodation(hotel),
        );
        let place_id = state.trip(&trip_id).unwrap().base_accommodation.unwrap();
        assert_eq!(state.place(&place_id).unwrap().name, "Hotel");
    }

    #[test]
    fn set_dates_reuses_day_ids_and_restamps() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Trip", date("2025-01-01"), 2, TripOptions::default());
        let before = state.trip(&trip_id).unwrap().day_ids.clone();

        set_trip_dates(&mut state, &trip_id, date("2025-02-10"), 2);

        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.day_ids, before);
        assert_eq!(
            day_dates(&state, &trip_id),
            vec!["2025-02-10", "2025-02-11", "2025-02-12"]
        );
    }

    #[test]
    fn set_dates_grows_with_empty_days() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Trip", date("2025-01-01"), 1, TripOptions::default());
        let before = state.trip(&trip_id).unwrap().day_ids.clone();

        set_trip_dates(&mut state, &trip_id, date("2025-01-01"), 3);

        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.nights, 3);
        assert_eq!(trip.day_ids.len(), 4);
        assert_eq!(&trip.day_ids[..2], &before[..]);
        for day_id in &trip.day_ids[2..] {
            assert!(state.day(day_id).unwrap().item_ids.is_empty());
        }
        assert_eq!(day_dates(&state, &trip_id)[3], "2025-01-04");
    }

    #[test]
    fn set_dates_shrinks_with_cascade() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Trip", date("2025-01-01"), 3, TripOptions::default());
        let last_day = *state.trip(&trip_id).unwrap().day_ids.last().unwrap();
        let first_day = state.trip(&trip_id).unwrap().day_ids[0];

        let kept = items::add_item(&mut state, ItemInput::note(first_day, "Breakfast"));
        let doomed = items::add_item(&mut state, ItemInput::place(last_day, "Museum", hanoi()));
        let link = links::add_link(&mut state, LinkInput::new(kept, doomed)).unwrap();

        set_trip_dates(&mut state, &trip_id, date("2025-01-01"), 1);

        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.day_ids.len(), 2);
        assert!(state.day(&last_day).is_none());
        assert!(state.item(&doomed).is_none());
        assert!(state.item(&kept).is_some());
        assert!(state.link(&link).is_none());
        assert_eq!(state.places.len(), 1, "places are shared and must survive");
    }

    #[test]
    fn set_dates_unknown_trip_is_noop() {
        let mut state = PlannerState::new();
        set_trip_dates(&mut state, &TripId::new(), date("2025-01-01"), 3);
        assert!(state.days.is_empty());
    }

    #[test]
    fn add_and_remove_day_renumber() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Trip", date("2025-01-01"), 1, TripOptions::default());

        let added = add_day(&mut state, &trip_id).unwrap();
        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.nights, 2);
        assert_eq!(state.day(&added).unwrap().date_iso(), "2025-01-03");
        assert_eq!(state.day(&added).unwrap().order, 2);

        let first = trip.day_ids[0];
        remove_day(&mut state, &first);
        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.nights, 1);
        assert_eq!(trip.day_ids[1], added);
        assert_eq!(state.day(&added).unwrap().order, 1);
        assert_eq!(state.day(&added).unwrap().date_iso(), "2025-01-02");
    }

    #[test]
    fn remove_day_refuses_minimum_trip() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Trip", date("2025-01-01"), 1, TripOptions::default());
        let first = state.trip(&trip_id).unwrap().day_ids[0];
        remove_day(&mut state, &first);
        assert_eq!(state.trip(&trip_id).unwrap().day_ids.len(), 2);
        assert!(state.day(&first).is_some());
    }

    #[test]
    fn remove_day_cascades_but_keeps_places() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Trip", date("2025-01-01"), 2, TripOptions::default());
        let day = state.trip(&trip_id).unwrap().day_ids[1];
        let other_day = state.trip(&trip_id).unwrap().day_ids[0];
        let a = items::add_item(&mut state, ItemInput::place(day, "A", hanoi()));
        let b = items::add_item(&mut state, ItemInput::note(day, "B"));
        let c = items::add_item(&mut state, ItemInput::note(other_day, "C"));
        let link_in = links::add_link(&mut state, LinkInput::new(c, a)).unwrap();
        let link_inner = links::add_link(&mut state, LinkInput::new(a, b)).unwrap();
        let place = state.item(&a).unwrap().place_id.unwrap();

        remove_day(&mut state, &day);

        assert!(state.item(&a).is_none());
        assert!(state.item(&b).is_none());
        assert!(state.item(&c).is_some());
        assert!(state.link(&link_in).is_none());
        assert!(state.link(&link_inner).is_none());
        assert!(state.place(&place).is_some());
        assert!(selectors::check_integrity(&state).is_empty());
    }

    #[test]
    fn update_trip_sets_and_clears_budget() {
        let mut state = PlannerState::new();
        let trip_id = create_trip(&mut state, "Trip", date("2025-01-01"), 1, TripOptions::default());
        update_trip(&mut state, &trip_id, TripPatch::budget(Some(500_000)));
        assert_eq!(state.trip(&trip_id).unwrap().budget_total, Some(500_000));
        update_trip(&mut state, &trip_id, TripPatch::budget(None));
        assert_eq!(state.trip(&trip_id).unwrap().budget_total, None);
    }

    #[test]
    fn delete_trip_cascades_and_clears_pointer() {
        let mut state = PlannerState::new();
        let keep = create_trip(&mut state, "Keep", date("2025-01-01"), 1, TripOptions::default());
        let gone = create_trip(&mut state, "Gone", date("2025-01-01"), 1, TripOptions::default());
        let day = state.trip(&gone).unwrap().day_ids[0];
        items::add_item(&mut state, ItemInput::place(day, "Spot", hanoi()));

        delete_trip(&mut state, &gone);

        assert!(state.trip(&gone).is_none());
        assert_eq!(state.trips.len(), 1);
        assert_eq!(state.days.len(), 2);
        assert!(state.items.is_empty());
        assert_eq!(state.places.len(), 1);
        assert_eq!(state.current_trip_id, None);
        assert!(set_current_trip(&mut state, &keep));
        assert!(!set_current_trip(&mut state, &gone));
    }
}
