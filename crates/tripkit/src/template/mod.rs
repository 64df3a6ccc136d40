//! # Template Normalizer
//!
//! Turns authored itinerary templates ([`TemplateSeed`]) into canonical store
//! entities. All writes go through the regular operators
//! ([`create_trip`], [`add_item`]) so an imported trip is indistinguishable
//! from one built by hand, apart from its [`TemplateMeta`] and the
//! `Template` source on its places.
//!
//! Places created by an import carry a stable `external_id`
//! (`template:{template_id}:{stop_id}`, or `template:{template_id}:{day}:{stop}`
//! for stops without an id). Re-importing the same template therefore reuses
//! the existing place records instead of duplicating them.
//!
//! Field spelling and precedence rules live in [`seed`].

pub mod seed;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::commands::items::{add_item, ItemInput};
use crate::commands::places;
use crate::commands::trips::{create_trip, update_trip, TripOptions, TripPatch};
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::ids::TripId;
use crate::model::{PlaceInput, PlaceSource, TemplateMeta, TravelMode};
use crate::state::PlannerState;

pub use seed::{classify_kind, LocationSource, SeedDay, SeedKind, SeedPlace, SeedStop, TemplateSeed, TimeSource};

/// Id of the template used by [`import_sample_trip`].
pub const SAMPLE_TEMPLATE_ID: &str = "hanoi-3n4d";

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("hanoi-3n4d.json", include_str!("../../templates/hanoi-3n4d.json")),
    ("jeju-2n3d.json", include_str!("../../templates/jeju-2n3d.json")),
];

static BUILTIN: Lazy<TemplateCatalog> = Lazy::new(|| {
    let mut catalog = TemplateCatalog::new();
    for (name, source) in BUILTIN_SOURCES {
        match TemplateCatalog::parse(source) {
            Ok(seed) => catalog.insert(seed),
            Err(err) => warn!(template = name, error = %err, "skipping malformed built-in template"),
        }
    }
    catalog
});

/// Templates by id.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, TemplateSeed>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The templates shipped with the crate.
    pub fn builtin() -> &'static TemplateCatalog {
        &BUILTIN
    }

    pub fn insert(&mut self, seed: TemplateSeed) {
        self.templates.insert(seed.id.clone(), seed);
    }

    pub fn get(&self, id: &str) -> Option<&TemplateSeed> {
        self.templates.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn parse(json: &str) -> Result<TemplateSeed> {
        serde_json::from_str(json).map_err(|e| PlannerError::Template(e.to_string()))
    }

    /// Parses and adds a single template document, returning its id.
    pub fn insert_json(&mut self, json: &str) -> Result<String> {
        let seed = Self::parse(json)?;
        let id = seed.id.clone();
        self.insert(seed);
        Ok(id)
    }

    /// Adds every `*.json` file in `dir`. Later files override earlier ids,
    /// including built-in ones when called on a clone of [`Self::builtin`].
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in &paths {
            let content = fs::read_to_string(path)?;
            let seed = Self::parse(&content)
                .map_err(|e| PlannerError::Template(format!("{}: {}", path.display(), e)))?;
            debug!(template = %seed.id, path = %path.display(), "template loaded");
            self.insert(seed);
        }
        Ok(paths.len())
    }
}

/// Parameters of an import that do not come from the template itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub start_date: NaiveDate,
    pub is_sample: bool,
    /// Used when the template does not declare them.
    pub currency: String,
    pub travel_mode: TravelMode,
    /// Used for the empty trip created when the template id is unknown.
    pub fallback_title: String,
    pub fallback_nights: u32,
}

impl ImportOptions {
    pub fn new(start_date: NaiveDate) -> Self {
        Self::from_config(&PlannerConfig::default(), start_date)
    }

    pub fn from_config(config: &PlannerConfig, start_date: NaiveDate) -> Self {
        Self {
            start_date,
            is_sample: false,
            currency: config.currency.clone(),
            travel_mode: config.travel_mode,
            fallback_title: config.default_trip_title.clone(),
            fallback_nights: config.default_nights,
        }
    }

    pub fn sample(mut self) -> Self {
        self.is_sample = true;
        self
    }
}

fn stop_key(template_id: &str, day_index: usize, stop_index: usize, stop: &SeedStop) -> String {
    match stop.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => format!("template:{}:{}", template_id, id),
        None => format!("template:{}:{}:{}", template_id, day_index, stop_index),
    }
}

fn base_accommodation_input(seed: &TemplateSeed) -> Option<PlaceInput> {
    let base = seed.base_accommodation.as_ref()?;
    let Some(location) = base.coords.resolve() else {
        warn!(template = %seed.id, "base accommodation has no usable location; skipped");
        return None;
    };
    Some(
        PlaceInput::user(base.name.clone(), location.lat_lng())
            .with_address(base.address.clone())
            .with_source(PlaceSource::Template, Some(format!("template:{}:base", seed.id))),
    )
}

/// Creates a trip from the template `template_id` and makes it current.
///
/// An unknown id never fails: it yields an empty trip using the fallback
/// title and length from `options`.
pub fn import_template(
    state: &mut PlannerState,
    catalog: &TemplateCatalog,
    template_id: &str,
    options: ImportOptions,
) -> TripId {
    let Some(seed) = catalog.get(template_id) else {
        warn!(template = template_id, "unknown template; creating an empty trip");
        let trip_options = TripOptions {
            currency: options.currency,
            travel_mode: options.travel_mode,
            is_sample: options.is_sample,
            ..Default::default()
        };
        return create_trip(
            state,
            options.fallback_title,
            options.start_date,
            options.fallback_nights,
            trip_options,
        );
    };

    let trip_options = TripOptions {
        currency: seed.currency.clone().unwrap_or(options.currency),
        travel_mode: seed
            .travel_mode
            .as_deref()
            .and_then(seed::parse_travel_mode)
            .unwrap_or(options.travel_mode),
        budget_total: seed.budget_total,
        base_accommodation: None,
        template: Some(TemplateMeta {
            template_id: seed.id.clone(),
            title: seed.title.clone(),
        }),
        is_sample: options.is_sample,
    };
    let trip_id = create_trip(state, seed.title.clone(), options.start_date, seed.nights(), trip_options);
    if let Some(input) = base_accommodation_input(seed) {
        let base = places::template_place(state, input);
        let patch = TripPatch {
            base_accommodation: Some(Some(base)),
            ..Default::default()
        };
        update_trip(state, &trip_id, patch);
    }
    let day_ids = state.trips.get(&trip_id).map(|t| t.day_ids.clone()).unwrap_or_default();

    if seed.days.len() > day_ids.len() {
        warn!(
            template = %seed.id,
            declared = seed.days.len(),
            used = day_ids.len(),
            "template has more days than the trip; extra days ignored"
        );
    }

    let mut imported = 0usize;
    for (day_index, (seed_day, day_id)) in seed.days.iter().zip(&day_ids).enumerate() {
        for (stop_index, stop) in seed_day.stops.iter().enumerate() {
            let location = stop.location();
            let kind = classify_kind(stop.declared_kind(), location.is_some());

            let mut input = ItemInput::new(*day_id, kind, stop.title.clone())
                .with_note(stop.note_text())
                .with_times(stop.start(), stop.end());
            input.cost = stop.cost;
            input.travel_mode = stop.travel_mode();
            input.place_id = location.map(|loc| {
                let place = PlaceInput::user(stop.title.clone(), loc.lat_lng())
                    .with_address(stop.address.clone().unwrap_or_default())
                    .with_source(
                        PlaceSource::Template,
                        Some(stop_key(&seed.id, day_index, stop_index, stop)),
                    );
                places::template_place(state, place)
            });
            add_item(state, input);
            imported += 1;
        }
    }

    info!(trip = %trip_id, template = %seed.id, items = imported, "template imported");
    trip_id
}

/// Imports the bundled sample itinerary flagged as a sample trip.
pub fn import_sample_trip(state: &mut PlannerState, catalog: &TemplateCatalog, options: ImportOptions) -> TripId {
    import_template(state, catalog, SAMPLE_TEMPLATE_ID, options.sample())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemKind, TravelMode};
    use crate::selectors;
    use crate::test_utils::date;

    fn import(state: &mut PlannerState, id: &str) -> TripId {
        import_template(state, TemplateCatalog::builtin(), id, ImportOptions::new(date("2025-03-01")))
    }

    fn items_of_trip<'a>(state: &'a PlannerState, trip: &TripId) -> Vec<&'a Item> {
        selectors::select_days_of_trip(state, Some(trip))
            .iter()
            .flat_map(|day| day.item_ids.iter())
            .filter_map(|id| state.item(id))
            .collect()
    }

    fn find<'a>(items: &[&'a Item], title: &str) -> &'a Item {
        items.iter().copied().find(|i| i.title == title).unwrap()
    }

    #[test]
    fn builtin_catalog_has_shipped_templates() {
        let catalog = TemplateCatalog::builtin();
        let ids: Vec<&str> = catalog.ids().collect();
        assert_eq!(ids, vec!["hanoi-3n4d", "jeju-2n3d"]);
    }

    #[test]
    fn hanoi_round_trip() {
        let mut state = PlannerState::new();
        let trip_id = import(&mut state, "hanoi-3n4d");

        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.nights, 3);
        assert_eq!(trip.day_ids.len(), 4);
        assert_eq!(trip.currency, "VND");
        assert_eq!(trip.template.as_ref().unwrap().template_id, "hanoi-3n4d");
        let base = trip.base_accommodation.unwrap();
        assert_eq!(state.place(&base).unwrap().name, "Old Quarter 호텔");

        let items = items_of_trip(&state, &trip_id);
        assert_eq!(items.len(), 16);
        for item in &items {
            if item.kind == ItemKind::Place {
                let place_id = item.place_id.expect("place item without place");
                assert_eq!(state.place(&place_id).unwrap().source, PlaceSource::Template);
            }
        }
        assert_eq!(items.iter().filter(|i| i.kind == ItemKind::Note).count(), 2);
        assert_eq!(items.iter().filter(|i| i.kind == ItemKind::Place).count(), 14);

        let seed = TemplateCatalog::builtin().get("hanoi-3n4d").unwrap();
        let stops = seed.days.iter().flat_map(|day| day.stops.iter());
        for (stop, item) in stops.zip(&items) {
            if stop.location().is_some() {
                assert_eq!(item.kind, ItemKind::Place, "{}", stop.title);
                assert!(item.place_id.is_some(), "{}", stop.title);
            }
        }
        assert!(selectors::check_integrity(&state).is_empty());
    }

    #[test]
    fn stops_without_location_become_notes() {
        let mut state = PlannerState::new();
        let trip_id = import(&mut state, "hanoi-3n4d");
        let items = items_of_trip(&state, &trip_id);

        let tip = find(&items, "Bargaining tips");
        assert_eq!(tip.kind, ItemKind::Note);
        assert_eq!(tip.place_id, None);
        assert_eq!(tip.note, "Start at half the asking price.");
    }

    #[test]
    fn times_and_notes_are_normalized() {
        let mut state = PlannerState::new();
        let trip_id = import(&mut state, "hanoi-3n4d");
        let items = items_of_trip(&state, &trip_id);

        let lake = find(&items, "호안끼엠 호수");
        assert_eq!(lake.start_time.unwrap().to_string(), "15:00");
        assert_eq!(lake.end_time.unwrap().to_string(), "16:00");

        let market = find(&items, "Dong Xuan Market");
        assert_eq!(market.start_time.unwrap().to_string(), "19:00");

        let mausoleum = find(&items, "Ho Chi Minh Mausoleum");
        assert_eq!(mausoleum.start_time.unwrap().to_string(), "07:30");
        assert_eq!(mausoleum.note, "Closed on Mondays and Fridays.");

        let arrival = find(&items, "Noi Bai 공항 도착");
        assert_eq!(arrival.kind, ItemKind::Place);
        assert!(arrival.place_id.is_some());
        assert_eq!(arrival.travel_mode, TravelMode::Car);

        let temple = find(&items, "Ngoc Son Temple");
        assert_eq!(temple.kind, ItemKind::Place);
        assert_eq!(temple.cost, Some(30_000));
        assert_eq!(temple.travel_mode, TravelMode::Walk);
    }

    #[test]
    fn located_stops_become_places_whatever_their_kind() {
        let mut catalog = TemplateCatalog::new();
        catalog
            .insert_json(
                r#"{"id":"kinds","title":"Kinds","nights":1,"days":[{"stops":[
                    {"title":"Airport","kind":"transport","coordinate":[21.2187,105.8042]},
                    {"title":"Lake","type":"spot","location":{"lat":21.0288,"lng":105.8525}},
                    {"title":"Rest at hotel","kind":"note","lat":21.0340,"lng":105.8500},
                    {"title":"Pack bags","kind":"spot"}
                ]}]}"#,
            )
            .unwrap();
        let mut state = PlannerState::new();
        let trip_id = import_template(&mut state, &catalog, "kinds", ImportOptions::new(date("2025-01-01")));

        let shape: Vec<(String, ItemKind, bool)> = items_of_trip(&state, &trip_id)
            .iter()
            .map(|i| (i.title.clone(), i.kind, selectors::select_item_place(&state, &i.id).is_some()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Airport".to_string(), ItemKind::Place, true),
                ("Lake".to_string(), ItemKind::Place, true),
                ("Rest at hotel".to_string(), ItemKind::Place, true),
                ("Pack bags".to_string(), ItemKind::Note, false),
            ]
        );
    }

    #[test]
    fn moved_stop_gets_a_fresh_place_on_reimport() {
        let template = |lat: f64| {
            format!(
                r#"{{"id":"moving","title":"Moving","nights":1,"days":[{{"stops":[
                    {{"id":"cafe","title":"Cafe","lat":{},"lng":105.85}}
                ]}}]}}"#,
                lat
            )
        };
        let mut state = PlannerState::new();
        let mut catalog = TemplateCatalog::new();
        catalog.insert_json(&template(21.03)).unwrap();
        let first = import_template(&mut state, &catalog, "moving", ImportOptions::new(date("2025-01-01")));
        catalog.insert_json(&template(21.05)).unwrap();
        let second = import_template(&mut state, &catalog, "moving", ImportOptions::new(date("2025-01-01")));

        let place_of = |trip: &TripId| items_of_trip(&state, trip)[0].place_id.unwrap();
        assert_ne!(place_of(&first), place_of(&second));
        assert_eq!(state.place(&place_of(&first)).unwrap().location.lat, 21.03);
        assert_eq!(state.place(&place_of(&second)).unwrap().location.lat, 21.05);
        assert_eq!(
            state.place(&place_of(&second)).unwrap().external_id.as_deref(),
            Some("template:moving:cafe")
        );
    }

    #[test]
    fn reimport_reuses_places() {
        let mut state = PlannerState::new();
        let first = import(&mut state, "hanoi-3n4d");
        let places_after_first = state.places.len();
        let second = import(&mut state, "hanoi-3n4d");

        assert_ne!(first, second);
        assert_eq!(state.places.len(), places_after_first);
        assert_eq!(
            state.trip(&first).unwrap().base_accommodation,
            state.trip(&second).unwrap().base_accommodation
        );

        let shape = |trip: &TripId| {
            items_of_trip(&state, trip)
                .iter()
                .map(|i| (i.title.clone(), i.kind, i.place_id, i.start_time))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first), shape(&second));
        assert_eq!(state.current_trip_id, Some(second));
    }

    #[test]
    fn items_alias_and_derived_keys() {
        let mut state = PlannerState::new();
        let trip_id = import(&mut state, "jeju-2n3d");
        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.day_ids.len(), 3);
        assert_eq!(trip.travel_mode, TravelMode::Car);
        assert!(trip.base_accommodation.is_none());

        let airport = items_of_trip(&state, &trip_id)[0].place_id.unwrap();
        assert_eq!(
            state.place(&airport).unwrap().external_id.as_deref(),
            Some("template:jeju-2n3d:0:0")
        );
    }

    #[test]
    fn unknown_template_creates_default_trip() {
        let mut state = PlannerState::new();
        let trip_id = import(&mut state, "atlantis-7n8d");
        let trip = state.trip(&trip_id).unwrap();
        assert_eq!(trip.title, PlannerConfig::default().default_trip_title);
        assert_eq!(trip.day_ids.len(), 2);
        assert!(trip.template.is_none());
        assert!(state.items.is_empty());
    }

    #[test]
    fn extra_seed_days_are_ignored() {
        let mut catalog = TemplateCatalog::new();
        catalog
            .insert_json(
                r#"{"id":"short","title":"Short","nights":1,"days":[
                    {"stops":[{"title":"a"}]},{"stops":[{"title":"b"}]},{"stops":[{"title":"c"}]}
                ]}"#,
            )
            .unwrap();
        let mut state = PlannerState::new();
        let trip_id = import_template(&mut state, &catalog, "short", ImportOptions::new(date("2025-01-01")));
        let titles: Vec<String> = items_of_trip(&state, &trip_id).iter().map(|i| i.title.clone()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn sample_trip_is_flagged() {
        let mut state = PlannerState::new();
        let trip_id = import_sample_trip(&mut state, TemplateCatalog::builtin(), ImportOptions::new(date("2025-01-01")));
        let trip = state.trip(&trip_id).unwrap();
        assert!(trip.is_sample);
        assert_eq!(trip.template.as_ref().unwrap().template_id, SAMPLE_TEMPLATE_ID);
    }

    #[test]
    fn load_dir_overrides_and_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.json"),
            r#"{"id":"hanoi-3n4d","title":"Custom Hanoi","nights":1,"days":[]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not a template").unwrap();

        let mut catalog = TemplateCatalog::builtin().clone();
        assert_eq!(catalog.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(catalog.get("hanoi-3n4d").unwrap().title, "Custom Hanoi");
        assert_eq!(catalog.len(), 2);

        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let err = catalog.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PlannerError::Template(msg) if msg.contains("broken.json")));
    }
}
