//! # API Facade
//!
//! [`PlannerApi`] is a **thin facade** over the command layer and the ports.
//! It owns one [`PlannerState`], a persistence backend, the configuration and
//! the template catalog, and is the single entry point for a UI.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Dispatches** to the operators in [`crate::commands`] and the readers in
//!   [`crate::selectors`]
//! - **Fills defaults** from [`PlannerConfig`] (currency, travel mode, the
//!   fallback trip for unknown templates)
//! - **Talks to the ports**: [`TripBackend`] for persistence, a
//!   [`RoutingPort`] for distance matrices
//!
//! ## Failures Become Notices
//!
//! Port failures never cross the API as errors. A failed save, load or list
//! is logged with `warn!` and pushed as a [`Notice`]; the in-memory state is
//! left as it was. Callers poll [`PlannerApi::drain_notices`] and show them.
//! Routing failures are recorded on the distance-matrix state instead (see
//! [`crate::distance`]).
//!
//! ## Generic Over TripBackend
//!
//! - Production: `PlannerApi<FsBackend>`
//! - Testing: `PlannerApi<MemBackend>`

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::commands::{self, places, trips, ItemInput, ItemPatch, LinkInput, LinkPatch, Notice, TripOptions, TripPatch};
use crate::config::PlannerConfig;
use crate::distance::{self, DistanceEntry, DistanceOutcome, MatrixTicket, PendingMatrixRequest};
use crate::ids::{DayId, ItemId, LinkId, PlaceId, TripId};
use crate::model::{Day, Item, PlaceInput, TravelMode, Trip};
use crate::routing::{MatrixResponse, RoutingError, RoutingPort};
use crate::selectors::{self, DayRoute, IntegrityViolation};
use crate::state::PlannerState;
use crate::store::{snapshot, FsBackend, TripBackend, TripSnapshot};
use crate::template::{self, ImportOptions, TemplateCatalog};

/// Owner recorded on saves when none is configured.
pub const DEFAULT_OWNER: &str = "local";

pub struct PlannerApi<B: TripBackend> {
    state: PlannerState,
    backend: B,
    config: PlannerConfig,
    catalog: TemplateCatalog,
    owner_id: String,
    notices: Vec<Notice>,
}

impl PlannerApi<FsBackend> {
    /// A planner persisting under the configured data directory.
    pub fn open(config: PlannerConfig) -> Self {
        let backend = FsBackend::new(config.data_dir());
        Self::new(backend, config)
    }
}

impl<B: TripBackend> PlannerApi<B> {
    /// Builds the catalog from the built-in templates plus
    /// `config.template_dir`, if set. A broken template directory is reported
    /// as a notice and otherwise ignored.
    pub fn new(backend: B, config: PlannerConfig) -> Self {
        let mut notices = Vec::new();
        let mut catalog = TemplateCatalog::builtin().clone();
        if let Some(dir) = &config.template_dir {
            let mut extended = catalog.clone();
            match extended.load_dir(dir) {
                Ok(count) => {
                    debug!(dir = %dir.display(), count, "extra templates loaded");
                    catalog = extended;
                }
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "template directory ignored");
                    notices.push(Notice::warning(format!("Could not load templates: {}", err)));
                }
            }
        }
        Self {
            state: PlannerState::new(),
            backend,
            config,
            catalog,
            owner_id: DEFAULT_OWNER.to_string(),
            notices,
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    pub fn with_catalog(mut self, catalog: TemplateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Takes every pending notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    // --- trips ---

    /// Creates a trip with the configured currency and travel mode.
    pub fn create_trip(&mut self, title: impl Into<String>, start_date: NaiveDate, nights: u32) -> TripId {
        let options = TripOptions::from_config(&self.config);
        trips::create_trip(&mut self.state, title, start_date, nights, options)
    }

    pub fn create_trip_with(
        &mut self,
        title: impl Into<String>,
        start_date: NaiveDate,
        nights: u32,
        options: TripOptions,
    ) -> TripId {
        trips::create_trip(&mut self.state, title, start_date, nights, options)
    }

    pub fn set_trip_dates(&mut self, trip_id: &TripId, start_date: NaiveDate, nights: u32) {
        trips::set_trip_dates(&mut self.state, trip_id, start_date, nights)
    }

    pub fn add_day(&mut self, trip_id: &TripId) -> Option<DayId> {
        trips::add_day(&mut self.state, trip_id)
    }

    pub fn remove_day(&mut self, day_id: &DayId) {
        trips::remove_day(&mut self.state, day_id)
    }

    pub fn update_trip(&mut self, trip_id: &TripId, patch: TripPatch) {
        trips::update_trip(&mut self.state, trip_id, patch)
    }

    pub fn set_base_accommodation(&mut self, trip_id: &TripId, place: Option<PlaceInput>) -> Option<PlaceId> {
        trips::set_base_accommodation(&mut self.state, trip_id, place)
    }

    pub fn set_current_trip(&mut self, trip_id: &TripId) -> bool {
        trips::set_current_trip(&mut self.state, trip_id)
    }

    /// Deletes the trip from memory and from the backend.
    pub fn delete_trip(&mut self, trip_id: &TripId) {
        trips::delete_trip(&mut self.state, trip_id);
        if let Err(err) = self.backend.delete_trip(trip_id) {
            warn!(trip = %trip_id, error = %err, "failed to delete stored trip");
            self.notify(Notice::error(format!("Failed to delete saved trip: {}", err)));
        }
    }

    // --- items, links, places ---

    pub fn add_item(&mut self, input: ItemInput) -> ItemId {
        commands::items::add_item(&mut self.state, input)
    }

    pub fn update_item(&mut self, item_id: &ItemId, patch: ItemPatch) {
        commands::items::update_item(&mut self.state, item_id, patch)
    }

    pub fn remove_item(&mut self, item_id: &ItemId) {
        commands::items::remove_item(&mut self.state, item_id)
    }

    pub fn move_item_within_day(&mut self, day_id: &DayId, from_index: usize, to_index: usize) {
        commands::items::move_item_within_day(&mut self.state, day_id, from_index, to_index)
    }

    pub fn move_item_to_day(&mut self, item_id: &ItemId, target_day_id: &DayId, index: Option<usize>) {
        commands::items::move_item_to_day(&mut self.state, item_id, target_day_id, index)
    }

    pub fn add_link(&mut self, input: LinkInput) -> Option<LinkId> {
        commands::links::add_link(&mut self.state, input)
    }

    pub fn update_link(&mut self, link_id: &LinkId, patch: LinkPatch) {
        commands::links::update_link(&mut self.state, link_id, patch)
    }

    pub fn remove_link(&mut self, link_id: &LinkId) {
        commands::links::remove_link(&mut self.state, link_id)
    }

    pub fn upsert_place(&mut self, id: Option<PlaceId>, input: PlaceInput) -> PlaceId {
        places::upsert_place(&mut self.state, id, input)
    }

    pub fn remove_place(&mut self, id: &PlaceId) {
        places::remove_place(&mut self.state, id)
    }

    // --- selectors ---

    pub fn current_trip(&self) -> Option<&Trip> {
        selectors::select_current_trip(&self.state)
    }

    pub fn days_of_trip(&self, trip_id: Option<&TripId>) -> Vec<&Day> {
        selectors::select_days_of_trip(&self.state, trip_id)
    }

    pub fn items_of_day(&self, day_id: Option<&DayId>) -> Vec<&Item> {
        selectors::select_items_of_day(&self.state, day_id)
    }

    pub fn total_cost(&self, trip_id: Option<&TripId>) -> i64 {
        selectors::select_total_cost(&self.state, trip_id)
    }

    pub fn budget_left(&self, trip_id: Option<&TripId>) -> Option<i64> {
        selectors::select_budget_left(&self.state, trip_id)
    }

    pub fn route_between(&self, trip_id: &TripId, from: &ItemId, to: &ItemId) -> Option<&DistanceEntry> {
        selectors::select_route_between(&self.state, trip_id, from, to)
    }

    pub fn day_routes(&self, day_id: &DayId) -> Vec<DayRoute<'_>> {
        selectors::select_day_routes(&self.state, day_id)
    }

    pub fn check_integrity(&self) -> Vec<IntegrityViolation> {
        selectors::check_integrity(&self.state)
    }

    // --- templates ---

    pub fn import_template(&mut self, template_id: &str, start_date: NaiveDate) -> TripId {
        let options = ImportOptions::from_config(&self.config, start_date);
        template::import_template(&mut self.state, &self.catalog, template_id, options)
    }

    pub fn import_sample_trip(&mut self, start_date: NaiveDate) -> TripId {
        let options = ImportOptions::from_config(&self.config, start_date);
        template::import_sample_trip(&mut self.state, &self.catalog, options)
    }

    // --- persistence ---

    /// Writes the trip's snapshot to the backend. Returns false (with a
    /// notice on backend failure) when nothing was saved.
    pub fn save_trip(&mut self, trip_id: &TripId) -> bool {
        let Some(snapshot) = TripSnapshot::extract(&self.state, trip_id) else {
            debug!(trip = %trip_id, "save_trip: unknown trip");
            return false;
        };
        match self.backend.save_trip(&snapshot, &self.owner_id) {
            Ok(()) => true,
            Err(err) => {
                warn!(trip = %trip_id, error = %err, "failed to save trip");
                self.notify(Notice::error(format!("Failed to save trip: {}", err)));
                false
            }
        }
    }

    /// Replaces the in-memory copy of the trip with the stored one and makes
    /// it current. Returns false (with a notice) when nothing was loaded.
    pub fn load_trip(&mut self, trip_id: &TripId) -> bool {
        let snapshot = match self.backend.load_trip(trip_id) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(trip = %trip_id, "load_trip: not stored");
                self.notify(Notice::warning(format!("Trip {} is not saved", trip_id)));
                return false;
            }
            Err(err) => {
                warn!(trip = %trip_id, error = %err, "failed to load trip");
                self.notify(Notice::error(format!("Failed to load trip: {}", err)));
                return false;
            }
        };

        let report = snapshot::restore(&mut self.state, snapshot);
        if !report.is_clean() {
            self.notify(Notice::warning(format!(
                "Trip was repaired while loading: {} missing day(s), {} missing item(s), {} unreferenced item(s) dropped",
                report.dangling_days, report.dangling_items, report.orphan_items
            )));
        }
        true
    }

    /// Trips saved under this planner's owner. Empty (with a notice) on
    /// backend failure.
    pub fn list_saved_trips(&mut self) -> Vec<TripId> {
        match self.backend.list_trips(&self.owner_id) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(owner = %self.owner_id, error = %err, "failed to list trips");
                self.notify(Notice::error(format!("Failed to list trips: {}", err)));
                Vec::new()
            }
        }
    }

    // --- distance matrix ---

    /// Fetches and merges the distance matrix of a trip (default: current)
    /// under `mode` (default: the trip's travel mode).
    pub async fn request_distance_matrix<R>(
        &mut self,
        routing: &R,
        trip_id: Option<&TripId>,
        mode: Option<TravelMode>,
    ) -> DistanceOutcome
    where
        R: RoutingPort + ?Sized,
    {
        let Some(trip) = trip_id
            .and_then(|id| self.state.trip(id))
            .or_else(|| selectors::select_current_trip(&self.state))
        else {
            debug!("request_distance_matrix: no trip");
            return DistanceOutcome::Skipped;
        };
        let trip_id = trip.id;
        let mode = mode.unwrap_or(trip.travel_mode);
        distance::request_distance_matrix_for_trip(&mut self.state, routing, &trip_id, mode).await
    }

    /// First half of a split request; see [`distance::begin_request`].
    pub fn begin_distance_request(&mut self, trip_id: &TripId, mode: TravelMode) -> Option<PendingMatrixRequest> {
        distance::begin_request(&mut self.state, trip_id, mode)
    }

    pub fn complete_distance_request(
        &mut self,
        ticket: MatrixTicket,
        result: Result<MatrixResponse, RoutingError>,
    ) -> DistanceOutcome {
        distance::complete_request(&mut self.state, ticket, result)
    }
}
