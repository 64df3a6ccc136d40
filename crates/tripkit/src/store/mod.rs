//! # Storage Layer
//!
//! Persistence of whole trips. The in-memory [`PlannerState`] is the working
//! copy; a backend only ever sees [`TripSnapshot`]s, the self-contained
//! sub-graph of one trip.
//!
//! ## Snapshot Contents
//!
//! A snapshot holds the trip, its days in order, their items in order, and
//! every place referenced by those items or by the trip's base
//! accommodation. Links and the distance cache are session data and are not
//! persisted.
//!
//! ## Loading Is Repairing
//!
//! Snapshots come from disk and may have been edited or truncated. Restoring
//! one ([`snapshot::restore`]) never fails; instead it drops what cannot be
//! resolved (day ids without a day record, item ids without an item record,
//! items no day lists) and reports what it dropped in a [`RestoreReport`].
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: One JSON file per trip plus an owner index.
//! - [`mem_backend::MemBackend`]: For testing logic without filesystem I/O.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//! ├── owners.json              # owner id → trip ids
//! └── trips/
//!     └── trip-{uuid}.json     # one TripSnapshot per trip
//! ```

use crate::error::Result;
use crate::ids::TripId;

pub mod fs_backend;
pub mod mem_backend;
pub mod snapshot;

pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use snapshot::{RestoreReport, TripSnapshot};

/// Abstract interface for trip persistence.
///
/// Methods take `&self`; implementations needing mutation use interior
/// mutability, matching the single-threaded planner.
pub trait TripBackend {
    /// `Ok(None)` when the trip was never saved (or was deleted).
    fn load_trip(&self, id: &TripId) -> Result<Option<TripSnapshot>>;

    /// Creates or replaces the stored snapshot and records `owner_id` as an
    /// owner of the trip.
    fn save_trip(&self, snapshot: &TripSnapshot, owner_id: &str) -> Result<()>;

    /// Trips saved under `owner_id`, in the order they were first saved.
    fn list_trips(&self, owner_id: &str) -> Result<Vec<TripId>>;

    /// Deleting an unknown trip is not an error.
    fn delete_trip(&self, id: &TripId) -> Result<()>;
}
