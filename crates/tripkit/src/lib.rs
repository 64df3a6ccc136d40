//! # tripkit
//!
//! The data core of an itinerary planner: a normalized trip graph with
//! referential integrity, an importer that turns loosely-shaped itinerary
//! templates into that graph, and a per-trip cache of route distances and
//! durations between consecutive stops.
//!
//! ## Architecture
//!
//! ```text
//! UI ──▶ api::PlannerApi ──▶ commands::*  ──▶ state::PlannerState ◀── selectors::*
//!              │                                   ▲
//!              ├──▶ template::import_template ─────┘ (through commands)
//!              ├──▶ distance::* ──▶ routing::RoutingPort   (async, external)
//!              └──▶ store::TripBackend                     (persistence)
//! ```
//!
//! - [`state`]: the entity store. A plain value, constructed explicitly; no
//!   global instance.
//! - [`commands`]: the only writers. Unknown ids are silent no-ops.
//! - [`selectors`]: pure reads, including budget and route lookups.
//! - [`template`]: seed shapes with a fixed field precedence, and the kind
//!   collapse table ([`template::classify_kind`]).
//! - [`distance`]: the distance-matrix state machine, sequence-numbered so
//!   stale responses are dropped.
//! - [`routing`]: the routing port and its wire types, plus a
//!   straight-line estimator usable offline.
//! - [`store`]: the persistence port, snapshots, and the memory and
//!   filesystem backends.
//! - [`api`]: the facade tying it together; port failures become
//!   [`commands::Notice`]s.
//!
//! ## Ambient
//!
//! Configuration is [`config::PlannerConfig`] (confique, TOML plus
//! `TRIPKIT_*` environment). Logging goes through `tracing`;
//! [`logging::init_tracing`] installs a subscriber for binaries and tests
//! that want output.

pub mod api;
pub mod commands;
pub mod config;
pub mod dates;
pub mod distance;
pub mod error;
pub mod geo;
pub mod ids;
pub mod logging;
pub mod model;
pub mod routing;
pub mod selectors;
pub mod state;
pub mod store;
pub mod template;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use api::PlannerApi;
pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use state::PlannerState;
