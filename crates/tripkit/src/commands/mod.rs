//! # Command Layer
//!
//! The mutation operators of the planner. Each entity family lives in its own
//! submodule and exposes plain functions over `&mut PlannerState`.
//!
//! ## Contract
//!
//! - **Sole writers**: nothing else in the crate mutates the entity maps.
//! - **Atomic transitions**: an operator looks up everything it needs first
//!   and only then writes, so a call either applies completely or not at all.
//! - **Unknown ids are no-ops**: a missing trip/day/item/link/place is not an
//!   error. The operator logs at `debug` and returns without touching state.
//!   Callers are expected to pass ids they obtained from the selectors.
//! - **No I/O**: operators never touch the persistence or routing ports.
//!
//! ## Command Modules
//!
//! - [`trips`]: Trip lifecycle, dates, day list
//! - [`items`]: Item insertion, patching, removal, reordering
//! - [`links`]: Explicit transitions between items
//! - [`places`]: Direct place map edits

use serde::Serialize;

pub mod items;
pub mod links;
pub mod places;
pub mod trips;

pub use items::{ItemInput, ItemPatch};
pub use links::{LinkInput, LinkPatch};
pub use trips::{TripOptions, TripPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A one-line, user-facing notification.
///
/// Port failures that must not cross the API boundary as errors end up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub content: String,
}

impl Notice {
    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            content: content.into(),
        }
    }
}
