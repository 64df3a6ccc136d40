//! # Identifiers
//!
//! Every entity kind gets its own id newtype so a `DayId` can never be handed
//! to an operator expecting an `ItemId`. Ids wrap a v4 [`Uuid`] and serialize
//! as the bare UUID string; `Display` adds a short kind prefix (`trip_…`,
//! `day_…`) which is what shows up in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocates a fresh, collision-resistant id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0.simple())
            }
        }
    };
}

entity_id!(
    /// Identifies a [`crate::model::Trip`].
    TripId,
    "trip"
);
entity_id!(DayId, "day");
entity_id!(ItemId, "item");
entity_id!(LinkId, "link");
entity_id!(PlaceId, "place");
