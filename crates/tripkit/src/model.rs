//! # Domain Model
//!
//! The planning graph is five flat entity kinds joined by id:
//!
//! ```text
//! Trip ──day_ids──▶ Day ──item_ids──▶ Item ──place_id──▶ Place
//!   └──base_accommodation────────────────────────────────▲
//!                   Link (from_item_id → to_item_id)
//! ```
//!
//! Ownership follows the arrows except for [`Place`]: places are shared.
//! Any number of items (and a trip's base accommodation slot) may point at
//! the same place, and removing an item never removes its place. A dangling
//! `place_id` is legal and means "no location".
//!
//! Ordering lives in the parent's id list (`Trip::day_ids`,
//! `Day::item_ids`). The `order` field on children mirrors the list position
//! and is re-stamped by the operators whenever the list changes.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::{self, ClockTime};
use crate::geo::LatLng;
use crate::ids::{DayId, ItemId, LinkId, PlaceId, TripId};

/// How the traveller gets to a stop, in the planner's own vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walk,
    Car,
    Transit,
    Bike,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown travel mode: {0}")]
pub struct UnknownTravelMode(pub String);

/// Accepts both the planner and the routing vocabulary (`walk`/`walking`, ...).
impl FromStr for TravelMode {
    type Err = UnknownTravelMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" | "walking" | "foot" => Ok(Self::Walk),
            "car" | "drive" | "driving" | "taxi" => Ok(Self::Car),
            "transit" | "bus" | "subway" | "metro" => Ok(Self::Transit),
            "bike" | "bicycle" | "cycling" => Ok(Self::Bike),
            _ => Err(UnknownTravelMode(s.to_string())),
        }
    }
}

/// The canonical item taxonomy.
///
/// Seed data uses many more spellings (activity, spot, meal, ...); those are
/// collapsed by [`crate::template::classify_kind`]. An item of kind `Place`
/// always carries a `place_id` when it is produced by the template importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Place,
    Note,
    Transport,
}

/// Where a place record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceSource {
    User,
    Template,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub template_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub title: String,
    pub start_date: NaiveDate,
    pub nights: u32,
    pub day_ids: Vec<DayId>,
    pub currency: String,
    pub travel_mode: TravelMode,
    #[serde(default)]
    pub budget_total: Option<i64>,
    #[serde(default)]
    pub base_accommodation: Option<PlaceId>,
    #[serde(default)]
    pub template: Option<TemplateMeta>,
    #[serde(default)]
    pub is_sample: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub id: DayId,
    pub trip_id: TripId,
    pub date: NaiveDate,
    pub item_ids: Vec<ItemId>,
    pub order: u32,
}

impl Day {
    pub fn date_iso(&self) -> String {
        dates::to_iso(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub trip_id: TripId,
    pub day_id: DayId,
    pub kind: ItemKind,
    pub title: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub start_time: Option<ClockTime>,
    #[serde(default)]
    pub end_time: Option<ClockTime>,
    #[serde(default)]
    pub cost: Option<i64>,
    pub travel_mode: TravelMode,
    #[serde(default)]
    pub place_id: Option<PlaceId>,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An explicit transition between two items, e.g. a manually chosen mode or
/// an overridden travel time. Distinct from the distance cache, which is
/// keyed rather than entity-backed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub trip_id: TripId,
    pub from_item_id: ItemId,
    pub to_item_id: ItemId,
    pub travel_mode: TravelMode,
    #[serde(default)]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub location: LatLng,
    #[serde(default)]
    pub address: String,
    pub source: PlaceSource,
    #[serde(default)]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A place description that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceInput {
    pub name: String,
    pub location: LatLng,
    #[serde(default)]
    pub address: String,
    pub source: PlaceSource,
    #[serde(default)]
    pub external_id: Option<String>,
}

impl PlaceInput {
    pub fn user(name: impl Into<String>, location: LatLng) -> Self {
        Self {
            name: name.into(),
            location,
            address: String::new(),
            source: PlaceSource::User,
            external_id: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_source(mut self, source: PlaceSource, external_id: Option<String>) -> Self {
        self.source = source;
        self.external_id = external_id;
        self
    }

    pub(crate) fn into_place(self, id: PlaceId) -> Place {
        let now = Utc::now();
        Place {
            id,
            name: self.name,
            location: self.location,
            address: self.address,
            source: self.source,
            external_id: self.external_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travel_mode_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&TravelMode::Transit).unwrap(), "\"transit\"");
        let mode: TravelMode = serde_json::from_str("\"bike\"").unwrap();
        assert_eq!(mode, TravelMode::Bike);
    }

    #[test]
    fn travel_mode_parses_both_vocabularies() {
        assert_eq!("driving".parse::<TravelMode>().unwrap(), TravelMode::Car);
        assert_eq!(" Walk ".parse::<TravelMode>().unwrap(), TravelMode::Walk);
        assert_eq!("cycling".parse::<TravelMode>().unwrap(), TravelMode::Bike);
        assert!("teleport".parse::<TravelMode>().is_err());
    }

    #[test]
    fn place_input_builds_user_place() {
        let loc = LatLng::new(37.5665, 126.978).unwrap();
        let id = PlaceId::new();
        let place = PlaceInput::user("Seoul City Hall", loc)
            .with_address("110 Sejong-daero")
            .into_place(id);
        assert_eq!(place.id, id);
        assert_eq!(place.source, PlaceSource::User);
        assert_eq!(place.address, "110 Sejong-daero");
        assert_eq!(place.created_at, place.updated_at);
    }

    #[test]
    fn trip_tolerates_missing_optional_fields() {
        let json = format!(
            r#"{{
                "id": "{}",
                "title": "Weekend",
                "start_date": "2025-05-01",
                "nights": 1,
                "day_ids": [],
                "currency": "KRW",
                "travel_mode": "walk",
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            }}"#,
            uuid::Uuid::new_v4()
        );
        let trip: Trip = serde_json::from_str(&json).unwrap();
        assert!(trip.budget_total.is_none());
        assert!(!trip.is_sample);
        assert!(trip.template.is_none());
    }
}
