//! Raw template shapes and their resolution into canonical values.
//!
//! Template authors spell the same concept several ways. Deserialization is
//! deliberately permissive (every spelling is an optional field); the
//! resolution functions below then pick exactly one source per concept in a
//! fixed order:
//!
//! | Concept  | Order                                                        |
//! |----------|--------------------------------------------------------------|
//! | location | `location` → `geo` → `coordinate` → bare `lat`/`lng`         |
//! | time     | clock string (`startTime`/`start`) → minutes (`startMinutes`/`startMin`) |
//! | note     | `note` → `memo` → `description` (first non-blank)            |
//!
//! A source that is present but does not resolve (out-of-range coordinate,
//! malformed clock string) is skipped in favour of the next one.

use serde::Deserialize;

use crate::dates::ClockTime;
use crate::geo::LatLng;
use crate::model::{ItemKind, TravelMode};

/// A coordinate in any of the accepted nested shapes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCoord {
    Short {
        lat: f64,
        #[serde(alias = "lon")]
        lng: f64,
    },
    Long {
        latitude: f64,
        longitude: f64,
    },
    Pair([f64; 2]),
}

impl RawCoord {
    pub fn resolve(&self) -> Option<LatLng> {
        match *self {
            Self::Short { lat, lng } => LatLng::new(lat, lng),
            Self::Long { latitude, longitude } => LatLng::new(latitude, longitude),
            Self::Pair([lat, lng]) => LatLng::new(lat, lng),
        }
    }
}

/// Which field a stop's location was taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource {
    Location(LatLng),
    Geo(LatLng),
    Coordinate(LatLng),
    Bare(LatLng),
}

impl LocationSource {
    pub fn lat_lng(&self) -> LatLng {
        match *self {
            Self::Location(p) | Self::Geo(p) | Self::Coordinate(p) | Self::Bare(p) => p,
        }
    }
}

/// Where a time-of-day value was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSource {
    Clock(String),
    Minutes(i64),
}

impl TimeSource {
    pub fn resolve(&self) -> Option<ClockTime> {
        match self {
            Self::Clock(raw) => raw.parse().ok(),
            Self::Minutes(minutes) => ClockTime::from_minutes(*minutes),
        }
    }
}

/// Picks the first time source that resolves, clock string first.
pub fn resolve_time(clock: Option<&str>, minutes: Option<i64>) -> Option<ClockTime> {
    let candidates = [
        clock.map(|c| TimeSource::Clock(c.to_string())),
        minutes.map(TimeSource::Minutes),
    ];
    candidates.iter().flatten().find_map(TimeSource::resolve)
}

/// The coordinate fields shared by stops and accommodation seeds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoordFields {
    #[serde(default)]
    pub location: Option<RawCoord>,
    #[serde(default)]
    pub geo: Option<RawCoord>,
    #[serde(default)]
    pub coordinate: Option<RawCoord>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon")]
    pub lng: Option<f64>,
}

impl CoordFields {
    pub fn resolve(&self) -> Option<LocationSource> {
        let nested = |raw: &Option<RawCoord>| raw.as_ref().and_then(RawCoord::resolve);
        if let Some(p) = nested(&self.location) {
            return Some(LocationSource::Location(p));
        }
        if let Some(p) = nested(&self.geo) {
            return Some(LocationSource::Geo(p));
        }
        if let Some(p) = nested(&self.coordinate) {
            return Some(LocationSource::Coordinate(p));
        }
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => LatLng::new(lat, lng).map(LocationSource::Bare),
            _ => None,
        }
    }
}

/// The loosely-typed kind a template declares for a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedKind {
    Activity,
    Spot,
    Meal,
    Attraction,
    Place,
    Lodging,
    Transport,
    Note,
    Other,
}

impl SeedKind {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Other;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "activity" | "activities" | "experience" => Self::Activity,
            "spot" | "sight" | "sightseeing" | "view" => Self::Spot,
            "meal" | "food" | "restaurant" | "cafe" => Self::Meal,
            "attraction" => Self::Attraction,
            "place" | "visit" => Self::Place,
            "lodging" | "hotel" | "stay" | "accommodation" => Self::Lodging,
            "transport" | "transfer" | "move" | "flight" | "train" => Self::Transport,
            "note" | "memo" | "tip" => Self::Note,
            _ => Self::Other,
        }
    }
}

/// Collapses a declared kind into the canonical item taxonomy.
///
/// | declared      | has location | result  |
/// |---------------|--------------|---------|
/// | anything      | no           | `Note`  |
/// | anything      | yes          | `Place` |
///
/// Whether a stop can be visited is decided by its coordinates alone, so a
/// located `transport` or `note` stop still becomes a `Place`. Every
/// imported `Place` item therefore has a place attached, and every located
/// stop is reachable by the distance matrix.
pub fn classify_kind(declared: SeedKind, has_location: bool) -> ItemKind {
    if !has_location {
        return ItemKind::Note;
    }
    match declared {
        SeedKind::Activity
        | SeedKind::Spot
        | SeedKind::Meal
        | SeedKind::Attraction
        | SeedKind::Place
        | SeedKind::Lodging
        | SeedKind::Transport
        | SeedKind::Note
        | SeedKind::Other => ItemKind::Place,
    }
}

/// Accepts both planner and routing vocabularies (`walk`/`walking`, ...).
pub fn parse_travel_mode(raw: &str) -> Option<TravelMode> {
    raw.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedPlace {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(flatten)]
    pub coords: CoordFields,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStop {
    /// Stable per-template stop key; used to reuse places on re-import.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, alias = "type", alias = "category")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub coords: CoordFields,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "start")]
    pub start_time: Option<String>,
    #[serde(default, alias = "startMin")]
    pub start_minutes: Option<i64>,
    #[serde(default, alias = "end")]
    pub end_time: Option<String>,
    #[serde(default, alias = "endMin")]
    pub end_minutes: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<i64>,
    #[serde(default, alias = "travelMode")]
    pub mode: Option<String>,
}

impl SeedStop {
    pub fn location(&self) -> Option<LocationSource> {
        self.coords.resolve()
    }

    pub fn start(&self) -> Option<ClockTime> {
        resolve_time(self.start_time.as_deref(), self.start_minutes)
    }

    pub fn end(&self) -> Option<ClockTime> {
        resolve_time(self.end_time.as_deref(), self.end_minutes)
    }

    pub fn note_text(&self) -> String {
        [&self.note, &self.memo, &self.description]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    }

    pub fn declared_kind(&self) -> SeedKind {
        SeedKind::parse(self.kind.as_deref())
    }

    pub fn travel_mode(&self) -> Option<TravelMode> {
        self.mode.as_deref().and_then(parse_travel_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDay {
    #[serde(default, alias = "items")]
    pub stops: Vec<SeedStop>,
}

/// A whole itinerary template as authored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSeed {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `days.len() - 1`.
    #[serde(default)]
    pub nights: Option<u32>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub travel_mode: Option<String>,
    #[serde(default)]
    pub budget_total: Option<i64>,
    #[serde(default)]
    pub base_accommodation: Option<SeedPlace>,
    #[serde(default)]
    pub days: Vec<SeedDay>,
}

impl TemplateSeed {
    pub fn nights(&self) -> u32 {
        self.nights
            .unwrap_or_else(|| self.days.len().saturating_sub(1) as u32)
    }
}
