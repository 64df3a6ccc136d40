//! # Routing Port
//!
//! The planner never talks to a routing provider directly. It hands a
//! [`MatrixRequest`] to whatever implements [`RoutingPort`] and gets back a
//! [`MatrixResponse`]. Providers and transports live outside this crate;
//! [`straight_line::StraightLineRouter`] is the built-in offline estimator.
//!
//! ## Wire Shapes
//!
//! Every coordinate in a request is tagged with the item id it belongs to so
//! results can be re-keyed on the way back. Responses come in two shapes and
//! both are accepted:
//!
//! ```text
//! { "routes": [ { "itemIds": [a, b, c], "legs": [hop_ab, hop_bc] } ] }
//! [ { "itemIds": [a, b], "legs": [hop_ab] }, ... ]
//! ```
//!
//! A segment with `n` item ids carries `n - 1` hops, one per consecutive pair.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLng;
use crate::ids::ItemId;
use crate::model::TravelMode;

pub mod straight_line;

/// Travel modes in the routing provider's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    Walking,
    Driving,
    Transit,
    Cycling,
}

impl From<TravelMode> for RoutingMode {
    fn from(mode: TravelMode) -> Self {
        match mode {
            TravelMode::Walk => Self::Walking,
            TravelMode::Car => Self::Driving,
            TravelMode::Transit => Self::Transit,
            TravelMode::Bike => Self::Cycling,
        }
    }
}

impl From<RoutingMode> for TravelMode {
    fn from(mode: RoutingMode) -> Self {
        match mode {
            RoutingMode::Walking => Self::Walk,
            RoutingMode::Driving => Self::Car,
            RoutingMode::Transit => Self::Transit,
            RoutingMode::Cycling => Self::Bike,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub item_id: ItemId,
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixPair {
    pub origin: Waypoint,
    pub destination: Waypoint,
}

/// One batched request: every origin/destination pair for a single mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRequest {
    pub mode: RoutingMode,
    pub pairs: Vec<MatrixPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteHop {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub path: Vec<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub item_ids: Vec<ItemId>,
    /// Overrides the request mode when the provider reports one.
    #[serde(default)]
    pub mode: Option<RoutingMode>,
    #[serde(alias = "hops")]
    pub legs: Vec<RouteHop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixResponse {
    Routes { routes: Vec<RouteSegment> },
    Segments(Vec<RouteSegment>),
}

impl MatrixResponse {
    pub fn into_segments(self) -> Vec<RouteSegment> {
        match self {
            Self::Routes { routes } => routes,
            Self::Segments(segments) => segments,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("routing transport failed: {0}")]
    Transport(String),

    #[error("routing response rejected: {0}")]
    InvalidResponse(String),
}

/// Computes travel metrics for coordinate pairs under one travel mode.
///
/// Timeouts and retries are the implementation's business.
#[async_trait]
pub trait RoutingPort: Send + Sync {
    async fn get_matrix(&self, request: MatrixRequest) -> Result<MatrixResponse, RoutingError>;
}
