use async_trait::async_trait;

use super::{MatrixRequest, MatrixResponse, RouteHop, RouteSegment, RoutingError, RoutingMode, RoutingPort};

/// Street networks are rarely straight; scale great-circle distance by this.
const DETOUR_FACTOR: f64 = 1.3;

/// Offline estimator: great-circle distance with a detour factor and a fixed
/// speed per mode. Useful when no provider is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct StraightLineRouter;

impl StraightLineRouter {
    pub fn new() -> Self {
        Self
    }

    /// Average speed in meters per second.
    pub fn speed(mode: RoutingMode) -> f64 {
        match mode {
            RoutingMode::Walking => 1.3,
            RoutingMode::Cycling => 4.2,
            RoutingMode::Transit => 6.0,
            RoutingMode::Driving => 8.3,
        }
    }

    /// Builds the response synchronously. Consecutive pairs that share an
    /// item (`a→b`, `b→c`) are chained into one multi-hop segment.
    pub fn estimate(&self, request: &MatrixRequest) -> MatrixResponse {
        let speed = Self::speed(request.mode);
        let mut routes: Vec<RouteSegment> = Vec::new();

        for pair in &request.pairs {
            let distance = pair.origin.location.haversine_meters(&pair.destination.location) * DETOUR_FACTOR;
            let hop = RouteHop {
                distance_meters: distance.round(),
                duration_seconds: (distance / speed).round(),
                path: vec![pair.origin.location, pair.destination.location],
            };

            let continues = routes
                .last()
                .is_some_and(|segment| segment.item_ids.last() == Some(&pair.origin.item_id));
            if continues {
                if let Some(segment) = routes.last_mut() {
                    segment.item_ids.push(pair.destination.item_id);
                    segment.legs.push(hop);
                }
            } else {
                routes.push(RouteSegment {
                    item_ids: vec![pair.origin.item_id, pair.destination.item_id],
                    mode: Some(request.mode),
                    legs: vec![hop],
                });
            }
        }

        MatrixResponse::Routes { routes }
    }
}

#[async_trait]
impl RoutingPort for StraightLineRouter {
    async fn get_matrix(&self, request: MatrixRequest) -> Result<MatrixResponse, RoutingError> {
        Ok(self.estimate(&request))
    }
}
