//! High-level route and tour planning.
//!
//! This module provides:
//! - [`RouteAlgorithm`] - supported search algorithms (Dijkstra, A*)
//! - [`RouteRequest`] / [`RoutePlan`] / [`plan_route`] - point-to-point routes
//! - [`TourRequest`] / [`TourPlan`] / [`plan_tour`] - multi-waypoint round trips
//!
//! Requests carry stop names; the planners resolve them against the
//! network (with fuzzy suggestions on a miss), run the search, and
//! materialize the resulting connection handles into serializable legs.

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cost::{CostModel, Criterion, DEFAULT_HEURISTIC_SCALE, DEFAULT_TRANSFER_PENALTY};
use crate::error::{Error, Result};
use crate::model::{ConnectionRef, Network, StopId};
use crate::search::{a_star, dijkstra};
use crate::time::Timestamp;
use crate::tour::{tabu_search, TabuConfig};

/// Supported search algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteAlgorithm {
    /// Plain label-correcting search keyed by arrival time.
    Dijkstra,
    /// Heuristic-guided search; required for the transfer criterion.
    #[default]
    #[serde(rename = "a-star")]
    AStar,
}

impl fmt::Display for RouteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteAlgorithm::Dijkstra => "dijkstra",
            RouteAlgorithm::AStar => "a-star",
        };
        f.write_str(value)
    }
}

/// Point-to-point route planning request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub from: String,
    pub to: String,
    /// Earliest departure from the start stop.
    pub depart: Timestamp,
    pub algorithm: RouteAlgorithm,
    pub criterion: Criterion,
    /// Heuristic weight for A*; zero makes A* exact.
    pub heuristic_scale: f64,
    /// Penalty per boarding under the transfer criterion.
    pub transfer_penalty: u64,
}

impl RouteRequest {
    /// A request with default algorithm, criterion, and tuning.
    pub fn new(from: impl Into<String>, to: impl Into<String>, depart: Timestamp) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            depart,
            algorithm: RouteAlgorithm::default(),
            criterion: Criterion::default(),
            heuristic_scale: DEFAULT_HEURISTIC_SCALE,
            transfer_penalty: DEFAULT_TRANSFER_PENALTY,
        }
    }
}

/// One boarded connection within a materialized plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanLeg {
    pub from: String,
    pub to: String,
    pub line: String,
    pub company: String,
    pub departure: Timestamp,
    pub arrival: Timestamp,
}

/// Planned point-to-point route.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub algorithm: RouteAlgorithm,
    pub criterion: Criterion,
    pub from: String,
    pub to: String,
    pub depart: Timestamp,
    /// Total cost under the criterion (arrival seconds or boarding
    /// penalties).
    pub cost: u64,
    /// Stops labeled during the search; telemetry, not correctness.
    pub labeled: usize,
    pub legs: Vec<PlanLeg>,
}

impl RoutePlan {
    /// Arrival time at the destination, if the route has any leg.
    pub fn arrival(&self) -> Option<Timestamp> {
        self.legs.last().map(|leg| leg.arrival)
    }
}

/// Multi-waypoint tour planning request.
#[derive(Debug, Clone)]
pub struct TourRequest {
    pub start: String,
    /// Mandatory stops, in no particular order.
    pub waypoints: Vec<String>,
    pub depart: Timestamp,
    pub criterion: Criterion,
    pub heuristic_scale: f64,
    pub transfer_penalty: u64,
    pub tabu: TabuConfig,
}

impl TourRequest {
    /// A request with default criterion and tuning.
    pub fn new(start: impl Into<String>, waypoints: Vec<String>, depart: Timestamp) -> Self {
        Self {
            start: start.into(),
            waypoints,
            depart,
            criterion: Criterion::default(),
            heuristic_scale: DEFAULT_HEURISTIC_SCALE,
            transfer_penalty: DEFAULT_TRANSFER_PENALTY,
            tabu: TabuConfig::default(),
        }
    }
}

/// Planned round trip through all requested waypoints.
#[derive(Debug, Clone, Serialize)]
pub struct TourPlan {
    pub criterion: Criterion,
    pub depart: Timestamp,
    /// Stop names in visiting order; the start appears first and last.
    pub order: Vec<String>,
    pub cost: u64,
    pub legs: Vec<PlanLeg>,
}

impl TourPlan {
    /// Arrival time back at the start, if the tour has any leg.
    pub fn arrival(&self) -> Option<Timestamp> {
        self.legs.last().map(|leg| leg.arrival)
    }
}

/// Resolve a stop name, attaching fuzzy suggestions on a miss.
fn resolve_stop(network: &Network, name: &str) -> Result<StopId> {
    network.stop_id(name).ok_or_else(|| Error::UnknownStop {
        name: name.to_string(),
        suggestions: network.fuzzy_matches(name, 3),
    })
}

fn materialize_legs(network: &Network, path: &[ConnectionRef]) -> Vec<PlanLeg> {
    path.iter()
        .map(|reference| {
            let connection = network.connection(*reference);
            PlanLeg {
                from: network.stop(reference.from).name.clone(),
                to: network.stop(connection.to).name.clone(),
                line: connection.line.clone(),
                company: connection.company.clone(),
                departure: connection.departure,
                arrival: connection.arrival,
            }
        })
        .collect()
}

/// Compute the best single route for a request.
///
/// Unknown stop names fail with [`Error::UnknownStop`]; an exhausted
/// search maps to [`Error::RouteNotFound`] at this boundary.
pub fn plan_route(network: &Network, request: &RouteRequest) -> Result<RoutePlan> {
    let start = resolve_stop(network, &request.from)?;
    let goal = resolve_stop(network, &request.to)?;
    let model = CostModel::for_criterion(request.criterion, request.transfer_penalty);

    let result = match (request.algorithm, request.criterion) {
        (RouteAlgorithm::Dijkstra, Criterion::Time) => {
            dijkstra(network, start, goal, request.depart)
        }
        (RouteAlgorithm::Dijkstra, Criterion::Transfers) => {
            warn!("transfer criterion needs the cost-aware search; using a-star");
            a_star(network, start, goal, request.depart, model, request.heuristic_scale)
        }
        (RouteAlgorithm::AStar, _) => {
            a_star(network, start, goal, request.depart, model, request.heuristic_scale)
        }
    }
    .ok_or_else(|| Error::RouteNotFound {
        start: request.from.clone(),
        goal: request.to.clone(),
        depart: request.depart.to_string(),
    })?;

    debug!(
        cost = result.cost,
        labeled = result.labeled,
        legs = result.path.len(),
        "route search finished"
    );

    Ok(RoutePlan {
        algorithm: request.algorithm,
        criterion: request.criterion,
        from: request.from.clone(),
        to: request.to.clone(),
        depart: request.depart,
        cost: result.cost,
        labeled: result.labeled,
        legs: materialize_legs(network, &result.path),
    })
}

/// Sequence a round trip through all waypoints of a request.
///
/// The underlying tabu search is a heuristic: the returned ordering is
/// near-optimal, not provably optimal.
pub fn plan_tour(network: &Network, request: &TourRequest) -> Result<TourPlan> {
    let start = resolve_stop(network, &request.start)?;
    let waypoints = request
        .waypoints
        .iter()
        .map(|name| resolve_stop(network, name))
        .collect::<Result<Vec<_>>>()?;
    let model = CostModel::for_criterion(request.criterion, request.transfer_penalty);

    let tour = tabu_search(
        network,
        start,
        &waypoints,
        request.depart,
        model,
        request.heuristic_scale,
        &request.tabu,
    )
    .ok_or_else(|| Error::TourNotFound {
        depart: request.depart.to_string(),
    })?;

    debug!(
        cost = tour.cost,
        legs = tour.path.len(),
        "tour search finished"
    );

    Ok(TourPlan {
        criterion: request.criterion,
        depart: request.depart,
        order: tour
            .order
            .iter()
            .map(|id| network.stop(*id).name.clone())
            .collect(),
        cost: tour.cost,
        legs: materialize_legs(network, &tour.path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{sample_network, ts, NetworkBuilder};

    #[test]
    fn plan_route_returns_materialized_legs() {
        let network = sample_network();
        let request = RouteRequest::new("A", "C", ts("08:00"));

        let plan = plan_route(&network, &request).expect("route exists");
        assert_eq!(plan.cost, u64::from(ts("08:25").seconds()));
        assert_eq!(plan.arrival(), Some(ts("08:25")));
        assert_eq!(plan.legs.len(), 2);
        assert_eq!(plan.legs[0].from, "A");
        assert_eq!(plan.legs[0].to, "B");
        assert_eq!(plan.legs[1].to, "C");
    }

    #[test]
    fn unknown_stop_is_distinct_from_no_route() {
        let network = sample_network();

        let unknown = plan_route(&network, &RouteRequest::new("A", "Z", ts("08:00")));
        assert!(matches!(unknown, Err(Error::UnknownStop { .. })));

        // C has no outgoing connections at all.
        let unreachable = plan_route(&network, &RouteRequest::new("C", "A", ts("08:00")));
        assert!(matches!(unreachable, Err(Error::RouteNotFound { .. })));
    }

    #[test]
    fn dijkstra_request_with_transfer_criterion_still_plans() {
        let network = sample_network();
        let request = RouteRequest {
            algorithm: RouteAlgorithm::Dijkstra,
            criterion: Criterion::Transfers,
            ..RouteRequest::new("A", "C", ts("08:00"))
        };

        let plan = plan_route(&network, &request).expect("route exists");
        assert_eq!(plan.cost, DEFAULT_TRANSFER_PENALTY);
    }

    #[test]
    fn infeasible_tour_is_an_error_not_a_panic() {
        let network = sample_network();
        // No connections return to A, so a closed tour cannot exist.
        let request = TourRequest::new("A", vec!["B".to_string()], ts("08:00"));
        let err = plan_tour(&network, &request).expect_err("tour is infeasible");
        assert!(matches!(err, Error::TourNotFound { .. }));
    }

    #[test]
    fn plan_tour_reports_the_visit_order_by_name() {
        let network = NetworkBuilder::new()
            .stop("Base", 51.10, 17.00)
            .stop("Central", 51.11, 17.03)
            .connection("Base", "Central", "1", "08:00", "08:10")
            .connection("Central", "Base", "1", "08:15", "08:25")
            .build();
        let request = TourRequest::new("Base", vec!["Central".to_string()], ts("08:00"));

        let plan = plan_tour(&network, &request).expect("tour exists");
        assert_eq!(plan.order, vec!["Base", "Central", "Base"]);
        assert_eq!(plan.arrival(), Some(ts("08:25")));
        assert_eq!(plan.legs.len(), 2);
    }

    #[test]
    fn route_plan_serializes_times_as_text() {
        let network = sample_network();
        let plan =
            plan_route(&network, &RouteRequest::new("A", "C", ts("08:00"))).expect("route exists");
        let json = serde_json::to_value(&plan).expect("plan serializes");
        assert_eq!(json["depart"], "08:00:00");
        assert_eq!(json["legs"][0]["departure"], "08:00:00");
        assert_eq!(json["algorithm"], "a-star");
    }
}
