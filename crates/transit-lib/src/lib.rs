//! Timetable transit routing library.
//!
//! This crate loads a timetabled connection network into memory, runs
//! time-respecting shortest-path searches over it (Dijkstra and A*,
//! minimizing either arrival time or line changes), and sequences
//! multi-waypoint round trips with a tabu-search optimizer. Higher-level
//! consumers (the CLI) should only depend on the entry points exported
//! here instead of reimplementing behavior.

#![deny(warnings)]

pub mod cost;
pub mod error;
pub mod itinerary;
pub mod model;
pub mod routing;
pub mod search;
pub mod time;
pub mod timetable;
pub mod tour;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cost::{CostModel, Criterion, DEFAULT_HEURISTIC_SCALE, DEFAULT_TRANSFER_PENALTY};
pub use error::{Error, Result};
pub use itinerary::{Itinerary, RenderMode, Ride};
pub use model::{Connection, ConnectionRef, Network, Stop, StopId};
pub use routing::{
    plan_route, plan_tour, PlanLeg, RouteAlgorithm, RoutePlan, RouteRequest, TourPlan, TourRequest,
};
pub use search::{a_star, dijkstra, SearchResult};
pub use time::Timestamp;
pub use timetable::{load_timetable, read_timetable};
pub use tour::TabuConfig;
