//! Multi-waypoint round-trip optimization via tabu search.
//!
//! The pathfinder acts as a memoized oracle answering "cost of travelling
//! from A to B departing no earlier than T". Tabu search explores
//! permutations of the mandatory waypoints between the fixed start stop
//! and the closing return to it. This is a local search: it converges to
//! good orderings quickly but makes no global-optimality guarantee.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::cost::CostModel;
use crate::model::{ConnectionRef, Network, StopId};
use crate::search::a_star;
use crate::time::Timestamp;

/// Cost assigned to candidate tours containing an unreachable leg.
const INFEASIBLE: u64 = u64::MAX;

/// Tuning knobs for the tabu search loop.
#[derive(Debug, Clone)]
pub struct TabuConfig {
    /// Outer iterations of the search loop.
    pub steps: usize,
    /// Neighborhood sweeps per outer iteration.
    pub sweeps: usize,
    /// Capacity of the FIFO tabu list.
    pub tabu_capacity: usize,
    /// Seed for the initial waypoint shuffle. Equal seeds reproduce runs
    /// exactly; no ambient randomness is consulted.
    pub seed: u64,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            steps: 10,
            sweeps: 5,
            tabu_capacity: 10,
            seed: 255,
        }
    }
}

/// Best tour found by [`tabu_search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    /// Visit order: the start stop first and last, waypoints between.
    pub order: Vec<StopId>,
    /// Concatenated connections of every leg, in travel order.
    pub path: Vec<ConnectionRef>,
    /// Sum of the leg costs under the active model.
    pub cost: u64,
}

/// Memoizing wrapper around the point-to-point search.
///
/// Candidate tours overlap heavily in their legs, so point-to-point
/// results are cached on the full (from, to, departure) triple; a hit is
/// valid no matter which candidate asked first.
struct PathOracle<'a> {
    network: &'a Network,
    model: CostModel,
    heuristic_scale: f64,
    cache: HashMap<(StopId, StopId, Timestamp), Option<(Vec<ConnectionRef>, u64)>>,
}

impl<'a> PathOracle<'a> {
    fn new(network: &'a Network, model: CostModel, heuristic_scale: f64) -> Self {
        Self {
            network,
            model,
            heuristic_scale,
            cache: HashMap::new(),
        }
    }

    fn leg(
        &mut self,
        from: StopId,
        to: StopId,
        depart: Timestamp,
    ) -> &Option<(Vec<ConnectionRef>, u64)> {
        let network = self.network;
        let model = self.model;
        let scale = self.heuristic_scale;
        self.cache
            .entry((from, to, depart))
            .or_insert_with(|| {
                a_star(network, from, to, depart, model, scale)
                    .map(|result| (result.path, result.cost))
            })
    }

    /// Full cost of a candidate order, chaining each leg's departure to
    /// the previous leg's arrival. `None` when any leg is unreachable.
    fn tour_cost(
        &mut self,
        order: &[StopId],
        depart: Timestamp,
    ) -> Option<(Vec<ConnectionRef>, u64)> {
        let mut path: Vec<ConnectionRef> = Vec::new();
        let mut cost: u64 = 0;
        let mut clock = depart;
        for pair in order.windows(2) {
            let (leg_path, leg_cost) = self.leg(pair[0], pair[1], clock).clone()?;
            cost = cost.saturating_add(leg_cost);
            if let Some(last) = leg_path.last() {
                clock = self.network.connection(*last).arrival;
            }
            path.extend(leg_path);
        }
        Some((path, cost))
    }
}

/// Unordered identity of a swap, used as the tabu fingerprint.
fn swap_fingerprint(a: StopId, b: StopId) -> (StopId, StopId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// All candidates reachable by swapping two interior positions, each
/// paired with its fingerprint. The fixed start entries at both ends are
/// never touched.
fn neighborhood(order: &[StopId]) -> Vec<(Vec<StopId>, (StopId, StopId))> {
    let mut candidates = Vec::new();
    for i in 1..order.len().saturating_sub(1) {
        for j in (i + 1)..order.len() - 1 {
            let mut neighbor = order.to_vec();
            neighbor.swap(i, j);
            let fingerprint = swap_fingerprint(neighbor[i], neighbor[j]);
            candidates.push((neighbor, fingerprint));
        }
    }
    candidates
}

/// Find a near-optimal round trip through `waypoints`, starting and
/// ending at `start`, departing no earlier than `depart`.
///
/// Returns `None` only when every explored ordering had an unreachable
/// leg. Ties promote: a neighbor matching the current cost is adopted,
/// letting the search drift across plateaus.
pub fn tabu_search(
    network: &Network,
    start: StopId,
    waypoints: &[StopId],
    depart: Timestamp,
    model: CostModel,
    heuristic_scale: f64,
    config: &TabuConfig,
) -> Option<Tour> {
    let mut oracle = PathOracle::new(network, model, heuristic_scale);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut shuffled = waypoints.to_vec();
    shuffled.shuffle(&mut rng);

    let mut current_order: Vec<StopId> = Vec::with_capacity(shuffled.len() + 2);
    current_order.push(start);
    current_order.extend(shuffled);
    current_order.push(start);

    let (mut current_path, mut current_cost) = score(&mut oracle, &current_order, depart);
    let mut best_order = current_order.clone();
    let mut best_path = current_path.clone();
    let mut best_cost = current_cost;

    let mut tabu: VecDeque<(StopId, StopId)> = VecDeque::new();

    for step in 0..config.steps {
        for _ in 0..config.sweeps {
            let mut chosen: Option<(Vec<StopId>, Vec<ConnectionRef>, u64)> = None;
            for (candidate, fingerprint) in neighborhood(&current_order) {
                if tabu.contains(&fingerprint) {
                    continue;
                }
                let (path, cost) = score(&mut oracle, &candidate, depart);
                tabu.push_back(fingerprint);
                if tabu.len() > config.tabu_capacity {
                    tabu.pop_front();
                }
                if chosen.as_ref().map_or(true, |(_, _, best)| cost < *best) {
                    chosen = Some((candidate, path, cost));
                }
            }
            if let Some((candidate, path, cost)) = chosen {
                if cost <= current_cost {
                    current_order = candidate;
                    current_path = path;
                    current_cost = cost;
                }
            }
        }
        if current_cost <= best_cost {
            if current_cost < best_cost {
                debug!(step, cost = current_cost, "tabu search improved best tour");
            }
            best_order = current_order.clone();
            best_path = current_path.clone();
            best_cost = current_cost;
        }
    }

    if best_cost == INFEASIBLE {
        return None;
    }
    Some(Tour {
        order: best_order,
        path: best_path,
        cost: best_cost,
    })
}

fn score(
    oracle: &mut PathOracle<'_>,
    order: &[StopId],
    depart: Timestamp,
) -> (Vec<ConnectionRef>, u64) {
    oracle
        .tour_cost(order, depart)
        .unwrap_or((Vec::new(), INFEASIBLE))
}
