//! Time-respecting shortest-path search over the connection network.
//!
//! Both searches share the feasibility rule that defines this problem: a
//! connection can only be boarded if it departs no earlier than the time
//! the search arrived at its source stop. The relaxed "distance" is the
//! cost assigned by the active model, not a static edge weight, which is
//! why plain Dijkstra over precomputed weights would be incorrect here.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::cost::CostModel;
use crate::model::{ConnectionRef, Network, StopId};
use crate::time::Timestamp;

/// Outcome of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Connections forming the path, in travel order. Empty when start
    /// and goal coincide.
    pub path: Vec<ConnectionRef>,
    /// Total accumulated cost under the active model.
    pub cost: u64,
    /// Number of stops that received a cost label. Diagnostic only; not
    /// part of the correctness contract.
    pub labeled: usize,
}

type Predecessors = HashMap<StopId, (StopId, ConnectionRef)>;

/// Time-respecting Dijkstra, keyed directly by arrival timestamp.
///
/// Equal keys pop the entry with the smaller stop id first; that
/// tie-break is shared with [`a_star`] and makes the returned path among
/// equal-cost alternatives deterministic.
pub fn dijkstra(
    network: &Network,
    start: StopId,
    goal: StopId,
    depart: Timestamp,
) -> Option<SearchResult> {
    let mut best: HashMap<StopId, u64> = HashMap::new();
    let mut parents: Predecessors = HashMap::new();
    let mut frontier = BinaryHeap::new();

    best.insert(start, 0);
    frontier.push(DijkstraEntry {
        cost: 0,
        node: start,
        arrival: depart,
    });

    while let Some(entry) = frontier.pop() {
        // Lazy deletion: a stale entry carries a cost its stop has since
        // improved past.
        if entry.cost > *best.get(&entry.node).unwrap_or(&u64::MAX) {
            continue;
        }
        if entry.node == goal {
            return Some(SearchResult {
                path: reconstruct_path(&parents, start, goal),
                cost: entry.cost,
                labeled: best.len(),
            });
        }

        for (index, connection) in network.connections(entry.node).iter().enumerate() {
            if connection.departure < entry.arrival {
                continue;
            }
            let candidate = u64::from(connection.arrival.seconds());
            if candidate < *best.get(&connection.to).unwrap_or(&u64::MAX) {
                best.insert(connection.to, candidate);
                parents.insert(
                    connection.to,
                    (entry.node, ConnectionRef::new(entry.node, index)),
                );
                frontier.push(DijkstraEntry {
                    cost: candidate,
                    node: connection.to,
                    arrival: connection.arrival,
                });
            }
        }
    }

    debug!(labeled = best.len(), "frontier exhausted before the goal");
    None
}

/// Time-respecting A* over the selected cost model.
///
/// The frontier key is the model cost plus `heuristic_scale` times the
/// chord distance from the relaxed connection's destination to the goal.
/// A scale of zero degenerates into the plain label-correcting search and
/// must return exactly what [`dijkstra`] returns under the time model.
/// Larger scales visit fewer stops but may return suboptimal paths once
/// the scaled estimate overshoots the true remaining cost.
pub fn a_star(
    network: &Network,
    start: StopId,
    goal: StopId,
    depart: Timestamp,
    model: CostModel,
    heuristic_scale: f64,
) -> Option<SearchResult> {
    let goal_stop = network.stop(goal);
    let mut best: HashMap<StopId, u64> = HashMap::new();
    let mut parents: Predecessors = HashMap::new();
    let mut frontier = BinaryHeap::new();

    best.insert(start, 0);
    frontier.push(AStarEntry::new(0.0, 0, start, depart));

    while let Some(entry) = frontier.pop() {
        if entry.cost > *best.get(&entry.node).unwrap_or(&u64::MAX) {
            continue;
        }
        if entry.node == goal {
            return Some(SearchResult {
                path: reconstruct_path(&parents, start, goal),
                cost: entry.cost,
                labeled: best.len(),
            });
        }

        // The connection that reached this stop, needed by the transfer
        // model to waive same-line continuations.
        let previous = parents
            .get(&entry.node)
            .map(|(_, reference)| network.connection(*reference));

        for (index, connection) in network.connections(entry.node).iter().enumerate() {
            if connection.departure < entry.arrival {
                continue;
            }
            let candidate = model.extend(entry.cost, previous, connection);
            if candidate < *best.get(&connection.to).unwrap_or(&u64::MAX) {
                best.insert(connection.to, candidate);
                parents.insert(
                    connection.to,
                    (entry.node, ConnectionRef::new(entry.node, index)),
                );
                let estimate = candidate as f64
                    + heuristic_scale * goal_stop.chord_distance_km(network.stop(connection.to));
                frontier.push(AStarEntry::new(
                    estimate,
                    candidate,
                    connection.to,
                    connection.arrival,
                ));
            }
        }
    }

    debug!(labeled = best.len(), "frontier exhausted before the goal");
    None
}

fn reconstruct_path(parents: &Predecessors, start: StopId, goal: StopId) -> Vec<ConnectionRef> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        let Some((previous, connection)) = parents.get(&current) else {
            break;
        };
        path.push(*connection);
        current = *previous;
    }
    path.reverse();
    path
}

#[derive(Debug, Clone, Copy)]
struct DijkstraEntry {
    cost: u64,
    node: StopId,
    arrival: Timestamp,
}

impl PartialEq for DijkstraEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DijkstraEntry {}

impl Ord for DijkstraEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for DijkstraEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct AStarEntry {
    estimate: FloatOrd,
    cost: u64,
    node: StopId,
    arrival: Timestamp,
}

impl AStarEntry {
    fn new(estimate: f64, cost: u64, node: StopId, arrival: Timestamp) -> Self {
        Self {
            estimate: FloatOrd(estimate),
            cost,
            node,
            arrival,
        }
    }
}

impl PartialEq for AStarEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AStarEntry {}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::DEFAULT_TRANSFER_PENALTY;
    use crate::test_helpers::{sample_network, NetworkBuilder};

    fn at(text: &str) -> Timestamp {
        text.parse().expect("valid time")
    }

    fn line_of(network: &Network, reference: ConnectionRef) -> String {
        network.connection(reference).line.clone()
    }

    /// Every connection on a returned path must depart no earlier than the
    /// arrival at its source stop.
    fn assert_time_feasible(network: &Network, depart: Timestamp, path: &[ConnectionRef]) {
        let mut clock = depart;
        for reference in path {
            let connection = network.connection(*reference);
            assert!(
                connection.departure >= clock,
                "connection departs {} but the path arrives at its source at {}",
                connection.departure,
                clock
            );
            clock = connection.arrival;
        }
    }

    #[test]
    fn dijkstra_finds_the_earliest_arrival() {
        let network = sample_network();
        let a = network.stop_id("A").unwrap();
        let c = network.stop_id("C").unwrap();

        let result = dijkstra(&network, a, c, at("08:00")).expect("route exists");
        assert_eq!(result.cost, u64::from(at("08:25").seconds()));
        assert_eq!(result.path.len(), 2);
        assert_time_feasible(&network, at("08:00"), &result.path);
    }

    #[test]
    fn dijkstra_respects_departure_feasibility() {
        // Arriving at B at 08:10 rules out the 08:05 express from B.
        let network = NetworkBuilder::new()
            .stop("A", 51.10, 17.00)
            .stop("B", 51.11, 17.03)
            .stop("C", 51.12, 17.06)
            .connection("A", "B", "1", "08:00", "08:10")
            .connection("B", "C", "9", "08:05", "08:07")
            .connection("B", "C", "1", "08:15", "08:25")
            .build();
        let a = network.stop_id("A").unwrap();
        let c = network.stop_id("C").unwrap();

        let result = dijkstra(&network, a, c, at("08:00")).expect("route exists");
        assert_eq!(result.cost, u64::from(at("08:25").seconds()));
        assert_time_feasible(&network, at("08:00"), &result.path);
    }

    #[test]
    fn dijkstra_reports_unreachable_goal_as_none() {
        // The only connection into C departs before we can reach B.
        let network = NetworkBuilder::new()
            .stop("A", 51.10, 17.00)
            .stop("B", 51.11, 17.03)
            .stop("C", 51.12, 17.06)
            .connection("A", "B", "1", "08:00", "08:10")
            .connection("B", "C", "1", "07:00", "07:10")
            .build();
        let a = network.stop_id("A").unwrap();
        let c = network.stop_id("C").unwrap();

        assert!(dijkstra(&network, a, c, at("08:00")).is_none());
    }

    #[test]
    fn dijkstra_with_coincident_endpoints_returns_empty_path() {
        let network = sample_network();
        let a = network.stop_id("A").unwrap();

        let result = dijkstra(&network, a, a, at("08:00")).expect("trivial route");
        assert!(result.path.is_empty());
        assert_eq!(result.cost, 0);
    }

    #[test]
    fn dijkstra_matches_brute_force_on_the_sample_network() {
        let network = sample_network();
        let depart = at("08:00");
        for from in 0..network.stop_count() {
            for to in 0..network.stop_count() {
                let searched = dijkstra(&network, from, to, depart).map(|r| r.cost);
                let expected = brute_force_earliest_arrival(&network, from, to, depart);
                assert_eq!(searched, expected, "pair ({from}, {to})");
            }
        }
    }

    /// Exhaustive enumeration of feasible paths; optimal arrival never
    /// benefits from revisiting a stop, so a visited set is safe.
    fn brute_force_earliest_arrival(
        network: &Network,
        from: StopId,
        to: StopId,
        depart: Timestamp,
    ) -> Option<u64> {
        fn recurse(
            network: &Network,
            current: StopId,
            goal: StopId,
            clock: Timestamp,
            visited: &mut Vec<StopId>,
        ) -> Option<u64> {
            if current == goal {
                return Some(if visited.len() == 1 {
                    0
                } else {
                    u64::from(clock.seconds())
                });
            }
            let mut best: Option<u64> = None;
            for connection in network.connections(current) {
                if connection.departure < clock || visited.contains(&connection.to) {
                    continue;
                }
                visited.push(connection.to);
                let arrival = recurse(network, connection.to, goal, connection.arrival, visited);
                visited.pop();
                best = match (best, arrival) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
            best
        }
        let mut visited = vec![from];
        recurse(network, from, to, depart, &mut visited)
    }

    #[test]
    fn a_star_with_zero_scale_degenerates_to_dijkstra() {
        let network = sample_network();
        let depart = at("08:00");
        for from in 0..network.stop_count() {
            for to in 0..network.stop_count() {
                let plain = dijkstra(&network, from, to, depart);
                let degenerate = a_star(&network, from, to, depart, CostModel::Time, 0.0);
                match (plain, degenerate) {
                    (Some(d), Some(a)) => {
                        assert_eq!(d.path, a.path, "pair ({from}, {to})");
                        assert_eq!(d.cost, a.cost, "pair ({from}, {to})");
                    }
                    (None, None) => {}
                    (d, a) => panic!("pair ({from}, {to}): {d:?} vs {a:?}"),
                }
            }
        }
    }

    #[test]
    fn a_star_time_criterion_picks_the_single_line_path() {
        let network = sample_network();
        let a = network.stop_id("A").unwrap();
        let c = network.stop_id("C").unwrap();

        let result = a_star(&network, a, c, at("08:00"), CostModel::Time, 0.0)
            .expect("route exists");
        assert_eq!(result.cost, u64::from(at("08:25").seconds()));
        let lines: Vec<String> = result
            .path
            .iter()
            .map(|r| line_of(&network, *r))
            .collect();
        assert_eq!(lines, vec!["1", "1"]);
        assert_time_feasible(&network, at("08:00"), &result.path);
    }

    #[test]
    fn transfer_criterion_prefers_staying_on_one_line() {
        // Make the two-line route arrive earlier so the time criterion
        // and the transfer criterion genuinely disagree.
        let network = NetworkBuilder::new()
            .stop("A", 51.10, 17.00)
            .stop("B", 51.11, 17.03)
            .stop("C", 51.12, 17.06)
            .stop("D", 51.10, 17.05)
            .connection("A", "B", "1", "08:00", "08:10")
            .connection("B", "C", "1", "08:15", "08:25")
            .connection("B", "D", "2", "08:11", "08:13")
            .connection("D", "C", "2", "08:14", "08:16")
            .build();
        let a = network.stop_id("A").unwrap();
        let c = network.stop_id("C").unwrap();
        let model = CostModel::Transfers {
            penalty: DEFAULT_TRANSFER_PENALTY,
        };

        let result = a_star(&network, a, c, at("08:00"), model, 0.0).expect("route exists");
        let lines: Vec<String> = result
            .path
            .iter()
            .map(|r| line_of(&network, *r))
            .collect();
        assert_eq!(lines, vec!["1", "1"]);
        assert_eq!(result.cost, DEFAULT_TRANSFER_PENALTY);
    }

    #[test]
    fn single_line_path_costs_exactly_one_boarding() {
        let network = NetworkBuilder::new()
            .stop("A", 51.10, 17.00)
            .stop("B", 51.11, 17.01)
            .stop("C", 51.12, 17.02)
            .stop("D", 51.13, 17.03)
            .connection("A", "B", "7", "08:00", "08:05")
            .connection("B", "C", "7", "08:06", "08:11")
            .connection("C", "D", "7", "08:12", "08:17")
            .build();
        let a = network.stop_id("A").unwrap();
        let d = network.stop_id("D").unwrap();
        let model = CostModel::Transfers { penalty: 500 };

        let result = a_star(&network, a, d, at("08:00"), model, 0.0).expect("route exists");
        assert_eq!(result.path.len(), 3);
        assert_eq!(result.cost, 500);
    }

    #[test]
    fn searches_are_idempotent() {
        let network = sample_network();
        let a = network.stop_id("A").unwrap();
        let c = network.stop_id("C").unwrap();

        let first = a_star(&network, a, c, at("08:00"), CostModel::Time, 1500.0);
        let second = a_star(&network, a, c, at("08:00"), CostModel::Time, 1500.0);
        assert_eq!(first, second);

        let first = dijkstra(&network, a, c, at("08:00"));
        let second = dijkstra(&network, a, c, at("08:00"));
        assert_eq!(first, second);
    }

    #[test]
    fn equal_cost_entries_pop_the_smaller_stop_first() {
        let mut heap = BinaryHeap::new();
        heap.push(DijkstraEntry {
            cost: 10,
            node: 9,
            arrival: at("08:00"),
        });
        heap.push(DijkstraEntry {
            cost: 10,
            node: 1,
            arrival: at("08:00"),
        });
        assert_eq!(heap.pop().map(|entry| entry.node), Some(1));
        assert_eq!(heap.pop().map(|entry| entry.node), Some(9));

        let mut heap = BinaryHeap::new();
        heap.push(AStarEntry::new(10.0, 10, 9, at("08:00")));
        heap.push(AStarEntry::new(10.0, 10, 1, at("08:00")));
        assert_eq!(heap.pop().map(|entry| entry.node), Some(1));
        assert_eq!(heap.pop().map(|entry| entry.node), Some(9));
    }

    #[test]
    fn stale_frontier_entries_are_discarded() {
        // The direct A->C connection queues C at 09:00; the path through B
        // then improves C to 08:20. The 09:00 entry is popped before the
        // goal and must be recognized as stale.
        let network = NetworkBuilder::new()
            .stop("A", 51.10, 17.00)
            .stop("B", 51.11, 17.03)
            .stop("C", 51.12, 17.06)
            .stop("D", 51.13, 17.08)
            .connection("A", "C", "1", "08:00", "09:00")
            .connection("A", "B", "2", "08:00", "08:05")
            .connection("B", "C", "2", "08:10", "08:20")
            .connection("C", "D", "3", "09:30", "09:40")
            .build();
        let a = network.stop_id("A").unwrap();
        let d = network.stop_id("D").unwrap();

        let result = dijkstra(&network, a, d, at("08:00")).expect("route exists");
        assert_eq!(result.cost, u64::from(at("09:40").seconds()));
        // Optimal path goes through B, not over the direct connection.
        assert_eq!(result.path.len(), 3);
        assert_time_feasible(&network, at("08:00"), &result.path);
    }
}
