use std::collections::HashMap;

use crate::time::Timestamp;

/// Index of a stop within the network arena.
pub type StopId = usize;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Minimum similarity before a stop name is offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A physical transit stop with its outgoing scheduled connections.
#[derive(Debug, Clone)]
pub struct Stop {
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    connections: Vec<Connection>,
}

impl Stop {
    /// Straight-line chord distance to another stop, in kilometres.
    ///
    /// Both coordinates are projected onto a unit sphere and the Euclidean
    /// distance between the Cartesian points is scaled by the Earth radius.
    /// The chord never exceeds the over-ground distance, which keeps the
    /// A* heuristic built on it admissible.
    pub fn chord_distance_km(&self, other: &Stop) -> f64 {
        let (ax, ay, az) = unit_sphere(self.latitude, self.longitude);
        let (bx, by, bz) = unit_sphere(other.latitude, other.longitude);
        let chord = ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt();
        EARTH_RADIUS_KM * chord
    }
}

fn unit_sphere(latitude: f64, longitude: f64) -> (f64, f64, f64) {
    let lat = latitude.to_radians();
    let lon = longitude.to_radians();
    (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// One scheduled trip segment between two stops.
///
/// `arrival >= departure` is assumed for well-formed timetables and is not
/// validated here; the importer trusts its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub departure: Timestamp,
    pub arrival: Timestamp,
    pub to: StopId,
    pub company: String,
    pub line: String,
}

/// Handle to a connection inside the network adjacency.
///
/// Search state and reconstructed paths store these handles instead of
/// borrowing or cloning connections, so the network stays the single owner
/// of all schedule data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionRef {
    pub from: StopId,
    index: usize,
}

impl ConnectionRef {
    pub(crate) fn new(from: StopId, index: usize) -> Self {
        Self { from, index }
    }
}

/// The full timetable graph: a stop arena plus a name index.
///
/// Built once by the importer and read-only afterwards; searches allocate
/// their own working state and never mutate the network.
#[derive(Debug, Clone, Default)]
pub struct Network {
    stops: Vec<Stop>,
    by_name: HashMap<String, StopId>,
}

impl Network {
    /// Number of stops in the network.
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Total number of scheduled connections.
    pub fn connection_count(&self) -> usize {
        self.stops.iter().map(|stop| stop.connections.len()).sum()
    }

    /// Resolve a stop by its case-sensitive name.
    pub fn stop_id(&self, name: &str) -> Option<StopId> {
        self.by_name.get(name).copied()
    }

    /// The stop behind an arena index.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this network.
    pub fn stop(&self, id: StopId) -> &Stop {
        &self.stops[id]
    }

    /// Outgoing connections of a stop.
    pub fn connections(&self, id: StopId) -> &[Connection] {
        &self.stops[id].connections
    }

    /// Resolve a connection handle.
    pub fn connection(&self, reference: ConnectionRef) -> &Connection {
        &self.stops[reference.from].connections[reference.index]
    }

    /// Stop names similar to `name`, most similar first, for diagnostics.
    pub fn fuzzy_matches(&self, name: &str, limit: usize) -> Vec<String> {
        let mut scored: Vec<(f64, &str)> = self
            .stops
            .iter()
            .map(|stop| (strsim::jaro_winkler(name, &stop.name), stop.name.as_str()))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    pub(crate) fn add_stop(&mut self, name: &str, latitude: f64, longitude: f64) -> StopId {
        let id = self.stops.len();
        self.stops.push(Stop {
            name: name.to_string(),
            latitude,
            longitude,
            connections: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub(crate) fn add_connection(&mut self, from: StopId, connection: Connection) {
        self.stops[from].connections.push(connection);
    }
}
