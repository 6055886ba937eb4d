// Test-only helpers for `transit-lib` tests
#![allow(dead_code)]

use crate::model::{Connection, Network, StopId};
use crate::time::Timestamp;

/// Builder assembling small synthetic networks for tests.
///
/// Stops get arena ids in declaration order; connections reference stops
/// by name and default to a single operator.
pub struct NetworkBuilder {
    network: Network,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            network: Network::default(),
        }
    }

    pub fn stop(mut self, name: &str, latitude: f64, longitude: f64) -> Self {
        self.network.add_stop(name, latitude, longitude);
        self
    }

    pub fn connection(
        mut self,
        from: &str,
        to: &str,
        line: &str,
        departs: &str,
        arrives: &str,
    ) -> Self {
        let from_id = self.id(from);
        let to_id = self.id(to);
        self.network.add_connection(
            from_id,
            Connection {
                departure: departs.parse().expect("valid departure time"),
                arrival: arrives.parse().expect("valid arrival time"),
                to: to_id,
                company: "MPK".to_string(),
                line: line.to_string(),
            },
        );
        self
    }

    pub fn build(self) -> Network {
        self.network
    }

    fn id(&self, name: &str) -> StopId {
        self.network
            .stop_id(name)
            .unwrap_or_else(|| panic!("stop {name} declared before use"))
    }
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The four-stop schedule used across search tests:
///
/// ```text
/// A --(line 1, 08:00-08:10)--> B --(line 1, 08:15-08:25)--> C
///                              B --(line 2, 08:12-08:20)--> D --(line 2, 08:22-08:30)--> C
/// ```
pub fn sample_network() -> Network {
    NetworkBuilder::new()
        .stop("A", 51.10, 17.00)
        .stop("B", 51.11, 17.03)
        .stop("C", 51.12, 17.06)
        .stop("D", 51.10, 17.05)
        .connection("A", "B", "1", "08:00", "08:10")
        .connection("B", "C", "1", "08:15", "08:25")
        .connection("B", "D", "2", "08:12", "08:20")
        .connection("D", "C", "2", "08:22", "08:30")
        .build()
}

/// Parse a `HH:MM[:SS]` literal in tests.
pub fn ts(text: &str) -> Timestamp {
    text.parse().expect("valid time literal")
}
