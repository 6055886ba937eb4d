//! Timetable import: turning a connection CSV into a [`Network`].
//!
//! The expected columns are `company`, `line`, `departure_time`,
//! `arrival_time`, `start_stop`, `start_stop_lat`, `start_stop_lon`,
//! `end_stop`, `end_stop_lat`, `end_stop_lon`. Extra columns are ignored.
//! A stop name may appear with slightly different coordinates across rows
//! (per-platform positions in the source data); the importer amalgamates
//! them into one stop at the mean position.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{Connection, Network};
use crate::time::Timestamp;

#[derive(Debug, Deserialize)]
struct ConnectionRecord {
    company: String,
    line: String,
    departure_time: String,
    arrival_time: String,
    start_stop: String,
    start_stop_lat: f64,
    start_stop_lon: f64,
    end_stop: String,
    end_stop_lat: f64,
    end_stop_lon: f64,
}

#[derive(Debug, Default)]
struct CoordinateSum {
    latitude: f64,
    longitude: f64,
    samples: f64,
}

impl CoordinateSum {
    fn add(&mut self, latitude: f64, longitude: f64) {
        self.latitude += latitude;
        self.longitude += longitude;
        self.samples += 1.0;
    }
}

/// Load a timetable CSV from disk.
pub fn load_timetable(path: &Path) -> Result<Network> {
    debug!(path = %path.display(), "loading timetable");
    let file = File::open(path)?;
    read_timetable(BufReader::new(file))
}

/// Read a timetable CSV from any reader.
pub fn read_timetable<R: Read>(reader: R) -> Result<Network> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records: Vec<ConnectionRecord> = Vec::new();
    for record in csv_reader.deserialize() {
        records.push(record?);
    }

    // One physical stop per unique name: average the coordinates seen on
    // either side of every connection. BTreeMap keeps id assignment
    // deterministic (sorted by name).
    let mut coordinates: BTreeMap<&str, CoordinateSum> = BTreeMap::new();
    for record in &records {
        coordinates
            .entry(record.start_stop.as_str())
            .or_default()
            .add(record.start_stop_lat, record.start_stop_lon);
        coordinates
            .entry(record.end_stop.as_str())
            .or_default()
            .add(record.end_stop_lat, record.end_stop_lon);
    }

    let mut network = Network::default();
    for (name, sum) in &coordinates {
        network.add_stop(name, sum.latitude / sum.samples, sum.longitude / sum.samples);
    }

    for record in &records {
        let from = network
            .stop_id(&record.start_stop)
            .expect("start stop registered above");
        let to = network
            .stop_id(&record.end_stop)
            .expect("end stop registered above");
        let departure: Timestamp = record.departure_time.parse()?;
        let arrival: Timestamp = record.arrival_time.parse()?;
        network.add_connection(
            from,
            Connection {
                departure,
                arrival,
                to,
                company: record.company.clone(),
                line: record.line.clone(),
            },
        );
    }

    info!(
        stops = network.stop_count(),
        connections = network.connection_count(),
        "timetable loaded"
    );
    Ok(network)
}
