//! Human-readable itinerary rendering.
//!
//! A plan's legs are one entry per boarded connection, which is too
//! granular for riders. [`Itinerary`] groups consecutive same-line legs
//! into rides and renders either compact board/alight instructions or the
//! full connection-by-connection trace.

use std::fmt::Write;

use serde::Serialize;

use crate::routing::PlanLeg;
use crate::time::Timestamp;

/// Presentation style for turning an [`Itinerary`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Board/alight instructions, one pair per ride.
    Compact,
    /// Every connection on its own line.
    Detailed,
}

/// One ride: a maximal run of consecutive legs on the same line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ride {
    pub line: String,
    pub board_stop: String,
    pub board_time: Timestamp,
    pub alight_stop: String,
    pub alight_time: Timestamp,
}

/// Structured, serializable itinerary derived from plan legs.
#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    /// Name of the stop the journey starts from.
    pub origin: String,
    pub rides: Vec<Ride>,
    legs: Vec<PlanLeg>,
}

impl Itinerary {
    /// Group consecutive same-line legs of a plan into rides.
    pub fn from_legs(origin: &str, legs: &[PlanLeg]) -> Self {
        let mut rides: Vec<Ride> = Vec::new();
        for leg in legs {
            match rides.last_mut() {
                Some(ride) if ride.line == leg.line => {
                    ride.alight_stop = leg.to.clone();
                    ride.alight_time = leg.arrival;
                }
                _ => rides.push(Ride {
                    line: leg.line.clone(),
                    board_stop: leg.from.clone(),
                    board_time: leg.departure,
                    alight_stop: leg.to.clone(),
                    alight_time: leg.arrival,
                }),
            }
        }
        Self {
            origin: origin.to_string(),
            rides,
            legs: legs.to_vec(),
        }
    }

    /// Render the itinerary using the requested textual mode.
    pub fn render(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::Compact => self.render_compact(),
            RenderMode::Detailed => self.render_detailed(),
        }
    }

    fn render_compact(&self) -> String {
        let mut buffer = String::new();
        for ride in &self.rides {
            let _ = writeln!(
                buffer,
                "Board line {} at {} ({})",
                ride.line, ride.board_stop, ride.board_time
            );
            let _ = writeln!(
                buffer,
                "Alight at {} ({})",
                ride.alight_stop, ride.alight_time
            );
        }
        buffer
    }

    fn render_detailed(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(buffer, "{}", self.origin);
        for leg in &self.legs {
            let _ = writeln!(
                buffer,
                "  {} -> {}  {} [line {}]",
                leg.departure, leg.arrival, leg.to, leg.line
            );
        }
        buffer
    }
}
