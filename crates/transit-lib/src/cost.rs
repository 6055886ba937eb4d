use std::fmt;

use serde::Serialize;

use crate::model::Connection;

/// Default multiplier converting kilometres of chord distance into cost
/// units for the A* frontier key.
pub const DEFAULT_HEURISTIC_SCALE: f64 = 1500.0;

/// Default penalty charged each time a path boards a different line.
pub const DEFAULT_TRANSFER_PENALTY: u64 = 500;

/// Optimization criterion selectable per search invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Arrive as early as possible.
    #[default]
    Time,
    /// Change lines as rarely as possible, ignoring the clock.
    Transfers,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Criterion::Time => "time",
            Criterion::Transfers => "transfers",
        };
        f.write_str(value)
    }
}

/// Edge-cost strategy, selected once per search and passed down so the
/// search loop itself stays criterion-agnostic.
#[derive(Debug, Clone, Copy)]
pub enum CostModel {
    /// Cost of a stop is the arrival timestamp at which it was reached.
    Time,
    /// Cost counts boardings; continuing on the current line is free.
    Transfers { penalty: u64 },
}

impl CostModel {
    /// Pick the model for a criterion tag.
    pub fn for_criterion(criterion: Criterion, transfer_penalty: u64) -> Self {
        match criterion {
            Criterion::Time => CostModel::Time,
            Criterion::Transfers => CostModel::Transfers {
                penalty: transfer_penalty,
            },
        }
    }

    /// Cost of extending the best path at the current stop with `next`.
    ///
    /// `previous` is the connection that reached the current stop, taken
    /// from the predecessor record of the running search. The transfer
    /// model waives its penalty exactly when `next` continues on that
    /// connection's line; the very first boarding always pays once.
    pub fn extend(
        &self,
        current_cost: u64,
        previous: Option<&Connection>,
        next: &Connection,
    ) -> u64 {
        match self {
            CostModel::Time => u64::from(next.arrival.seconds()),
            CostModel::Transfers { penalty } => {
                let boarding = match previous {
                    Some(prev) if prev.line == next.line => 0,
                    _ => *penalty,
                };
                current_cost + boarding
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StopId;
    use crate::time::Timestamp;

    fn connection(line: &str, to: StopId) -> Connection {
        Connection {
            departure: Timestamp::from_hms(8, 0, 0),
            arrival: Timestamp::from_hms(8, 10, 0),
            to,
            company: "MPK".to_string(),
            line: line.to_string(),
        }
    }

    #[test]
    fn time_model_costs_arrival_seconds() {
        let model = CostModel::for_criterion(Criterion::Time, DEFAULT_TRANSFER_PENALTY);
        let next = connection("1", 1);
        assert_eq!(model.extend(12345, None, &next), 8 * 3600 + 600);
    }

    #[test]
    fn first_boarding_pays_the_penalty() {
        let model = CostModel::for_criterion(Criterion::Transfers, 500);
        let next = connection("1", 1);
        assert_eq!(model.extend(0, None, &next), 500);
    }

    #[test]
    fn same_line_continuation_is_free() {
        let model = CostModel::for_criterion(Criterion::Transfers, 500);
        let previous = connection("1", 1);
        let next = connection("1", 2);
        assert_eq!(model.extend(500, Some(&previous), &next), 500);
    }

    #[test]
    fn line_change_accumulates() {
        let model = CostModel::for_criterion(Criterion::Transfers, 500);
        let previous = connection("1", 1);
        let next = connection("2", 2);
        assert_eq!(model.extend(500, Some(&previous), &next), 1000);
    }
}
