use thiserror::Error;

/// Convenient result alias for the transit library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a time string does not match `HH:MM[:SS]`.
    #[error("invalid time '{input}': expected HH:MM or HH:MM:SS")]
    InvalidTimestamp { input: String },

    /// Raised when a stop name could not be found in the timetable.
    #[error("unknown stop: {name}{}", format_suggestions(.suggestions))]
    UnknownStop {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when no feasible route exists between two stops. Note that
    /// the searches themselves report this as `None`; the error only
    /// appears at the planning boundary where callers asked for a route.
    #[error("no route found between {start} and {goal} departing at {depart}")]
    RouteNotFound {
        start: String,
        goal: String,
        depart: String,
    },

    /// Raised when every waypoint ordering of a requested tour had an
    /// unreachable leg.
    #[error("no feasible tour through the requested stops departing at {depart}")]
    TourNotFound { depart: String },

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
