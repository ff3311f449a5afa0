//! Error type shared by every planner component.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors reported by parsing, model building, search and extraction.
///
/// `Infeasible`, `Timeout` and `Unknown` are ordinary negative outcomes of a
/// solve. `ResultInconsistency` signals a broken contract between the model
/// builder and a solver and should be treated as a bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Hour or minute outside its valid range.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Malformed roster input (weekday name, time, duration, range).
    #[error("parse error: {0}")]
    Parse(String),

    /// A student cannot be placed by construction (no candidates, no skip).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rejected solve or expansion parameters.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A declarative model that violates the solver contract.
    #[error("invalid model: {0}")]
    ModelInvalid(String),

    /// The search proved that no valid assignment exists.
    #[error("no feasible schedule exists")]
    Infeasible,

    /// The time budget ran out or the solve was cancelled.
    #[error("solve timed out before a schedule was found")]
    Timeout,

    /// The solver stopped without proving feasibility or infeasibility.
    #[error("solver finished with unknown status")]
    Unknown,

    /// The solver returned an assignment the extractor cannot interpret.
    #[error("result inconsistency: {0}")]
    ResultInconsistency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            PlanError::Parse("invalid day 'monday'".into()).to_string(),
            "parse error: invalid day 'monday'"
        );
        assert_eq!(PlanError::Infeasible.to_string(), "no feasible schedule exists");
        assert_ne!(PlanError::Timeout, PlanError::Unknown);
    }
}
