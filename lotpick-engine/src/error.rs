use std::time::Duration;

use thiserror::Error;

/// Everything that can stop a run. No variant carries a partial result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller input rejected before any simulation work.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Iteration count {requested} exceeds the ceiling of {ceiling}")]
    ExcessiveIterations { requested: u128, ceiling: u64 },

    #[error("Run cancelled after {completed} of {total} iterations")]
    Cancelled { completed: u64, total: u64 },

    #[error("Run exceeded its {limit:?} time limit after {completed} of {total} iterations")]
    TimedOut {
        limit: Duration,
        completed: u64,
        total: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfig(msg.into())
    }

    /// True for errors raised by input validation, as opposed to errors raised mid-run.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_) | EngineError::ExcessiveIterations { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_precondition() {
        let err = EngineError::ExcessiveIterations { requested: 12, ceiling: 10 };
        assert_eq!(err.to_string(), "Iteration count 12 exceeds the ceiling of 10");

        let err = EngineError::invalid("mainCount is negative (-1)");
        assert_eq!(err.to_string(), "Invalid config: mainCount is negative (-1)");
    }

    #[test]
    fn test_is_validation() {
        assert!(EngineError::invalid("x").is_validation());
        assert!(!EngineError::Cancelled { completed: 1, total: 2 }.is_validation());
        assert!(!EngineError::Internal("x".into()).is_validation());
    }
}
