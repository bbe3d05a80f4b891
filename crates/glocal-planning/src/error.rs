use glocal_mapping::MapError;
use thiserror::Error;

/// Errors raised by the exploration planners.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("Map query failed: {0}")]
    Map(#[from] MapError),

    #[error("Invalid planner config: {0}")]
    InvalidConfig(String),

    #[error("Planner used before setup_from_config succeeded")]
    NotConfigured,
}

/// Reject non-positive or non-finite lengths.
pub(crate) fn require_positive(name: &str, value: f64) -> Result<(), PlannerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlannerError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}
