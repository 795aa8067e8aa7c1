//! Unified error handling.
//!
//! Errors are only produced while building routes, checkpoint lists and
//! trackers. Once a tracker exists, every per-tick operation degrades to
//! `None`/`false` outputs instead of failing.

use thiserror::Error;

/// Errors raised while constructing course guidance inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CourseError {
    /// A route needs at least one segment (two valid points).
    #[error("route '{route_id}' has {point_count} points, at least {minimum_required} required")]
    InsufficientPoints {
        route_id: String,
        point_count: usize,
        minimum_required: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid config '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A checkpoint cannot be placed on the course.
    #[error("invalid checkpoint '{checkpoint_id}': {reason}")]
    InvalidCheckpoint {
        checkpoint_id: String,
        reason: String,
    },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, CourseError>;

impl CourseError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        CourseError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn checkpoint(checkpoint_id: &str, reason: impl Into<String>) -> Self {
        CourseError::InvalidCheckpoint {
            checkpoint_id: checkpoint_id.to_string(),
            reason: reason.into(),
        }
    }
}
