//! Guidance state and the read-only views derived from it.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Checkpoint;

/// Progress along the course.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub along_route_distance_km: f64,
    /// Fraction of the course completed, in [0, 1]
    pub percent_complete: f64,
}

/// Mutable state owned by one tracker. Only `tick`, `tick_distance` and
/// `dismiss_crossing_banner` change it.
///
/// The state is fully derivable from the sample stream, so persisting it is
/// only needed for UI continuity across process restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceState {
    /// `None` until the first usable tick
    pub current_progress: Option<CourseProgress>,
    pub is_off_course: bool,
    /// Grows monotonically
    pub crossed_checkpoint_ids: HashSet<String>,
    /// Elapsed time at first crossing
    pub checkpoint_actual_times: HashMap<String, Duration>,
    /// Most advanced checkpoint of the latest crossing tick, until dismissed
    pub active_crossing_banner: Option<Checkpoint>,
    pub last_known_distance_km: f64,
    /// Deviation of the latest projected position (route mode)
    #[serde(default)]
    pub last_deviation_km: Option<f64>,
    /// Segment of the latest projection, used as search hint
    #[serde(default)]
    pub last_segment_index: Option<usize>,
    #[serde(default)]
    pub last_elapsed: Duration,
    /// Latest usable pace in seconds per km
    #[serde(default)]
    pub last_pace_secs_per_km: Option<f64>,
}

/// A checkpoint reached during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointCrossing {
    pub checkpoint: Checkpoint,
    /// Elapsed time of the crossing tick
    pub actual_time: Duration,
    /// Actual minus predicted time in seconds, positive when behind plan
    pub delta_secs: Option<f64>,
}

/// Recorded time at a crossed checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSplit {
    pub checkpoint_id: String,
    pub name: String,
    pub distance_from_start_km: f64,
    pub actual_time: Duration,
    pub predicted_time: Option<Duration>,
    pub delta_secs: Option<f64>,
}

/// Read-only view of the tracker outputs after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceSnapshot {
    pub progress: Option<CourseProgress>,
    /// `None` when the course length is unknown
    pub distance_remaining_km: Option<f64>,
    /// `None` in distance-only mode
    pub deviation_km: Option<f64>,
    pub is_off_course: bool,
    pub next_checkpoint: Option<Checkpoint>,
    pub next_checkpoint_distance_km: Option<f64>,
    /// Expected elapsed time at the next checkpoint
    pub next_checkpoint_eta: Option<Duration>,
    pub projected_finish_time: Option<Duration>,
    pub active_crossing_banner: Option<Checkpoint>,
    pub crossed_checkpoint_count: usize,
    pub elapsed: Duration,
}
