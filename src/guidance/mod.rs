//! # Guidance Tracker
//!
//! Turns a stream of position (route mode) or cumulative distance
//! (distance-only mode) samples into course guidance:
//! - monotonic progress and percent complete
//! - off-course status from the lateral deviation to the course
//! - one-shot checkpoint crossings with recorded split times
//! - next-checkpoint distance/ETA and projected finish time
//!
//! ## State machine
//!
//! `NotStarted -> Tracking <-> OffCourse`. There is no terminal state; the
//! owner drops the tracker when the run ends. Both tracking states carry
//! zero or more crossed checkpoints.
//!
//! The tracker is synchronous. Callers serialize `tick` calls; every call runs
//! to completion in O(segments + checkpoints).

pub mod events;
pub mod state;

pub use events::{GuidanceEvent, GuidanceEventSink, NoopSink, RecordingSink};
pub use state::{
    CheckpointCrossing, CheckpointSplit, CourseProgress, GuidanceSnapshot, GuidanceState,
};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CourseError, Result};
use crate::estimate::{checkpoint_eta, projected_finish_time, time_delta_secs};
use crate::projection::{Projection, project, project_windowed};
use crate::{CheckpointList, GeoPoint, Route};

/// Tracker configuration, set once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuidanceConfig {
    /// Deviation above which the runner is off course, in km.
    /// Evaluated per sample, no debounce.
    /// Default: 0.07 (70 meters)
    pub off_course_threshold_km: f64,

    /// Distance covered before a finish time is projected, in km.
    /// Default: 0.5
    pub minimum_distance_for_projection_km: f64,

    /// Course length in km. `None` uses the route length when a route is
    /// present, otherwise the length is unknown.
    /// Default: None
    pub total_distance_km: Option<f64>,

    /// Segments searched either side of the previous match. `None` scans the
    /// whole route on every tick.
    /// Default: None
    pub projection_window_segments: Option<usize>,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            off_course_threshold_km: 0.07,
            minimum_distance_for_projection_km: 0.5,
            total_distance_km: None,
            projection_window_segments: None,
        }
    }
}

impl GuidanceConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.off_course_threshold_km.is_finite() || self.off_course_threshold_km <= 0.0 {
            return Err(CourseError::config(
                "off_course_threshold_km",
                format!("must be > 0, got {}", self.off_course_threshold_km),
            ));
        }
        if !self.minimum_distance_for_projection_km.is_finite()
            || self.minimum_distance_for_projection_km < 0.0
        {
            return Err(CourseError::config(
                "minimum_distance_for_projection_km",
                format!("must be >= 0, got {}", self.minimum_distance_for_projection_km),
            ));
        }
        if let Some(total) = self.total_distance_km {
            if !total.is_finite() || total < 0.0 {
                return Err(CourseError::config(
                    "total_distance_km",
                    format!("must be >= 0, got {}", total),
                ));
            }
        }
        if self.projection_window_segments == Some(0) {
            return Err(CourseError::config(
                "projection_window_segments",
                "window must cover at least one segment",
            ));
        }
        Ok(())
    }
}

/// Stateful course guidance for one run.
pub struct GuidanceTracker {
    route: Option<Route>,
    checkpoints: CheckpointList,
    config: GuidanceConfig,
    total_distance_km: f64,
    state: GuidanceState,
    sink: Arc<dyn GuidanceEventSink>,
}

impl fmt::Debug for GuidanceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuidanceTracker")
            .field("route", &self.route.as_ref().map(|r| r.id.as_str()))
            .field("checkpoints", &self.checkpoints.len())
            .field("config", &self.config)
            .field("total_distance_km", &self.total_distance_km)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl GuidanceTracker {
    /// Create a tracker. Without a route only `tick_distance` advances
    /// progress.
    pub fn new(
        route: Option<Route>,
        checkpoints: CheckpointList,
        config: GuidanceConfig,
    ) -> Result<Self> {
        config.validate()?;

        let total_distance_km = config
            .total_distance_km
            .or_else(|| route.as_ref().map(Route::total_distance_km))
            .unwrap_or(0.0);

        info!(
            "Guidance tracker: route={}, {} checkpoints, {:.2}km, off-course threshold {:.0}m",
            route.as_ref().map(|r| r.id.as_str()).unwrap_or("none"),
            checkpoints.len(),
            total_distance_km,
            config.off_course_threshold_km * 1000.0
        );

        Ok(Self {
            route,
            checkpoints,
            config,
            total_distance_km,
            state: GuidanceState::default(),
            sink: Arc::new(NoopSink),
        })
    }

    /// Create a tracker for a race without course geometry.
    pub fn distance_only(checkpoints: CheckpointList, config: GuidanceConfig) -> Result<Self> {
        Self::new(None, checkpoints, config)
    }

    /// Rebuild a tracker from a previously saved state.
    ///
    /// Entries referring to unknown checkpoints are dropped, as are actual
    /// times for checkpoints not marked crossed. Saved progress is lifted to
    /// at least the displayed progress and its percentage recomputed against
    /// the current course length. Route-only fields are cleared when no route
    /// is configured.
    pub fn restore(
        route: Option<Route>,
        checkpoints: CheckpointList,
        config: GuidanceConfig,
        mut state: GuidanceState,
    ) -> Result<Self> {
        let mut tracker = Self::new(route, checkpoints, config)?;

        let known = |id: &String| tracker.checkpoints.get(id).is_some();
        let before = state.crossed_checkpoint_ids.len();
        state.crossed_checkpoint_ids.retain(|id| known(id));
        let crossed = &state.crossed_checkpoint_ids;
        state.checkpoint_actual_times.retain(|id, _| crossed.contains(id));
        if before != state.crossed_checkpoint_ids.len() {
            warn!(
                "Dropped {} unknown checkpoint(s) from restored state",
                before - state.crossed_checkpoint_ids.len()
            );
        }
        if let Some(banner) = &state.active_crossing_banner {
            if !state.crossed_checkpoint_ids.contains(&banner.id) {
                state.active_crossing_banner = None;
            }
        }
        if !state.last_known_distance_km.is_finite() || state.last_known_distance_km < 0.0 {
            state.last_known_distance_km = 0.0;
        }
        // Progress never falls behind what was already shown
        if let Some(progress) = state.current_progress {
            let along = progress.along_route_distance_km;
            if along.is_finite() && along > state.last_known_distance_km {
                state.last_known_distance_km = along;
            }
            state.current_progress = Some(CourseProgress {
                along_route_distance_km: state.last_known_distance_km,
                percent_complete: tracker.percent_complete(state.last_known_distance_km),
            });
        }
        match &tracker.route {
            Some(route) => {
                let last_segment = route.segment_count() - 1;
                state.last_segment_index = state.last_segment_index.map(|i| i.min(last_segment));
            }
            None => {
                state.is_off_course = false;
                state.last_deviation_km = None;
                state.last_segment_index = None;
            }
        }

        tracker.state = state;
        Ok(tracker)
    }

    /// Attach a sink for crossing and off-course events.
    pub fn with_event_sink(mut self, sink: Arc<dyn GuidanceEventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn checkpoints(&self) -> &CheckpointList {
        &self.checkpoints
    }

    pub fn config(&self) -> &GuidanceConfig {
        &self.config
    }

    /// Course length in km, 0 when unknown.
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    pub fn state(&self) -> &GuidanceState {
        &self.state
    }

    // ========================================================================
    // Ticks
    // ========================================================================

    /// Advance with a live position (route mode).
    ///
    /// Returns the checkpoints crossed by this tick in course order. On a
    /// tracker without a route, or with an invalid position, progress is left
    /// unchanged.
    pub fn tick(
        &mut self,
        position: &GeoPoint,
        elapsed: Duration,
        current_pace_secs_per_km: f64,
    ) -> Vec<CheckpointCrossing> {
        let Some(route) = self.route.as_ref() else {
            warn!("Position tick on a tracker without a route, progress unchanged");
            return self.advance(None, elapsed, current_pace_secs_per_km);
        };
        if !position.is_valid() {
            warn!(
                "Ignoring invalid position ({}, {})",
                position.latitude, position.longitude
            );
            return self.advance(None, elapsed, current_pace_secs_per_km);
        }

        let projection = self.project(route, position);
        debug!(
            "Projected onto segment {} at {:.3}km, deviation {:.0}m",
            projection.nearest_vertex_index,
            projection.along_route_distance_km,
            projection.deviation_km * 1000.0
        );

        self.state.last_segment_index = Some(projection.nearest_vertex_index);
        self.state.last_deviation_km = Some(projection.deviation_km);
        self.update_off_course(projection.deviation_km);

        self.advance(
            Some(projection.along_route_distance_km),
            elapsed,
            current_pace_secs_per_km,
        )
    }

    /// Advance with a cumulative distance (distance-only mode).
    ///
    /// Off-course status is not evaluated. Non-finite distances leave progress
    /// unchanged.
    pub fn tick_distance(
        &mut self,
        distance_km: f64,
        elapsed: Duration,
        current_pace_secs_per_km: f64,
    ) -> Vec<CheckpointCrossing> {
        if !distance_km.is_finite() {
            warn!("Ignoring non-finite distance sample {}", distance_km);
            return self.advance(None, elapsed, current_pace_secs_per_km);
        }
        self.advance(Some(distance_km), elapsed, current_pace_secs_per_km)
    }

    /// Clear the crossing banner. Idempotent.
    pub fn dismiss_crossing_banner(&mut self) {
        self.state.active_crossing_banner = None;
    }

    /// Before the first fix the runner is assumed to be at the start, so an
    /// out-and-back course resolves to the outbound leg.
    fn project(&self, route: &Route, position: &GeoPoint) -> Projection {
        let hint = self.state.last_segment_index.unwrap_or(0);
        match self.config.projection_window_segments {
            Some(window) => project_windowed(
                position,
                route,
                hint,
                window,
                self.config.off_course_threshold_km,
            ),
            None => project(position, route, Some(hint)),
        }
    }

    fn update_off_course(&mut self, deviation_km: f64) {
        let off_course = deviation_km > self.config.off_course_threshold_km;
        if off_course == self.state.is_off_course {
            return;
        }
        self.state.is_off_course = off_course;

        let event = if off_course {
            info!("Off course: {:.0}m from the route", deviation_km * 1000.0);
            GuidanceEvent::WentOffCourse { deviation_km }
        } else {
            info!("Back on course");
            GuidanceEvent::BackOnCourse
        };
        self.sink.on_event(&event);
    }

    /// Shared tail of both tick variants: monotonic progress, then crossings.
    fn advance(
        &mut self,
        distance_km: Option<f64>,
        elapsed: Duration,
        current_pace_secs_per_km: f64,
    ) -> Vec<CheckpointCrossing> {
        self.state.last_elapsed = elapsed;
        if current_pace_secs_per_km.is_finite() && current_pace_secs_per_km > 0.0 {
            self.state.last_pace_secs_per_km = Some(current_pace_secs_per_km);
        }

        if let Some(distance) = distance_km {
            let along = self.state.last_known_distance_km.max(distance);
            self.state.last_known_distance_km = along;
            self.state.current_progress = Some(CourseProgress {
                along_route_distance_km: along,
                percent_complete: self.percent_complete(along),
            });
        }

        if self.state.current_progress.is_none() {
            return Vec::new();
        }
        self.cross_checkpoints(elapsed)
    }

    fn cross_checkpoints(&mut self, elapsed: Duration) -> Vec<CheckpointCrossing> {
        let along = self.state.last_known_distance_km;
        let newly: Vec<_> = self
            .checkpoints
            .newly_crossed(along, &self.state.crossed_checkpoint_ids)
            .cloned()
            .collect();

        let mut crossings = Vec::with_capacity(newly.len());
        for checkpoint in newly {
            self.state
                .checkpoint_actual_times
                .insert(checkpoint.id.clone(), elapsed);
            self.state
                .crossed_checkpoint_ids
                .insert(checkpoint.id.clone());

            let delta_secs = checkpoint
                .predicted_time
                .map(|predicted| time_delta_secs(elapsed, predicted));
            info!(
                "Crossed checkpoint '{}' at {:.2}km ({:.0}s elapsed{})",
                checkpoint.name,
                checkpoint.distance_from_start_km,
                elapsed.as_secs_f64(),
                delta_secs
                    .map(|d| format!(", {:+.0}s vs plan", d))
                    .unwrap_or_default()
            );

            let crossing = CheckpointCrossing {
                checkpoint,
                actual_time: elapsed,
                delta_secs,
            };
            self.sink.on_event(&GuidanceEvent::CheckpointCrossed(crossing.clone()));
            crossings.push(crossing);
        }

        // A multi-crossing tick only surfaces the most advanced checkpoint
        if let Some(last) = crossings.last() {
            self.state.active_crossing_banner = Some(last.checkpoint.clone());
        }
        crossings
    }

    fn percent_complete(&self, along_km: f64) -> f64 {
        if self.total_distance_km <= 0.0 {
            return 0.0;
        }
        (along_km / self.total_distance_km).clamp(0.0, 1.0)
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    pub fn current_progress(&self) -> Option<CourseProgress> {
        self.state.current_progress
    }

    pub fn is_off_course(&self) -> bool {
        self.state.is_off_course
    }

    pub fn active_crossing_banner(&self) -> Option<&crate::Checkpoint> {
        self.state.active_crossing_banner.as_ref()
    }

    /// First checkpoint in course order not yet crossed.
    pub fn next_checkpoint(&self) -> Option<&crate::Checkpoint> {
        self.checkpoints.first_not_in(&self.state.crossed_checkpoint_ids)
    }

    /// Distance to the next checkpoint in km, after the first tick.
    pub fn next_checkpoint_distance_km(&self) -> Option<f64> {
        let progress = self.state.current_progress?;
        let next = self.next_checkpoint()?;
        Some((next.distance_from_start_km - progress.along_route_distance_km).max(0.0))
    }

    /// Expected elapsed time at the next checkpoint.
    pub fn next_checkpoint_eta(&self) -> Option<Duration> {
        let next = self.next_checkpoint()?;
        if next.predicted_time.is_some() {
            return next.predicted_time;
        }
        checkpoint_eta(
            self.state.last_elapsed,
            self.next_checkpoint_distance_km()?,
            self.state.last_pace_secs_per_km?,
            None,
        )
    }

    /// Finish time if the average pace so far holds.
    pub fn projected_finish_time(&self) -> Option<Duration> {
        let progress = self.state.current_progress?;
        projected_finish_time(
            self.state.last_elapsed,
            progress.along_route_distance_km,
            self.total_distance_km,
            self.config.minimum_distance_for_projection_km,
        )
    }

    /// Crossed checkpoints in course order with actual and planned times.
    pub fn checkpoint_splits(&self) -> Vec<CheckpointSplit> {
        self.checkpoints
            .iter()
            .filter_map(|cp| {
                let actual = *self.state.checkpoint_actual_times.get(&cp.id)?;
                Some(CheckpointSplit {
                    checkpoint_id: cp.id.clone(),
                    name: cp.name.clone(),
                    distance_from_start_km: cp.distance_from_start_km,
                    actual_time: actual,
                    predicted_time: cp.predicted_time,
                    delta_secs: cp.predicted_time.map(|p| time_delta_secs(actual, p)),
                })
            })
            .collect()
    }

    /// Snapshot of every output.
    pub fn snapshot(&self) -> GuidanceSnapshot {
        let progress = self.state.current_progress;
        let distance_remaining_km = match progress {
            Some(p) if self.total_distance_km > 0.0 => {
                Some((self.total_distance_km - p.along_route_distance_km).max(0.0))
            }
            _ => None,
        };

        GuidanceSnapshot {
            progress,
            distance_remaining_km,
            deviation_km: self.state.last_deviation_km,
            is_off_course: self.state.is_off_course,
            next_checkpoint: self.next_checkpoint().cloned(),
            next_checkpoint_distance_km: self.next_checkpoint_distance_km(),
            next_checkpoint_eta: self.next_checkpoint_eta(),
            projected_finish_time: self.projected_finish_time(),
            active_crossing_banner: self.state.active_crossing_banner.clone(),
            crossed_checkpoint_count: self.state.crossed_checkpoint_ids.len(),
            elapsed: self.state.last_elapsed,
        }
    }
}
