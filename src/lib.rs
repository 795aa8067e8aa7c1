//! # Course Guide
//!
//! Live course progress and checkpoint guidance for GPS-tracked runs and races.
//!
//! This library provides:
//! - Projection of a live position onto a reference course polyline
//!   (along-route distance and lateral deviation)
//! - A tick-driven guidance tracker with monotonic progress, off-course
//!   detection and one-shot checkpoint crossing events
//! - A distance-only mode for races without course geometry
//! - Next-checkpoint ETA and projected finish time
//!
//! ## Features
//!
//! - **`synthetic`** - Deterministic course and runner trace generator
//! - **`cli`** - `courseguide-cli` replay tool for GPX files
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use courseguide::{
//!     Checkpoint, CheckpointList, GeoPoint, GuidanceConfig, GuidanceTracker, Route, RouteConfig,
//! };
//!
//! let course: Vec<GeoPoint> = (0..=100)
//!     .map(|i| GeoPoint::new(47.0 + i as f64 * 0.001, 8.0))
//!     .collect();
//! let route = Route::from_points("course", &course, &RouteConfig::default()).unwrap();
//! let checkpoints = CheckpointList::new(vec![Checkpoint::new("cp1", "Aid 1", 5.0)]).unwrap();
//!
//! let mut tracker =
//!     GuidanceTracker::new(Some(route), checkpoints, GuidanceConfig::default()).unwrap();
//! tracker.tick(&GeoPoint::new(47.02, 8.0), Duration::from_secs(600), 300.0);
//!
//! let snapshot = tracker.snapshot();
//! assert!(!snapshot.is_off_course);
//! assert_eq!(snapshot.next_checkpoint.unwrap().id, "cp1");
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{CourseError, Result};

// Geographic utilities (distance, bounds, conversions)
pub mod geo_utils;

// Reference course with cumulative distances
pub mod route;
pub use route::{Route, RouteConfig, RouteVertex};

// Position-to-route projection
pub mod projection;
pub use projection::{Projection, project, project_windowed};

// Ordered checkpoints / aid stations
pub mod checkpoints;
pub use checkpoints::{Checkpoint, CheckpointList};

// ETA and finish-time extrapolation
pub mod estimate;

// Stateful guidance tracker
pub mod guidance;
pub use guidance::{
    CheckpointCrossing, CheckpointSplit, CourseProgress, GuidanceConfig, GuidanceEvent,
    GuidanceEventSink, GuidanceSnapshot, GuidanceState, GuidanceTracker, NoopSink, RecordingSink,
};

// Synthetic courses and traces for tests and benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic position with optional elevation and timestamp.
///
/// # Example
/// ```
/// use courseguide::GeoPoint;
/// let point = GeoPoint::new(46.5197, 6.6323); // Lausanne
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
    /// Unix timestamp (seconds since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl GeoPoint {
    /// Create a new point without elevation or timestamp.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation_m: None,
            timestamp: None,
        }
    }

    /// Create a new point with elevation.
    pub fn with_elevation(latitude: f64, longitude: f64, elevation_m: f64) -> Self {
        Self {
            elevation_m: Some(elevation_m),
            ..Self::new(latitude, longitude)
        }
    }

    /// Attach a unix timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a course.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from points.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Check whether a point lies inside the bounds.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}
