//! Synthetic courses and runner traces for testing and benchmarking.
//!
//! Generates deterministic course polylines and noisy position samples with
//! known ground truth (the exact along-route distance of every sample).
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use courseguide::synthetic::{CoursePattern, SyntheticCourse, SyntheticRunner};
//! use courseguide::{GeoPoint, Route, RouteConfig};
//!
//! let course = SyntheticCourse {
//!     origin: GeoPoint::new(45.92, 6.87),
//!     length_meters: 5_000.0,
//!     pattern: CoursePattern::Winding,
//!     point_spacing_meters: 20.0,
//!     seed: 42,
//! };
//! let route = Route::from_points("synthetic", &course.generate(), &RouteConfig::default()).unwrap();
//!
//! let runner = SyntheticRunner {
//!     pace_secs_per_km: 360.0,
//!     sample_interval_secs: 5.0,
//!     gps_noise_sigma_meters: 3.0,
//!     seed: 7,
//! };
//! let trace = runner.run(&route);
//! assert!(!trace.is_empty());
//! ```

use std::f64::consts::PI;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo_utils::METERS_PER_DEG_LAT;
use crate::{GeoPoint, Route};

// ============================================================================
// Types
// ============================================================================

/// Shape of a generated course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoursePattern {
    /// Straight line with minor perturbation.
    Straight,
    /// Winding trail with realistic turns.
    Winding,
    /// Out to a turnaround and back along the same line.
    OutAndBack,
}

/// Configuration for a generated course.
#[derive(Debug, Clone)]
pub struct SyntheticCourse {
    /// Start of the course.
    pub origin: GeoPoint,
    /// Total course length in meters (for out-and-back, both legs).
    pub length_meters: f64,
    pub pattern: CoursePattern,
    /// Spacing between course vertices in meters.
    pub point_spacing_meters: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// Runner model used to sample positions along a course.
#[derive(Debug, Clone)]
pub struct SyntheticRunner {
    /// Constant pace in seconds per km.
    pub pace_secs_per_km: f64,
    /// Time between samples in seconds.
    pub sample_interval_secs: f64,
    /// GPS noise standard deviation in meters.
    pub gps_noise_sigma_meters: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

/// A generated position sample with its ground truth.
#[derive(Debug, Clone, Copy)]
pub struct TraceSample {
    pub position: GeoPoint,
    pub elapsed: Duration,
    pub pace_secs_per_km: f64,
    /// Exact along-route distance before noise was added, in km.
    pub true_distance_km: f64,
}

// ============================================================================
// Coordinate Helpers
// ============================================================================

/// Convert meters to degrees of latitude.
fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

/// Convert meters to degrees of longitude at a given latitude.
fn meters_to_deg_lng(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lng = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg_lng.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg_lng
}

/// Move `meters` from `from` along `heading` (radians, 0 = east).
fn step(from: &GeoPoint, heading: f64, meters: f64) -> GeoPoint {
    GeoPoint::new(
        from.latitude + meters_to_deg_lat(meters * heading.sin()),
        from.longitude + meters_to_deg_lng(meters * heading.cos(), from.latitude),
    )
}

// ============================================================================
// Generation
// ============================================================================

impl SyntheticCourse {
    /// Generate the course polyline.
    pub fn generate(&self) -> Vec<GeoPoint> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let spacing = self.point_spacing_meters.max(1.0);

        let outbound_length = match self.pattern {
            CoursePattern::OutAndBack => self.length_meters / 2.0,
            _ => self.length_meters,
        };
        let num_points = (outbound_length / spacing).ceil().max(1.0) as usize;

        let mut heading: f64 = rng.gen_range(0.0..(2.0 * PI));
        let mut current = self.origin;
        let mut points = Vec::with_capacity(num_points * 2 + 1);
        points.push(with_course_elevation(current, 0));

        for i in 0..num_points {
            heading += match self.pattern {
                CoursePattern::Straight | CoursePattern::OutAndBack => rng.gen_range(-0.02..0.02),
                CoursePattern::Winding => {
                    // Gentle sinusoidal base with random turns, max ~30 degrees per step
                    (i as f64 * 0.01).sin() * 0.3 + rng.gen_range(-0.15..0.15)
                }
            };
            current = step(&current, heading, spacing);
            points.push(with_course_elevation(current, i + 1));
        }

        if self.pattern == CoursePattern::OutAndBack {
            // Return leg retraces the outbound vertices
            let outbound: Vec<GeoPoint> = points.iter().rev().skip(1).copied().collect();
            points.extend(outbound);
        }

        points
    }
}

/// Simple sinusoidal elevation profile.
fn with_course_elevation(point: GeoPoint, index: usize) -> GeoPoint {
    GeoPoint::with_elevation(
        point.latitude,
        point.longitude,
        1000.0 + 150.0 * (index as f64 * 0.01).sin(),
    )
}

impl SyntheticRunner {
    /// Sample the runner's position from start to finish of `route`.
    ///
    /// A runner that never finishes (non-finite pace or sample interval)
    /// produces an empty trace.
    pub fn run(&self, route: &Route) -> Vec<TraceSample> {
        if !self.pace_secs_per_km.is_finite() || !self.sample_interval_secs.is_finite() {
            return Vec::new();
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let total_km = route.total_distance_km();
        let interval = self.sample_interval_secs.max(0.1);
        let km_per_sample = interval / self.pace_secs_per_km.max(1.0);

        let mut samples = Vec::new();
        let mut n = 0usize;
        loop {
            let true_distance_km = (n as f64 * km_per_sample).min(total_km);
            let exact = route.point_at_distance(true_distance_km);
            samples.push(TraceSample {
                position: add_gps_noise(&exact, self.gps_noise_sigma_meters, &mut rng),
                elapsed: Duration::from_secs_f64(n as f64 * interval),
                pace_secs_per_km: self.pace_secs_per_km,
                true_distance_km,
            });
            if true_distance_km >= total_km {
                break;
            }
            n += 1;
        }
        samples
    }
}

/// Add Gaussian GPS noise to a point.
fn add_gps_noise(point: &GeoPoint, sigma_meters: f64, rng: &mut StdRng) -> GeoPoint {
    if sigma_meters <= 0.0 {
        return *point;
    }

    // Box-Muller transform for Gaussian noise
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();

    GeoPoint {
        latitude: point.latitude + meters_to_deg_lat(z0 * sigma_meters),
        longitude: point.longitude + meters_to_deg_lng(z1 * sigma_meters, point.latitude),
        ..*point
    }
}
