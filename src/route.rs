//! Reference course model.
//!
//! A [`Route`] is an ordered polyline with the cumulative along-route distance
//! precomputed at every vertex. It is built once when a run or race starts and
//! shared read-only by the tracker for the rest of the session.

use geo::{Coord, LineString, algorithm::simplify::Simplify};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CourseError, Result};
use crate::geo_utils::{compute_bounds, haversine_distance};
use crate::{Bounds, GeoPoint};

/// Minimum number of vertices for a route to have a segment.
pub const MIN_ROUTE_POINTS: usize = 2;

/// Configuration for building a route from recorded points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Tolerance for Douglas-Peucker simplification (in degrees).
    /// 0 keeps every point. 0.00005 (~5 meters) is plenty for recorded
    /// courses sampled every second.
    /// Default: 0.0
    pub simplification_tolerance: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            simplification_tolerance: 0.0,
        }
    }
}

impl RouteConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.simplification_tolerance.is_finite() || self.simplification_tolerance < 0.0 {
            return Err(CourseError::config(
                "simplification_tolerance",
                format!("must be >= 0, got {}", self.simplification_tolerance),
            ));
        }
        Ok(())
    }
}

/// A course vertex with the along-route distance from the start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteVertex {
    pub point: GeoPoint,
    pub cumulative_distance_km: f64,
}

/// An immutable reference course.
///
/// Only constructed through [`Route::from_points`], so it always holds at
/// least one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Identifier of the stored course
    pub id: String,
    vertices: Vec<RouteVertex>,
    bounds: Bounds,
}

impl Route {
    /// Build a route from raw course points.
    ///
    /// Invalid coordinates are dropped before the minimum point count is
    /// checked.
    ///
    /// # Example
    /// ```
    /// use courseguide::{GeoPoint, Route, RouteConfig};
    ///
    /// let points = vec![GeoPoint::new(47.0, 8.0), GeoPoint::new(47.01, 8.0)];
    /// let route = Route::from_points("loop", &points, &RouteConfig::default()).unwrap();
    /// assert!((route.total_distance_km() - 1.11).abs() < 0.01);
    /// ```
    pub fn from_points(id: &str, points: &[GeoPoint], config: &RouteConfig) -> Result<Self> {
        config.validate()?;

        let valid: Vec<GeoPoint> = points.iter().filter(|p| p.is_valid()).copied().collect();
        if valid.len() < MIN_ROUTE_POINTS {
            return Err(CourseError::InsufficientPoints {
                route_id: id.to_string(),
                point_count: valid.len(),
                minimum_required: MIN_ROUTE_POINTS,
            });
        }

        let kept = if config.simplification_tolerance > 0.0 {
            simplify_points(&valid, config.simplification_tolerance)
        } else {
            valid
        };

        let mut vertices = Vec::with_capacity(kept.len());
        let mut cumulative_km = 0.0;
        for (i, point) in kept.iter().enumerate() {
            if i > 0 {
                cumulative_km += haversine_distance(&kept[i - 1], point) / 1000.0;
            }
            vertices.push(RouteVertex {
                point: *point,
                cumulative_distance_km: cumulative_km,
            });
        }

        let bounds = compute_bounds(&kept);

        debug!(
            "Built route '{}': {} points -> {} vertices, {:.2}km",
            id,
            points.len(),
            vertices.len(),
            cumulative_km
        );

        Ok(Self {
            id: id.to_string(),
            vertices,
            bounds,
        })
    }

    pub fn vertices(&self) -> &[RouteVertex] {
        &self.vertices
    }

    /// Number of segments (vertex pairs).
    pub fn segment_count(&self) -> usize {
        self.vertices.len() - 1
    }

    /// Course length in kilometers.
    pub fn total_distance_km(&self) -> f64 {
        self.vertices
            .last()
            .map(|v| v.cumulative_distance_km)
            .unwrap_or(0.0)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Position at a given along-route distance, interpolated within a segment.
    /// Distances outside the course clamp to the start or finish.
    pub fn point_at_distance(&self, distance_km: f64) -> GeoPoint {
        let (a, b, ratio) = self.locate(distance_km);
        let lat = a.point.latitude + ratio * (b.point.latitude - a.point.latitude);
        let lng = a.point.longitude + ratio * (b.point.longitude - a.point.longitude);
        match (a.point.elevation_m, b.point.elevation_m) {
            (Some(ea), Some(eb)) => GeoPoint::with_elevation(lat, lng, ea + ratio * (eb - ea)),
            _ => GeoPoint::new(lat, lng),
        }
    }

    /// Interpolated elevation at a given along-route distance, if the course
    /// carries elevation on both neighbouring vertices.
    pub fn elevation_at_distance(&self, distance_km: f64) -> Option<f64> {
        self.point_at_distance(distance_km).elevation_m
    }

    /// Segment endpoints and the fraction of the way along it for a distance.
    fn locate(&self, distance_km: f64) -> (&RouteVertex, &RouteVertex, f64) {
        let first = &self.vertices[0];
        let last = &self.vertices[self.vertices.len() - 1];
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return (first, first, 0.0);
        }
        if distance_km >= last.cumulative_distance_km {
            return (last, last, 0.0);
        }

        // First vertex strictly beyond the target distance
        let upper = self
            .vertices
            .partition_point(|v| v.cumulative_distance_km <= distance_km);
        let a = &self.vertices[upper - 1];
        let b = &self.vertices[upper];
        let seg_len = b.cumulative_distance_km - a.cumulative_distance_km;
        if seg_len <= f64::EPSILON {
            return (a, a, 0.0);
        }
        (a, b, (distance_km - a.cumulative_distance_km) / seg_len)
    }
}

/// Douglas-Peucker simplification that keeps the original points (and their
/// elevation/timestamps) for every retained vertex.
fn simplify_points(points: &[GeoPoint], tolerance: f64) -> Vec<GeoPoint> {
    let line = LineString::new(
        points
            .iter()
            .map(|p| Coord {
                x: p.longitude,
                y: p.latitude,
            })
            .collect(),
    );
    let simplified = line.simplify(&tolerance);

    // Retained coordinates are a subsequence of the input
    let mut kept = Vec::with_capacity(simplified.0.len());
    let mut cursor = 0;
    for coord in &simplified.0 {
        while cursor < points.len() {
            let p = &points[cursor];
            cursor += 1;
            if p.longitude == coord.x && p.latitude == coord.y {
                kept.push(*p);
                break;
            }
        }
    }

    if kept.len() < MIN_ROUTE_POINTS {
        return points.to_vec();
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplify_keeps_endpoints_and_elevation() {
        let points: Vec<GeoPoint> = (0..50)
            .map(|i| GeoPoint::with_elevation(47.0 + i as f64 * 0.0001, 8.0, 400.0 + i as f64))
            .collect();
        let kept = simplify_points(&points, 0.00001);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], points[0]);
        assert_eq!(kept[1], points[49]);
        assert_eq!(kept[1].elevation_m, Some(449.0));
    }
}
