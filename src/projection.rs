//! Projection of a live position onto a reference course.
//!
//! Every segment is measured in one local planar frame centered on the
//! position (longitude scaled by the cosine of the position latitude). The
//! position is projected perpendicularly onto each segment, clamped to the
//! segment ends, and the deviation is the planar distance to that foot. The
//! segment with the smallest deviation wins.
//!
//! Ties (equal deviation, e.g. the two legs of an out-and-back course) are
//! resolved towards continuity with the previous fix: the first tied segment
//! at or after the search hint wins. Without a hint the furthest-along
//! segment wins.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::EARTH_RADIUS_METERS;
use crate::{GeoPoint, Route};

/// Deviations closer than this (in km) count as a tie.
const TIE_EPSILON_KM: f64 = 1e-9;

/// Kilometers per degree of latitude, consistent with the haversine radius.
const KM_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0 / 1000.0;

/// Result of projecting a position onto a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Distance from the route start to the projected point, in km
    pub along_route_distance_km: f64,
    /// Distance from the position to the projected point, in km
    pub deviation_km: f64,
    /// Index of the start vertex of the matched segment
    pub nearest_vertex_index: usize,
    /// Nearest point on the route
    pub point: GeoPoint,
    /// Position of the projected point within the segment (0 = start, 1 = end)
    pub segment_fraction: f64,
}

/// Project a position onto the route with a full scan over all segments.
///
/// `search_hint` is the segment index of the previous projection and only
/// influences tie-breaking.
///
/// # Example
/// ```
/// use courseguide::{project, GeoPoint, Route, RouteConfig};
///
/// let route = Route::from_points(
///     "straight",
///     &[GeoPoint::new(47.0, 8.0), GeoPoint::new(47.0, 8.1)],
///     &RouteConfig::default(),
/// )
/// .unwrap();
///
/// let projection = project(&GeoPoint::new(47.0, 8.05), &route, None);
/// assert!(projection.deviation_km < 0.001);
/// assert!((projection.along_route_distance_km - route.total_distance_km() / 2.0).abs() < 0.01);
/// ```
pub fn project(position: &GeoPoint, route: &Route, search_hint: Option<usize>) -> Projection {
    scan(position, route, 0, route.segment_count() - 1, search_hint)
}

/// Project a position onto the route, scanning only `window` segments either
/// side of `hint`.
///
/// If the best windowed deviation exceeds `fallback_threshold_km` the search is
/// repeated over the whole route, so a runner who legitimately jumped ahead
/// (shortcut, GPS fix resuming far along) is not reported off course.
pub fn project_windowed(
    position: &GeoPoint,
    route: &Route,
    hint: usize,
    window: usize,
    fallback_threshold_km: f64,
) -> Projection {
    let last_segment = route.segment_count() - 1;
    let hint = hint.min(last_segment);
    let lo = hint.saturating_sub(window);
    let hi = hint.saturating_add(window).min(last_segment);

    let windowed = scan(position, route, lo, hi, Some(hint));
    if windowed.deviation_km <= fallback_threshold_km || (lo == 0 && hi == last_segment) {
        return windowed;
    }

    debug!(
        "Windowed projection [{}..={}] deviates {:.3}km, falling back to full scan",
        lo, hi, windowed.deviation_km
    );
    project(position, route, Some(hint))
}

/// Best projection over segments `first..=last`.
fn scan(
    position: &GeoPoint,
    route: &Route,
    first: usize,
    last: usize,
    hint: Option<usize>,
) -> Projection {
    let vertices = route.vertices();
    let mut best: Option<Projection> = None;

    for i in first..=last {
        let a = &vertices[i];
        let b = &vertices[i + 1];

        let (t, point, deviation_km) = project_on_segment(position, &a.point, &b.point);
        let along = a.cumulative_distance_km
            + t * (b.cumulative_distance_km - a.cumulative_distance_km);

        let candidate = Projection {
            along_route_distance_km: along,
            deviation_km,
            nearest_vertex_index: i,
            point,
            segment_fraction: t,
        };

        best = match best {
            Some(current) if !is_better(&candidate, &current, hint) => Some(current),
            _ => Some(candidate),
        };
    }

    // `first..=last` always holds at least one segment
    best.unwrap_or(Projection {
        along_route_distance_km: 0.0,
        deviation_km: f64::INFINITY,
        nearest_vertex_index: 0,
        point: vertices[0].point,
        segment_fraction: 0.0,
    })
}

fn is_better(candidate: &Projection, current: &Projection, hint: Option<usize>) -> bool {
    if candidate.deviation_km < current.deviation_km - TIE_EPSILON_KM {
        return true;
    }
    if candidate.deviation_km > current.deviation_km + TIE_EPSILON_KM {
        return false;
    }

    let c = candidate.nearest_vertex_index;
    let cur = current.nearest_vertex_index;
    match hint {
        None => c > cur,
        Some(h) => match (c >= h, cur >= h) {
            (true, false) => true,
            (false, true) => false,
            // Both ahead of the hint: the closer one keeps continuity
            (true, true) => c < cur,
            (false, false) => c > cur,
        },
    }
}

/// Project `p` onto segment `a`-`b`. Returns the clamped parameter, the
/// projected point and the deviation in km.
///
/// Planar approximation scaled by the cosine of `p`'s latitude, so every
/// segment is compared in the same frame. Accurate at race scales.
fn project_on_segment(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> (f64, GeoPoint, f64) {
    let cos_lat = p.latitude.to_radians().cos();

    let dx = (b.longitude - a.longitude) * cos_lat;
    let dy = b.latitude - a.latitude;
    let px = (p.longitude - a.longitude) * cos_lat;
    let py = p.latitude - a.latitude;

    let seg_len_sq = dx * dx + dy * dy;
    let t = if seg_len_sq < 1e-20 {
        // Degenerate segment
        0.0
    } else {
        ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0)
    };

    let deviation_km = (px - t * dx).hypot(py - t * dy) * KM_PER_DEGREE;
    if t == 0.0 {
        return (0.0, *a, deviation_km);
    }
    let lat = a.latitude + t * (b.latitude - a.latitude);
    let lng = a.longitude + t * (b.longitude - a.longitude);
    let point = match (a.elevation_m, b.elevation_m) {
        (Some(ea), Some(eb)) => GeoPoint::with_elevation(lat, lng, ea + t * (eb - ea)),
        _ => GeoPoint::new(lat, lng),
    };
    (t, point, deviation_km)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_projection_clamps_to_ends() {
        let a = GeoPoint::new(48.0, 16.0);
        let b = GeoPoint::new(48.0, 17.0);

        let (t, point, _) = project_on_segment(&GeoPoint::new(48.0, 15.5), &a, &b);
        assert_eq!(t, 0.0);
        assert_eq!(point, a);

        let (t, point, _) = project_on_segment(&GeoPoint::new(48.0, 17.5), &a, &b);
        assert_eq!(t, 1.0);
        assert_eq!(point, b);
    }

    #[test]
    fn degenerate_segment_returns_start() {
        let a = GeoPoint::new(48.0, 16.0);
        let (t, point, _) = project_on_segment(&GeoPoint::new(48.1, 16.1), &a, &a);
        assert_eq!(t, 0.0);
        assert_eq!(point, a);
    }

    #[test]
    fn tie_prefers_first_segment_at_or_after_hint() {
        let make = |i: usize| Projection {
            along_route_distance_km: i as f64,
            deviation_km: 0.01,
            nearest_vertex_index: i,
            point: GeoPoint::new(0.0, 0.0),
            segment_fraction: 0.5,
        };
        // No hint: further along wins
        assert!(is_better(&make(9), &make(2), None));
        // Hint 2: segment 2 keeps continuity over the return leg at 9
        assert!(!is_better(&make(9), &make(2), Some(2)));
        // Hint past both: the later one is closer behind
        assert!(is_better(&make(9), &make(2), Some(12)));
    }
}
