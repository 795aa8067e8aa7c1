//! Geographic utilities: distances, bounds and degree/meter conversion.

use crate::{Bounds, GeoPoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters per degree of latitude (approximately constant).
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Great-circle distance between two points in meters.
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Flat-earth distance in meters.
///
/// Scales longitude by the cosine of the mean latitude. Good to well under a
/// percent at race scales and avoids the trig of [`haversine_distance`].
pub fn equirectangular_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let (dx, dy) = local_offset_meters(a, b);
    (dx * dx + dy * dy).sqrt()
}

/// East/north offset in meters of `to` relative to `from`.
pub(crate) fn local_offset_meters(from: &GeoPoint, to: &GeoPoint) -> (f64, f64) {
    let mean_lat = (from.latitude + to.latitude) / 2.0;
    let dx = (to.longitude - from.longitude) * METERS_PER_DEG_LAT * mean_lat.to_radians().cos();
    let dy = (to.latitude - from.latitude) * METERS_PER_DEG_LAT;
    (dx, dy)
}

/// Convert a distance in meters to degrees of longitude at a given latitude.
///
/// Longitude degrees shrink towards the poles, so this is the larger of the
/// two conversions and safe to use as a search radius.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg.abs() < 1e-10 {
        return meters / METERS_PER_DEG_LAT;
    }
    meters / meters_per_deg
}

/// Bounding box of a set of points. Empty input yields an all-zero box.
pub fn compute_bounds(points: &[GeoPoint]) -> Bounds {
    Bounds::from_points(points).unwrap_or(Bounds {
        min_lat: 0.0,
        max_lat: 0.0,
        min_lng: 0.0,
        max_lng: 0.0,
    })
}

/// Arithmetic center of a set of points.
pub fn compute_center(points: &[GeoPoint]) -> GeoPoint {
    if points.is_empty() {
        return GeoPoint::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.longitude).sum::<f64>() / n;
    GeoPoint::new(lat, lng)
}

/// Total polyline length in meters.
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}
