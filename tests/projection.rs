//! Tests for route projection

use courseguide::{GeoPoint, Route, RouteConfig, project, project_windowed};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// North-bound course, `segments` steps of ~111 m.
fn straight_route(segments: usize) -> Route {
    let points: Vec<GeoPoint> = (0..=segments)
        .map(|i| GeoPoint::new(47.0 + i as f64 * 0.001, 8.0))
        .collect();
    Route::from_points("straight", &points, &RouteConfig::default()).unwrap()
}

/// Out to 47.01 and back along the identical vertices.
fn out_and_back_route() -> Route {
    let mut points: Vec<GeoPoint> = (0..=10)
        .map(|i| GeoPoint::new(47.0 + i as f64 * 0.001, 8.0))
        .collect();
    let back: Vec<GeoPoint> = points.iter().rev().skip(1).copied().collect();
    points.extend(back);
    Route::from_points("out-and-back", &points, &RouteConfig::default()).unwrap()
}

#[test]
fn test_on_route_position_has_no_deviation() {
    let route = straight_route(10);
    let position = route.point_at_distance(0.5);

    let projection = project(&position, &route, None);
    assert!(projection.deviation_km < 1e-6);
    assert!(approx_eq(projection.along_route_distance_km, 0.5, 1e-6));
    assert_eq!(projection.nearest_vertex_index, 4);
}

#[test]
fn test_lateral_offset_is_deviation() {
    let route = straight_route(10);
    // ~38 m east of the course at 47.0055
    let position = GeoPoint::new(47.0055, 8.0005);

    let projection = project(&position, &route, None);
    assert!(approx_eq(projection.deviation_km, 0.038, 0.002));
    assert!(approx_eq(projection.point.latitude, 47.0055, 1e-6));
    assert!(approx_eq(projection.point.longitude, 8.0, 1e-9));
    assert!(approx_eq(
        projection.along_route_distance_km,
        route.total_distance_km() * 0.55,
        1e-4
    ));
    assert!(approx_eq(projection.segment_fraction, 0.5, 1e-3));
}

#[test]
fn test_clamps_before_start_and_after_finish() {
    let route = straight_route(10);

    let before = project(&GeoPoint::new(46.99, 8.0), &route, None);
    assert_eq!(before.along_route_distance_km, 0.0);
    assert!(approx_eq(before.deviation_km, 1.112, 0.001));

    let after = project(&GeoPoint::new(47.02, 8.0), &route, None);
    assert!(approx_eq(
        after.along_route_distance_km,
        route.total_distance_km(),
        1e-9
    ));
    assert_eq!(after.nearest_vertex_index, 9);
}

#[test]
fn test_far_position_is_far() {
    let route = straight_route(10);
    let projection = project(&GeoPoint::new(48.5, 8.0), &route, None);
    assert!(projection.deviation_km > 100.0);
}

#[test]
fn test_far_position_projects_level_with_itself() {
    let route = straight_route(500);
    // ~38 km east of the course, level with segment 10
    let position = GeoPoint::new(47.0105, 8.5);

    let projection = project(&position, &route, None);
    assert_eq!(projection.nearest_vertex_index, 10);
    assert!(approx_eq(projection.point.latitude, 47.0105, 1e-9));
    assert!(approx_eq(projection.deviation_km, 37.9, 0.1));
}

#[test]
fn test_multi_segment_selects_nearest() {
    // L-shaped course: north, then east
    let points = vec![
        GeoPoint::new(47.0, 8.0),
        GeoPoint::new(47.01, 8.0),
        GeoPoint::new(47.01, 8.02),
    ];
    let route = Route::from_points("l-shape", &points, &RouteConfig::default()).unwrap();

    let projection = project(&GeoPoint::new(47.0101, 8.01), &route, None);
    assert_eq!(projection.nearest_vertex_index, 1);
    assert!(projection.along_route_distance_km > route.vertices()[1].cumulative_distance_km);
}

#[test]
fn test_along_distance_increases_with_position() {
    let route = straight_route(10);
    let p1 = project(&GeoPoint::new(47.002, 8.0001), &route, None);
    let p2 = project(&GeoPoint::new(47.008, 7.9999), &route, None);
    assert!(p2.along_route_distance_km > p1.along_route_distance_km);
}

#[test]
fn test_out_and_back_tie_without_hint_prefers_further_along() {
    let route = out_and_back_route();
    let position = GeoPoint::new(47.0035, 8.0);

    let projection = project(&position, &route, None);
    // Return leg: 47.004 -> 47.003 is segment 16
    assert_eq!(projection.nearest_vertex_index, 16);
    assert!(projection.along_route_distance_km > 1.5);
}

#[test]
fn test_out_and_back_tie_follows_hint() {
    let route = out_and_back_route();
    let position = GeoPoint::new(47.0035, 8.0);

    // Runner still heading out
    let outbound = project(&position, &route, Some(0));
    assert_eq!(outbound.nearest_vertex_index, 3);
    assert!(approx_eq(outbound.along_route_distance_km, 0.389, 0.001));

    // Runner already past the turnaround
    let inbound = project(&position, &route, Some(11));
    assert_eq!(inbound.nearest_vertex_index, 16);
    assert!(approx_eq(inbound.along_route_distance_km, 1.835, 0.001));
}

#[test]
fn test_windowed_matches_full_scan_near_hint() {
    let route = straight_route(500);
    let position = GeoPoint::new(47.1005, 8.0002);

    let full = project(&position, &route, Some(99));
    let windowed = project_windowed(&position, &route, 99, 5, 0.07);
    assert_eq!(full, windowed);
    assert_eq!(windowed.nearest_vertex_index, 100);
}

#[test]
fn test_windowed_falls_back_to_full_scan_on_jump() {
    let route = straight_route(500);
    // GPS resumes ~40 km along, far outside the window around segment 10
    let position = GeoPoint::new(47.3605, 8.0);

    let projection = project_windowed(&position, &route, 10, 5, 0.07);
    assert_eq!(projection.nearest_vertex_index, 360);
    assert!(projection.deviation_km < 1e-6);
}

#[test]
fn test_windowed_keeps_window_result_when_truly_off_course() {
    let route = straight_route(500);
    // Level with segment 10 but ~38 km east: the full scan agrees with the window
    let position = GeoPoint::new(47.0105, 8.5);

    let projection = project_windowed(&position, &route, 10, 5, 0.07);
    assert!(projection.deviation_km > 30.0);
    assert_eq!(projection.nearest_vertex_index, 10);
}

#[test]
fn test_hint_past_route_end_is_clamped() {
    let route = straight_route(10);
    let projection = project_windowed(&GeoPoint::new(47.0095, 8.0), &route, 99, 2, 0.07);
    assert_eq!(projection.nearest_vertex_index, 9);
}
