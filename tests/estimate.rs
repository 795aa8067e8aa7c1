//! Tests for ETA and finish-time estimates

use std::time::Duration;

use courseguide::estimate::*;

#[test]
fn test_average_pace() {
    assert_eq!(
        average_pace_secs_per_km(Duration::from_secs(3600), 10.0),
        Some(360.0)
    );
    assert_eq!(average_pace_secs_per_km(Duration::ZERO, 10.0), None);
    assert_eq!(average_pace_secs_per_km(Duration::from_secs(60), 0.0), None);
}

#[test]
fn test_eta_from_current_pace() {
    let eta = checkpoint_eta(Duration::from_secs(2250), 2.5, 300.0, None);
    assert_eq!(eta, Some(Duration::from_secs(3000)));
}

#[test]
fn test_eta_prefers_predicted_time() {
    let predicted = Duration::from_secs(5400);
    let eta = checkpoint_eta(Duration::from_secs(2250), 2.5, 300.0, Some(predicted));
    assert_eq!(eta, Some(predicted));

    // Even without a usable pace
    let eta = checkpoint_eta(Duration::from_secs(2250), 2.5, f64::NAN, Some(predicted));
    assert_eq!(eta, Some(predicted));
}

#[test]
fn test_eta_without_usable_pace() {
    for pace in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        assert_eq!(
            checkpoint_eta(Duration::from_secs(100), 1.0, pace, None),
            None,
            "pace {pace}"
        );
    }
}

#[test]
fn test_projected_finish() {
    let finish = projected_finish_time(Duration::from_secs(3600), 10.0, 50.0, 0.5);
    assert_eq!(finish, Some(Duration::from_secs(18_000)));
}

#[test]
fn test_projected_finish_below_minimum_distance() {
    assert_eq!(
        projected_finish_time(Duration::from_secs(120), 0.3, 50.0, 0.5),
        None
    );
}

#[test]
fn test_projected_finish_degenerate_inputs() {
    // Unknown course length
    assert_eq!(
        projected_finish_time(Duration::from_secs(3600), 10.0, 0.0, 0.5),
        None
    );
    // Clock not started
    assert_eq!(projected_finish_time(Duration::ZERO, 10.0, 50.0, 0.5), None);
}

#[test]
fn test_projected_finish_past_course_end() {
    // Beyond the marked length nothing remains
    let finish = projected_finish_time(Duration::from_secs(20_000), 52.0, 50.0, 0.5);
    assert_eq!(finish, Some(Duration::from_secs(20_000)));
}

#[test]
fn test_time_delta() {
    assert_eq!(
        time_delta_secs(Duration::from_secs(2000), Duration::from_secs(1800)),
        200.0
    );
    assert_eq!(
        time_delta_secs(Duration::from_secs(1700), Duration::from_secs(1800)),
        -100.0
    );
}
