//! ETA and finish-time extrapolation.
//!
//! These are live "if pace holds" indicators: plain linear models with no
//! fatigue or elevation adjustment.

use std::time::Duration;

/// Average pace in seconds per km so far.
///
/// `None` before any distance is covered or before the clock has started.
pub fn average_pace_secs_per_km(elapsed: Duration, along_route_distance_km: f64) -> Option<f64> {
    let elapsed_secs = elapsed.as_secs_f64();
    if elapsed_secs <= 0.0 || !along_route_distance_km.is_finite() || along_route_distance_km <= 0.0
    {
        return None;
    }
    Some(elapsed_secs / along_route_distance_km)
}

/// Elapsed time at which the next checkpoint is expected to be reached.
///
/// A planned `predicted_time` wins. Otherwise the remaining distance is covered
/// at `current_pace_secs_per_km`; a non-finite or non-positive pace gives
/// `None`.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use courseguide::estimate::checkpoint_eta;
///
/// let eta = checkpoint_eta(Duration::from_secs(1800), 2.5, 360.0, None);
/// assert_eq!(eta, Some(Duration::from_secs(2700)));
/// ```
pub fn checkpoint_eta(
    elapsed: Duration,
    distance_to_next_km: f64,
    current_pace_secs_per_km: f64,
    predicted_time: Option<Duration>,
) -> Option<Duration> {
    if predicted_time.is_some() {
        return predicted_time;
    }
    if !current_pace_secs_per_km.is_finite() || current_pace_secs_per_km <= 0.0 {
        return None;
    }
    if !distance_to_next_km.is_finite() || distance_to_next_km < 0.0 {
        return None;
    }
    let remaining_secs = distance_to_next_km * current_pace_secs_per_km;
    Duration::try_from_secs_f64(elapsed.as_secs_f64() + remaining_secs).ok()
}

/// Projected finish time assuming the average pace so far holds.
///
/// Only computed once `along_route_distance_km` reaches `minimum_distance_km`,
/// the clock is running and the course length is known.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use courseguide::estimate::projected_finish_time;
///
/// // 10 km in an hour on a 50 km course
/// let finish = projected_finish_time(Duration::from_secs(3600), 10.0, 50.0, 0.5);
/// assert_eq!(finish, Some(Duration::from_secs(18_000)));
/// ```
pub fn projected_finish_time(
    elapsed: Duration,
    along_route_distance_km: f64,
    total_distance_km: f64,
    minimum_distance_km: f64,
) -> Option<Duration> {
    if !total_distance_km.is_finite() || total_distance_km <= 0.0 {
        return None;
    }
    if along_route_distance_km < minimum_distance_km {
        return None;
    }
    let average_pace = average_pace_secs_per_km(elapsed, along_route_distance_km)?;
    let remaining_km = (total_distance_km - along_route_distance_km).max(0.0);
    Duration::try_from_secs_f64(elapsed.as_secs_f64() + remaining_km * average_pace).ok()
}

/// Signed difference in seconds between an actual and a planned time.
/// Positive means behind plan.
pub fn time_delta_secs(actual: Duration, predicted: Duration) -> f64 {
    actual.as_secs_f64() - predicted.as_secs_f64()
}
