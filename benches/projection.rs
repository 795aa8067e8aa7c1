//! Performance benchmarks for route projection and the guidance tracker.
//!
//! Run with: `cargo bench --features synthetic`
//!
//! Courses and traces come from the deterministic synthetic generator, so
//! numbers are comparable between runs.

use std::time::Duration;

use courseguide::synthetic::{CoursePattern, SyntheticCourse, SyntheticRunner};
use courseguide::{
    Checkpoint, CheckpointList, GeoPoint, GuidanceConfig, GuidanceTracker, Route, RouteConfig,
    project, project_windowed,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

// ============================================================================
// Fixtures
// ============================================================================

/// Winding course of `km` kilometers with a vertex every 20 meters.
fn course(km: f64) -> Route {
    let points = SyntheticCourse {
        origin: GeoPoint::new(45.92, 6.87),
        length_meters: km * 1000.0,
        pattern: CoursePattern::Winding,
        point_spacing_meters: 20.0,
        seed: 42,
    }
    .generate();
    Route::from_points("bench", &points, &RouteConfig::default()).unwrap()
}

/// Aid stations every 10 km.
fn aid_stations(route: &Route) -> CheckpointList {
    let count = (route.total_distance_km() / 10.0) as usize;
    let checkpoints = (1..=count)
        .map(|i| Checkpoint::new(&format!("cp{}", i), &format!("Aid {}", i), i as f64 * 10.0))
        .collect();
    CheckpointList::new(checkpoints).unwrap()
}

// ============================================================================
// Benchmarks
// ============================================================================

/// Single projection: full scan vs windowed search, by course length.
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for km in [10, 50, 170].iter() {
        let route = course(*km as f64);
        let midway = route.total_distance_km() / 2.0;
        let position = route.point_at_distance(midway);
        let hint = route.segment_count() / 2;

        group.bench_with_input(BenchmarkId::new("full_scan", km), &route, |b, r| {
            b.iter(|| project(black_box(&position), r, Some(hint)))
        });

        group.bench_with_input(BenchmarkId::new("windowed_50", km), &route, |b, r| {
            b.iter(|| project_windowed(black_box(&position), r, hint, 50, 0.07))
        });
    }

    group.finish();
}

/// Replay a whole 50 km race at one fix every 5 seconds.
fn bench_tracker_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_replay");
    group.sample_size(10); // Fewer samples for slow operations

    let route = course(50.0);
    let trace = SyntheticRunner {
        pace_secs_per_km: 420.0,
        sample_interval_secs: 5.0,
        gps_noise_sigma_meters: 4.0,
        seed: 7,
    }
    .run(&route);

    for window in [None, Some(50)] {
        let config = GuidanceConfig {
            projection_window_segments: window,
            ..GuidanceConfig::default()
        };
        let label = window.map_or("full_scan".to_string(), |w| format!("windowed_{}", w));

        group.bench_function(BenchmarkId::new("race_50km", label), |b| {
            b.iter(|| {
                let mut tracker =
                    GuidanceTracker::new(Some(route.clone()), aid_stations(&route), config.clone())
                        .unwrap();
                for sample in &trace {
                    tracker.tick(black_box(&sample.position), sample.elapsed, sample.pace_secs_per_km);
                }
                tracker.snapshot()
            })
        });
    }

    group.finish();
}

/// Distance-only ticks, the race mode without course geometry.
fn bench_distance_only(c: &mut Criterion) {
    let route = course(50.0);
    let checkpoints = aid_stations(&route);

    c.bench_function("distance_only_10k_ticks", |b| {
        b.iter(|| {
            let mut tracker =
                GuidanceTracker::distance_only(checkpoints.clone(), GuidanceConfig::default())
                    .unwrap();
            for i in 0..10_000u64 {
                tracker.tick_distance(
                    black_box(i as f64 * 0.005),
                    Duration::from_secs(i * 2),
                    400.0,
                );
            }
            tracker.snapshot()
        })
    });
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_projection,
    bench_tracker_replay,
    bench_distance_only,
);

criterion_main!(benches);
