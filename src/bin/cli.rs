//! courseguide CLI - Replay tool for course guidance
//!
//! Usage:
//!   courseguide-cli replay <course.gpx> <track.gpx> [--checkpoints <file.json>]
//!   courseguide-cli race <distances.json> --checkpoints <file.json>
//!
//! Feeds a recorded track (or a list of cumulative distances) through a
//! guidance tracker and prints checkpoint crossings, off-course transitions
//! and the final snapshot, to check tracker behaviour against real courses.

use clap::{Parser, Subcommand};
use courseguide::{
    Checkpoint, CheckpointList, GeoPoint, GuidanceConfig, GuidanceEvent, GuidanceEventSink,
    GuidanceTracker, Route, RouteConfig, geo_utils::haversine_distance,
};
use gpx::{Gpx, read};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "courseguide-cli")]
#[command(about = "Replay recorded tracks through the course guidance tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a GPX track against a GPX course
    Replay {
        /// GPX file with the reference course
        course: PathBuf,

        /// GPX file with the recorded track
        track: PathBuf,

        /// JSON file with checkpoints
        #[arg(short, long)]
        checkpoints: Option<PathBuf>,

        /// Seconds between track points
        #[arg(long, default_value = "1.0")]
        interval: f64,

        /// Off-course threshold in meters
        #[arg(long, default_value = "70")]
        threshold: f64,

        /// Search window in segments around the previous match
        #[arg(long)]
        window: Option<usize>,

        /// Douglas-Peucker tolerance for the course, in degrees
        #[arg(long, default_value = "0.0")]
        simplify: f64,
    },

    /// Replay cumulative distances (distance-only mode)
    Race {
        /// JSON array of cumulative distances in km, one per sample
        distances: PathBuf,

        /// JSON file with checkpoints
        #[arg(short, long)]
        checkpoints: PathBuf,

        /// Seconds between samples
        #[arg(long, default_value = "1.0")]
        interval: f64,

        /// Course length in km
        #[arg(long)]
        total: Option<f64>,
    },
}

/// Checkpoint entry as written in checkpoint files.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckpointEntry {
    id: String,
    name: String,
    distance_km: f64,
    #[serde(default)]
    elevation_m: Option<f64>,
    #[serde(default)]
    aid_station: bool,
    /// Planned arrival in seconds from the start
    #[serde(default)]
    predicted_secs: Option<f64>,
}

impl CheckpointEntry {
    fn into_checkpoint(self) -> Checkpoint {
        let mut cp = Checkpoint::new(&self.id, &self.name, self.distance_km);
        if self.aid_station {
            cp = cp.with_aid_station();
        }
        if let Some(elevation) = self.elevation_m {
            cp = cp.with_elevation(elevation);
        }
        if let Some(secs) = self.predicted_secs.and_then(|s| Duration::try_from_secs_f64(s).ok()) {
            cp = cp.with_predicted_time(secs);
        }
        cp
    }
}

/// Prints guidance events as they happen.
struct PrintSink;

impl GuidanceEventSink for PrintSink {
    fn on_event(&self, event: &GuidanceEvent) {
        match event {
            GuidanceEvent::CheckpointCrossed(crossing) => {
                let delta = crossing
                    .delta_secs
                    .map(|d| format!(" ({:+.0}s vs plan)", d))
                    .unwrap_or_default();
                println!(
                    "  [CP] {} at {:.2}km, {}{}",
                    crossing.checkpoint.name,
                    crossing.checkpoint.distance_from_start_km,
                    format_duration(crossing.actual_time),
                    delta
                );
            }
            GuidanceEvent::WentOffCourse { deviation_km } => {
                println!("  [OFF] {:.0}m from course", deviation_km * 1000.0);
            }
            GuidanceEvent::BackOnCourse => println!("  [ON] back on course"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Replay { interval, .. } | Commands::Race { interval, .. }
            if !interval.is_finite() || interval <= 0.0 =>
        {
            Err(format!("--interval must be > 0, got {}", interval))
        }
        Commands::Replay {
            course,
            track,
            checkpoints,
            interval,
            threshold,
            window,
            simplify,
        } => {
            let config = GuidanceConfig {
                off_course_threshold_km: threshold / 1000.0,
                projection_window_segments: window,
                ..GuidanceConfig::default()
            };
            run_replay(
                &course,
                &track,
                checkpoints.as_deref(),
                interval,
                simplify,
                config,
            )
        }
        Commands::Race {
            distances,
            checkpoints,
            interval,
            total,
        } => {
            let config = GuidanceConfig {
                total_distance_km: total,
                ..GuidanceConfig::default()
            };
            run_race(&distances, &checkpoints, interval, config)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERR] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_replay(
    course_path: &Path,
    track_path: &Path,
    checkpoints_path: Option<&Path>,
    interval: f64,
    simplify: f64,
    config: GuidanceConfig,
) -> Result<(), String> {
    let course_points = load_gpx_points(course_path)?;
    let track_points = load_gpx_points(track_path)?;
    let checkpoints = match checkpoints_path {
        Some(path) => load_checkpoints(path)?,
        None => CheckpointList::empty(),
    };

    let route_config = RouteConfig {
        simplification_tolerance: simplify,
    };
    let route = Route::from_points(&file_id(course_path), &course_points, &route_config)
        .map_err(|e| e.to_string())?;

    println!("\n{}", "=".repeat(60));
    println!(
        "Course: {} points -> {} vertices, {:.2}km",
        course_points.len(),
        route.vertices().len(),
        route.total_distance_km()
    );
    println!("Track:  {} points, {} checkpoints", track_points.len(), checkpoints.len());
    println!("{}", "=".repeat(60));

    let mut tracker = GuidanceTracker::new(Some(route), checkpoints, config)
        .map_err(|e| e.to_string())?
        .with_event_sink(Arc::new(PrintSink));

    let mut pace = RollingPace::new(10);
    let mut previous: Option<GeoPoint> = None;
    let start = std::time::Instant::now();

    for (i, point) in track_points.iter().enumerate() {
        let step_km = previous
            .map(|p| haversine_distance(&p, point) / 1000.0)
            .unwrap_or(0.0);
        previous = Some(*point);
        let elapsed = Duration::from_secs_f64(i as f64 * interval);
        tracker.tick(point, elapsed, pace.push(step_km, interval));
    }

    println!(
        "\nReplayed {} samples in {:?}",
        track_points.len(),
        start.elapsed()
    );
    print_summary(&tracker)
}

fn run_race(
    distances_path: &Path,
    checkpoints_path: &Path,
    interval: f64,
    config: GuidanceConfig,
) -> Result<(), String> {
    let content = fs::read_to_string(distances_path).map_err(|e| e.to_string())?;
    let distances: Vec<f64> = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    let checkpoints = load_checkpoints(checkpoints_path)?;

    let mut tracker = GuidanceTracker::distance_only(checkpoints, config)
        .map_err(|e| e.to_string())?
        .with_event_sink(Arc::new(PrintSink));

    let mut pace = RollingPace::new(10);
    let mut previous = 0.0;
    for (i, distance) in distances.iter().enumerate() {
        let step_km = (distance - previous).max(0.0);
        previous = *distance;
        let elapsed = Duration::from_secs_f64(i as f64 * interval);
        tracker.tick_distance(*distance, elapsed, pace.push(step_km, interval));
    }

    print_summary(&tracker)
}

fn print_summary(tracker: &GuidanceTracker) -> Result<(), String> {
    println!("\nSplits:");
    for split in tracker.checkpoint_splits() {
        println!(
            "  {:<20} {:>7.2}km  {}",
            split.name,
            split.distance_from_start_km,
            format_duration(split.actual_time)
        );
    }

    let snapshot = tracker.snapshot();
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
    println!("\nFinal snapshot:\n{}", json);
    Ok(())
}

/// Pace in seconds per km over the last `capacity` steps.
struct RollingPace {
    steps: VecDeque<(f64, f64)>,
    capacity: usize,
}

impl RollingPace {
    fn new(capacity: usize) -> Self {
        Self {
            steps: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a step and return the current pace (infinite while standing still).
    fn push(&mut self, km: f64, secs: f64) -> f64 {
        if self.steps.len() == self.capacity {
            self.steps.pop_front();
        }
        self.steps.push_back((km, secs));
        let (km, secs) = self
            .steps
            .iter()
            .fold((0.0, 0.0), |(k, s), (dk, ds)| (k + dk, s + ds));
        if km <= 0.0 { f64::INFINITY } else { secs / km }
    }
}

/// Extract all track (or route) points from a GPX file
fn load_gpx_points(path: &Path) -> Result<Vec<GeoPoint>, String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let reader = BufReader::new(file);
    let gpx: Gpx = read(reader).map_err(|e| format!("{}: {}", path.display(), e))?;

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for pt in &segment.points {
                points.push(to_geo_point(pt));
            }
        }
    }
    // Planned courses are often exported as <rte> instead of <trk>
    for route in &gpx.routes {
        for pt in &route.points {
            points.push(to_geo_point(pt));
        }
    }

    if points.is_empty() {
        return Err(format!("{}: no track points found", path.display()));
    }
    Ok(points)
}

fn to_geo_point(pt: &gpx::Waypoint) -> GeoPoint {
    let p = pt.point();
    GeoPoint {
        latitude: p.y(),
        longitude: p.x(),
        elevation_m: pt.elevation,
        timestamp: None,
    }
}

fn load_checkpoints(path: &Path) -> Result<CheckpointList, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let entries: Vec<CheckpointEntry> =
        serde_json::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))?;
    CheckpointList::new(entries.into_iter().map(CheckpointEntry::into_checkpoint).collect())
        .map_err(|e| e.to_string())
}

fn file_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("course")
        .to_string()
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
