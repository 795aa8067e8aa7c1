//! Ordered checkpoints and aid stations.
//!
//! The same list drives both route mode and distance-only mode. It is sorted
//! by distance from start once at construction; every lookup relies on that
//! order.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CourseError, Result};

/// A named marker along the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: String,
    pub name: String,
    /// Distance from the start in km
    pub distance_from_start_km: f64,
    /// Elevation in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
    #[serde(default)]
    pub has_aid_station: bool,
    /// Planned arrival time, measured from the start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_time: Option<Duration>,
}

impl Checkpoint {
    pub fn new(id: &str, name: &str, distance_from_start_km: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            distance_from_start_km,
            elevation_m: None,
            has_aid_station: false,
            predicted_time: None,
        }
    }

    pub fn with_aid_station(mut self) -> Self {
        self.has_aid_station = true;
        self
    }

    pub fn with_elevation(mut self, elevation_m: f64) -> Self {
        self.elevation_m = Some(elevation_m);
        self
    }

    pub fn with_predicted_time(mut self, predicted_time: Duration) -> Self {
        self.predicted_time = Some(predicted_time);
        self
    }
}

/// Checkpoints sorted by ascending distance from start.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckpointList {
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointList {
    /// Validate and sort checkpoints.
    ///
    /// Rejects non-finite or negative distances and duplicate ids. Checkpoints
    /// at equal distance keep their input order.
    pub fn new(mut checkpoints: Vec<Checkpoint>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(checkpoints.len());
        for cp in &checkpoints {
            if !cp.distance_from_start_km.is_finite() || cp.distance_from_start_km < 0.0 {
                return Err(CourseError::checkpoint(
                    &cp.id,
                    format!(
                        "distance from start must be a finite value >= 0, got {}",
                        cp.distance_from_start_km
                    ),
                ));
            }
            if !seen.insert(cp.id.as_str()) {
                return Err(CourseError::checkpoint(&cp.id, "duplicate checkpoint id"));
            }
        }

        checkpoints.sort_by(|a, b| a.distance_from_start_km.total_cmp(&b.distance_from_start_km));
        Ok(Self { checkpoints })
    }

    /// An empty list.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|cp| cp.id == id)
    }

    /// The closest checkpoint not yet crossed.
    pub fn first_not_in(&self, crossed: &HashSet<String>) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|cp| !crossed.contains(&cp.id))
    }

    /// Checkpoints at or before `distance_km` that are not yet crossed, in
    /// ascending distance order.
    pub fn newly_crossed<'a>(
        &'a self,
        distance_km: f64,
        crossed: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a Checkpoint> + 'a {
        self.checkpoints
            .iter()
            .take_while(move |cp| cp.distance_from_start_km <= distance_km)
            .filter(move |cp| !crossed.contains(&cp.id))
    }
}

impl<'a> IntoIterator for &'a CheckpointList {
    type Item = &'a Checkpoint;
    type IntoIter = std::slice::Iter<'a, Checkpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.checkpoints.iter()
    }
}
