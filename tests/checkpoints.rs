//! Tests for the checkpoint model

use std::collections::HashSet;
use std::time::Duration;

use courseguide::{Checkpoint, CheckpointList, CourseError};

fn ids<'a>(checkpoints: impl Iterator<Item = &'a Checkpoint>) -> Vec<&'a str> {
    checkpoints.map(|cp| cp.id.as_str()).collect()
}

#[test]
fn test_sorted_by_distance_at_construction() {
    let list = CheckpointList::new(vec![
        Checkpoint::new("c", "Col", 40.0),
        Checkpoint::new("a", "Aid 1", 10.0),
        Checkpoint::new("b", "Aid 2", 25.0),
    ])
    .unwrap();

    assert_eq!(ids(list.iter()), vec!["a", "b", "c"]);
    assert_eq!(list.len(), 3);
    assert!(!list.is_empty());
}

#[test]
fn test_equal_distances_keep_input_order() {
    let list = CheckpointList::new(vec![
        Checkpoint::new("start", "Start", 0.0),
        Checkpoint::new("timing", "Timing mat", 0.0),
    ])
    .unwrap();
    assert_eq!(ids(list.iter()), vec!["start", "timing"]);
}

#[test]
fn test_rejects_duplicate_ids() {
    let err = CheckpointList::new(vec![
        Checkpoint::new("a", "Aid 1", 10.0),
        Checkpoint::new("a", "Aid 1 again", 20.0),
    ])
    .unwrap_err();
    assert!(matches!(err, CourseError::InvalidCheckpoint { ref checkpoint_id, .. } if checkpoint_id == "a"));
}

#[test]
fn test_rejects_invalid_distances() {
    for distance in [f64::NAN, f64::INFINITY, -1.0] {
        let result = CheckpointList::new(vec![Checkpoint::new("x", "Bad", distance)]);
        assert!(
            matches!(result, Err(CourseError::InvalidCheckpoint { .. })),
            "distance {distance} should be rejected"
        );
    }
}

#[test]
fn test_first_not_in() {
    let list = CheckpointList::new(vec![
        Checkpoint::new("a", "Aid 1", 10.0),
        Checkpoint::new("b", "Aid 2", 25.0),
    ])
    .unwrap();

    let mut crossed = HashSet::new();
    assert_eq!(list.first_not_in(&crossed).unwrap().id, "a");
    crossed.insert("a".to_string());
    assert_eq!(list.first_not_in(&crossed).unwrap().id, "b");
    crossed.insert("b".to_string());
    assert!(list.first_not_in(&crossed).is_none());
}

#[test]
fn test_newly_crossed() {
    let list = CheckpointList::new(vec![
        Checkpoint::new("a", "Aid 1", 10.0),
        Checkpoint::new("b", "Aid 2", 25.0),
        Checkpoint::new("c", "Col", 40.0),
    ])
    .unwrap();

    let mut crossed = HashSet::new();
    assert_eq!(ids(list.newly_crossed(30.0, &crossed)), vec!["a", "b"]);
    // Inclusive at the marked distance
    assert_eq!(ids(list.newly_crossed(10.0, &crossed)), vec!["a"]);

    crossed.insert("a".to_string());
    assert_eq!(ids(list.newly_crossed(30.0, &crossed)), vec!["b"]);
    assert!(list.newly_crossed(5.0, &crossed).next().is_none());
}

#[test]
fn test_builders_and_lookup() {
    let cp = Checkpoint::new("a", "Aid 1", 10.0)
        .with_aid_station()
        .with_elevation(1450.0)
        .with_predicted_time(Duration::from_secs(3600));
    let list = CheckpointList::new(vec![cp.clone()]).unwrap();

    let found = list.get("a").unwrap();
    assert_eq!(found, &cp);
    assert!(found.has_aid_station);
    assert_eq!(found.elevation_m, Some(1450.0));
    assert_eq!(found.predicted_time, Some(Duration::from_secs(3600)));
    assert!(list.get("missing").is_none());
}

#[test]
fn test_empty_list() {
    let list = CheckpointList::empty();
    assert!(list.is_empty());
    assert!(list.first_not_in(&HashSet::new()).is_none());
}
