//! Guidance events for haptic/voice/notification collaborators.
//!
//! Sinks are fire-and-forget: the tracker calls them synchronously from
//! inside `tick` and ignores what they do with the event.

use std::sync::Mutex;

use super::state::CheckpointCrossing;

/// Events emitted while ticking a tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum GuidanceEvent {
    /// A checkpoint was reached for the first time.
    CheckpointCrossed(CheckpointCrossing),
    /// Deviation rose above the off-course threshold.
    WentOffCourse { deviation_km: f64 },
    /// Deviation dropped back to or below the threshold.
    BackOnCourse,
}

impl GuidanceEvent {
    /// Short event name, e.g. for analytics or notification channels.
    pub fn as_str(&self) -> &'static str {
        match self {
            GuidanceEvent::CheckpointCrossed(_) => "checkpoint_crossed",
            GuidanceEvent::WentOffCourse { .. } => "off_course",
            GuidanceEvent::BackOnCourse => "back_on_course",
        }
    }
}

/// Receiver for guidance events.
///
/// Implementations must be thread-safe so a tracker can move between threads
/// with its sink attached.
pub trait GuidanceEventSink: Send + Sync {
    fn on_event(&self, event: &GuidanceEvent);
}

/// Sink that drops every event.
pub struct NoopSink;

impl GuidanceEventSink for NoopSink {
    fn on_event(&self, _event: &GuidanceEvent) {}
}

/// Sink that keeps every event in memory.
/// Useful for testing and as a reference implementation.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GuidanceEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event received so far, oldest first.
    pub fn events(&self) -> Vec<GuidanceEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Remove and return every event received so far.
    pub fn take(&self) -> Vec<GuidanceEvent> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl GuidanceEventSink for RecordingSink {
    fn on_event(&self, event: &GuidanceEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
