//! Latest-position slot and the aligned pose record.

use serde::Serialize;

use crate::types::{HeadingSample, PositionSample};

/// Single latest position. New fixes overwrite it, no history is kept.
#[derive(Debug, Clone, Default)]
pub struct PoseState {
    position: Option<PositionSample>,
}

impl PoseState {
    pub fn new() -> Self {
        PoseState::default()
    }

    /// Overwrite the stored position unconditionally.
    pub fn set_position(&mut self, latitude: f64, longitude: f64, at: f64) {
        self.position = Some(PositionSample {
            latitude,
            longitude,
            captured_at: at,
        });
    }

    pub fn current_position(&self) -> Option<PositionSample> {
        self.position
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn clear(&mut self) {
        self.position = None;
    }
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// A position paired with the heading sample aligned to it, if any.
///
/// `heading` is `None` when no heading is buffered or the nearest one is
/// further than the allowed skew from the position timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub position: PositionSample,
    pub heading: Option<HeadingSample>,
}

impl Pose {
    pub fn latitude(&self) -> f64 {
        self.position.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.position.longitude
    }

    /// Heading in degrees.
    pub fn heading_deg(&self) -> Option<f64> {
        self.heading.map(|h| h.heading)
    }

    pub fn has_heading(&self) -> bool {
        self.heading.is_some()
    }

    /// Time between the position and its aligned heading, in seconds.
    pub fn skew(&self) -> Option<f64> {
        self.heading.map(|h| h.distance_to(self.position.captured_at))
    }

    /// Seconds since the position arrived.
    pub fn age(&self, now: f64) -> f64 {
        now - self.position.captured_at
    }

    /// True once the position is older than `max_age` seconds.
    ///
    /// The ingestion worker stops silently on connection loss, leaving the
    /// last pose frozen; this is how callers tell a frozen pose from a live one.
    pub fn is_stale(&self, now: f64, max_age: f64) -> bool {
        self.age(now) > max_age
    }

    /// `(latitude, longitude, heading)` triple.
    pub fn as_tuple(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        (
            Some(self.position.latitude),
            Some(self.position.longitude),
            self.heading_deg(),
        )
    }
}

/// Triple form of an optional pose: all-absent when there is no position.
pub fn pose_tuple(pose: Option<&Pose>) -> (Option<f64>, Option<f64>, Option<f64>) {
    match pose {
        Some(p) => p.as_tuple(),
        None => (None, None, None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
