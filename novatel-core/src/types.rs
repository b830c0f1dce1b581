//! Shared types, error enum, and sample records for novatel-core.

use serde::Serialize;
use thiserror::Error;

/// All errors produced by novatel-core and novatel-client.
#[derive(Debug, Error)]
pub enum NovatelError {
    #[error("line exceeds {limit} bytes without a terminator")]
    LineTooLong { limit: usize },
    #[error("config error: {0}")]
    Config(String),
    #[error("could not resolve {0}")]
    Resolve(String),
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn ingestion worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NovatelError>;

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// Latest position fix, stamped with its arrival time (UNIX seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: f64,
}

/// One heading/azimuth reading in degrees, stamped with its arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadingSample {
    pub captured_at: f64,
    pub heading: f64,
}

impl HeadingSample {
    pub fn new(captured_at: f64, heading: f64) -> Self {
        HeadingSample {
            captured_at,
            heading,
        }
    }

    /// Absolute time distance from `target`.
    pub fn distance_to(&self, target: f64) -> f64 {
        (self.captured_at - target).abs()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Current wall-clock time as UNIX seconds.
pub fn now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
