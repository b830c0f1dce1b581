//! Time-windowed heading buffer.
//!
//! Samples are appended at the tail in arrival order and pruned from the head
//! once they are older than the window, measured against the newest recorded
//! timestamp rather than the wall clock, so pruning is deterministic for a
//! given sequence of inserts.

use std::collections::VecDeque;

use crate::types::HeadingSample;

/// Default maximum heading age, in seconds.
pub const DEFAULT_HEADING_WINDOW: f64 = 2.0;

/// Heading samples no older than `window` seconds relative to the newest one.
#[derive(Debug, Clone)]
pub struct HeadingHistory {
    window: f64,
    samples: VecDeque<HeadingSample>,
}

impl HeadingHistory {
    pub fn new(window: f64) -> Self {
        HeadingHistory {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Append a sample, then prune relative to its timestamp.
    pub fn record(&mut self, sample: HeadingSample) {
        let now = sample.captured_at;
        self.samples.push_back(sample);
        self.prune(now);
    }

    /// Drop head samples older than the window relative to `now`.
    pub fn prune(&mut self, now: f64) {
        while let Some(front) = self.samples.front() {
            if now - front.captured_at > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Sample whose timestamp is closest to `target`.
    ///
    /// Linear scan in insertion order; on a tie the earlier sample wins.
    pub fn nearest(&self, target: f64) -> Option<&HeadingSample> {
        let mut best: Option<(&HeadingSample, f64)> = None;
        for sample in &self.samples {
            let dt = sample.distance_to(target);
            match best {
                Some((_, best_dt)) if dt >= best_dt => {}
                _ => best = Some((sample, dt)),
            }
        }
        best.map(|(sample, _)| sample)
    }

    /// Most recently recorded sample.
    pub fn latest(&self) -> Option<&HeadingSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeadingSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for HeadingHistory {
    fn default() -> Self {
        HeadingHistory::new(DEFAULT_HEADING_WINDOW)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
