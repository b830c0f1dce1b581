//! Fuses position and attitude reports into a time-aligned pose.
//!
//! Pure logic, no I/O: the caller stamps each sentence with its arrival time
//! and hands it to [`FusionState::update`]. [`FusionState::get_pose`] pairs
//! the latest position with the heading sample nearest to it in time.

use crate::history::HeadingHistory;
use crate::pose::{Pose, PoseState};
use crate::sentence::Sentence;
use crate::types::HeadingSample;

/// Default maximum |heading time - position time|, in seconds.
pub const DEFAULT_MAX_HEADING_SKEW: f64 = 0.05;

/// What an [`update`](FusionState::update) changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FusionUpdate {
    Position { latitude: f64, longitude: f64 },
    Heading { heading: f64 },
}

/// Running counters for a fusion session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    pub positions: u64,
    pub headings: u64,
    pub ignored: u64,
}

/// Position slot plus heading history, guarded together by the client lock.
#[derive(Debug, Clone)]
pub struct FusionState {
    max_heading_skew: f64,
    pose: PoseState,
    headings: HeadingHistory,
    stats: FusionStats,
}

impl FusionState {
    pub fn new(max_heading_skew: f64, heading_window: f64) -> Self {
        FusionState {
            max_heading_skew,
            pose: PoseState::new(),
            headings: HeadingHistory::new(heading_window),
            stats: FusionStats::default(),
        }
    }

    /// Apply one parsed sentence received at `arrival` (UNIX seconds).
    ///
    /// Fix sentences do not feed the fusion and are counted as ignored.
    pub fn update(&mut self, sentence: &Sentence, arrival: f64) -> Option<FusionUpdate> {
        match sentence {
            Sentence::Position(p) => {
                self.pose.set_position(p.latitude, p.longitude, arrival);
                self.stats.positions += 1;
                Some(FusionUpdate::Position {
                    latitude: p.latitude,
                    longitude: p.longitude,
                })
            }
            Sentence::Attitude(a) => {
                self.headings.record(HeadingSample::new(arrival, a.heading));
                self.stats.headings += 1;
                Some(FusionUpdate::Heading { heading: a.heading })
            }
            Sentence::Fix(_) => {
                self.stats.ignored += 1;
                None
            }
        }
    }

    /// Best time-matched pose.
    ///
    /// - No position yet: `None`.
    /// - No heading buffered, or the nearest one is more than
    ///   `max_heading_skew` away from the position: position only.
    /// - Otherwise: position with the nearest heading.
    pub fn get_pose(&self) -> Option<Pose> {
        let position = self.pose.current_position()?;
        let heading = self
            .headings
            .nearest(position.captured_at)
            .filter(|h| h.distance_to(position.captured_at) <= self.max_heading_skew)
            .copied();
        Some(Pose { position, heading })
    }

    /// Forget position, headings and counters.
    pub fn reset(&mut self) {
        self.pose.clear();
        self.headings.clear();
        self.stats = FusionStats::default();
    }

    pub fn headings(&self) -> &HeadingHistory {
        &self.headings
    }

    pub fn stats(&self) -> FusionStats {
        self.stats
    }
}

impl Default for FusionState {
    fn default() -> Self {
        FusionState::new(
            DEFAULT_MAX_HEADING_SKEW,
            crate::history::DEFAULT_HEADING_WINDOW,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::pose_tuple;
    use crate::sentence::classify;

    const POSITION: &str = "#BESTPOSA,COM1,0,83.5,FINESTEERING,2167,244820.000,02000000,b1f6,16248;\
        SOL_COMPUTED,NARROW_INT,31.12345600,121.65432100,12.3456,-9.1000,WGS84*6a3f2c8e";

    fn attitude(heading: f64) -> Sentence {
        let line = format!("#INSPVAXA,COM1;INS_SOLUTION_GOOD,INS_RTKFIXED,0,0,0,0,0,0,0,0,0,{heading}*00");
        classify(&line).expect("valid attitude")
    }

    fn position() -> Sentence {
        classify(POSITION).expect("valid position")
    }

    #[test]
    fn test_no_position_is_all_absent() {
        let mut state = FusionState::default();
        assert!(state.get_pose().is_none());

        // Heading alone does not produce a pose.
        state.update(&attitude(45.5), 100.0);
        assert_eq!(pose_tuple(state.get_pose().as_ref()), (None, None, None));
    }

    #[test]
    fn test_position_before_any_heading() {
        let mut state = FusionState::default();
        state.update(&position(), 100.0);
        assert_eq!(
            pose_tuple(state.get_pose().as_ref()),
            (Some(31.123456), Some(121.654321), None)
        );
    }

    #[test]
    fn test_heading_within_skew() {
        let mut state = FusionState::new(0.05, 2.0);
        state.update(&position(), 100.00);
        state.update(&attitude(45.5), 100.02);

        let pose = state.get_pose().unwrap();
        assert_eq!(pose.heading_deg(), Some(45.5));
        assert_eq!(pose.latitude(), 31.123456);
        assert_eq!(pose.longitude(), 121.654321);
    }

    #[test]
    fn test_heading_outside_skew_suppressed() {
        let mut state = FusionState::new(0.05, 2.0);
        state.update(&position(), 100.00);
        state.update(&attitude(45.5), 100.20);

        let pose = state.get_pose().unwrap();
        assert_eq!(pose.latitude(), 31.123456);
        assert!(pose.heading.is_none());
    }

    #[test]
    fn test_nearest_heading_selected() {
        let mut state = FusionState::new(0.05, 2.0);
        state.update(&attitude(10.0), 99.90);
        state.update(&attitude(20.0), 99.98);
        state.update(&position(), 100.00);
        state.update(&attitude(30.0), 100.03);

        assert_eq!(state.get_pose().unwrap().heading_deg(), Some(20.0));
    }

    #[test]
    fn test_heading_at_skew_boundary() {
        let mut state = FusionState::new(0.5, 2.0);
        state.update(&position(), 100.0);
        state.update(&attitude(45.5), 100.5);
        assert_eq!(state.get_pose().unwrap().heading_deg(), Some(45.5));

        // Just past the boundary the heading is suppressed.
        state.update(&position(), 99.999);
        assert!(state.get_pose().unwrap().heading.is_none());
    }

    #[test]
    fn test_malformed_position_keeps_previous() {
        let mut state = FusionState::default();
        state.update(&position(), 100.0);

        for bad in [
            "#BESTPOSA,COM1;SOL_COMPUTED,SINGLE*00",
            "#BESTPOSA,COM1;SOL_COMPUTED,SINGLE,abc,121.0*00",
        ] {
            if let Some(sentence) = classify(bad) {
                state.update(&sentence, 100.5);
            }
        }
        let pose = state.get_pose().unwrap();
        assert_eq!(pose.latitude(), 31.123456);
        assert_eq!(pose.position.captured_at, 100.0);
        assert_eq!(state.stats().positions, 1);

        let next = classify("#BESTPOSA,COM1;SOL_COMPUTED,SINGLE,32.5,122.25,10.0*00").unwrap();
        state.update(&next, 101.0);
        let pose = state.get_pose().unwrap();
        assert_eq!(pose.latitude(), 32.5);
        assert_eq!(pose.longitude(), 122.25);
        assert_eq!(pose.position.captured_at, 101.0);
    }

    #[test]
    fn test_fix_sentence_ignored() {
        let mut state = FusionState::default();
        let fix = classify("$GPGGA,024520.00,3107.40736,N,12139.25926,E,4,28,0.6,12.35,M,-9.10,M,1.0,0000*6B")
            .unwrap();
        assert!(state.update(&fix, 100.0).is_none());
        assert!(state.get_pose().is_none());
        assert_eq!(state.stats().ignored, 1);
    }

    #[test]
    fn test_heading_window_applied() {
        let mut state = FusionState::new(0.05, 2.0);
        state.update(&attitude(10.0), 100.0);
        state.update(&attitude(20.0), 103.0);
        assert_eq!(state.headings().len(), 1);

        // The pruned sample cannot align with an old position.
        state.update(&position(), 100.0);
        assert!(state.get_pose().unwrap().heading.is_none());
    }

    #[test]
    fn test_reset() {
        let mut state = FusionState::default();
        state.update(&position(), 100.0);
        state.update(&attitude(1.0), 100.0);
        state.reset();
        assert!(state.get_pose().is_none());
        assert!(state.headings().is_empty());
        assert_eq!(state.stats(), FusionStats::default());
    }

    #[test]
    fn test_stats() {
        let mut state = FusionState::default();
        state.update(&position(), 100.0);
        state.update(&attitude(1.0), 100.0);
        state.update(&attitude(2.0), 100.1);
        assert_eq!(
            state.stats(),
            FusionStats {
                positions: 1,
                headings: 2,
                ignored: 0
            }
        );
    }
}
