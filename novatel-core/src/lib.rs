//! novatel-core: line splitting, sentence parsing and pose alignment for
//! NovAtel GPS/INS receivers.
//!
//! No sockets and no threads, only algorithms. `novatel-client` drives these
//! from a TCP ingestion worker; `novatel-cli` uses the parsers directly for
//! stream diagnostics.

pub mod config;
pub mod frame;
pub mod fusion;
pub mod history;
pub mod pose;
pub mod sentence;
pub mod types;

// Re-export commonly used types at crate root
pub use config::ClientConfig;
pub use frame::FrameSplitter;
pub use fusion::{FusionState, FusionStats, FusionUpdate};
pub use history::HeadingHistory;
pub use pose::{pose_tuple, Pose, PoseState};
pub use sentence::{classify, Sentence};
pub use types::*;
