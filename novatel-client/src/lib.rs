//! novatel-client: TCP ingestion worker and time-aligned pose queries.
//!
//! A [`NovatelClient`] owns one background thread that reads the receiver's
//! ASCII stream, parses `#BESTPOSA` / `#INSPVA` logs, and updates a shared
//! fusion state. Callers read the latest position paired with the heading
//! nearest to it in time.
//!
//! There is no automatic reconnection: when the worker stops, the last pose
//! stays frozen. Use [`NovatelClient::state`], [`NovatelClient::last_exit`]
//! and [`Pose::is_stale`](novatel_core::Pose::is_stale) to detect it.

mod client;
mod status;
mod worker;

pub use client::NovatelClient;
pub use status::{WorkerExit, WorkerState};
pub use worker::connect;
