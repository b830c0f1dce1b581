//! Public client: start/stop the ingestion worker, query the aligned pose.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use novatel_core::types::{NovatelError, Result};
use novatel_core::{ClientConfig, FusionState, FusionStats, Pose};
use tracing::{debug, warn};

use crate::status::{Shared, WorkerExit, WorkerState};
use crate::worker::Worker;

struct WorkerHandle {
    thread: JoinHandle<WorkerExit>,
    cancel: Arc<AtomicBool>,
    done: mpsc::Receiver<()>,
}

/// Time-aligned pose client for one receiver connection.
///
/// One background thread reads the stream; any number of threads may call
/// [`get_pose`](NovatelClient::get_pose) concurrently.
///
/// ```ignore
/// let client = NovatelClient::new(ClientConfig::default().with_max_heading_skew(0.05))?;
/// client.start()?;
/// if let Some(pose) = client.get_pose() {
///     println!("{:.8} {:.8} {:?}", pose.latitude(), pose.longitude(), pose.heading_deg());
/// }
/// client.stop();
/// ```
pub struct NovatelClient {
    config: Arc<ClientConfig>,
    shared: Arc<Shared>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl NovatelClient {
    /// Build a client. Does not connect until [`start`](Self::start).
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let fusion = FusionState::new(config.max_heading_skew, config.heading_window);
        Ok(NovatelClient {
            config: Arc::new(config),
            shared: Arc::new(Shared::new(fusion)),
            worker: Mutex::new(None),
        })
    }

    /// Start ingestion.
    ///
    /// Returns `Ok(false)` without doing anything while a previous worker is
    /// still alive, including one that was asked to stop but has not exited.
    pub fn start(&self) -> Result<bool> {
        let mut slot = self.worker_slot();

        if let Some(handle) = slot.as_ref() {
            if !handle.thread.is_finished() {
                debug!("Ingestion worker already running");
                return Ok(false);
            }
        }
        if let Some(handle) = slot.take() {
            // Exited on its own; reap it.
            let _ = handle.thread.join();
        }

        if self.config.reset_on_start {
            self.shared.fusion().reset();
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel();
        let worker = Worker::new(
            Arc::clone(&self.config),
            Arc::clone(&self.shared),
            Arc::clone(&cancel),
        );

        self.shared.begin();
        let spawned = thread::Builder::new()
            .name("novatel-ingest".into())
            .spawn(move || {
                let exit = worker.run();
                let _ = done_tx.send(());
                exit
            });

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                self.shared.finish(WorkerExit::Failed(e.to_string()));
                return Err(NovatelError::Spawn(e));
            }
        };

        *slot = Some(WorkerHandle {
            thread,
            cancel,
            done: done_rx,
        });
        Ok(true)
    }

    /// Request shutdown and wait up to `stop_grace` for the worker to exit.
    ///
    /// Returning means the stop was requested, not that the thread is gone:
    /// a worker still blocked past the grace period is left to finish on its
    /// own and `start()` stays a no-op until it does. Safe to call when the
    /// client was never started.
    pub fn stop(&self) {
        let mut slot = self.worker_slot();
        let Some(handle) = slot.take() else {
            return;
        };

        handle.cancel.store(true, Ordering::Release);
        match handle.done.recv_timeout(self.config.stop_grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.thread.join().is_err() {
                    warn!("Ingestion worker panicked");
                    self.shared.finish(WorkerExit::Failed("worker panicked".into()));
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    grace_ms = self.config.stop_grace.as_millis() as u64,
                    "Ingestion worker did not exit within grace period"
                );
                *slot = Some(handle);
            }
        }
    }

    /// Latest position paired with its time-aligned heading.
    ///
    /// `None` until the first position report arrives. Never blocks on I/O.
    pub fn get_pose(&self) -> Option<Pose> {
        self.shared.fusion().get_pose()
    }

    /// `(latitude, longitude, heading)` with absent values as `None`.
    pub fn get_pose_tuple(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        novatel_core::pose_tuple(self.get_pose().as_ref())
    }

    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// Why the most recent worker run ended, if it has.
    pub fn last_exit(&self) -> Option<WorkerExit> {
        self.shared.last_exit()
    }

    /// True while a worker is connecting or streaming.
    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    pub fn stats(&self) -> FusionStats {
        self.shared.fusion().stats()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<WorkerHandle>> {
        self.worker.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for NovatelClient {
    fn drop(&mut self) {
        self.stop();
    }
}
