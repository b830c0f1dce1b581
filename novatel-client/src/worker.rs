//! Ingestion worker: owns the TCP connection and feeds the fusion state.
//!
//! One run is `Connecting → Streaming → Stopped`. The read deadline bounds
//! how long a stop request can go unnoticed. Any socket fault, a remote
//! close, or cancellation ends the run; there is no retry here.

use std::io::{ErrorKind, Read};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use novatel_core::types::{now, NovatelError, Result};
use novatel_core::{classify, ClientConfig, FrameSplitter, FusionUpdate};
use tracing::{debug, info, trace, warn};

use crate::status::{Shared, WorkerExit, WorkerState};

const READ_BUF_SIZE: usize = 4096;

/// Open a TCP connection to the configured receiver.
///
/// Tries each resolved address in turn, each bounded by `connect_timeout`.
pub fn connect(config: &ClientConfig) -> Result<TcpStream> {
    let addr = config.addr();
    let candidates: Vec<SocketAddr> = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|_| NovatelError::Resolve(addr.clone()))?
        .collect();

    let mut last_err = None;
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, config.connect_timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(addr = %candidate, error = %e, "Connect attempt failed");
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(source) => NovatelError::Connect { addr, source },
        None => NovatelError::Resolve(addr),
    })
}

#[derive(Debug, Default)]
struct LineCounters {
    lines: u64,
    dropped: u64,
    oversized: u64,
}

pub(crate) struct Worker {
    config: Arc<ClientConfig>,
    shared: Arc<Shared>,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    pub(crate) fn new(
        config: Arc<ClientConfig>,
        shared: Arc<Shared>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Worker {
            config,
            shared,
            cancel,
        }
    }

    /// Run until cancelled, disconnected, or failed.
    pub(crate) fn run(self) -> WorkerExit {
        self.shared.set_state(WorkerState::Connecting);
        info!(addr = %self.config.addr(), "Connecting to receiver");

        let exit = match connect(&self.config) {
            Ok(stream) => self.stream(stream),
            Err(e) => {
                warn!(error = %e, "Receiver connection failed");
                WorkerExit::Failed(e.to_string())
            }
        };

        self.shared.finish(exit.clone());
        info!(exit = %exit, "Ingestion worker stopped");
        exit
    }

    fn stream(&self, mut stream: TcpStream) -> WorkerExit {
        if let Err(e) = stream.set_read_timeout(Some(self.config.recv_timeout)) {
            return WorkerExit::Failed(e.to_string());
        }

        self.shared.set_state(WorkerState::Streaming);
        info!(
            addr = %self.config.addr(),
            local_addr = ?stream.local_addr().ok(),
            "Connected to receiver"
        );

        let mut splitter = FrameSplitter::new(self.config.max_line_len);
        let mut buf = [0u8; READ_BUF_SIZE];
        let mut counters = LineCounters::default();

        let exit = loop {
            if self.cancel.load(Ordering::Acquire) {
                break WorkerExit::Cancelled;
            }

            match stream.read(&mut buf) {
                Ok(0) => break WorkerExit::RemoteClosed,
                Ok(len) => {
                    splitter.extend(&buf[..len]);
                    self.drain(&mut splitter, &mut counters);
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    trace!("No receiver data before read timeout");
                }
                Err(e) => {
                    warn!(error = %e, "Receiver socket error");
                    break WorkerExit::Failed(e.to_string());
                }
            }
        };

        let _ = stream.shutdown(Shutdown::Both);
        let stats = self.shared.fusion().stats();
        info!(
            lines = counters.lines,
            positions = stats.positions,
            headings = stats.headings,
            dropped = counters.dropped,
            oversized = counters.oversized,
            "Receiver stream closed"
        );
        exit
    }

    fn drain(&self, splitter: &mut FrameSplitter, counters: &mut LineCounters) {
        while let Some(item) = splitter.next_line() {
            match item {
                Ok(line) => self.ingest(&line, counters),
                Err(e) => {
                    counters.oversized += 1;
                    warn!(error = %e, "Discarding oversized line");
                }
            }
        }
    }

    /// Stamp a line with its arrival time and apply it under the lock.
    fn ingest(&self, line: &str, counters: &mut LineCounters) {
        counters.lines += 1;
        let arrival = now();

        let Some(sentence) = classify(line) else {
            counters.dropped += 1;
            trace!(line, "Dropped unrecognized or malformed line");
            return;
        };

        let (update, stats) = {
            let mut fusion = self.shared.fusion();
            let update = fusion.update(&sentence, arrival);
            (update, fusion.stats())
        };

        match update {
            Some(FusionUpdate::Position {
                latitude,
                longitude,
            }) => {
                if stats.positions == 1 {
                    info!(
                        lat = format!("{latitude:.8}"),
                        lon = format!("{longitude:.8}"),
                        "First position report"
                    );
                }
            }
            Some(FusionUpdate::Heading { heading }) => {
                if stats.headings == 1 {
                    info!(hdg = format!("{heading:.2}"), "First attitude report");
                }
            }
            None => trace!(kind = sentence.kind(), "Sentence not used for fusion"),
        }
    }
}
