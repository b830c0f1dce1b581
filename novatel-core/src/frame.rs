//! Split a raw receiver byte stream into newline-terminated text lines.
//!
//! Responsibilities:
//! - Accumulate bytes across partial reads
//! - Drop non-ASCII bytes instead of failing
//! - Strip `\r` and surrounding whitespace, skip empty lines
//! - Bound line length so a peer that never sends `\n` cannot grow the buffer

use crate::types::NovatelError;

/// Default upper bound on a single line, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 8192;

/// Incremental line splitter over an ASCII byte stream.
///
/// Feed bytes with [`extend`](FrameSplitter::extend), then drain complete
/// lines with [`next_line`](FrameSplitter::next_line) until it returns `None`.
#[derive(Debug)]
pub struct FrameSplitter {
    buf: String,
    max_line_len: usize,
    // Dropping bytes until the next '\n' after an overflow.
    discarding: bool,
    // Overflow seen by `extend`, reported by the next `next_line`.
    overflowed: bool,
}

impl FrameSplitter {
    pub fn new(max_line_len: usize) -> Self {
        FrameSplitter {
            buf: String::new(),
            max_line_len,
            discarding: false,
            overflowed: false,
        }
    }

    /// Append raw bytes. Non-ASCII bytes are ignored.
    pub fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if !b.is_ascii() {
                continue;
            }
            if self.discarding {
                if b == b'\n' {
                    self.discarding = false;
                }
                continue;
            }
            self.buf.push(b as char);
        }

        // Only the text after the last newline is a pending partial line.
        let pending = match self.buf.rfind('\n') {
            Some(idx) => self.buf.len() - idx - 1,
            None => self.buf.len(),
        };
        if pending > self.max_line_len {
            let keep = self.buf.len() - pending;
            self.buf.truncate(keep);
            self.discarding = true;
            self.overflowed = true;
        }
    }

    /// Next complete, non-empty line.
    ///
    /// Returns `Some(Err(LineTooLong))` once per oversized line; the offending
    /// bytes are discarded and splitting continues on the next call.
    pub fn next_line(&mut self) -> Option<Result<String, NovatelError>> {
        loop {
            let Some(idx) = self.buf.find('\n') else {
                if self.overflowed {
                    self.overflowed = false;
                    return Some(Err(NovatelError::LineTooLong {
                        limit: self.max_line_len,
                    }));
                }
                return None;
            };

            let raw: String = self.buf.drain(..=idx).collect();
            let line = raw.trim_end_matches('\n').trim_end_matches('\r').trim();
            if line.is_empty() {
                continue;
            }
            if line.len() > self.max_line_len {
                return Some(Err(NovatelError::LineTooLong {
                    limit: self.max_line_len,
                }));
            }
            return Some(Ok(line.to_string()));
        }
    }

    /// Drain every complete line, skipping oversized ones.
    pub fn lines(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(item) = self.next_line() {
            if let Ok(line) = item {
                out.push(line);
            }
        }
        out
    }

    /// Bytes currently buffered, complete lines included.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Drop all buffered text.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.discarding = false;
        self.overflowed = false;
    }
}

impl Default for FrameSplitter {
    fn default() -> Self {
        FrameSplitter::new(DEFAULT_MAX_LINE_LEN)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
