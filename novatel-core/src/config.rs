//! Client configuration.
//!
//! `ClientConfig` is immutable once a client is built. The text form is a
//! small YAML-like file:
//!
//! ```text
//! receiver:
//!   host: "192.168.3.22"
//!   port: 2000
//!
//! alignment:
//!   max_heading_skew: 0.05
//!   heading_window: 2.0
//!   reset_on_start: true
//!
//! stream:
//!   connect_timeout_ms: 5000
//!   recv_timeout_ms: 1000
//!   stop_grace_ms: 2000
//!   max_line_len: 8192
//! ```
//!
//! Parsing is pure; reading the file is left to the caller.

use std::time::Duration;

use crate::frame::DEFAULT_MAX_LINE_LEN;
use crate::fusion::DEFAULT_MAX_HEADING_SKEW;
use crate::history::DEFAULT_HEADING_WINDOW;
use crate::types::NovatelError;

pub const DEFAULT_HOST: &str = "192.168.3.22";
pub const DEFAULT_PORT: u16 = 2000;

/// Connection, alignment and stream settings for one client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Maximum |heading time - position time| in seconds for a heading to be reported.
    pub max_heading_skew: f64,
    /// Maximum heading age in seconds, relative to the newest heading.
    pub heading_window: f64,
    /// Clear position and heading history when a worker is (re)started.
    pub reset_on_start: bool,
    pub connect_timeout: Duration,
    /// Read deadline; bounds how long a stop request can go unnoticed.
    pub recv_timeout: Duration,
    /// How long `stop()` waits for the worker to exit.
    pub stop_grace: Duration,
    pub max_line_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            max_heading_skew: DEFAULT_MAX_HEADING_SKEW,
            heading_window: DEFAULT_HEADING_WINDOW,
            reset_on_start: true,
            connect_timeout: Duration::from_secs(5),
            recv_timeout: Duration::from_secs(1),
            stop_grace: Duration::from_secs(2),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            ..ClientConfig::default()
        }
    }

    pub fn with_max_heading_skew(mut self, seconds: f64) -> Self {
        self.max_heading_skew = seconds;
        self
    }

    pub fn with_heading_window(mut self, seconds: f64) -> Self {
        self.heading_window = seconds;
        self
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_reset_on_start(mut self, reset: bool) -> Self {
        self.reset_on_start = reset;
        self
    }

    /// `host:port` for display and logging.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the worker cannot run with.
    pub fn validate(&self) -> Result<(), NovatelError> {
        if self.host.trim().is_empty() {
            return Err(NovatelError::Config("host is empty".into()));
        }
        if self.port == 0 {
            return Err(NovatelError::Config("port must be non-zero".into()));
        }
        if !self.max_heading_skew.is_finite() || self.max_heading_skew < 0.0 {
            return Err(NovatelError::Config(format!(
                "max_heading_skew must be a non-negative number, got {}",
                self.max_heading_skew
            )));
        }
        if !self.heading_window.is_finite() || self.heading_window <= 0.0 {
            return Err(NovatelError::Config(format!(
                "heading_window must be positive, got {}",
                self.heading_window
            )));
        }
        // A zero read timeout is rejected by the socket layer.
        if self.recv_timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(NovatelError::Config("timeouts must be non-zero".into()));
        }
        if self.max_line_len == 0 {
            return Err(NovatelError::Config("max_line_len must be non-zero".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Text form
// ---------------------------------------------------------------------------

/// Parse config text, starting from defaults. Unknown keys are ignored.
pub fn parse_config(text: &str) -> Result<ClientConfig, NovatelError> {
    let mut config = ClientConfig::default();
    let mut current_section: Option<String> = None;

    for (lineno, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');
        let Some((key, val)) = stripped.split_once(':') else {
            return Err(NovatelError::Config(format!(
                "line {}: expected `key: value`",
                lineno + 1
            )));
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }
        let Some(section) = current_section.as_deref() else {
            continue;
        };

        let bad = |what: &str| {
            NovatelError::Config(format!("line {}: invalid {what}: {val}", lineno + 1))
        };

        match (section, key) {
            ("receiver", "host") => {
                if let Some(v) = parse_string_value(val) {
                    config.host = v;
                }
            }
            ("receiver", "port") => config.port = val.parse().map_err(|_| bad("port"))?,
            ("alignment", "max_heading_skew") => {
                config.max_heading_skew = val.parse().map_err(|_| bad("max_heading_skew"))?
            }
            ("alignment", "heading_window") => {
                config.heading_window = val.parse().map_err(|_| bad("heading_window"))?
            }
            ("alignment", "reset_on_start") => {
                config.reset_on_start = val.parse().map_err(|_| bad("reset_on_start"))?
            }
            ("stream", "connect_timeout_ms") => {
                config.connect_timeout = parse_millis(val).ok_or_else(|| bad("connect_timeout_ms"))?
            }
            ("stream", "recv_timeout_ms") => {
                config.recv_timeout = parse_millis(val).ok_or_else(|| bad("recv_timeout_ms"))?
            }
            ("stream", "stop_grace_ms") => {
                config.stop_grace = parse_millis(val).ok_or_else(|| bad("stop_grace_ms"))?
            }
            ("stream", "max_line_len") => {
                config.max_line_len = val.parse().map_err(|_| bad("max_line_len"))?
            }
            _ => {}
        }
    }

    config.validate()?;
    Ok(config)
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_millis(val: &str) -> Option<Duration> {
    val.parse::<u64>().ok().map(Duration::from_millis)
}

/// Render config in the text form accepted by [`parse_config`].
pub fn serialize_config(config: &ClientConfig) -> String {
    let lines = [
        "# novatel-pose configuration".to_string(),
        String::new(),
        "receiver:".into(),
        format!("  host: \"{}\"", config.host),
        format!("  port: {}", config.port),
        String::new(),
        "alignment:".into(),
        format!("  max_heading_skew: {}", config.max_heading_skew),
        format!("  heading_window: {}", config.heading_window),
        format!("  reset_on_start: {}", config.reset_on_start),
        String::new(),
        "stream:".into(),
        format!("  connect_timeout_ms: {}", config.connect_timeout.as_millis()),
        format!("  recv_timeout_ms: {}", config.recv_timeout.as_millis()),
        format!("  stop_grace_ms: {}", config.stop_grace.as_millis()),
        format!("  max_line_len: {}", config.max_line_len),
    ];
    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "192.168.3.22");
        assert_eq!(config.port, 2000);
        assert_eq!(config.max_heading_skew, 0.05);
        assert_eq!(config.heading_window, 2.0);
        assert_eq!(config.recv_timeout, Duration::from_secs(1));
        assert!(config.reset_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
receiver:
  host: "10.0.0.5"
  port: 3001

alignment:
  max_heading_skew: 0.1
  heading_window: 5.0
  reset_on_start: false

stream:
  recv_timeout_ms: 250
  max_line_len: 1024
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 3001);
        assert_eq!(config.max_heading_skew, 0.1);
        assert_eq!(config.heading_window, 5.0);
        assert!(!config.reset_on_start);
        assert_eq!(config.recv_timeout, Duration::from_millis(250));
        assert_eq!(config.max_line_len, 1024);
        // Untouched keys keep their defaults.
        assert_eq!(config.stop_grace, Duration::from_secs(2));
    }

    #[test]
    fn test_parse_config_rejects_bad_values() {
        assert!(parse_config("receiver:\n  port: seventy\n").is_err());
        assert!(parse_config("alignment:\n  heading_window: -1\n").is_err());
        assert!(parse_config("stream:\n  recv_timeout_ms: 0\n").is_err());
        assert!(parse_config("no colon here\n").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let config = ClientConfig::new("gnss.local", 2100)
            .with_max_heading_skew(0.02)
            .with_reset_on_start(false);
        let parsed = parse_config(&serialize_config(&config)).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("", 2000).validate().is_err());
        assert!(ClientConfig::new("h", 0).validate().is_err());
        assert!(ClientConfig::default()
            .with_max_heading_skew(f64::NAN)
            .validate()
            .is_err());
        assert!(ClientConfig::default()
            .with_recv_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_addr() {
        assert_eq!(ClientConfig::new("gnss.local", 2100).addr(), "gnss.local:2100");
    }
}
