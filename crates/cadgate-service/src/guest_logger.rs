//! Forwarding of browser-side guest logs into the server log.

use cadgate_client::redact_body;
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Target that guest-originated events are logged under.
pub const GUEST_LOG_TARGET: &str = "cadgate::guest";

/// Severity a guest page may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuestLogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl GuestLogLevel {
    /// Parses a level case-insensitively. Unknown levels fall back to `Info`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for GuestLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Writes guest log records at the requested level.
///
/// Credential-looking fields in the context are redacted before logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestLoggerService;

impl GuestLoggerService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Log `message` with optional structured `context`.
    pub fn log(&self, level: GuestLogLevel, message: &str, context: Option<&Value>) {
        let context = context
            .map(|c| redact_body(c).to_string())
            .unwrap_or_default();

        match level {
            GuestLogLevel::Debug => debug!(target: GUEST_LOG_TARGET, %context, "{}", message),
            GuestLogLevel::Info => info!(target: GUEST_LOG_TARGET, %context, "{}", message),
            GuestLogLevel::Warning => warn!(target: GUEST_LOG_TARGET, %context, "{}", message),
            GuestLogLevel::Error => error!(target: GUEST_LOG_TARGET, %context, "{}", message),
        }
    }
}
