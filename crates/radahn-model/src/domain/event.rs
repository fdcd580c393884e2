use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Severity attached to a `log-message` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events fanned out to every connected client.
///
/// Delivery is best effort: there is no acknowledgement and lagging clients drop events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    LogMessage { msg: String, level: LogLevel },
    JobFolder { path: PathBuf },
    TelemetryScalar { payload: String },
    TelemetryAtoms { payload: String },
}

impl ClientEvent {
    /// Event name as seen by clients.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::LogMessage { .. } => "log-message",
            ClientEvent::JobFolder { .. } => "job-folder",
            ClientEvent::TelemetryScalar { .. } => "telemetry-scalar",
            ClientEvent::TelemetryAtoms { .. } => "telemetry-atoms",
        }
    }

    pub fn log(level: LogLevel, msg: impl Into<String>) -> Self {
        ClientEvent::LogMessage {
            msg: msg.into(),
            level,
        }
    }
}
