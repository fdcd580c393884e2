use std::io::IsTerminal;

use crate::logger::format::LoggerFormat;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `radahn_relay=debug,info`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
    /// Also log the `log-message` events sent to clients.
    pub client_events: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
            client_events: true,
        }
    }
}

impl LoggerConfig {
    pub fn new(level: impl Into<String>, format: LoggerFormat) -> Self {
        Self {
            level: level.into(),
            format,
            ..Default::default()
        }
    }
}
