mod config;
mod error;
mod format;
mod log;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;
pub use log::CLIENT_TARGET;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Call it before starting a multi-threaded runtime, otherwise timestamps fall back to UTC.
/// A second call fails with [`LoggerError::AlreadyInitialized`].
pub fn init_logger(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    log::install(cfg)
}
