use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::Directive, fmt, fmt::time::OffsetTime,
    layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Target under which the event bus mirrors `log-message` events.
pub const CLIENT_TARGET: &str = "radahn::client";

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

pub(super) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = filter(cfg)?;
    let output = output(cfg)?;

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("SetGlobalDefaultError") || msg.contains("global default") {
                LoggerError::AlreadyInitialized
            } else {
                LoggerError::InitializationFailed(msg)
            }
        })
}

fn output(cfg: &LoggerConfig) -> Result<OutputLayer, LoggerError> {
    let layer = match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(local_timer())
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_target(cfg.with_targets)
            .with_current_span(true)
            .with_timer(local_timer())
            .boxed(),
        LoggerFormat::Journald => journald()?,
    };
    Ok(layer)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald() -> Result<OutputLayer, LoggerError> {
    tracing_journald::layer()
        .map(|layer| layer.boxed())
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald() -> Result<OutputLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

pub(crate) fn filter(cfg: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let invalid = || LoggerError::InvalidLogLevel(cfg.level.clone());
    let filter = EnvFilter::try_new(&cfg.level).map_err(|_| invalid())?;
    if cfg.client_events {
        return Ok(filter);
    }
    let mute: Directive = format!("{CLIENT_TARGET}=off").parse().map_err(|_| invalid())?;
    Ok(filter.add_directive(mute))
}

// The offset lookup fails once the process has spawned threads; UTC is used then.
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}
