//! Cancellable telemetry relay loop.
//!
//! Every iteration waits at most `poll_timeout` for a frame and then checks the slot's
//! cancellation flag, so a cancelled relay stops within one poll timeout.

use std::{future::Future, time::Duration};

use radahn_core::{EventBus, SlotGuard};
use radahn_model::{ClientEvent, TaskName};
use tracing::{debug, info, instrument, trace};

use crate::{
    error::RelayError,
    filter::FrameFilter,
    source::{FrameSource, ZmqSubscriber},
};

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Which telemetry stream a relay carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryKind {
    /// Thermodynamic scalars; malformed frames are filtered out.
    Scalar,
    /// Atom positions, forwarded untouched.
    Atoms,
}

impl TelemetryKind {
    pub fn task_name(&self) -> TaskName {
        match self {
            TelemetryKind::Scalar => TaskName::ListenTelemetryA,
            TelemetryKind::Atoms => TaskName::ListenTelemetryB,
        }
    }

    fn event(&self, payload: String) -> ClientEvent {
        match self {
            TelemetryKind::Scalar => ClientEvent::TelemetryScalar { payload },
            TelemetryKind::Atoms => ClientEvent::TelemetryAtoms { payload },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub kind: TelemetryKind,
    /// Publisher endpoint, e.g. `tcp://localhost:50000`.
    pub endpoint: String,
    pub poll_timeout: Duration,
    pub filter: FrameFilter,
}

impl RelayConfig {
    pub fn scalar() -> Self {
        Self {
            kind: TelemetryKind::Scalar,
            endpoint: "tcp://localhost:50000".to_string(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            filter: FrameFilter::require_keys(["header", "data"]),
        }
    }

    pub fn atoms() -> Self {
        Self {
            kind: TelemetryKind::Atoms,
            endpoint: "tcp://localhost:50001".to_string(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            filter: FrameFilter::accept_all(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if !self.endpoint.contains("://") {
            return Err(RelayError::InvalidConfig(format!(
                "endpoint '{}' is missing a transport prefix",
                self.endpoint
            )));
        }
        if self.poll_timeout.is_zero() {
            return Err(RelayError::InvalidConfig("poll timeout must be > 0".into()));
        }
        Ok(())
    }
}

/// Counters reported when a relay stops on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub forwarded: u64,
    pub dropped: u64,
}

fn cancelled(guard: Option<&SlotGuard>) -> bool {
    guard.is_some_and(SlotGuard::is_cancel_requested)
}

/// Forward frames from `source` to `bus` until cancelled.
///
/// With `guard == None` the loop ignores cancellation and only ends when the source fails.
/// Returns `Ok` only when the loop stopped because cancellation was requested.
pub async fn relay<S>(
    source: &mut S,
    cfg: &RelayConfig,
    bus: &EventBus,
    guard: Option<&SlotGuard>,
) -> Result<RelayStats, RelayError>
where
    S: FrameSource + ?Sized,
{
    let mut stats = RelayStats::default();
    loop {
        match tokio::time::timeout(cfg.poll_timeout, source.recv()).await {
            Ok(Ok(frame)) => {
                // Payloads travel as text; frames that are not UTF-8 are malformed too.
                let payload = cfg
                    .filter
                    .accepts(&frame)
                    .then(|| std::str::from_utf8(&frame).ok())
                    .flatten();
                match payload {
                    Some(payload) => {
                        bus.publish(cfg.kind.event(payload.to_owned()));
                        stats.forwarded += 1;
                    }
                    None => {
                        stats.dropped += 1;
                        debug!(kind = ?cfg.kind, len = frame.len(), "malformed frame dropped");
                    }
                }
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => trace!(kind = ?cfg.kind, "no frame within poll timeout"),
        }

        if cancelled(guard) {
            return Ok(stats);
        }
    }
}

/// Drive `fut` to completion while checking for cancellation every `poll`.
///
/// Returns `Ok(None)` if cancellation was requested first.
async fn until_cancelled<F, T>(
    fut: F,
    poll: Duration,
    guard: Option<&SlotGuard>,
) -> Result<Option<T>, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    tokio::pin!(fut);
    loop {
        match tokio::time::timeout(poll, &mut fut).await {
            Ok(res) => return res.map(Some),
            Err(_) if cancelled(guard) => return Ok(None),
            Err(_) => trace!("still connecting"),
        }
    }
}

/// A relay bound to a ZeroMQ publisher.
pub struct TelemetryRelay {
    cfg: RelayConfig,
}

impl TelemetryRelay {
    pub fn new(cfg: RelayConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.cfg
    }

    /// Connect and relay until cancelled or the transport fails.
    ///
    /// Connecting may wait for the publisher to come up; the wait is cancellable too.
    #[instrument(level = "debug", skip_all, fields(kind = ?self.cfg.kind, endpoint = %self.cfg.endpoint))]
    pub async fn run(
        &self,
        bus: &EventBus,
        guard: Option<&SlotGuard>,
    ) -> Result<RelayStats, RelayError> {
        self.cfg.validate()?;

        let connect = ZmqSubscriber::connect(&self.cfg.endpoint);
        let Some(mut source) = until_cancelled(connect, self.cfg.poll_timeout, guard).await? else {
            debug!("cancelled before the publisher came up");
            return Ok(RelayStats::default());
        };

        info!("listening for telemetry");
        relay(&mut source, &self.cfg, bus, guard).await
    }
}
