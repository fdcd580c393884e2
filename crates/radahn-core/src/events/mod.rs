//! Fan-out channel carrying [`ClientEvent`]s to every connected client.

use std::path::Path;

use radahn_model::{ClientEvent, LogLevel};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

/// Default number of events a slow client may fall behind before it starts missing some.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of clients that received the event.
    pub fn publish(&self, event: ClientEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                trace!(event = event.name(), "no client connected; event dropped");
                0
            }
        }
    }

    /// Write `msg` to the agent log and forward it to clients as a `log-message`.
    pub fn log(&self, level: LogLevel, msg: impl Into<String>) {
        let msg = msg.into();
        match level {
            LogLevel::Debug => debug!(target: "radahn::client", "{msg}"),
            LogLevel::Info => info!(target: "radahn::client", "{msg}"),
            LogLevel::Warning => warn!(target: "radahn::client", "{msg}"),
            LogLevel::Error => error!(target: "radahn::client", "{msg}"),
        }
        self.publish(ClientEvent::log(level, msg));
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.log(LogLevel::Info, msg);
    }

    pub fn warn(&self, msg: impl Into<String>) {
        self.log(LogLevel::Warning, msg);
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.log(LogLevel::Error, msg);
    }

    pub fn job_folder(&self, path: &Path) {
        self.publish(ClientEvent::JobFolder {
            path: path.to_path_buf(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.info("job created");

        let expected = ClientEvent::log(LogLevel::Info, "job created");
        assert_eq!(a.recv().await.unwrap(), expected);
        assert_eq!(b.recv().await.unwrap(), expected);
    }

    #[test]
    fn publish_without_clients_is_not_an_error() {
        let bus = EventBus::default();
        assert_eq!(
            bus.publish(ClientEvent::TelemetryAtoms {
                payload: "[]".into()
            }),
            0
        );
    }

    #[tokio::test]
    async fn slow_client_lags_instead_of_blocking() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe();
        for i in 0..5 {
            bus.info(format!("event {i}"));
        }
        assert!(matches!(
            slow.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
    }
}
