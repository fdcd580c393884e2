//! One-shot command channel to the running simulation.

use std::time::Duration;

use radahn_core::EventBus;
use radahn_model::ControlMessage;
use tracing::{debug, instrument};
use zeromq::{PushSocket, Socket, SocketSend, ZmqMessage};

use crate::error::RelayError;

#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Command endpoint of the engine.
    pub endpoint: String,
    /// Upper bound for connecting and handing the message to the transport.
    pub timeout: Duration,
    /// Value of `header.generator` in outgoing messages.
    pub generator: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            endpoint: "tcp://localhost:50002".to_string(),
            timeout: Duration::from_secs(2),
            generator: "radahn-agentd".to_string(),
        }
    }
}

/// Fire-and-forget sender: nothing is acknowledged, retried or returned to the caller.
#[derive(Debug, Clone)]
pub struct ControlChannel {
    cfg: ControlConfig,
}

impl ControlChannel {
    pub fn new(cfg: ControlConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ControlConfig {
        &self.cfg
    }

    /// Push a `STOP_SIMULATION` command.
    ///
    /// Failures are reported to the log and to clients as an error `log-message`.
    #[instrument(level = "debug", skip_all, fields(endpoint = %self.cfg.endpoint))]
    pub async fn send_stop_command(&self, bus: &EventBus) {
        let msg = ControlMessage::stop_simulation(self.cfg.generator.as_str());
        match self.send(&msg).await {
            Ok(()) => bus.info("stop command sent to the simulation"),
            Err(e) => bus.error(format!("unable to send the stop command: {e}")),
        }
    }

    async fn send(&self, msg: &ControlMessage) -> Result<(), RelayError> {
        let payload = serde_json::to_string(msg)?;
        let mut socket = PushSocket::new();

        tokio::time::timeout(self.cfg.timeout, async {
            socket.connect(&self.cfg.endpoint).await?;
            socket.send(ZmqMessage::from(payload)).await?;
            Ok::<_, RelayError>(())
        })
        .await
        .map_err(|_| RelayError::Timeout(self.cfg.timeout))??;

        debug!("control message handed to transport");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::flatten;
    use radahn_model::{ClientEvent, LogLevel};
    use zeromq::{PullSocket, SocketRecv};

    #[tokio::test]
    async fn stop_command_reaches_pull_socket() {
        let mut pull = PullSocket::new();
        let endpoint = pull.bind("tcp://127.0.0.1:0").await.unwrap();

        let channel = ControlChannel::new(ControlConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        });
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();

        channel.send_stop_command(&bus).await;

        let frame = tokio::time::timeout(Duration::from_secs(5), pull.recv())
            .await
            .unwrap()
            .unwrap();
        let msg: ControlMessage = serde_json::from_slice(&flatten(frame)).unwrap();
        assert_eq!(msg, ControlMessage::stop_simulation("radahn-agentd"));
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::LogMessage { level: LogLevel::Info, .. }
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_logged_not_raised() {
        let channel = ControlChannel::new(ControlConfig {
            endpoint: "tcp://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(200),
            ..Default::default()
        });
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();

        tokio::time::timeout(Duration::from_secs(2), channel.send_stop_command(&bus))
            .await
            .expect("send_stop_command must be bounded");

        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::LogMessage { level: LogLevel::Error, .. }
        ));
    }
}
