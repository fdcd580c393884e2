use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::debug;
use zeromq::{Socket, SocketRecv, SubSocket, ZmqMessage};

use crate::error::RelayError;

/// Receive side of a publish/subscribe transport.
///
/// `recv` must be cancel-safe: the relay loop drops pending receives when its poll
/// timeout elapses and calls `recv` again on the next iteration.
#[async_trait]
pub trait FrameSource: Send {
    async fn recv(&mut self) -> Result<Bytes, RelayError>;
}

/// ZeroMQ SUB socket subscribed to every topic.
pub struct ZmqSubscriber {
    endpoint: String,
    socket: SubSocket,
}

impl ZmqSubscriber {
    pub async fn connect(endpoint: &str) -> Result<Self, RelayError> {
        let mut socket = SubSocket::new();
        socket.connect(endpoint).await?;
        socket.subscribe("").await?;
        debug!(endpoint, "subscribed to all topics");
        Ok(Self {
            endpoint: endpoint.to_string(),
            socket,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FrameSource for ZmqSubscriber {
    async fn recv(&mut self) -> Result<Bytes, RelayError> {
        let msg = self.socket.recv().await?;
        Ok(flatten(msg))
    }
}

/// Join a multipart message into one payload.
pub(crate) fn flatten(msg: ZmqMessage) -> Bytes {
    let mut parts = msg.into_vec();
    if parts.len() == 1 {
        return parts.remove(0);
    }
    let mut out = BytesMut::new();
    for part in parts {
        out.extend_from_slice(&part);
    }
    out.freeze()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::mpsc;

    /// In-memory source fed through an mpsc channel.
    pub(crate) struct ChannelSource(pub(crate) mpsc::Receiver<Bytes>);

    pub(crate) fn channel_source() -> (mpsc::Sender<Bytes>, ChannelSource) {
        let (tx, rx) = mpsc::channel(16);
        (tx, ChannelSource(rx))
    }

    #[async_trait]
    impl FrameSource for ChannelSource {
        async fn recv(&mut self) -> Result<Bytes, RelayError> {
            self.0.recv().await.ok_or(RelayError::Closed)
        }
    }
}
