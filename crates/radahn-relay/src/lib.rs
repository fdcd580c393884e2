//! Telemetry relays and the simulation control channel.
//!
//! Both talk ZeroMQ: relays subscribe to the engine's publishers and forward each
//! frame to the client [`radahn_core::EventBus`]; the control channel pushes one-shot
//! commands to the engine.

mod error;
pub use error::RelayError;

pub mod source;
pub use source::{FrameSource, ZmqSubscriber};

pub mod filter;
pub use filter::FrameFilter;

pub mod relay;
pub use relay::{RelayConfig, RelayStats, TelemetryKind, TelemetryRelay, relay};

pub mod control;
pub use control::{ControlChannel, ControlConfig};
