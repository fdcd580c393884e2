//! Command surface of the radahn agent.
//!
//! [`ApiHandler`] is the transport-neutral command set; [`Orchestrator`] implements it on
//! top of the task registry, the pipeline runner and the telemetry relays. With the `http`
//! feature, [`HttpApi`] mounts it on an axum router.

mod error;
pub use error::ApiError;

mod handler;
pub use handler::ApiHandler;

mod orchestrator;
pub use orchestrator::Orchestrator;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use axum;
