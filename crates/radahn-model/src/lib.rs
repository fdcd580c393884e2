//! Wire and domain types shared by every radahn crate.
//!
//! Nothing here performs I/O: these are the request payloads accepted from clients,
//! the events broadcast back to them, and the structured command sent to the simulation.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;
