//! Process-wide logging setup for radahn binaries.

mod logger;
pub use logger::*;
