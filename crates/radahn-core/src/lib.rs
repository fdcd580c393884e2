pub mod error;
pub use error::CoreError;

pub mod registry;
pub use registry::{SlotGuard, TaskRegistry};

pub mod events;
pub use events::EventBus;

pub mod job;
pub use job::{Job, JobConfig, JobFactory};

pub mod generate;
pub use generate::{FileInputGenerator, InputGenerator};
