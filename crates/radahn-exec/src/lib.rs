mod error;
pub use error::{ExecError, ExecResult};

mod util;
pub use util::shell_quote;

pub mod step;
pub use step::{ProcessStep, StepOutcome};

pub mod script;
pub use script::RunScript;

pub mod proc;
pub use proc::ProcessHandle;

pub mod runner;
pub use runner::{FailurePolicy, JobRunner};

pub mod config;
pub use config::PipelineConfig;

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::{FailurePolicy, JobRunner, PipelineConfig, ProcessStep, StepOutcome};
}
