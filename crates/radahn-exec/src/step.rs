use std::{path::PathBuf, process::ExitStatus};

/// Recorded result of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Process exited with this code.
    Exited(i32),
    /// Process was terminated by a signal.
    Signalled,
    /// Never started because an earlier step failed under [`crate::FailurePolicy::Halt`].
    Skipped,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Exited(0))
    }
}

impl From<ExitStatus> for StepOutcome {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => StepOutcome::Exited(code),
            None => StepOutcome::Signalled,
        }
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Exited(code) => write!(f, "exit code {code}"),
            StepOutcome::Signalled => f.write_str("terminated by signal"),
            StepOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

/// One external command of a pipeline.
#[derive(Debug, Clone)]
pub struct ProcessStep {
    name: String,
    command: String,
    working_dir: PathBuf,
    env: Vec<(String, String)>,
    result: Option<StepOutcome>,
}

impl ProcessStep {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            working_dir: working_dir.into(),
            env: Vec::new(),
            result: None,
        }
    }

    /// Add a variable to the environment overlay; later entries win.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn working_dir(&self) -> &std::path::Path {
        &self.working_dir
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn result(&self) -> Option<StepOutcome> {
        self.result
    }

    pub fn stdout_path(&self) -> PathBuf {
        self.working_dir.join(format!("{}.stdout.txt", self.name))
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.working_dir.join(format!("{}.stderr.txt", self.name))
    }

    /// Store the outcome; a step's result is written once and never overwritten.
    pub(crate) fn record(&mut self, outcome: StepOutcome) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_is_write_once() {
        let mut step = ProcessStep::new("workflow", "true", "/tmp");
        assert!(step.record(StepOutcome::Exited(2)));
        assert!(!step.record(StepOutcome::Exited(0)));
        assert_eq!(step.result(), Some(StepOutcome::Exited(2)));
    }

    #[test]
    fn output_files_are_named_after_step() {
        let step = ProcessStep::new("simulation", "sh run.sh", "/jobs/42");
        assert_eq!(
            step.stdout_path(),
            PathBuf::from("/jobs/42/simulation.stdout.txt")
        );
        assert_eq!(
            step.stderr_path(),
            PathBuf::from("/jobs/42/simulation.stderr.txt")
        );
    }

    #[test]
    fn only_zero_exit_is_success() {
        assert!(StepOutcome::Exited(0).is_success());
        assert!(!StepOutcome::Exited(1).is_success());
        assert!(!StepOutcome::Signalled.is_success());
        assert!(!StepOutcome::Skipped.is_success());
    }
}
