//! Sequential pipeline driver.
//!
//! ```text
//! Idle(0) -> StepStarting -> StepRunning -> StepStarting(next) -> ... -> Completed
//! ```
//!
//! Each call to [`JobRunner::advance`] performs at most one transition and never blocks.

use std::{path::Path, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    error::ExecResult,
    proc::{self, ProcessHandle},
    script::RunScript,
    step::{ProcessStep, StepOutcome},
};

/// What happens to the remaining steps after one exits unsuccessfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and start the next step anyway.
    #[default]
    Continue,
    /// Mark every remaining step as skipped and complete immediately.
    Halt,
}

pub struct JobRunner {
    name: String,
    steps: Vec<ProcessStep>,
    current: usize,
    handle: Option<ProcessHandle>,
    policy: FailurePolicy,
    script: RunScript,
}

impl JobRunner {
    /// Build a runner whose transcript is `<working_dir>/<name>_run.sh`.
    pub fn new(name: impl Into<String>, working_dir: &Path, steps: Vec<ProcessStep>) -> Self {
        let name = name.into();
        let script = RunScript::for_pipeline(working_dir, &name);
        Self {
            name,
            steps,
            current: 0,
            handle: None,
            policy: FailurePolicy::default(),
            script,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_script(&self) -> &RunScript {
        &self.script
    }

    /// Steps with whatever results have been recorded so far.
    pub fn steps(&self) -> &[ProcessStep] {
        &self.steps
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.steps.len()
    }

    /// Index of the step being started or polled.
    pub fn current_step(&self) -> Option<&ProcessStep> {
        self.steps.get(self.current)
    }

    /// Move the pipeline forward by at most one transition.
    ///
    /// Returns `Ok(true)` once every step has a recorded result.
    pub fn advance(&mut self) -> ExecResult<bool> {
        if self.is_complete() {
            return Ok(true);
        }

        let Some(handle) = self.handle.as_mut() else {
            let step = &self.steps[self.current];
            info!(pipeline = %self.name, step = step.name(), index = self.current, "starting step");
            self.handle = Some(proc::run(step, &self.script)?);
            return Ok(false);
        };

        let Some(status) = handle.poll()? else {
            return Ok(false);
        };

        let outcome = StepOutcome::from(status);
        let step = &mut self.steps[self.current];
        step.record(outcome);
        self.handle = None;
        self.current += 1;

        if outcome.is_success() {
            debug!(pipeline = %self.name, step = step.name(), "step finished");
        } else {
            warn!(pipeline = %self.name, step = step.name(), %outcome, "step failed");
            if self.policy == FailurePolicy::Halt {
                self.skip_remaining();
            }
        }

        Ok(self.is_complete())
    }

    fn skip_remaining(&mut self) {
        for step in &mut self.steps[self.current..] {
            step.record(StepOutcome::Skipped);
        }
        self.current = self.steps.len();
    }

    /// Call [`JobRunner::advance`] every `interval` until the pipeline completes.
    pub async fn run_to_completion(&mut self, interval: Duration) -> ExecResult<&[ProcessStep]> {
        while !self.advance()? {
            tokio::time::sleep(interval).await;
        }
        info!(pipeline = %self.name, "pipeline completed");
        Ok(&self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn second_step_starts_only_after_first_completes() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let steps = vec![
            ProcessStep::new("a", "sleep 0.2 && touch a.done", dir),
            ProcessStep::new("b", "test -f a.done", dir),
        ];
        let mut runner = JobRunner::new("order", dir, steps);

        assert!(!runner.advance().unwrap());
        assert!(runner.steps()[0].stdout_path().exists());
        assert!(!runner.steps()[1].stdout_path().exists());

        let steps = runner.run_to_completion(TICK).await.unwrap();
        assert_eq!(steps[0].result(), Some(StepOutcome::Exited(0)));
        assert_eq!(steps[1].result(), Some(StepOutcome::Exited(0)));
    }

    #[tokio::test]
    async fn transcript_lists_commands_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let steps = vec![
            ProcessStep::new("first", "echo cmd1", dir),
            ProcessStep::new("second", "echo cmd2", dir),
        ];
        let mut runner = JobRunner::new("lammpsSteered", dir, steps);
        runner.run_to_completion(TICK).await.unwrap();

        let body = std::fs::read_to_string(dir.join("lammpsSteered_run.sh")).unwrap();
        assert_eq!(body, "#!/bin/sh\necho cmd1\n\necho cmd2\n\n");
        assert_eq!(
            std::fs::read_to_string(dir.join("second.stdout.txt")).unwrap(),
            "cmd2\n"
        );
    }

    #[tokio::test]
    async fn failing_step_does_not_stop_pipeline_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let steps = vec![
            ProcessStep::new("broken", "exit 3", dir),
            ProcessStep::new("after", "true", dir),
        ];
        let mut runner = JobRunner::new("continue", dir, steps);

        let steps = runner.run_to_completion(TICK).await.unwrap();
        assert_eq!(steps[0].result(), Some(StepOutcome::Exited(3)));
        assert_eq!(steps[1].result(), Some(StepOutcome::Exited(0)));
    }

    #[tokio::test]
    async fn halt_policy_skips_remaining_steps() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let steps = vec![
            ProcessStep::new("broken", "exit 1", dir),
            ProcessStep::new("never", "touch never.ran", dir),
        ];
        let mut runner = JobRunner::new("halt", dir, steps).with_policy(FailurePolicy::Halt);

        let steps = runner.run_to_completion(TICK).await.unwrap();
        assert_eq!(steps[0].result(), Some(StepOutcome::Exited(1)));
        assert_eq!(steps[1].result(), Some(StepOutcome::Skipped));
        assert!(!dir.join("never.ran").exists());
        assert!(runner.is_complete());
    }

    #[test]
    fn empty_pipeline_is_complete() {
        let tmp = tempfile::tempdir().unwrap();
        let mut runner = JobRunner::new("empty", tmp.path(), Vec::new());
        assert!(runner.advance().unwrap());
        assert!(!runner.run_script().path().exists());
    }
}
