//! Process step runner: spawn one command with its output captured to files.

use std::{fs::File, process::ExitStatus, process::Stdio};

use tokio::process::Child;
use tracing::{debug, trace};

use crate::{
    error::{ExecError, ExecResult},
    script::RunScript,
    step::ProcessStep,
    util::shell_command,
};

/// A spawned step. No timeout is applied: a hung process stays pending forever.
#[derive(Debug)]
pub struct ProcessHandle {
    step: String,
    child: Child,
}

impl ProcessHandle {
    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Non-blocking completion check: `None` while the process is still running.
    pub fn poll(&mut self) -> ExecResult<Option<ExitStatus>> {
        self.child.try_wait().map_err(|source| ExecError::Poll {
            step: self.step.clone(),
            source,
        })
    }

    /// Wait for the process to exit.
    pub async fn wait(&mut self) -> ExecResult<ExitStatus> {
        self.child.wait().await.map_err(|source| ExecError::Poll {
            step: self.step.clone(),
            source,
        })
    }
}

/// Record `step` in the transcript, then spawn it through the shell.
///
/// The command is appended to `script` before spawning so an aborted job still
/// carries a replayable record of what was attempted.
pub fn run(step: &ProcessStep, script: &RunScript) -> ExecResult<ProcessHandle> {
    if step.command().trim().is_empty() {
        return Err(ExecError::EmptyCommand(step.name().to_string()));
    }

    script.append(step.command())?;

    let stdout_path = step.stdout_path();
    let stdout = File::create(&stdout_path).map_err(|e| ExecError::io(&stdout_path, e))?;
    let stderr_path = step.stderr_path();
    let stderr = File::create(&stderr_path).map_err(|e| ExecError::io(&stderr_path, e))?;

    let mut cmd = shell_command(step.command());
    cmd.current_dir(step.working_dir())
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    for (k, v) in step.env() {
        cmd.env(k, v);
    }

    trace!(target: "radahn.exec.proc", step = step.name(), command = step.command(), "spawn");
    let child = cmd.spawn().map_err(|source| ExecError::Spawn {
        step: step.name().to_string(),
        source,
    })?;
    debug!(target: "radahn.exec.proc", step = step.name(), pid = ?child.id(), "step spawned");

    Ok(ProcessHandle {
        step: step.name().to_string(),
        child,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn output_streams_go_to_step_files() {
        let tmp = tempfile::tempdir().unwrap();
        let script = RunScript::for_pipeline(tmp.path(), "test");
        let step = ProcessStep::new("hello", "echo out; echo err 1>&2", tmp.path());

        let mut handle = run(&step, &script).unwrap();
        let status = handle.wait().await.unwrap();

        assert!(status.success());
        assert_eq!(std::fs::read_to_string(step.stdout_path()).unwrap(), "out\n");
        assert_eq!(std::fs::read_to_string(step.stderr_path()).unwrap(), "err\n");
    }

    #[tokio::test]
    async fn env_overlay_reaches_process() {
        let tmp = tempfile::tempdir().unwrap();
        let script = RunScript::for_pipeline(tmp.path(), "test");
        let step = ProcessStep::new("env", "printf %s \"$RADAHN_JOB\"", tmp.path())
            .with_env("RADAHN_JOB", "job-7");

        run(&step, &script).unwrap().wait().await.unwrap();

        assert_eq!(std::fs::read_to_string(step.stdout_path()).unwrap(), "job-7");
    }

    #[tokio::test]
    async fn poll_is_non_blocking_while_running() {
        let tmp = tempfile::tempdir().unwrap();
        let script = RunScript::for_pipeline(tmp.path(), "test");
        let step = ProcessStep::new("sleepy", "sleep 0.3", tmp.path());

        let mut handle = run(&step, &script).unwrap();
        assert!(handle.poll().unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(600)).await;
        let status = handle.poll().unwrap().expect("process should have exited");
        assert!(status.success());
    }

    #[tokio::test]
    async fn command_recorded_even_if_spawn_target_is_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let script = RunScript::for_pipeline(tmp.path(), "test");
        let step = ProcessStep::new("missing", "/definitely/not/here --flag", tmp.path());

        let status = run(&step, &script).unwrap().wait().await.unwrap();

        assert!(!status.success());
        let transcript = std::fs::read_to_string(script.path()).unwrap();
        assert!(transcript.contains("/definitely/not/here --flag\n\n"));
    }

    #[test]
    fn empty_command_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let script = RunScript::for_pipeline(tmp.path(), "test");
        let step = ProcessStep::new("blank", "   ", tmp.path());

        assert!(matches!(run(&step, &script), Err(ExecError::EmptyCommand(name)) if name == "blank"));
        assert!(!script.path().exists());
    }
}
