use std::{path::PathBuf, time::Duration};

use radahn_model::RunParams;

use crate::{
    error::{ExecError, ExecResult},
    runner::{FailurePolicy, JobRunner},
    step::ProcessStep,
    util::{absolute, shell_quote},
};

/// Name of the step that renders the distributed workflow into the job directory.
pub const WORKFLOW_STEP: &str = "workflow";
/// Name of the step that executes the rendered workflow.
pub const SIMULATION_STEP: &str = "simulation";

/// How a simulation job is turned into pipeline steps.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pipeline name; the transcript is `<name>_run.sh`.
    pub name: String,
    /// Interpreter or executable that runs the workflow description.
    pub launcher: String,
    /// Workflow description handed to the launcher.
    pub workflow_script: PathBuf,
    /// Shell script the launcher writes into the job directory.
    pub launch_script: String,
    /// Cadence of [`JobRunner::advance`] calls.
    pub poll_interval: Duration,
    pub failure_policy: FailurePolicy,
    /// Extra variables for every step.
    pub env: Vec<(String, String)>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "lammpsSteered".to_string(),
            launcher: "python3".to_string(),
            workflow_script: PathBuf::from("workflow/lammpsSteered.py"),
            launch_script: "LammpsSteered.sh".to_string(),
            poll_interval: Duration::from_secs(1),
            failure_policy: FailurePolicy::Continue,
            env: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> ExecResult<()> {
        if self.name.trim().is_empty() || self.name.contains(['/', '\\']) {
            return Err(ExecError::InvalidConfig(format!(
                "pipeline name '{}' must be a plain file name",
                self.name
            )));
        }
        if self.launcher.trim().is_empty() {
            return Err(ExecError::InvalidConfig("launcher is empty".into()));
        }
        if self.launch_script.trim().is_empty() {
            return Err(ExecError::InvalidConfig("launch script is empty".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ExecError::InvalidConfig("poll interval must be > 0".into()));
        }
        Ok(())
    }

    /// The two simulation steps for a job living in `working_dir`.
    ///
    /// Relative `working_dir` and `workflow_script` are resolved against the agent's cwd.
    pub fn build_steps(&self, working_dir: &std::path::Path, params: &RunParams) -> Vec<ProcessStep> {
        let working_dir = absolute(working_dir);
        let working_dir = working_dir.as_path();
        let mut workflow = format!(
            "{} {} --workdir {} --nvesteps {} --frequpdate {} --ncores {}",
            self.launcher,
            shell_quote(&absolute(&self.workflow_script).to_string_lossy()),
            shell_quote(&working_dir.to_string_lossy()),
            params.nve_steps,
            params.update_interval,
            params.n_cores,
        );
        if params.force_timestep {
            workflow.push_str(" --forcetimestep");
        }
        let simulation = format!("sh ./{}", shell_quote(&self.launch_script));

        [(WORKFLOW_STEP, workflow), (SIMULATION_STEP, simulation)]
            .into_iter()
            .map(|(name, command)| {
                self.env.iter().fold(
                    ProcessStep::new(name, command, working_dir),
                    |step, (k, v)| step.with_env(k.as_str(), v.as_str()),
                )
            })
            .collect()
    }

    pub fn build_runner(&self, working_dir: &std::path::Path, params: &RunParams) -> JobRunner {
        JobRunner::new(
            self.name.as_str(),
            &absolute(working_dir),
            self.build_steps(working_dir, params),
        )
        .with_policy(self.failure_policy)
    }
}
