use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use radahn_core::{
    CoreError, EventBus, FileInputGenerator, InputGenerator, Job, JobConfig, JobFactory,
    TaskRegistry,
};
use radahn_exec::{PipelineConfig, ProcessStep};
use radahn_model::{
    ClientEvent, GenerateRequest, OpenFolderRequest, SaveProjectRequest, SlotInfo, Submission,
    TaskName,
};
use radahn_relay::{ControlChannel, ControlConfig, RelayConfig, TelemetryRelay};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{error::ApiError, handler::ApiHandler};

/// Wires client commands to registry slots and their background activities.
pub struct Orchestrator {
    registry: Arc<TaskRegistry>,
    bus: EventBus,
    jobs: JobFactory,
    generator: Arc<dyn InputGenerator>,
    pipeline: Arc<PipelineConfig>,
    scalar: RelayConfig,
    atoms: RelayConfig,
    control: ControlChannel,
    project_dir: PathBuf,
}

impl Orchestrator {
    /// Orchestrator with default job root, pipeline, relay endpoints and project directory.
    pub fn new(registry: Arc<TaskRegistry>, bus: EventBus) -> Self {
        Self {
            registry,
            bus,
            jobs: JobFactory::new(JobConfig::default()),
            generator: Arc::new(FileInputGenerator::new()),
            pipeline: Arc::new(PipelineConfig::default()),
            scalar: RelayConfig::scalar(),
            atoms: RelayConfig::atoms(),
            control: ControlChannel::new(ControlConfig::default()),
            project_dir: PathBuf::from("projects"),
        }
    }

    pub fn with_jobs(mut self, jobs: JobFactory) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn InputGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn with_relays(mut self, scalar: RelayConfig, atoms: RelayConfig) -> Self {
        self.scalar = scalar;
        self.atoms = atoms;
        self
    }

    pub fn with_control(mut self, control: ControlChannel) -> Self {
        self.control = control;
        self
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn submit_relay(&self, cfg: &RelayConfig) -> Result<bool, ApiError> {
        let name = cfg.kind.task_name();
        let relay = TelemetryRelay::new(cfg.clone());
        let bus = self.bus.clone();

        let started = self.registry.try_submit(name.as_str(), move |guard| async move {
            match relay.run(&bus, Some(&guard)).await {
                Ok(stats) => info!(
                    slot = %name,
                    forwarded = stats.forwarded,
                    dropped = stats.dropped,
                    "telemetry relay stopped"
                ),
                Err(e) => bus.error(format!("telemetry relay {name} failed: {e}")),
            }
        })?;
        Ok(started)
    }
}

/// Allocate a job directory and write the inputs into it.
///
/// The directory is kept on failure.
async fn prepare_job(
    jobs: &JobFactory,
    generator: &dyn InputGenerator,
    req: &GenerateRequest,
) -> Result<Job, CoreError> {
    let mut job = jobs.create_job().await?;
    generator.generate(&mut job, req).await?;
    debug!(job = %job.id(), artifacts = ?job.input_artifacts(), "inputs written");
    Ok(job)
}

fn report_steps(bus: &EventBus, pipeline: &str, steps: &[ProcessStep]) {
    for step in steps {
        match step.result() {
            Some(outcome) if outcome.is_success() => {
                bus.info(format!("{pipeline}: step {} {outcome}", step.name()))
            }
            Some(outcome) => bus.warn(format!(
                "{pipeline}: step {} {outcome}, see {}",
                step.name(),
                step.stderr_path().display()
            )),
            None => bus.warn(format!("{pipeline}: step {} has no result", step.name())),
        }
    }
}

/// Canonical form of `path` if it is an existing directory inside the job root.
async fn resolve_job_folder(root: &Path, path: &Path) -> Result<PathBuf, ApiError> {
    let invalid = || ApiError::InvalidRequest(format!("{} is not a job folder", path.display()));
    let root = tokio::fs::canonicalize(root).await.map_err(|_| invalid())?;
    let dir = tokio::fs::canonicalize(path).await.map_err(|_| invalid())?;
    let is_dir = tokio::fs::metadata(&dir)
        .await
        .is_ok_and(|meta| meta.is_dir());
    if dir == root || !dir.starts_with(&root) || !is_dir {
        return Err(invalid());
    }
    Ok(dir)
}

async fn open_in_file_manager(path: &Path) -> std::io::Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "windows")] {
            let program = "explorer";
        } else if #[cfg(target_os = "macos")] {
            let program = "open";
        } else {
            let program = "xdg-open";
        }
    }

    let status = tokio::process::Command::new(program)
        .arg(path)
        .status()
        .await?;
    if !status.success() {
        warn!(program, path = %path.display(), %status, "file manager exited unsuccessfully");
    }
    Ok(())
}

#[async_trait]
impl ApiHandler for Orchestrator {
    async fn start_listening(&self) -> Result<Submission, ApiError> {
        let scalar = self.submit_relay(&self.scalar)?;
        let atoms = self.submit_relay(&self.atoms)?;
        Ok(Submission::from(scalar || atoms))
    }

    async fn stop_listening(&self) -> Result<Submission, ApiError> {
        let mut requested = false;
        for cfg in [&self.scalar, &self.atoms] {
            requested |= self.registry.request_cancel(cfg.kind.task_name().as_str())?;
        }
        Ok(Submission::from(requested))
    }

    async fn generate_inputs(&self, req: GenerateRequest) -> Result<Submission, ApiError> {
        req.validate()?;
        let jobs = self.jobs.clone();
        let generator = Arc::clone(&self.generator);
        let bus = self.bus.clone();

        let started = self.registry.try_submit(
            TaskName::GenerateInputs.as_str(),
            move |guard| async move {
                let _guard = guard;
                match prepare_job(&jobs, generator.as_ref(), &req).await {
                    Ok(job) => {
                        bus.job_folder(job.working_dir());
                        bus.info(format!(
                            "input files generated in {}",
                            job.working_dir().display()
                        ));
                    }
                    Err(e) => bus.error(format!("input generation failed: {e}")),
                }
            },
        )?;
        Ok(Submission::from(started))
    }

    async fn launch_simulation(&self, req: GenerateRequest) -> Result<Submission, ApiError> {
        req.validate()?;
        let jobs = self.jobs.clone();
        let generator = Arc::clone(&self.generator);
        let pipeline = Arc::clone(&self.pipeline);
        let bus = self.bus.clone();

        let started = self.registry.try_submit(
            TaskName::RunSimulation.as_str(),
            move |guard| async move {
                let _guard = guard;
                let job = match prepare_job(&jobs, generator.as_ref(), &req).await {
                    Ok(job) => job,
                    Err(e) => {
                        bus.error(format!("input generation failed: {e}"));
                        return;
                    }
                };
                bus.job_folder(job.working_dir());
                bus.info(format!("launching {} in {}", pipeline.name, job.working_dir().display()));

                let mut runner = pipeline.build_runner(job.working_dir(), &req.run_params);
                match runner.run_to_completion(pipeline.poll_interval).await {
                    Ok(steps) => report_steps(&bus, &pipeline.name, steps),
                    Err(e) => bus.error(format!("{} aborted: {e}", pipeline.name)),
                }
            },
        )?;

        self.start_listening().await?;
        Ok(Submission::from(started))
    }

    async fn open_job_folder(&self, req: OpenFolderRequest) -> Result<Submission, ApiError> {
        req.validate()?;
        let dir = resolve_job_folder(self.jobs.root(), &req.path).await?;
        let bus = self.bus.clone();

        let started = self.registry.try_submit(
            TaskName::OpenFolder.as_str(),
            move |guard| async move {
                let _guard = guard;
                if let Err(e) = open_in_file_manager(&dir).await {
                    bus.error(format!("unable to open {}: {e}", dir.display()));
                }
            },
        )?;
        Ok(Submission::from(started))
    }

    async fn send_stop_command(&self) -> Result<Submission, ApiError> {
        self.control.send_stop_command(&self.bus).await;
        Ok(Submission::accepted())
    }

    async fn save_project(&self, req: SaveProjectRequest) -> Result<Submission, ApiError> {
        req.validate()?;
        let path = self.project_dir.join(req.file_name());

        let write = async {
            tokio::fs::create_dir_all(&self.project_dir)
                .await
                .map_err(|e| CoreError::io(&self.project_dir, e))?;
            let body = serde_json::to_vec_pretty(&req.data)?;
            tokio::fs::write(&path, body)
                .await
                .map_err(|e| CoreError::io(&path, e))
        };

        match write.await {
            Ok(()) => {
                self.bus.info(format!("project saved to {}", path.display()));
                Ok(Submission::accepted())
            }
            Err(e) => {
                self.bus.error(format!("unable to save project {}: {e}", req.name));
                Err(e.into())
            }
        }
    }

    fn list_slots(&self) -> Vec<SlotInfo> {
        self.registry.snapshot()
    }

    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.bus.subscribe()
    }
}
