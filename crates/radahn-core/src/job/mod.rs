//! Job lifecycle: one fresh working directory per accepted submission.
//!
//! Directories are never reused and never deleted here; abandoned jobs stay on disk
//! for postmortem inspection.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Parent directory under which every `<uuid>/` job directory is created.
    pub root: PathBuf,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("radahn").join("jobs"),
        }
    }
}

/// One isolated unit of work.
#[derive(Debug, Clone)]
pub struct Job {
    id: Uuid,
    working_dir: PathBuf,
    input_artifacts: Vec<String>,
}

impl Job {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// File names written by input generation, in write order.
    pub fn input_artifacts(&self) -> &[String] {
        &self.input_artifacts
    }

    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.working_dir.join(file_name)
    }

    pub fn record_artifact(&mut self, file_name: impl Into<String>) {
        let file_name = file_name.into();
        if !self.input_artifacts.contains(&file_name) {
            self.input_artifacts.push(file_name);
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobFactory {
    root: PathBuf,
}

impl JobFactory {
    /// A relative `root` is resolved against the current directory, so job directories
    /// stay valid for processes started inside them.
    pub fn new(cfg: JobConfig) -> Self {
        let root = std::path::absolute(&cfg.root).unwrap_or(cfg.root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a new job directory `<root>/<uuid>/`.
    ///
    /// The leaf directory is created with a non-recursive `create_dir`, so an existing
    /// directory is never adopted.
    pub async fn create_job(&self) -> Result<Job, CoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::io(&self.root, e))?;

        loop {
            let id = Uuid::new_v4();
            let working_dir = self.root.join(id.to_string());
            match tokio::fs::create_dir(&working_dir).await {
                Ok(()) => {
                    info!(job = %id, dir = %working_dir.display(), "job directory created");
                    return Ok(Job {
                        id,
                        working_dir,
                        input_artifacts: Vec::new(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(job = %id, "job directory collision; drawing a new id");
                }
                Err(e) => return Err(CoreError::io(working_dir, e)),
            }
        }
    }
}
