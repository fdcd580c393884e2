//! Input artifact generation.
//!
//! Content of the artifacts belongs to the chemistry tooling; this module only
//! guarantees that every file is written and flushed before [`InputGenerator::generate`]
//! returns, so the pipeline can rely on them by name.

use async_trait::async_trait;
use radahn_model::GenerateRequest;
pub use radahn_model::{GEOMETRY_FILE, LMP_FILE, MOTORS_FILE, RUN_PARAMS_FILE};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::{error::CoreError, job::Job};

#[async_trait]
pub trait InputGenerator: Send + Sync + 'static {
    /// Write every input artifact for `request` into the job directory and record them on `job`.
    async fn generate(&self, job: &mut Job, request: &GenerateRequest) -> Result<(), CoreError>;
}

/// Writes the request payloads verbatim, one file per artifact.
#[derive(Debug, Default, Clone)]
pub struct FileInputGenerator;

impl FileInputGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InputGenerator for FileInputGenerator {
    #[instrument(level = "debug", skip_all, fields(job = %job.id()))]
    async fn generate(&self, job: &mut Job, request: &GenerateRequest) -> Result<(), CoreError> {
        request.validate()?;

        write_artifact(job, GEOMETRY_FILE, request.geometry.as_bytes()).await?;
        write_artifact(
            job,
            request.force_field_file_name.trim(),
            request.force_field.as_bytes(),
        )
        .await?;

        if let Some(motors) = &request.motor_config {
            let body = serde_json::to_vec_pretty(motors)?;
            write_artifact(job, MOTORS_FILE, &body).await?;
        }
        if let Some(lmp) = &request.lmp_config {
            write_artifact(job, LMP_FILE, lmp.as_bytes()).await?;
        }

        let params = serde_json::to_vec_pretty(&request.run_params)?;
        write_artifact(job, RUN_PARAMS_FILE, &params).await?;

        debug!(artifacts = job.input_artifacts().len(), "inputs generated");
        Ok(())
    }
}

async fn write_artifact(job: &mut Job, file_name: &str, body: &[u8]) -> Result<(), CoreError> {
    let path = job.artifact_path(file_name);
    // Each artifact is written once; a second writer for the same name is a collision.
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|e| CoreError::io(&path, e))?;
    file.write_all(body)
        .await
        .map_err(|e| CoreError::io(&path, e))?;
    file.sync_all().await.map_err(|e| CoreError::io(&path, e))?;

    job.record_artifact(file_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobConfig, JobFactory};
    use radahn_model::RunParams;

    fn request() -> GenerateRequest {
        GenerateRequest {
            geometry: "1\nsingle atom\nC 0.0 0.0 0.0\n".into(),
            force_field: "reax".into(),
            force_field_file_name: "ffield.reax".into(),
            motor_config: Some(serde_json::json!({"motors": [{"type": "rotate"}]})),
            lmp_config: Some("units real\n".into()),
            run_params: RunParams::default(),
        }
    }

    async fn job(root: &std::path::Path) -> Job {
        JobFactory::new(JobConfig {
            root: root.to_path_buf(),
        })
        .create_job()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn writes_all_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = job(tmp.path()).await;

        FileInputGenerator::new()
            .generate(&mut job, &request())
            .await
            .unwrap();

        assert_eq!(
            job.input_artifacts(),
            [
                GEOMETRY_FILE,
                "ffield.reax",
                MOTORS_FILE,
                LMP_FILE,
                RUN_PARAMS_FILE
            ]
        );
        let lmp = std::fs::read_to_string(job.artifact_path(LMP_FILE)).unwrap();
        assert_eq!(lmp, "units real\n");
        let params: RunParams =
            serde_json::from_slice(&std::fs::read(job.artifact_path(RUN_PARAMS_FILE)).unwrap())
                .unwrap();
        assert_eq!(params, RunParams::default());
    }

    #[tokio::test]
    async fn optional_artifacts_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = job(tmp.path()).await;
        let mut req = request();
        req.motor_config = None;
        req.lmp_config = None;

        FileInputGenerator::new().generate(&mut job, &req).await.unwrap();

        assert!(!job.artifact_path(MOTORS_FILE).exists());
        assert!(!job.artifact_path(LMP_FILE).exists());
        assert_eq!(job.input_artifacts().len(), 3);
    }

    #[tokio::test]
    async fn force_field_named_like_geometry_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = job(tmp.path()).await;
        let mut req = request();
        req.force_field_file_name = GEOMETRY_FILE.into();

        let err = FileInputGenerator::new()
            .generate(&mut job, &req)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(!job.artifact_path(GEOMETRY_FILE).exists());
    }

    #[tokio::test]
    async fn artifact_is_never_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = job(tmp.path()).await;

        write_artifact(&mut job, GEOMETRY_FILE, b"geometry").await.unwrap();
        let err = write_artifact(&mut job, GEOMETRY_FILE, b"force field")
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Io { .. }));
        let kept = std::fs::read_to_string(job.artifact_path(GEOMETRY_FILE)).unwrap();
        assert_eq!(kept, "geometry");
    }

    #[tokio::test]
    async fn invalid_request_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = job(tmp.path()).await;
        let mut req = request();
        req.force_field_file_name = "../escape".into();

        let err = FileInputGenerator::new()
            .generate(&mut job, &req)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(job.input_artifacts().is_empty());
        assert_eq!(std::fs::read_dir(job.working_dir()).unwrap().count(), 0);
    }
}
