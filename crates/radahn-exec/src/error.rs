use std::path::PathBuf;

use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("spawn of step '{step}' failed: {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },
    #[error("polling step '{step}' failed: {source}")]
    Poll {
        step: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("empty command for step '{0}'")]
    EmptyCommand(String),
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl ExecError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExecError::Io {
            path: path.into(),
            source,
        }
    }
}
