//! Replayable shell transcript of every command a pipeline ran.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::{ExecError, ExecResult};

pub const SHEBANG: &str = "#!/bin/sh";

/// Append-only `<pipeline>_run.sh` inside a job directory.
#[derive(Debug, Clone)]
pub struct RunScript {
    path: PathBuf,
}

impl RunScript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Transcript path for `pipeline` inside `working_dir`.
    pub fn for_pipeline(working_dir: &Path, pipeline: &str) -> Self {
        Self::new(working_dir.join(format!("{pipeline}_run.sh")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `command` followed by a blank line; the shebang is written first on a new file.
    pub fn append(&self, command: &str) -> ExecResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ExecError::io(&self.path, e))?;

        let is_new = file
            .metadata()
            .map_err(|e| ExecError::io(&self.path, e))?
            .len()
            == 0;

        let mut entry = String::new();
        if is_new {
            entry.push_str(SHEBANG);
            entry.push('\n');
        }
        entry.push_str(command);
        entry.push_str("\n\n");

        file.write_all(entry.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ExecError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_has_shebang_once_and_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let script = RunScript::for_pipeline(tmp.path(), "lammpsSteered");

        script.append("cmd1 --flag").unwrap();
        script.append("cmd2").unwrap();

        assert_eq!(script.path(), tmp.path().join("lammpsSteered_run.sh"));
        let body = std::fs::read_to_string(script.path()).unwrap();
        assert_eq!(body, "#!/bin/sh\ncmd1 --flag\n\ncmd2\n\n");
    }
}
