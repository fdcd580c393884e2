use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ModelError, RunParams};

/// Geometry written into every job directory.
pub const GEOMETRY_FILE: &str = "input.xyz";
/// Optional LAMMPS input script.
pub const LMP_FILE: &str = "input.lmp";
/// Optional motor graph.
pub const MOTORS_FILE: &str = "motors.json";
pub const RUN_PARAMS_FILE: &str = "run_params.json";

/// Artifact names the workflow reads by convention; no payload may claim them.
pub const RESERVED_ARTIFACTS: [&str; 4] = [GEOMETRY_FILE, LMP_FILE, MOTORS_FILE, RUN_PARAMS_FILE];

/// Payload of `generate-inputs` and `launch-simulation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Molecular geometry as exported by the viewer (XYZ text).
    pub geometry: String,
    /// Force field file content.
    pub force_field: String,
    /// File name the force field is written under inside the job directory.
    pub force_field_file_name: String,
    /// Motor graph produced by the editor, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_config: Option<Value>,
    /// Optional LAMMPS input script overriding the default one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lmp_config: Option<String>,
    #[serde(default)]
    pub run_params: RunParams,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.geometry.trim().is_empty() {
            return Err(ModelError::invalid("geometry", "cannot be empty"));
        }
        if self.force_field.trim().is_empty() {
            return Err(ModelError::invalid("forceField", "cannot be empty"));
        }
        check_file_name("forceFieldFileName", &self.force_field_file_name)?;
        let name = self.force_field_file_name.trim();
        if RESERVED_ARTIFACTS.contains(&name) {
            return Err(ModelError::invalid(
                "forceFieldFileName",
                format!("'{name}' is reserved for a generated artifact"),
            ));
        }
        self.run_params.validate()
    }
}

/// Payload of `open-job-folder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFolderRequest {
    pub path: PathBuf,
}

impl OpenFolderRequest {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.path.as_os_str().is_empty() {
            return Err(ModelError::invalid("path", "cannot be empty"));
        }
        Ok(())
    }
}

/// Payload of `save-project`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveProjectRequest {
    pub name: String,
    pub data: Value,
}

impl SaveProjectRequest {
    pub fn validate(&self) -> Result<(), ModelError> {
        check_file_name("name", &self.name)
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name.trim())
    }
}

/// Rejects names that would escape the directory they are written into.
fn check_file_name(field: &'static str, name: &str) -> Result<(), ModelError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ModelError::invalid(field, "cannot be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(ModelError::invalid(
            field,
            format!("'{name}' is not a plain file name"),
        ));
    }
    Ok(())
}
