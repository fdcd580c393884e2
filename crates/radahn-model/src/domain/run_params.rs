use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Parameters forwarded to the workflow launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunParams {
    /// Total number of NVE steps the engine integrates.
    pub nve_steps: u64,
    /// Physical cores assigned to the simulation engine.
    pub n_cores: u32,
    /// Telemetry is published every `update_interval` steps.
    pub update_interval: u64,
    /// Let the engine adapt its timestep under large forces.
    pub force_timestep: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            nve_steps: 1000,
            n_cores: 1,
            update_interval: 100,
            force_timestep: false,
        }
    }
}

impl RunParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.nve_steps == 0 {
            return Err(ModelError::invalid("nveSteps", "must be greater than 0"));
        }
        if self.n_cores == 0 {
            return Err(ModelError::invalid("nCores", "must be greater than 0"));
        }
        if self.update_interval == 0 {
            return Err(ModelError::invalid("updateInterval", "must be greater than 0"));
        }
        if self.update_interval > self.nve_steps {
            return Err(ModelError::invalid(
                "updateInterval",
                format!("{} exceeds nveSteps ({})", self.update_interval, self.nve_steps),
            ));
        }
        Ok(())
    }
}
