use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Named background activities known to the agent.
///
/// Each variant owns exactly one registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskName {
    /// Writes the simulation input artifacts into a fresh job directory.
    GenerateInputs,
    /// Generates inputs and then drives the external pipeline to completion.
    RunSimulation,
    /// Relays scalar telemetry frames.
    ListenTelemetryA,
    /// Relays atom position frames.
    ListenTelemetryB,
    /// Opens a job directory in the platform file manager.
    OpenFolder,
}

impl TaskName {
    pub const ALL: [TaskName; 5] = [
        TaskName::GenerateInputs,
        TaskName::RunSimulation,
        TaskName::ListenTelemetryA,
        TaskName::ListenTelemetryB,
        TaskName::OpenFolder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::GenerateInputs => "generateInputs",
            TaskName::RunSimulation => "runSimulation",
            TaskName::ListenTelemetryA => "listenTelemetryA",
            TaskName::ListenTelemetryB => "listenTelemetryB",
            TaskName::OpenFolder => "openFolder",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskName::ALL
            .into_iter()
            .find(|name| name.as_str() == s.trim())
            .ok_or_else(|| ModelError::UnknownTask(s.to_string()))
    }
}
