use async_trait::async_trait;
use radahn_model::{
    ClientEvent, GenerateRequest, OpenFolderRequest, SaveProjectRequest, SlotInfo, Submission,
};
use tokio::sync::broadcast;

use crate::error::ApiError;

/// Client commands accepted by the agent.
///
/// Slot-guarded commands return as soon as the activity is started (or found already
/// running); their progress and failures are reported through [`ApiHandler::subscribe`].
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Start both telemetry relays.
    async fn start_listening(&self) -> Result<Submission, ApiError>;

    /// Ask both telemetry relays to stop.
    async fn stop_listening(&self) -> Result<Submission, ApiError>;

    async fn generate_inputs(&self, req: GenerateRequest) -> Result<Submission, ApiError>;

    /// Generate inputs, run the simulation pipeline, and start listening.
    async fn launch_simulation(&self, req: GenerateRequest) -> Result<Submission, ApiError>;

    async fn open_job_folder(&self, req: OpenFolderRequest) -> Result<Submission, ApiError>;

    /// Push a stop command to the running simulation. Never fails the request.
    async fn send_stop_command(&self) -> Result<Submission, ApiError>;

    async fn save_project(&self, req: SaveProjectRequest) -> Result<Submission, ApiError>;

    fn list_slots(&self) -> Vec<SlotInfo>;

    fn subscribe(&self) -> broadcast::Receiver<ClientEvent>;
}
