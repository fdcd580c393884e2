use std::{convert::Infallible, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use radahn_model::{GenerateRequest, OpenFolderRequest, SaveProjectRequest, Submission};
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tracing::debug;

use crate::{error::ApiError, handler::ApiHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build the axum router.
    ///
    /// Routes:
    /// - POST /api/v1/commands/{command} - one route per client command, answers 202
    /// - GET /api/v1/tasks - slot snapshot
    /// - GET /api/v1/events - client events as Server-Sent Events
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/commands/start-listening", post(start_listening::<H>))
            .route("/api/v1/commands/stop-listening", post(stop_listening::<H>))
            .route("/api/v1/commands/generate-inputs", post(generate_inputs::<H>))
            .route("/api/v1/commands/launch-simulation", post(launch_simulation::<H>))
            .route("/api/v1/commands/open-job-folder", post(open_job_folder::<H>))
            .route("/api/v1/commands/send-stop-command", post(send_stop_command::<H>))
            .route("/api/v1/commands/save-project", post(save_project::<H>))
            .route("/api/v1/tasks", get(list_tasks::<H>))
            .route("/api/v1/events", get(events::<H>))
            .with_state(self.handler)
    }
}

fn accepted(submission: Submission) -> impl IntoResponse {
    (StatusCode::ACCEPTED, Json(submission))
}

async fn start_listening<H: ApiHandler>(
    State(handler): State<Arc<H>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(accepted(handler.start_listening().await?))
}

async fn stop_listening<H: ApiHandler>(
    State(handler): State<Arc<H>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(accepted(handler.stop_listening().await?))
}

async fn generate_inputs<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(force_field = %req.force_field_file_name, "generate-inputs");
    Ok(accepted(handler.generate_inputs(req).await?))
}

async fn launch_simulation<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(params = ?req.run_params, "launch-simulation");
    Ok(accepted(handler.launch_simulation(req).await?))
}

async fn open_job_folder<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    Json(req): Json<OpenFolderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(accepted(handler.open_job_folder(req).await?))
}

async fn send_stop_command<H: ApiHandler>(
    State(handler): State<Arc<H>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(accepted(handler.send_stop_command().await?))
}

async fn save_project<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    Json(req): Json<SaveProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(name = %req.name, "save-project");
    Ok(accepted(handler.save_project(req).await?))
}

/// GET /api/v1/tasks
async fn list_tasks<H: ApiHandler>(State(handler): State<Arc<H>>) -> impl IntoResponse {
    Json(handler.list_slots())
}

/// GET /api/v1/events
///
/// Clients that fall behind skip the events they missed.
async fn events<H: ApiHandler>(
    State(handler): State<Arc<H>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(handler.subscribe()).filter_map(|msg| match msg {
        Ok(event) => Event::default()
            .event(event.name())
            .json_data(&event)
            .ok()
            .map(Ok),
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            debug!(missed, "event stream lagged");
            None
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
