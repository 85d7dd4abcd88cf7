//! Job submission channel.
//!
//! [`JobChannel`] is the seam between the job client and the execution
//! server: one call opens the per-session event stream, another sends the
//! graph. [`ComfyUIChannel`] implements it over HTTP + WebSocket.

use async_trait::async_trait;

use crate::api::{ComfyUIApi, ComfyUIApiError};
use crate::client::{ComfyUIClient, ComfyUIClientError, ComfyUIConnection};
use crate::config::MediaClientConfig;
use crate::error::{JobStage, MediaJobError};
use crate::graph::JobSubmission;
use crate::messages::ComfyUIMessage;

/// A stream of server events for one session.
#[async_trait]
pub trait EventStream: Send {
    /// Wait for the next event. `Ok(None)` means the stream ended.
    async fn next_message(&mut self) -> Result<Option<ComfyUIMessage>, ComfyUIClientError>;

    /// Release the connection. Safe to call more than once.
    async fn close(&mut self);
}

/// Transport to an execution server.
#[async_trait]
pub trait JobChannel: Send + Sync {
    type Events: EventStream;

    /// Open the event connection for `session_id`.
    async fn open_events(&self, session_id: &str) -> Result<Self::Events, MediaJobError>;

    /// Send a job and wait for the server's acknowledgement.
    async fn submit(&self, submission: &JobSubmission) -> Result<(), MediaJobError>;
}

/// [`JobChannel`] backed by ComfyUI's `/prompt` and `/ws` endpoints.
#[derive(Debug, Clone)]
pub struct ComfyUIChannel {
    api: ComfyUIApi,
    client: ComfyUIClient,
}

impl ComfyUIChannel {
    pub fn new(api: ComfyUIApi, client: ComfyUIClient) -> Self {
        Self { api, client }
    }

    pub fn from_config(config: &MediaClientConfig) -> Self {
        Self::new(
            ComfyUIApi::new(config.server_url.clone()),
            ComfyUIClient::new(config.ws_url()),
        )
    }
}

#[async_trait]
impl JobChannel for ComfyUIChannel {
    type Events = ComfyUIConnection;

    async fn open_events(&self, session_id: &str) -> Result<ComfyUIConnection, MediaJobError> {
        self.client
            .connect(session_id)
            .await
            .map_err(|e| MediaJobError::Connection {
                stage: JobStage::OpeningEvents,
                message: e.to_string(),
            })
    }

    async fn submit(&self, submission: &JobSubmission) -> Result<(), MediaJobError> {
        match self.api.submit_workflow(submission).await {
            Ok(ack) => {
                tracing::info!(
                    session_id = %submission.session_id,
                    prompt_id = ack.prompt_id.as_deref().unwrap_or("-"),
                    queue_number = ack.number,
                    "Workflow submitted to ComfyUI",
                );
                Ok(())
            }
            Err(ComfyUIApiError::ApiError { status, body }) => {
                Err(MediaJobError::Submission { status, body })
            }
            Err(ComfyUIApiError::Request(e)) => Err(MediaJobError::Connection {
                stage: JobStage::Submitting,
                message: e.to_string(),
            }),
        }
    }
}
