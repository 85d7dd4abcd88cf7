//! Media job client: submit a graph, wait for its files.
//!
//! [`MediaJobClient`] runs one job per call:
//!
//! 1. build and validate the graph (no I/O),
//! 2. capture the output directory baseline,
//! 3. open the session's event connection,
//! 4. submit the graph,
//! 5. wait for the completion signal, then poll for new files,
//! 6. order the new files and return their paths.
//!
//! The event connection is closed on every exit path once opened.
//!
//! Jobs writing to the same folder concurrently can see each other's
//! files as new; callers that need isolation should use distinct folders.

use std::path::PathBuf;

use tracing::Instrument;

use crate::channel::{ComfyUIChannel, EventStream, JobChannel};
use crate::config::MediaClientConfig;
use crate::detector::CompletionDetector;
use crate::error::MediaJobError;
use crate::graph::JobSubmission;
use crate::resolver::{resolve_artifacts, Artifact};
use crate::snapshot::{FsOutputLister, ListedFile, OutputLister};
use crate::workflow::{ImageBatchParams, MediaWorkflow, VideoParams};

/// Client for image and video generation jobs.
pub struct MediaJobClient<C = ComfyUIChannel, L = FsOutputLister> {
    config: MediaClientConfig,
    channel: C,
    lister: L,
}

impl MediaJobClient {
    /// Client talking to the ComfyUI server named in `config`, watching
    /// the real filesystem.
    pub fn new(config: MediaClientConfig) -> Self {
        let channel = ComfyUIChannel::from_config(&config);
        Self::with_parts(config, channel, FsOutputLister)
    }
}

impl<C: JobChannel, L: OutputLister> MediaJobClient<C, L> {
    pub fn with_parts(config: MediaClientConfig, channel: C, lister: L) -> Self {
        Self {
            config,
            channel,
            lister,
        }
    }

    pub fn config(&self) -> &MediaClientConfig {
        &self.config
    }

    /// Generate a batch of images; returns one absolute path per image,
    /// oldest first.
    pub async fn generate_image_batch(
        &self,
        params: ImageBatchParams,
    ) -> Result<Vec<PathBuf>, MediaJobError> {
        let artifacts = self.run(&MediaWorkflow::ImageBatch(params)).await?;
        Ok(artifacts.into_iter().map(|a| a.path).collect())
    }

    /// Generate one video; returns its absolute path.
    pub async fn generate_video(&self, params: VideoParams) -> Result<PathBuf, MediaJobError> {
        let folder = params.folder.clone();
        let artifacts = self.run(&MediaWorkflow::Video(params)).await?;
        artifacts
            .into_iter()
            .next()
            .map(|a| a.path)
            .ok_or(MediaJobError::ArtifactNotDetected {
                found: 0,
                expected: 1,
                folder,
            })
    }

    /// Run one job to completion and return exactly
    /// `workflow.expected_count()` artifacts.
    pub async fn run(&self, workflow: &MediaWorkflow) -> Result<Vec<Artifact>, MediaJobError> {
        let built = workflow.build_graph()?;
        built.graph.validate()?;

        let session_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "media_job",
            session_id = %session_id,
            kind = %workflow.kind(),
            folder = %workflow.folder(),
        );

        let submission = JobSubmission {
            graph: built.graph,
            session_id,
        };
        tracing::info!(parent: &span, seed = built.seed, nodes = submission.graph.len(), "Starting job");

        self.run_submission(workflow, submission)
            .instrument(span)
            .await
    }

    async fn run_submission(
        &self,
        workflow: &MediaWorkflow,
        submission: JobSubmission,
    ) -> Result<Vec<Artifact>, MediaJobError> {
        let kind = workflow.kind();
        let expected = workflow.expected_count();
        let folder = workflow.folder();

        let mut detector = CompletionDetector::new(
            &self.lister,
            self.config.output_dir(folder),
            folder,
            kind.extension(),
            expected,
            self.config.poll_interval,
            self.config.timeout_for(kind),
        );
        detector.begin().await?;

        let mut events = self.channel.open_events(&submission.session_id).await?;
        let outcome = self.drive(&mut detector, &mut events, &submission).await;
        events.close().await;

        let fresh = outcome?;
        let artifacts = resolve_artifacts(detector.dir(), fresh, expected);
        tracing::info!(
            paths = ?artifacts.iter().map(|a| a.path.display().to_string()).collect::<Vec<_>>(),
            "Job complete",
        );
        Ok(artifacts)
    }

    /// Submit, wait for the signal, and poll. The caller owns `events`
    /// and closes it whatever this returns.
    async fn drive<E: EventStream>(
        &self,
        detector: &mut CompletionDetector<'_, L>,
        events: &mut E,
        submission: &JobSubmission,
    ) -> Result<Vec<ListedFile>, MediaJobError> {
        self.channel.submit(submission).await?;
        detector.await_signal(events).await?;
        detector.poll().await
    }
}
