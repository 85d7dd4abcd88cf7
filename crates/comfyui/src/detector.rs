//! Completion detection for a submitted job.
//!
//! The server's event stream only says that an output node executed.
//! It does not say which files were written, and the write may not be
//! flushed when the event fires. [`CompletionDetector`] therefore:
//!
//! 1. captures a baseline of the output directory before submission,
//! 2. blocks on the event stream until the completion signal arrives,
//! 3. polls the directory until enough new files exist or a timeout
//!    elapses.
//!
//! ```text
//! Idle -> Submitted -> AwaitingSignal -> Polling -> Resolved
//!                                               \-> TimedOut
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

use crate::channel::EventStream;
use crate::error::{JobStage, MediaJobError};
use crate::snapshot::{FileSetSnapshot, ListedFile, OutputLister};

/// Lifecycle of one detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    /// Baseline captured; the job may be submitted.
    Submitted,
    /// Blocked on the event stream.
    AwaitingSignal,
    /// Completion signal received; watching the directory.
    Polling,
    Resolved,
    TimedOut,
}

/// Watches one output directory for the artifacts of one job.
pub struct CompletionDetector<'a, L: OutputLister + ?Sized> {
    lister: &'a L,
    dir: PathBuf,
    folder: String,
    extension: &'static str,
    expected: usize,
    poll_interval: Duration,
    timeout: Duration,
    baseline: FileSetSnapshot,
    state: DetectorState,
}

impl<'a, L: OutputLister + ?Sized> CompletionDetector<'a, L> {
    /// * `dir`       - physical output directory to watch.
    /// * `folder`    - caller-facing folder name, used in error messages.
    /// * `extension` - artifact extension without the dot.
    /// * `expected`  - number of new files that complete the job.
    pub fn new(
        lister: &'a L,
        dir: PathBuf,
        folder: impl Into<String>,
        extension: &'static str,
        expected: usize,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            lister,
            dir,
            folder: folder.into(),
            extension,
            expected,
            poll_interval,
            timeout,
            baseline: FileSetSnapshot::default(),
            state: DetectorState::Idle,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn baseline(&self) -> &FileSetSnapshot {
        &self.baseline
    }

    /// Create the output directory if needed and record the files
    /// already in it. Must run before the job is submitted.
    pub async fn begin(&mut self) -> Result<(), MediaJobError> {
        self.expect_state(DetectorState::Idle)?;

        self.lister
            .ensure_dir(&self.dir)
            .await
            .map_err(|source| MediaJobError::OutputDirectory {
                stage: JobStage::Snapshot,
                source,
            })?;
        let existing = self
            .lister
            .list(&self.dir, self.extension)
            .await
            .map_err(|source| MediaJobError::OutputDirectory {
                stage: JobStage::Snapshot,
                source,
            })?;

        self.baseline = FileSetSnapshot::from_listing(&existing);
        self.state = DetectorState::Submitted;
        tracing::debug!(
            dir = %self.dir.display(),
            existing = self.baseline.len(),
            "Captured output baseline",
        );
        Ok(())
    }

    /// Block until the event stream delivers the completion signal.
    ///
    /// Everything else on the stream is discarded, `execution_error`
    /// included: a job that fails on the server leaves this waiting until
    /// the socket closes. There is no timeout here; bounding the overall
    /// job is the caller's business.
    pub async fn await_signal<E>(&mut self, events: &mut E) -> Result<(), MediaJobError>
    where
        E: EventStream + ?Sized,
    {
        self.expect_state(DetectorState::Submitted)?;
        self.state = DetectorState::AwaitingSignal;

        loop {
            let message = events
                .next_message()
                .await
                .map_err(|e| MediaJobError::Connection {
                    stage: JobStage::AwaitingSignal,
                    message: e.to_string(),
                })?;

            match message {
                Some(msg) if msg.is_completion_signal() => {
                    tracing::info!(
                        prompt_id = msg.prompt_id().unwrap_or("-"),
                        "Execution completion signal received",
                    );
                    self.state = DetectorState::Polling;
                    return Ok(());
                }
                Some(msg) => {
                    tracing::trace!(kind = msg.kind(), "Ignoring event while awaiting completion");
                }
                None => {
                    return Err(MediaJobError::Connection {
                        stage: JobStage::AwaitingSignal,
                        message: "event stream closed before completion signal".to_string(),
                    });
                }
            }
        }
    }

    /// Poll the output directory until at least `expected` new files
    /// exist, returning all of them in listing order.
    ///
    /// Fails with [`MediaJobError::ArtifactNotDetected`] once the timeout
    /// elapses with fewer files; a partial list is never returned.
    pub async fn poll(&mut self) -> Result<Vec<ListedFile>, MediaJobError> {
        self.expect_state(DetectorState::Polling)?;
        let started = Instant::now();

        loop {
            let current = self
                .lister
                .list(&self.dir, self.extension)
                .await
                .map_err(|source| MediaJobError::OutputDirectory {
                    stage: JobStage::Polling,
                    source,
                })?;
            let fresh = self.baseline.new_files(current);

            if fresh.len() >= self.expected {
                tracing::debug!(
                    found = fresh.len(),
                    expected = self.expected,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "New output files detected",
                );
                self.state = DetectorState::Resolved;
                return Ok(fresh);
            }

            if started.elapsed() >= self.timeout {
                tracing::warn!(
                    folder = %self.folder,
                    found = fresh.len(),
                    expected = self.expected,
                    "Timed out waiting for output files",
                );
                self.state = DetectorState::TimedOut;
                return Err(MediaJobError::ArtifactNotDetected {
                    found: fresh.len(),
                    expected: self.expected,
                    folder: self.folder.clone(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn expect_state(&self, expected: DetectorState) -> Result<(), MediaJobError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(MediaJobError::DetectorOutOfOrder {
                expected,
                actual: self.state,
            })
        }
    }
}
