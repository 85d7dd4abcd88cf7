//! Error taxonomy of the media job client.
//!
//! Every failure carries the [`JobStage`] it happened in so callers can
//! decide whether re-polling, re-submitting, or giving up makes sense.
//! Nothing in this crate retries on its own.

use std::fmt;

use adgen_core::error::CoreError;

use crate::graph::GraphError;

/// The point in a job's lifecycle at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    /// Capturing the baseline snapshot of the output directory.
    Snapshot,
    /// Opening the event connection.
    OpeningEvents,
    /// Sending the graph to the server.
    Submitting,
    /// Waiting for the execution-completion signal.
    AwaitingSignal,
    /// Polling the output directory for new files.
    Polling,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Snapshot => "snapshot",
            Self::OpeningEvents => "opening events",
            Self::Submitting => "submitting",
            Self::AwaitingSignal => "awaiting signal",
            Self::Polling => "polling",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaJobError {
    /// The supplied seed is outside the accepted range. No I/O was done.
    #[error("Invalid seed {seed}: must be within {min}..={max}")]
    InvalidSeed { seed: i64, min: i64, max: i64 },

    /// A request parameter failed validation. No I/O was done.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The built graph violates a structural invariant.
    #[error("Invalid workflow graph: {0}")]
    InvalidGraph(#[from] GraphError),

    /// The server rejected the submission.
    #[error("Server rejected the job ({status}): {body}")]
    Submission { status: u16, body: String },

    /// The job probably ran, but its output did not show up in time.
    #[error("Only {found} of {expected} files were detected in '{folder}' within the timeout")]
    ArtifactNotDetected {
        found: usize,
        expected: usize,
        folder: String,
    },

    /// The network connection failed or dropped.
    #[error("Connection error while {stage}: {message}")]
    Connection { stage: JobStage, message: String },

    /// The output directory could not be created or read.
    #[error("Output directory error while {stage}: {source}")]
    OutputDirectory {
        stage: JobStage,
        #[source]
        source: std::io::Error,
    },

    /// A completion detector method was called in the wrong state.
    #[error("Completion detector is {actual:?}, expected {expected:?}")]
    DetectorOutOfOrder {
        expected: crate::detector::DetectorState,
        actual: crate::detector::DetectorState,
    },
}

impl From<CoreError> for MediaJobError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSeed { seed, min, max } => Self::InvalidSeed { seed, min, max },
            CoreError::Validation(msg) => Self::InvalidRequest(msg),
        }
    }
}

impl MediaJobError {
    /// The stage the job reached before failing, if it got past validation.
    pub fn stage(&self) -> Option<JobStage> {
        match self {
            Self::InvalidSeed { .. } | Self::InvalidRequest(_) | Self::InvalidGraph(_) => None,
            Self::Submission { .. } => Some(JobStage::Submitting),
            Self::ArtifactNotDetected { .. } => Some(JobStage::Polling),
            Self::Connection { stage, .. } | Self::OutputDirectory { stage, .. } => Some(*stage),
            Self::DetectorOutOfOrder { .. } => None,
        }
    }
}
