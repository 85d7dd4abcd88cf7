//! Workflow graph builders.
//!
//! Each generation mode is a variant of [`MediaWorkflow`] with its own
//! parameter struct and graph template. The variant also decides what
//! the completion detector looks for: the artifact extension and how
//! many new files make the job complete.

mod image;
mod video;

use std::fmt;

pub use image::{ImageBatchParams, IMAGE_SAMPLER_NODE, IMAGE_SAVE_NODE};
pub use video::{VideoParams, VIDEO_COMBINE_NODE, VIDEO_NOISE_NODE, VIDEO_UPSCALE_SCALE_NODE};

use crate::error::MediaJobError;
use crate::graph::NodeGraph;

/// The kind of file a workflow produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Video,
}

impl ArtifactKind {
    /// File extension (without the dot) the server writes for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Video => "mp4",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// A graph ready for submission plus the seed baked into it.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: NodeGraph,
    pub seed: i64,
}

/// One unit of generative work.
#[derive(Debug, Clone)]
pub enum MediaWorkflow {
    ImageBatch(ImageBatchParams),
    Video(VideoParams),
}

impl MediaWorkflow {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::ImageBatch(_) => ArtifactKind::Image,
            Self::Video(_) => ArtifactKind::Video,
        }
    }

    /// Number of new files that mark the job as complete.
    pub fn expected_count(&self) -> usize {
        match self {
            Self::ImageBatch(p) => p.batch_size as usize,
            Self::Video(_) => 1,
        }
    }

    /// Output folder (relative to the server's output directory).
    pub fn folder(&self) -> &str {
        match self {
            Self::ImageBatch(p) => &p.folder,
            Self::Video(p) => &p.folder,
        }
    }

    /// Validate the parameters and build the graph. Performs no I/O.
    pub fn build_graph(&self) -> Result<BuiltGraph, MediaJobError> {
        match self {
            Self::ImageBatch(p) => p.build_graph(),
            Self::Video(p) => p.build_graph(),
        }
    }
}

impl From<ImageBatchParams> for MediaWorkflow {
    fn from(params: ImageBatchParams) -> Self {
        Self::ImageBatch(params)
    }
}

impl From<VideoParams> for MediaWorkflow {
    fn from(params: VideoParams) -> Self {
        Self::Video(params)
    }
}

/// `SaveImage` / `VHS_VideoCombine` prefix: `<folder>/<base_filename>`.
fn filename_prefix(folder: &str, base_filename: &str) -> String {
    format!("{folder}/{base_filename}")
}
