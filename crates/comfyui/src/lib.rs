//! ComfyUI media job client.
//!
//! Builds node graphs for image batches and videos, submits them to a
//! ComfyUI server over HTTP, listens on the session's WebSocket for the
//! completion signal, and finds the files the job wrote by diffing the
//! output directory.
//!
//! ```no_run
//! # async fn demo() -> Result<(), adgen_comfyui::MediaJobError> {
//! use adgen_comfyui::{ImageBatchParams, MediaClientConfig, MediaJobClient};
//!
//! let client = MediaJobClient::new(MediaClientConfig::default());
//! let paths = client
//!     .generate_image_batch(ImageBatchParams::new("a red bicycle"))
//!     .await?;
//! # let _ = paths;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod channel;
pub mod client;
pub mod config;
pub mod detector;
pub mod error;
pub mod graph;
pub mod media_client;
pub mod messages;
pub mod resolver;
pub mod snapshot;
pub mod workflow;

pub use channel::{ComfyUIChannel, EventStream, JobChannel};
pub use config::{ConfigError, MediaClientConfig};
pub use error::{JobStage, MediaJobError};
pub use graph::{JobSubmission, NodeGraph, NodeInput};
pub use media_client::MediaJobClient;
pub use resolver::Artifact;
pub use snapshot::{FsOutputLister, ListedFile, OutputLister};
pub use workflow::{ArtifactKind, ImageBatchParams, MediaWorkflow, VideoParams};
