//! Flux Schnell text-to-image batch workflow.

use adgen_core::seed::resolve_seed;
use adgen_core::validation::{validate_output_name, validate_positive};

use super::{filename_prefix, BuiltGraph};
use crate::error::MediaJobError;
use crate::graph::{Node, NodeGraph};

/// Node id of the `KSampler` carrying the seed.
pub const IMAGE_SAMPLER_NODE: &str = "31";

/// Node id of the `SaveImage` output node.
pub const IMAGE_SAVE_NODE: &str = "9";

const CHECKPOINT: &str = "flux_schnell.safetensors";
const LATENT_SIZE: u32 = 1024;
const SAMPLER_STEPS: u32 = 6;

/// Words rewritten to "image" before encoding, so prompts written for
/// video still read as still-image prompts.
const PROMPT_REWRITES: [(&str, &str); 3] = [("37", "video"), ("38", "film"), ("39", "footage")];

/// Parameters for a batch of still images.
#[derive(Debug, Clone)]
pub struct ImageBatchParams {
    pub prompt: String,
    pub folder: String,
    pub base_filename: String,
    /// `None` draws a random seed.
    pub seed: Option<i64>,
    pub batch_size: u32,
}

impl ImageBatchParams {
    /// Defaults: folder `flux_examples`, base name `example`, 4 images, random seed.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            folder: "flux_examples".to_string(),
            base_filename: "example".to_string(),
            seed: None,
            batch_size: 4,
        }
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn base_filename(mut self, base_filename: impl Into<String>) -> Self {
        self.base_filename = base_filename.into();
        self
    }

    pub fn seed(mut self, seed: Option<i64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub(crate) fn build_graph(&self) -> Result<BuiltGraph, MediaJobError> {
        validate_output_name("folder", &self.folder)?;
        validate_output_name("base_filename", &self.base_filename)?;
        validate_positive("batch_size", self.batch_size)?;
        let seed = resolve_seed(self.seed)?;
        tracing::info!(seed, batch_size = self.batch_size, "Building image batch workflow");

        let mut graph = NodeGraph::new();

        graph.insert("30", Node::new("CheckpointLoaderSimple").input("ckpt_name", CHECKPOINT));
        graph.insert(
            "27",
            Node::new("EmptySD3LatentImage")
                .input("width", LATENT_SIZE)
                .input("height", LATENT_SIZE)
                .input("batch_size", self.batch_size),
        );

        // Prompt text, passed through the rewrite chain 42 -> 37 -> 38 -> 39.
        graph.insert(
            "42",
            Node::new("StringFunction|pysssss")
                .input("action", "append")
                .input("tidy_tags", "no")
                .input("text_a", self.prompt.as_str())
                .input("result", self.prompt.as_str()),
        );
        let mut previous = "42";
        for (id, word) in PROMPT_REWRITES {
            graph.insert(
                id,
                Node::new("String Replace (mtb)")
                    .link("string", previous, 0)
                    .input("old", word)
                    .input("new", "image"),
            );
            previous = id;
        }

        graph.insert(
            "43",
            Node::new("CLIPTextEncode")
                .link("text", previous, 0)
                .link("clip", "30", 1),
        );
        graph.insert(
            "33",
            Node::new("CLIPTextEncode")
                .input("text", "")
                .link("clip", "30", 1),
        );

        graph.insert(
            IMAGE_SAMPLER_NODE,
            Node::new("KSampler")
                .input("seed", seed)
                .input("steps", SAMPLER_STEPS)
                .input("cfg", 1i64)
                .input("sampler_name", "euler")
                .input("scheduler", "simple")
                .input("denoise", 1i64)
                .link("model", "30", 0)
                .link("positive", "43", 0)
                .link("negative", "33", 0)
                .link("latent_image", "27", 0),
        );
        graph.insert(
            "8",
            Node::new("VAEDecode")
                .link("samples", IMAGE_SAMPLER_NODE, 0)
                .link("vae", "30", 2),
        );
        graph.insert(
            IMAGE_SAVE_NODE,
            Node::new("SaveImage")
                .input(
                    "filename_prefix",
                    filename_prefix(&self.folder, &self.base_filename),
                )
                .link("images", "8", 0),
        );

        Ok(BuiltGraph { graph, seed })
    }
}
