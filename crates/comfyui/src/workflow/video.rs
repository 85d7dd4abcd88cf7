//! Hunyuan text-to-video workflow with optional upscale stage.

use adgen_core::resolution::{upscale_resolution, validate_dimensions};
use adgen_core::seed::resolve_seed;
use adgen_core::validation::{validate_output_name, validate_positive};

use super::{filename_prefix, BuiltGraph};
use crate::error::MediaJobError;
use crate::graph::{Node, NodeGraph};

/// Node id of the `RandomNoise` source carrying the seed.
pub const VIDEO_NOISE_NODE: &str = "25";

/// Node id of the `VHS_VideoCombine` output node.
pub const VIDEO_COMBINE_NODE: &str = "75";

/// Node id of the `ImageScale` node that sets the upscale target.
pub const VIDEO_UPSCALE_SCALE_NODE: &str = "89";

/// Decoded frames, before any upscale.
const DECODE_NODE: &str = "73";

/// Parameters for a single video clip.
#[derive(Debug, Clone)]
pub struct VideoParams {
    pub prompt: String,
    pub folder: String,
    pub base_filename: String,
    /// `None` draws a random seed.
    pub seed: Option<i64>,
    pub frame_count: u32,
    pub width: u32,
    pub height: u32,
    pub enable_upscale: bool,
}

impl VideoParams {
    /// Defaults: folder `KTaivle`, base name `video`, 73 frames at 848x480,
    /// no upscale, random seed.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            folder: "KTaivle".to_string(),
            base_filename: "video".to_string(),
            seed: None,
            frame_count: 73,
            width: 848,
            height: 480,
            enable_upscale: false,
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

    pub fn frame_count(mut self, frame_count: u32) -> Self {
        self.frame_count = frame_count;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn upscale(mut self, enable: bool) -> Self {
        self.enable_upscale = enable;
        self
    }

    pub(crate) fn build_graph(&self) -> Result<BuiltGraph, MediaJobError> {
        validate_output_name("folder", &self.folder)?;
        validate_output_name("base_filename", &self.base_filename)?;
        validate_dimensions(self.width, self.height)?;
        validate_positive("frame_count", self.frame_count)?;
        let seed = resolve_seed(self.seed)?;
        tracing::info!(
            seed,
            width = self.width,
            height = self.height,
            frames = self.frame_count,
            upscale = self.enable_upscale,
            "Building video workflow",
        );

        let mut graph = NodeGraph::new();

        // Loaders
        graph.insert(
            "10",
            Node::new("VAELoader").input("vae_name", "hunyuan_video_vae_bf16.safetensors"),
        );
        graph.insert(
            "11",
            Node::new("DualCLIPLoader")
                .input("clip_name1", "clip_l.safetensors")
                .input("clip_name2", "llava_llama3_fp8_scaled.safetensors")
                .input("type", "hunyuan_video"),
        );
        graph.insert(
            "12",
            Node::new("UNETLoader")
                .input("unet_name", "hunyuan_video_t2v_720p_bf16.safetensors")
                .input("weight_dtype", "default"),
        );
        graph.insert(
            "67",
            Node::new("ModelSamplingSD3")
                .input("shift", 7i64)
                .link("model", "12", 0),
        );
        graph.insert(
            "79",
            Node::new("LoraLoaderModelOnly")
                .input("lora_name", "hyvideo_FastVideo_LoRA-fp8.safetensors")
                .input("strength_model", 0.8)
                .link("model", "67", 0),
        );

        // Conditioning
        graph.insert(
            "44",
            Node::new("CLIPTextEncode")
                .input("text", self.prompt.as_str())
                .link("clip", "11", 0),
        );
        graph.insert(
            "26",
            Node::new("FluxGuidance")
                .input("guidance", 6i64)
                .link("conditioning", "44", 0),
        );
        graph.insert(
            "22",
            Node::new("BasicGuider")
                .link("model", "79", 0)
                .link("conditioning", "26", 0),
        );

        // Sampling
        graph.insert("16", Node::new("KSamplerSelect").input("sampler_name", "euler"));
        graph.insert(
            "17",
            Node::new("BasicScheduler")
                .input("scheduler", "simple")
                .input("steps", 8i64)
                .input("denoise", 1i64)
                .link("model", "12", 0),
        );
        graph.insert(VIDEO_NOISE_NODE, Node::new("RandomNoise").input("noise_seed", seed));
        graph.insert(
            "45",
            Node::new("EmptyHunyuanLatentVideo")
                .input("width", self.width)
                .input("height", self.height)
                .input("length", self.frame_count)
                .input("batch_size", 1i64),
        );
        graph.insert(
            "13",
            Node::new("SamplerCustomAdvanced")
                .link("noise", VIDEO_NOISE_NODE, 0)
                .link("guider", "22", 0)
                .link("sampler", "16", 0)
                .link("sigmas", "17", 0)
                .link("latent_image", "45", 0),
        );
        graph.insert(
            DECODE_NODE,
            Node::new("VAEDecodeTiled")
                .input("tile_size", 256i64)
                .input("overlap", 64i64)
                .input("temporal_size", 64i64)
                .input("temporal_overlap", 8i64)
                .link("samples", "13", 0)
                .link("vae", "10", 0),
        );

        let frames_source = if self.enable_upscale {
            self.insert_upscale_chain(&mut graph);
            VIDEO_UPSCALE_SCALE_NODE
        } else {
            DECODE_NODE
        };

        graph.insert(
            VIDEO_COMBINE_NODE,
            Node::new("VHS_VideoCombine")
                .input("frame_rate", 24i64)
                .input("loop_count", 0i64)
                .input(
                    "filename_prefix",
                    filename_prefix(&self.folder, &self.base_filename),
                )
                .input("format", "video/nvenc_h264-mp4")
                .input("pix_fmt", "yuv420p")
                .input("bitrate", 10i64)
                .input("megabit", true)
                .input("save_metadata", false)
                .input("pingpong", false)
                .input("save_output", true)
                .link("images", frames_source, 0),
        );

        Ok(BuiltGraph { graph, seed })
    }

    /// Model upscale of the decoded frames, then a lanczos resize to the
    /// fixed target for this aspect ratio.
    fn insert_upscale_chain(&self, graph: &mut NodeGraph) {
        let (target_width, target_height) = upscale_resolution(self.width, self.height);
        tracing::debug!(target_width, target_height, "Upscale target selected");

        graph.insert(
            "87",
            Node::new("UpscaleModelLoader").input("model_name", "4x_foolhardy_Remacri.pth"),
        );
        graph.insert(
            "88",
            Node::new("ImageUpscaleWithModel")
                .link("upscale_model", "87", 0)
                .link("image", DECODE_NODE, 0),
        );
        graph.insert(
            VIDEO_UPSCALE_SCALE_NODE,
            Node::new("ImageScale")
                .input("upscale_method", "lanczos")
                .input("width", target_width)
                .input("height", target_height)
                .input("crop", "center")
                .link("image", "88", 0),
        );
    }
}
