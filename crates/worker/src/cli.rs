//! Argument parsing for the `adgen-worker` binary.

use std::path::PathBuf;

use adgen_comfyui::{ImageBatchParams, MediaWorkflow, VideoParams};
use adgen_core::seed::{MAX_SEED, MIN_SEED};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "adgen-worker")]
#[command(about = "Run one image batch or video job against a ComfyUI server", long_about = None)]
pub struct Cli {
    /// Extra key=value file loaded into the environment before
    /// configuration is read (e.g. `COMFYUI_HOST=...`, or the `IP=` and
    /// `PORT=` lines of an `IP_PORT_ADDRESS.txt`).
    #[arg(long, env = "ADGEN_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    #[command(subcommand)]
    pub job: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a batch of images
    Image(ImageArgs),

    /// Generate one video
    Video(VideoArgs),
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Text prompt
    pub prompt: String,

    #[arg(long, default_value = "flux_examples")]
    pub folder: String,

    #[arg(long, default_value = "example")]
    pub base_filename: String,

    /// Fixed seed; random when omitted
    #[arg(long, value_parser = clap::value_parser!(i64).range(MIN_SEED..=MAX_SEED))]
    pub seed: Option<i64>,

    #[arg(long, default_value_t = 4)]
    pub batch_size: u32,
}

#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Text prompt
    pub prompt: String,

    #[arg(long, default_value = "KTaivle")]
    pub folder: String,

    #[arg(long, default_value = "video")]
    pub base_filename: String,

    /// Fixed seed; random when omitted
    #[arg(long, value_parser = clap::value_parser!(i64).range(MIN_SEED..=MAX_SEED))]
    pub seed: Option<i64>,

    #[arg(long, default_value_t = 73)]
    pub frames: u32,

    #[arg(long, default_value_t = 848)]
    pub width: u32,

    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Upscale the decoded frames to the nearest standard resolution
    #[arg(long)]
    pub upscale: bool,
}

impl From<ImageArgs> for ImageBatchParams {
    fn from(args: ImageArgs) -> Self {
        ImageBatchParams::new(args.prompt)
            .folder(args.folder)
            .base_filename(args.base_filename)
            .seed(args.seed)
            .batch_size(args.batch_size)
    }
}

impl From<VideoArgs> for VideoParams {
    fn from(args: VideoArgs) -> Self {
        VideoParams::new(args.prompt)
            .folder(args.folder)
            .base_filename(args.base_filename)
            .seed(args.seed)
            .frame_count(args.frames)
            .size(args.width, args.height)
            .upscale(args.upscale)
    }
}

impl From<Command> for MediaWorkflow {
    fn from(command: Command) -> Self {
        match command {
            Command::Image(args) => MediaWorkflow::ImageBatch(args.into()),
            Command::Video(args) => MediaWorkflow::Video(args.into()),
        }
    }
}
