use adgen_comfyui::{MediaClientConfig, MediaJobClient, MediaWorkflow};
use adgen_worker::cli::Cli;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(path) = &cli.key_file {
        dotenvy::from_filename(path)
            .with_context(|| format!("failed to load key file {}", path.display()))?;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adgen_worker=info,adgen_comfyui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MediaClientConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        server_url = %config.server_url,
        output_dir = %config.base_output_dir.display(),
        "Worker starting",
    );

    let client = MediaJobClient::new(config);
    let workflow = MediaWorkflow::from(cli.job);
    let artifacts = client.run(&workflow).await?;

    for artifact in artifacts {
        println!("{}", artifact.path.display());
    }
    Ok(())
}
