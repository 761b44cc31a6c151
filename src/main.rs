// Main entry point for the terminal playback harness
// Usage: video-queue-player [config.json]

use std::path::PathBuf;

use anyhow::Context;
use video_queue_player::{ui, PlayerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with the player output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("video_queue_player=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = PlayerConfig::load(config_path.as_deref()).context("Failed to load config")?;

    ui::app::run(config).await
}
