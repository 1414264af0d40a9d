use anyhow::{Context, Result};
use clap::Parser;
use installm_core::config::ChatMode;
use installm_core::{SessionManager, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "installm")]
#[command(about = "InstaLLM - chat with local models from your browser")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory scanned for .gguf model files
    #[arg(short, long)]
    models_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Send each prompt on its own, without conversation history
    #[arg(long)]
    single_turn: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = match cli.config {
        Some(ref path) => Settings::load_from(path),
        None => Settings::load(),
    };

    if let Some(dir) = cli.models_dir {
        settings.models.dir = dir;
    }
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if cli.single_turn {
        settings.chat.mode = ChatMode::SingleTurn;
    }

    let state = Arc::new(SessionManager::from_settings(&settings));
    let app = installm_web::app(state);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        "InstaLLM listening on http://{addr} (models: {})",
        settings.models.dir.display()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
