use odyssea_server::{log_filter, serve, ServerConfig};
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    let dotenv = dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .init();

    if let Some(path) = dotenv {
        tracing::info!(target: "server", path = %path.display(), "Loaded environment file");
    }

    let cfg = ServerConfig::load();
    tracing::info!(
        target: "server",
        addr = %cfg.listen_addr(),
        audio_dir = %cfg.audio_dir.display(),
        retain_artifacts = cfg.retain_artifacts,
        "Starting Odyssea"
    );

    serve(cfg).await.map_err(|e| e.into())
}
