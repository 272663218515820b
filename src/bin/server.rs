//! Shopping search HTTP server.
//!
//! Loads configuration from `$SHOPSIFT_CONFIG` or the default config path,
//! builds the search pipeline, and serves it until Ctrl-C.

use shopsift::{AppConfig, SearchServer, build_pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("shopsift-server starting");

    let config = AppConfig::load().map_err(|e| {
        let path = AppConfig::config_path();
        tracing::error!(path = %path.display(), error = %e, "failed to load config");
        anyhow::anyhow!("failed to load config from {}: {e}", path.display())
    })?;

    let pipeline = build_pipeline(&config)?;
    let server = SearchServer::start(pipeline, &config.server).await?;
    tracing::info!(
        addr = %server.addr(),
        port = server.port(),
        "shopsift-server ready"
    );

    tokio::signal::ctrl_c().await?;

    server.shutdown();
    tracing::info!("shopsift-server shut down cleanly");
    Ok(())
}
