use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use larder_server::config::ServerConfig;
use larder_server::{build_service, repository, serve, sweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("larder_server=info")),
        )
        .init();

    let config = ServerConfig::parse();

    let repo = repository::connect(config.database_url.as_deref())
        .await
        .context("failed to open repository")?;
    let service = build_service(&config, repo);

    if !service.admin_configured() {
        warn!("ADMIN_PASSWORD is not set; edits and deletes on items more than 15 days from expiry will fail");
    }

    if config.auto_purge {
        let purge_service = service.clone();
        let every = Duration::from_secs(config.purge_interval_secs.max(1));
        tokio::spawn(async move {
            sweeper::run_trash_purge(purge_service, every).await;
        });
    }

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, backend = service.backend(), "larder server listening");

    serve(listener, service).await.context("server failed")?;
    Ok(())
}
