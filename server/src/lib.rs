//! Food expiry tracker HTTP service.
//!
//! Serves the item lifecycle (create, edit, trash, restore, purge) over JSON,
//! enforcing the time-distance authorization gate on every edit and delete.

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod repository;
pub mod service;
pub mod sweeper;

use std::sync::Arc;

use larder_common::gate::AuthorizationGate;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::repository::Repository;
use crate::service::FoodService;

/// Wire up the service from configuration and an already-opened repository.
pub fn build_service(config: &ServerConfig, repo: Arc<dyn Repository>) -> Arc<FoodService> {
    let gate = AuthorizationGate::from_config(config.admin_password.as_deref());
    Arc::new(FoodService::new(
        repo,
        gate,
        config.day_offset(),
        config.trash_retention_days,
    ))
}

/// Serve the API on `listener` until the process stops.
pub async fn serve(listener: TcpListener, service: Arc<FoodService>) -> std::io::Result<()> {
    axum::serve(listener, http::router(service)).await
}
