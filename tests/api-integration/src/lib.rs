//! In-process server harness for end-to-end API tests.
//!
//! Each [`TestServer`] binds an ephemeral port on 127.0.0.1, serves the real
//! router over an in-memory repository and is torn down on drop.

use std::sync::Arc;

use chrono::{DateTime, Offset, Utc};
use larder_client::{ApiClient, Session};
use larder_common::countdown::DEFAULT_TRASH_RETENTION_DAYS;
use larder_common::gate::AuthorizationGate;
use larder_common::item::{Category, NewFoodItem};
use larder_common::FoodItem;
use larder_server::repository::{MemoryRepository, Repository};
use larder_server::service::FoodService;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const ADMIN_PASSWORD: &str = "pantry-keeper";

pub struct TestServer {
    pub base: String,
    pub repo: Arc<MemoryRepository>,
    pub service: Arc<FoodService>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Server with [`ADMIN_PASSWORD`] configured.
    pub async fn start() -> Self {
        Self::start_with(Some(ADMIN_PASSWORD)).await
    }

    pub async fn start_with(admin_password: Option<&str>) -> Self {
        tracing_subscriber::fmt::try_init().ok();

        let repo = Arc::new(MemoryRepository::new());
        let service = Arc::new(FoodService::new(
            repo.clone(),
            AuthorizationGate::from_config(admin_password),
            Utc.fix(),
            DEFAULT_TRASH_RETENTION_DAYS,
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener address");
        let serving = service.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = larder_server::serve(listener, serving).await {
                tracing::error!("test server stopped: {e}");
            }
        });

        TestServer {
            base: format!("http://{addr}"),
            repo,
            service,
            task,
        }
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.base).expect("build api client")
    }

    pub fn session(&self, admin_password: Option<&str>) -> Session {
        Session::new(self.api(), admin_password.map(str::to_string))
    }

    /// Full URL for raw requests, e.g. `url("/food-items")`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base)
    }

    /// Insert an item straight into the store, bypassing HTTP.
    pub async fn seed(&self, name: &str, expiry: DateTime<Utc>) -> FoodItem {
        self.repo
            .create(
                NewFoodItem {
                    name: name.to_string(),
                    expiry_date: expiry,
                    category: Category::Gm,
                    notes: None,
                },
                Utc::now(),
            )
            .await
            .expect("seed item")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
