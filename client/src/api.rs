//! Typed wrapper over the `/api` HTTP surface.

use std::time::Duration;

use larder_common::item::{DeleteRequest, FoodItem, FoodItemDraft, FoodItemPatch, UpdateRequest};
use larder_common::ItemId;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyReply {
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChangeReply {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    pub backend: String,
    pub admin_configured: bool,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// Client for one tracker server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// `base` is the server origin, e.g. `http://localhost:5000`.
    pub fn new(base: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(ApiClient {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// WebSocket URL of the change-event stream.
    pub fn events_url(&self) -> String {
        let origin = if let Some(rest) = self.base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base.clone()
        };
        format!("{origin}/api/events")
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}/api{path}", self.base))
    }

    async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }
        let message = match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(e) => e.message,
            Err(_) => String::from_utf8_lossy(&body).into_owned(),
        };
        Err(ClientError::Api { status, message })
    }

    pub async fn list_active(&self) -> Result<Vec<FoodItem>, ClientError> {
        Self::read(self.request(Method::GET, "/food-items").send().await?).await
    }

    pub async fn list_trash(&self) -> Result<Vec<FoodItem>, ClientError> {
        Self::read(self.request(Method::GET, "/food-items/trash").send().await?).await
    }

    pub async fn get(&self, id: &ItemId) -> Result<FoodItem, ClientError> {
        let resp = self
            .request(Method::GET, &format!("/food-items/{id}"))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn create(&self, draft: &FoodItemDraft) -> Result<FoodItem, ClientError> {
        let resp = self
            .request(Method::POST, "/food-items")
            .json(draft)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn update(
        &self,
        id: &ItemId,
        patch: FoodItemPatch,
        admin_password: Option<&str>,
    ) -> Result<FoodItem, ClientError> {
        let body = UpdateRequest {
            patch,
            admin_password: admin_password.map(str::to_string),
        };
        let resp = self
            .request(Method::PATCH, &format!("/food-items/{id}"))
            .json(&body)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn soft_delete(
        &self,
        id: &ItemId,
        admin_password: Option<&str>,
    ) -> Result<StatusMessage, ClientError> {
        let body = DeleteRequest {
            admin_password: admin_password.map(str::to_string),
        };
        let resp = self
            .request(Method::DELETE, &format!("/food-items/{id}"))
            .json(&body)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn restore(&self, id: &ItemId) -> Result<StatusMessage, ClientError> {
        let resp = self
            .request(Method::POST, &format!("/food-items/{id}/restore"))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn purge(&self, id: &ItemId) -> Result<StatusMessage, ClientError> {
        let resp = self
            .request(Method::DELETE, &format!("/food-items/{id}/permanent"))
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn clear_trash(&self) -> Result<StatusMessage, ClientError> {
        let resp = self
            .request(Method::DELETE, "/food-items/trash/clear")
            .send()
            .await?;
        Self::read(resp).await
    }

    /// A wrong secret is `valid: false`, not an error. An unconfigured
    /// server answers 500 with `valid: false` and a message.
    pub async fn verify_password(&self, password: &str) -> Result<VerifyReply, ClientError> {
        let resp = self
            .request(Method::POST, "/verify-password")
            .json(&VerifyBody { password })
            .send()
            .await?;
        if resp.status().is_server_error() {
            let body = resp.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }
        Self::read(resp).await
    }

    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
    ) -> Result<PasswordChangeReply, ClientError> {
        let resp = self
            .request(Method::POST, "/change-password")
            .json(&ChangePasswordBody {
                current_password: current,
                new_password: new,
            })
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        Self::read(self.request(Method::GET, "/health").send().await?).await
    }
}
