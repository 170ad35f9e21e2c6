//! REST client for the notification API.
//!
//! Thin wrapper over reqwest covering the four notification endpoints. The
//! list endpoint returns raw JSON values; tolerant per-entry parsing happens
//! in [`crate::sync`], so one malformed entry never fails the whole fetch.

use serde::Deserialize;
use tokio::time::Duration;
use tracing::debug;

use vigil_core::config::ApiConfig;

use crate::error::{FeedError, Result};

/// Client for the notification REST API.
pub struct NotificationApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

impl NotificationApi {
    /// Create a client from configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::ConnectionFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the full notification list as raw JSON entries.
    ///
    /// `GET /notifications`
    pub async fn fetch_notifications(&self) -> Result<Vec<serde_json::Value>> {
        debug!(base_url = %self.base_url, "fetching notification list");

        let response = self
            .client
            .get(format!("{}/notifications", self.base_url))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let list: ListResponse = response.json().await?;
        Ok(list.data)
    }

    /// Mark a single notification as read.
    ///
    /// `PUT /notifications/{id}/mark-read`
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .put(format!("{}/notifications/{}/mark-read", self.base_url, id))
            .send()
            .await?;

        Self::check_status(response).await.map(|_| ())
    }

    /// Mark every notification as read in one batched call.
    ///
    /// `PUT /notifications/mark-all-read`
    pub async fn mark_all_read(&self) -> Result<()> {
        let response = self
            .client
            .put(format!("{}/notifications/mark-all-read", self.base_url))
            .send()
            .await?;

        Self::check_status(response).await.map(|_| ())
    }

    /// Delete a notification.
    ///
    /// `DELETE /notifications/{id}`
    pub async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/notifications/{}", self.base_url, id))
            .send()
            .await?;

        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(FeedError::from_http_status(status, &body))
    }
}
