//! HTTP client for the bot API.

use crate::store::{Bot, BotStatus};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// API client error types.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error: {status} {body}")]
    Status { status: u16, body: String },
    #[error("Malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct BotsBody {
    bots: Vec<Bot>,
}

#[derive(Debug, Deserialize)]
struct BotBody {
    bot: Bot,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    status: &'a str,
}

/// Client for one botwatch server. Every request self-aborts after the
/// configured timeout and reports it as an ordinary failure.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// Fetch the full bot list.
    pub async fn fetch_bots(&self) -> Result<Vec<Bot>, ApiError> {
        let url = format!("{}/api/bots", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let body: BotsBody = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.bots)
    }

    /// Ask the server to set a bot's status; returns the authoritative
    /// post-update record.
    pub async fn update_bot(&self, id: &str, status: BotStatus) -> Result<Bot, ApiError> {
        let url = format!("{}/api/bots/{}", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .json(&UpdateBody {
                status: status.as_str(),
            })
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(self.status_error(response).await);
        }

        let body: BotBody = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(body.bot)
    }

    fn request_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    async fn status_error(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ApiError::Status { status, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::spawn_test_server;

    #[tokio::test]
    async fn test_fetch_bots() {
        let (base, _store) = spawn_test_server().await;
        let client = ApiClient::new(&base, Duration::from_secs(2)).unwrap();

        let bots = client.fetch_bots().await.unwrap();
        assert_eq!(bots.len(), 4);
        assert_eq!(bots[0].id, "bot-1");
    }

    #[tokio::test]
    async fn test_update_bot_echoes_server_record() {
        let (base, store) = spawn_test_server().await;
        let client = ApiClient::new(&base, Duration::from_secs(2)).unwrap();

        let bot = client.update_bot("bot-2", BotStatus::Offline).await.unwrap();
        assert_eq!(bot.status, BotStatus::Offline);

        let server_side = store
            .list_bots()
            .into_iter()
            .find(|b| b.id == "bot-2")
            .unwrap();
        assert_eq!(server_side.last_update, bot.last_update);
    }

    #[tokio::test]
    async fn test_update_unknown_bot_is_status_error() {
        let (base, _store) = spawn_test_server().await;
        let client = ApiClient::new(&base, Duration::from_secs(2)).unwrap();

        let err = client.update_bot("bot-9", BotStatus::Online).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Reserved port with nothing listening.
        let client = ApiClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let err = client.fetch_bots().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
    }
}
