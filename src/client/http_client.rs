use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::push::{PushChannel, PushHandle};
use super::ItemService;
use crate::protocol::{ChangeEvent, Item, RequestError};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP consumer of the Booklist item service.
///
/// Stores the session token issued by [`HttpClient::login`]; the sync layer
/// still passes the credential explicitly on every call, so one client can
/// serve several sessions.
pub struct HttpClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Result<Self, RequestError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub(crate) fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| RequestError::Connection(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session token issued by the last successful [`HttpClient::login`].
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    /// Authenticate against the item service and install the session token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<String, RequestError> {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| RequestError::Connection(format!("http request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RequestError::Unauthorized("invalid credentials".to_string()));
        }
        if !response.status().is_success() {
            return Err(RequestError::Server(format!(
                "login failed: HTTP {}",
                response.status()
            )));
        }

        let data: Value = response.json().await.map_err(|e| {
            RequestError::Protocol(format!("failed to parse login response: {}", e))
        })?;

        match data.get("token").and_then(|t| t.as_str()) {
            Some(token) => {
                self.token = Some(token.to_string());
                Ok(token.to_string())
            }
            None => Err(RequestError::Unauthorized("no token in response".to_string())),
        }
    }

    async fn request<T>(
        &self,
        method: reqwest::Method,
        path: &str,
        credential: &str,
        body: Option<&Value>,
    ) -> Result<T, RequestError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.send(method, path, credential, body).await?;
        response
            .json()
            .await
            .map_err(|e| RequestError::Protocol(format!("failed to parse response: {}", e)))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        credential: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, RequestError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url).bearer_auth(credential);
        if let Some(b) = body {
            request = request.json(b);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RequestError::Connection(format!("http request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RequestError::Unauthorized(format!("HTTP {} {}", status, path)));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RequestError::NotFound(format!("HTTP {} {}", status, path)));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RequestError::Server(format!(
                "HTTP {} {}: {}",
                status, path, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ItemService for HttpClient {
    async fn list_items(&self, credential: &str) -> Result<Vec<Item>, RequestError> {
        self.request(reqwest::Method::GET, "/api/items", credential, None)
            .await
    }

    async fn create_item(&self, credential: &str, item: &Item) -> Result<Item, RequestError> {
        let body = serde_json::to_value(item)
            .map_err(|e| RequestError::Protocol(format!("failed to encode item: {}", e)))?;
        self.request(reqwest::Method::POST, "/api/items", credential, Some(&body))
            .await
    }

    async fn update_item(&self, credential: &str, item: &Item) -> Result<Item, RequestError> {
        let id = item.id.as_deref().ok_or_else(|| {
            RequestError::Protocol("update requires a persisted item".to_string())
        })?;
        let body = serde_json::to_value(item)
            .map_err(|e| RequestError::Protocol(format!("failed to encode item: {}", e)))?;
        self.request(
            reqwest::Method::PUT,
            &format!("/api/items/{}", id),
            credential,
            Some(&body),
        )
        .await
    }

    async fn delete_item(&self, credential: &str, id: &str) -> Result<(), RequestError> {
        // 204 responses carry no body, so skip the decode step entirely
        self.send(
            reqwest::Method::DELETE,
            &format!("/api/items/{}", id),
            credential,
            None,
        )
        .await?;
        Ok(())
    }

    async fn open_push_channel(
        &self,
        credential: &str,
        events: mpsc::Sender<ChangeEvent>,
    ) -> Result<PushHandle, RequestError> {
        PushChannel::connect(&self.base_url, credential, events).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = HttpClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_token_installed_by_set_token() {
        let mut client = HttpClient::new("http://localhost:3000").unwrap();
        assert_eq!(client.token(), None);
        client.set_token("abc");
        assert_eq!(client.token(), Some("abc"));
    }
}
