use crate::modules::offline_sync::core::ports::{ProductRemote, RemoteError};
use crate::modules::products::core::listing::ListQuery;
use crate::modules::products::core::product::{Product, ProductDraft};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const MAX_LOG_BODY_CHARS: usize = 256;

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<String>,
}

/// `ProductRemote` over the product API's HTTP routes.
#[derive(Debug, Clone)]
pub struct HttpProductClient {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl HttpProductClient {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_timeout,
        })
    }

    fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    fn product_url(&self, id: i64) -> String {
        format!("{}/products/{id}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))
    }

    /// Maps a non-success status onto the client's error taxonomy.
    async fn failure(response: reqwest::Response, id: Option<i64>) -> RemoteError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, body = %preview(&body), "product API request failed");
        match (status, id) {
            (StatusCode::BAD_REQUEST, _) => RemoteError::Validation(parse_errors(&body)),
            (StatusCode::NOT_FOUND, Some(id)) => RemoteError::NotFound(id),
            _ => RemoteError::Transport(format!("unexpected status {status}")),
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Transport(format!("failed to decode response: {e}")))
    }
}

/// The server's `{"errors": [...]}` list, or the raw body when it has another shape.
pub fn parse_errors(body: &str) -> Vec<String> {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors,
        _ if body.trim().is_empty() => vec!["Request rejected".to_string()],
        _ => vec![body.trim().to_string()],
    }
}

fn preview(body: &str) -> String {
    let mut preview: String = body.chars().take(MAX_LOG_BODY_CHARS).collect();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    preview
}

#[async_trait]
impl ProductRemote for HttpProductClient {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Product>, RemoteError> {
        let response = self
            .send(self.client.get(self.products_url()).query(&query.query_pairs()))
            .await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, None).await);
        }
        Self::decode(response).await
    }

    async fn get(&self, id: i64) -> Result<Product, RemoteError> {
        let response = self.send(self.client.get(self.product_url(id))).await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, Some(id)).await);
        }
        Self::decode(response).await
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, RemoteError> {
        let response = self
            .send(self.client.post(self.products_url()).json(draft))
            .await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, None).await);
        }
        Self::decode(response).await
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> Result<(), RemoteError> {
        let response = self
            .send(self.client.put(self.product_url(id)).json(draft))
            .await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, Some(id)).await);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let response = self.send(self.client.delete(self.product_url(id))).await?;
        if !response.status().is_success() {
            return Err(Self::failure(response, Some(id)).await);
        }
        Ok(())
    }

    async fn probe(&self) -> bool {
        match self
            .client
            .get(self.products_url())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!(%error, "connectivity probe failed");
                false
            }
        }
    }
}
