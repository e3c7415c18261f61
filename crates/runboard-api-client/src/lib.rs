//! Shared HTTP client for the workflow backend.
//!
//! Provides a minimal JSON transport (every call is a fresh round trip: no retries,
//! no timeout, no caching), the typed failure it produces, and one domain method per
//! backend endpoint. View controllers depend on the [`WorkflowApi`] trait rather than
//! on the concrete client.

pub mod api;

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use runboard_core::ClientConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use api::WorkflowApi;

/// Path prefix of every backend endpoint.
pub const API_PREFIX: &str = "/api";

/// Message used when a failed response carries no parseable JSON body.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response. `message` is the body's `detail` when present.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(String),

    /// 2xx response whose body did not match the expected shape.
    #[error("Invalid response from server: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract the human-readable message of a non-2xx response.
///
/// A JSON body with a non-empty `detail` yields that detail; an unparseable body yields
/// [`UNKNOWN_ERROR`]; anything else falls back to `HTTP <status>`.
pub fn error_message(status: u16, body: &[u8]) -> String {
    let parsed: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return UNKNOWN_ERROR.to_string(),
    };

    match parsed.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => {
            format!("HTTP {}", status)
        }
        Some(other) => other.to_string(),
    }
}

/// HTTP client bound to one backend origin.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, None).await?;
        decode(&body)
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| ApiError::Decode(format!("Failed to serialize request: {}", e)))?;
        let body = self.send(Method::POST, path, Some(payload)).await?;
        decode(&body)
    }

    /// POST without a body. The response body of a successful call is ignored.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::POST, path, None).await?;
        Ok(())
    }

    /// Issue one request and return the raw body of a 2xx response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.build_url(path);
        tracing::debug!(method = %method, path = %path, "Sending API request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()));

        if !status.is_success() {
            let message = match &bytes {
                Ok(bytes) => error_message(status.as_u16(), bytes),
                Err(_) => UNKNOWN_ERROR.to_string(),
            };
            tracing::warn!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                error = %message,
                "API request failed"
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            "API request succeeded"
        );
        Ok(bytes?.to_vec())
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
