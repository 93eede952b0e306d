//! Upload URL client
//!
//! Calls `GET /generate-upload-url?fileName=...` on the issuance service.

use crate::issuance::{ErrorResponse, UploadUrlResponse, UPLOAD_URL_PATH};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    ServerError { status: StatusCode, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Anything that can hand out an upload URL for an object name.
#[async_trait]
pub trait UploadUrlSource: Send + Sync {
    async fn request_upload_url(&self, object_name: &str) -> Result<String, ClientError>;
}

/// HTTP client for the issuance service
#[derive(Debug, Clone)]
pub struct UploadUrlClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl UploadUrlClient {
    /// Create a client for the service at `base_url` (e.g. `http://localhost:3000`)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base URL must start with http:// or https://: {}",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl UploadUrlSource for UploadUrlClient {
    #[tracing::instrument(
        name = "client.request_upload_url",
        skip(self),
        fields(http.status_code = tracing::field::Empty),
        err
    )]
    async fn request_upload_url(&self, object_name: &str) -> Result<String, ClientError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, UPLOAD_URL_PATH))
            .query(&[("fileName", object_name)])
            .send()
            .await?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());

        if status == StatusCode::OK {
            let body: UploadUrlResponse = response
                .json()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
            return Ok(body.upload_url);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        Err(ClientError::ServerError { status, message })
    }
}
