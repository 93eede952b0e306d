//! Upload URL issuance
//!
//! Turns a client-supplied object name into a pre-signed, time-limited PUT URL
//! for a fixed bucket, key prefix and content type. Issuance is stateless: no
//! record of issued URLs is kept.
//!
//! # Example
//!
//! ```no_run
//! use clipdrop::config::Config;
//! use clipdrop::issuance::UploadUrlIssuer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let issuer = UploadUrlIssuer::from_config(&config)?;
//! let issued = issuer.issue_upload_url("demo.mp4").await?;
//! println!("PUT {} before {}", issued.url, issued.expires_at);
//! # Ok(())
//! # }
//! ```

pub mod naming;
pub mod s3;

use crate::config::Config;
use crate::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use naming::NamingError;
pub use s3::{S3Presigner, StorageCredentials};

/// Path of the issuance endpoint.
pub const UPLOAD_URL_PATH: &str = "/generate-upload-url";

/// Body text returned for every signing failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Failed to generate upload URL";

/// Body text returned when the object name is rejected.
pub const INVALID_NAME_MESSAGE: &str = "Invalid file name";

/// Successful response body: `{"uploadURL": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadUrlResponse {
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
}

/// Error response body: `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Signing errors
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid presign request: {0}")]
    InvalidRequest(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Issuance errors
#[derive(Error, Debug)]
pub enum IssuanceError {
    #[error("Invalid object name: {0}")]
    InvalidName(#[from] NamingError),

    #[error(transparent)]
    Signing(#[from] SignerError),
}

/// Everything the signing primitive needs for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub expires_in: Duration,
}

/// Storage provider signing primitive
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Produce a pre-signed PUT URL for `request`
    async fn presign_put(&self, request: &PresignRequest) -> Result<String, SignerError>;
}

/// An issued upload URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadUrl {
    pub url: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues upload URLs for one bucket and key prefix
#[derive(Clone)]
pub struct UploadUrlIssuer {
    signer: Arc<dyn UrlSigner>,
    bucket: String,
    key_prefix: String,
    content_type: String,
    expires_in: Duration,
    unique_prefix: bool,
}

impl UploadUrlIssuer {
    /// Create an issuer that signs through `signer`
    pub fn new(config: &Config, signer: Arc<dyn UrlSigner>) -> Self {
        Self {
            signer,
            bucket: config.storage.bucket.clone(),
            key_prefix: config.storage.key_prefix.clone(),
            content_type: config.issuance.content_type.clone(),
            expires_in: Duration::from_secs(config.issuance.expires_in_secs),
            unique_prefix: config.issuance.unique_prefix,
        }
    }

    /// Create an issuer backed by [`S3Presigner`]
    pub fn from_config(config: &Config) -> Result<Self, SignerError> {
        let signer = S3Presigner::from_config(&config.storage)?;
        Ok(Self::new(config, Arc::new(signer)))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Build the storage key for an object name
    pub fn storage_key(&self, object_name: &str) -> Result<String, NamingError> {
        let name = naming::normalize_object_name(object_name, self.unique_prefix)?;
        Ok(format!("{}{}", self.key_prefix, name))
    }

    /// Issue a pre-signed PUT URL for `object_name`
    ///
    /// The failure cause is logged here; callers should only ever show a
    /// generic message.
    #[tracing::instrument(
        name = "issuance.issue_upload_url",
        skip(self),
        fields(
            storage.bucket = %self.bucket,
            storage.key = tracing::field::Empty
        ),
        err
    )]
    pub async fn issue_upload_url(&self, object_name: &str) -> Result<UploadUrl, IssuanceError> {
        let key = match self.storage_key(object_name) {
            Ok(key) => key,
            Err(e) => {
                metrics::record_rejected_name();
                tracing::warn!(error = %e, "Rejected object name");
                return Err(e.into());
            }
        };
        tracing::Span::current().record("storage.key", key.as_str());

        let request = PresignRequest {
            bucket: self.bucket.clone(),
            key,
            content_type: self.content_type.clone(),
            expires_in: self.expires_in,
        };

        let issued_at = Utc::now();
        let start_time = Instant::now();
        let result = self.signer.presign_put(&request).await;
        let duration = start_time.elapsed();
        metrics::record_presign_duration(duration.as_secs_f64());

        match result {
            Ok(url) => {
                metrics::record_upload_url_issued();
                tracing::info!(
                    key = %request.key,
                    duration_ms = duration.as_millis(),
                    "Upload URL issued"
                );
                Ok(UploadUrl {
                    url,
                    key: request.key,
                    expires_at: issued_at
                        + chrono::Duration::seconds(self.expires_in.as_secs() as i64),
                })
            }
            Err(e) => {
                metrics::record_upload_url_failure();
                metrics::record_error("presign");
                tracing::error!(
                    error = %e,
                    key = %request.key,
                    "Failed to presign upload URL"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner;

    #[async_trait]
    impl UrlSigner for FixedSigner {
        async fn presign_put(&self, request: &PresignRequest) -> Result<String, SignerError> {
            Ok(format!(
                "https://{}.example.com/{}?ct={}&expires={}",
                request.bucket,
                request.key,
                request.content_type,
                request.expires_in.as_secs()
            ))
        }
    }

    struct FailingSigner;

    #[async_trait]
    impl UrlSigner for FailingSigner {
        async fn presign_put(&self, _request: &PresignRequest) -> Result<String, SignerError> {
            Err(SignerError::SigningFailed("credentials rejected".into()))
        }
    }

    fn issuer(signer: Arc<dyn UrlSigner>) -> UploadUrlIssuer {
        let mut config = Config::default();
        config.issuance.unique_prefix = false;
        UploadUrlIssuer::new(&config, signer)
    }

    #[test]
    fn test_response_wire_names() {
        let body = serde_json::to_string(&UploadUrlResponse {
            upload_url: "https://x".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"uploadURL":"https://x"}"#);
    }

    #[tokio::test]
    async fn test_issue_uses_fixed_bucket_prefix_and_type() {
        let issued = issuer(Arc::new(FixedSigner))
            .issue_upload_url("demo.mp4")
            .await
            .unwrap();

        assert_eq!(issued.key, "uploads/demo.mp4");
        assert_eq!(
            issued.url,
            "https://user-uploaded-videos1.example.com/uploads/demo.mp4?ct=video/mp4&expires=3600"
        );
    }

    #[tokio::test]
    async fn test_expiry_is_one_hour_from_issuance() {
        let before = Utc::now();
        let issued = issuer(Arc::new(FixedSigner))
            .issue_upload_url("demo.mp4")
            .await
            .unwrap();
        let window = issued.expires_at - before;
        assert!(window.num_seconds() >= 3599 && window.num_seconds() <= 3601);
    }

    #[tokio::test]
    async fn test_signing_failure_is_reported() {
        let result = issuer(Arc::new(FailingSigner))
            .issue_upload_url("demo.mp4")
            .await;
        assert!(matches!(result, Err(IssuanceError::Signing(_))));
    }

    #[tokio::test]
    async fn test_traversal_never_reaches_signer() {
        let result = issuer(Arc::new(FailingSigner))
            .issue_upload_url("../../other-bucket/x.mp4")
            .await;
        assert!(matches!(
            result,
            Err(IssuanceError::InvalidName(NamingError::PathTraversal(_)))
        ));
    }
}
