//! Prometheus metrics endpoint
//!
//! Serves `/metrics` and `/health` on their own listener so scraping never
//! shares a port with the public issuance endpoint.
//!
//! # Example
//!
//! ```no_run
//! use clipdrop::metrics::server::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("127.0.0.1:9090");
//! let addr = server.start().await?;
//! println!("Metrics server listening on {}", addr);
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::config::MetricsConfig;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, TextEncoder};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Metrics server error
#[derive(Debug, thiserror::Error)]
pub enum MetricsServerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Prometheus metrics HTTP server
pub struct MetricsServer {
    address: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MetricsServer {
    /// Create a metrics server for `address`; nothing is bound until `start`
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            shutdown_tx: None,
            server_handle: None,
        }
    }

    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.address.clone())
    }

    /// Start the metrics server
    ///
    /// Returns the actual bound address (useful when using port 0)
    pub async fn start(&mut self) -> Result<SocketAddr, MetricsServerError> {
        let listener = TcpListener::bind(&self.address).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);
        self.server_handle = Some(tokio::spawn(run_server(listener, shutdown_rx)));

        debug!(%addr, "Metrics server started");
        Ok(addr)
    }

    /// Shutdown the metrics server
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }
}

async fn run_server(listener: TcpListener, mut shutdown_rx: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Metrics server failed to accept connection");
                        continue;
                    }
                };
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(io, service_fn(handle_request))
                        .await
                    {
                        debug!(%peer_addr, error = %e, "Metrics connection error");
                    }
                });
            }
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => metrics_response(),
        (&Method::GET, "/health") => {
            text_response(StatusCode::OK, "application/json", r#"{"status":"ok"}"#)
        }
        _ => text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found"),
    };
    Ok(response)
}

fn metrics_response() -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain",
            "Failed to encode metrics",
        );
    }

    let mut response = Response::new(Full::new(Bytes::from(buffer)));
    if let Ok(value) = HeaderValue::from_str(encoder.format_type()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_address() {
        let config = MetricsConfig {
            enabled: true,
            address: "127.0.0.1:9191".into(),
        };
        let server = MetricsServer::from_config(&config);
        assert_eq!(server.address, "127.0.0.1:9191");
    }

    #[tokio::test]
    async fn test_serves_metrics_and_health() {
        crate::metrics::record_upload_url_issued();

        let mut server = MetricsServer::new("127.0.0.1:0");
        let addr = server.start().await.unwrap();

        let body = reqwest::get(format!("http://{}/metrics", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("clipdrop_upload_urls_total"));

        let health = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
        assert_eq!(health.status(), reqwest::StatusCode::OK);

        let missing = reqwest::get(format!("http://{}/nope", addr)).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        server.shutdown().await;
    }
}
