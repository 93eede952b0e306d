//! HTTP server module
//!
//! Accepts connections with `hyper` on `tokio` and hands every request to
//! [`handler::handle_request`]. Requests share nothing but read-only state, so
//! any number of connections can be served concurrently.
//!
//! # Example
//!
//! ```no_run
//! use clipdrop::config::Config;
//! use clipdrop::server::Server;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let server = Server::new(config).await?;
//! println!("Listening on {}", server.local_addr());
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod handler;

use crate::config::{Config, ConfigError};
use crate::issuance::{SignerError, UploadUrlIssuer};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create signer: {0}")]
    Signer(#[from] SignerError),

    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("Server error: {0}")]
    RuntimeError(String),
}

/// HTTP Server
pub struct Server {
    issuer: Arc<UploadUrlIssuer>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Validate `config`, build the S3-backed issuer and bind the listener
    pub async fn new(config: Config) -> Result<Self, ServerError> {
        config.validate()?;
        let issuer = UploadUrlIssuer::from_config(&config)?;
        Self::with_issuer(&config, issuer).await
    }

    /// Bind the listener for an already constructed issuer
    ///
    /// If port 0 is configured, the OS assigns a free port; see [`local_addr`].
    ///
    /// [`local_addr`]: Server::local_addr
    pub async fn with_issuer(
        config: &Config,
        issuer: UploadUrlIssuer,
    ) -> Result<Self, ServerError> {
        let addr = config.server.socket_addr()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {}: {}", addr, e)))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(format!("Failed to get local address: {}", e)))?;

        info!(bucket = %issuer.bucket(), "Server bound to {}", local_addr);

        Ok(Self {
            issuer: Arc::new(issuer),
            listener,
            local_addr,
        })
    }

    /// The address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Serve until `shutdown` completes
    ///
    /// Connection errors are logged and never stop the accept loop.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        info!("Serving upload URLs on {}", self.local_addr);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                },
            };

            let issuer = Arc::clone(&self.issuer);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req| {
                    let issuer = Arc::clone(&issuer);
                    async move { handler::handle_request(req, issuer).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Error serving connection from {}: {}", peer_addr, e);
                }
            });
        }

        info!("Shutting down server");
        Ok(())
    }
}
