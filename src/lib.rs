//! Clipdrop Library
//!
//! MP4 video intake with direct-to-S3 upload URLs.
//!
//! # Features
//!
//! - **Intake**: One selected-file slot fed by picker, drag and drop and remove,
//!   admitting only MP4 files, driven by a pure reducer
//! - **Issuance**: Pre-signed, one-hour PUT URLs for a fixed bucket and prefix
//! - **Safe Naming**: Object names are reduced to one sanitized path segment
//! - **Fail Fast**: Configuration and credentials are validated at startup
//!
//! # Example
//!
//! ```no_run
//! use clipdrop::{config::Config, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod intake;
pub mod issuance;
pub mod logging;
pub mod metrics;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use intake::{CandidateFile, IntakeController, IntakeState};
pub use issuance::UploadUrlIssuer;
pub use server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The only content type admitted by intake and signed by issuance.
pub const MP4_MIME_TYPE: &str = "video/mp4";
