//! Console-side half of the connection flow: an HTTP client for the polling
//! endpoints and the two-step wizard that drives it.

pub mod api_client;
pub mod wizard;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::platform::PlatformStatus;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// What the wizard needs from the backend.
#[async_trait]
pub trait PlatformPoller: Send + Sync {
    /// Returns the id of the new platform.
    async fn create_platform(&self, name: &str, agent_id: &str) -> Result<String, ClientError>;

    async fn fetch_status(&self, platform_id: &str) -> Result<PlatformStatus, ClientError>;

    /// `None` while the backend answers "not ready yet".
    async fn fetch_qr(&self, platform_id: &str) -> Result<Option<String>, ClientError>;
}
