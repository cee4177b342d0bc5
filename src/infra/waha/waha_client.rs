use crate::domain::models::session::{PollOutcome, RestartOutcome, SessionInfo};
use crate::domain::ports::RemoteSessionClient;
use crate::error::AppError;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Element holding the pairing QR code on the WhatsApp Web login screen.
pub const QR_SELECTOR: &str = "div[data-ref] canvas";

/// Captures smaller than this are blank or corrupt.
const MIN_QR_BYTES: usize = 100;

const WEBHOOK_EVENTS: [&str; 2] = ["message", "session.status"];

pub struct WahaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct WebhookConfig<'a> {
    url: &'a str,
    events: [&'a str; 2],
}

#[derive(Serialize)]
struct SessionConfig<'a> {
    webhooks: Vec<WebhookConfig<'a>>,
}

impl<'a> SessionConfig<'a> {
    fn webhook(url: &'a str) -> Self {
        Self { webhooks: vec![WebhookConfig { url, events: WEBHOOK_EVENTS }] }
    }
}

#[derive(Serialize)]
struct CreateSessionPayload<'a> {
    name: &'a str,
    start: bool,
    config: SessionConfig<'a>,
}

#[derive(Serialize)]
struct UpdateSessionPayload<'a> {
    config: SessionConfig<'a>,
}

impl WahaClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.header("X-Api-Key", &self.api_key)
        }
    }

    async fn create_session(&self, session_id: &str, webhook_url: &str) -> Result<(), AppError> {
        let payload = CreateSessionPayload {
            name: session_id,
            start: false,
            config: SessionConfig::webhook(webhook_url),
        };

        let res = self.authorized(self.client.post(self.url("/api/sessions")))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::RemoteServiceUnavailable(format!("create session {}: {}", session_id, e)))?;

        let status = res.status();
        // Another request created it first
        if status.is_success() || status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            info!("Remote session {} created (status {})", session_id, status);
            return Ok(());
        }

        let text = res.text().await.unwrap_or_default();
        Err(AppError::RemoteServiceUnavailable(format!("create session {} failed. Status: {}, Body: {}", session_id, status, text)))
    }

    /// Points an existing session's webhook at `webhook_url`. A reused session may still carry
    /// the webhook of the tenant that held it before.
    async fn update_webhook(&self, session_id: &str, webhook_url: &str) -> Result<(), AppError> {
        let payload = UpdateSessionPayload { config: SessionConfig::webhook(webhook_url) };

        let res = self.authorized(self.client.put(self.url(&format!("/api/sessions/{}", session_id))))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::RemoteServiceUnavailable(format!("update session {}: {}", session_id, e)))?;

        if res.status().is_success() {
            debug!("Webhook of remote session {} updated", session_id);
            return Ok(());
        }

        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        Err(AppError::RemoteServiceUnavailable(format!("update session {} failed. Status: {}, Body: {}", session_id, status, text)))
    }

    async fn start_session(&self, session_id: &str) -> Result<(), String> {
        let res = self.authorized(self.client.post(self.url(&format!("/api/sessions/{}/start", session_id))))
            .send()
            .await
            .map_err(|e| format!("connection error: {}", e))?;

        if res.status().is_success() {
            return Ok(());
        }

        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        Err(format!("Status: {}, Body: {}", status, text))
    }
}

#[async_trait]
impl RemoteSessionClient for WahaClient {
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>, AppError> {
        let res = self.authorized(self.client.get(self.url(&format!("/api/sessions/{}", session_id))))
            .send()
            .await
            .map_err(|e| AppError::RemoteServiceUnavailable(format!("get session {}: {}", session_id, e)))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::RemoteServiceUnavailable(format!("get session {} failed. Status: {}, Body: {}", session_id, status, text)));
        }

        let info = res.json::<SessionInfo>().await
            .map_err(|e| AppError::RemoteServiceUnavailable(format!("invalid session payload for {}: {}", session_id, e)))?;
        Ok(Some(info))
    }

    #[instrument(skip(self, webhook_url))]
    async fn create_and_start(&self, session_id: &str, webhook_url: &str) -> Result<(), AppError> {
        match self.get_session(session_id).await? {
            None => self.create_session(session_id, webhook_url).await?,
            Some(_) => self.update_webhook(session_id, webhook_url).await?,
        }

        let start_err = match self.start_session(session_id).await {
            Ok(()) => {
                info!("Remote session {} started", session_id);
                return Ok(());
            }
            Err(e) => e,
        };

        // No clean "already started" answer exists, so re-read the session to decide.
        match self.get_session(session_id).await {
            Ok(Some(info)) if info.status.is_active() => {
                info!("Start of {} rejected but session is already {}", session_id, info.status);
                Ok(())
            }
            Ok(other) => Err(AppError::RemoteServiceUnavailable(format!(
                "start session {} failed ({}), session state afterwards: {}",
                session_id,
                start_err,
                other.map(|i| i.status.to_string()).unwrap_or_else(|| "missing".into())
            ))),
            Err(e) => Err(AppError::RemoteServiceUnavailable(format!("start session {} failed ({}), re-check failed: {}", session_id, start_err, e))),
        }
    }

    async fn fetch_qr_image(&self, session_id: &str) -> Result<Option<String>, AppError> {
        let res = self.authorized(self.client.get(self.url("/api/screenshot")))
            .query(&[("session", session_id), ("selector", QR_SELECTOR)])
            .send()
            .await
            .map_err(|e| AppError::RemoteServiceUnavailable(format!("screenshot {}: {}", session_id, e)))?;

        // Selector not rendered yet while the browser boots
        if !res.status().is_success() {
            debug!("QR for {} not available yet (status {})", session_id, res.status());
            return Ok(None);
        }

        let bytes = res.bytes().await
            .map_err(|e| AppError::RemoteServiceUnavailable(format!("screenshot body {}: {}", session_id, e)))?;

        if bytes.len() < MIN_QR_BYTES {
            debug!("QR capture for {} too small ({} bytes)", session_id, bytes.len());
            return Ok(None);
        }

        Ok(Some(format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(&bytes))))
    }

    async fn get_status(&self, session_id: &str) -> PollOutcome {
        match self.get_session(session_id).await {
            Ok(Some(info)) => PollOutcome::Reported(info.status),
            Ok(None) => PollOutcome::Missing,
            Err(e) => PollOutcome::Unreachable(e.to_string()),
        }
    }

    async fn ensure_started(&self, session_id: &str) -> RestartOutcome {
        match self.start_session(session_id).await {
            Ok(()) => {
                info!("Auto-restart requested for session {}", session_id);
                RestartOutcome::Requested
            }
            Err(e) => RestartOutcome::Failed(e),
        }
    }

    async fn stop(&self, session_id: &str) {
        let res = self.authorized(self.client.post(self.url(&format!("/api/sessions/{}/stop", session_id))))
            .send()
            .await;

        match res {
            Ok(response) if response.status().is_success() => info!("Remote session {} stopped", session_id),
            Ok(response) => warn!("Stopping session {} returned status {}", session_id, response.status()),
            Err(e) => warn!("Stopping session {} failed: {}", session_id, e),
        }
    }
}
