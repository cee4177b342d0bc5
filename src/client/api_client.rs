use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ClientError, PlatformPoller};
use crate::domain::models::platform::PlatformStatus;

/// Talks to `/api/v1/platforms` with the session cookies of a logged-in console user.
pub struct PlatformApiClient {
    client: Client,
    base_url: String,
    access_token: String,
    csrf_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    name: &'a str,
    agent_id: &'a str,
}

#[derive(Deserialize)]
struct Created {
    data: CreatedPlatform,
}

#[derive(Deserialize)]
struct CreatedPlatform {
    id: String,
}

#[derive(Deserialize)]
struct StatusBody {
    status: PlatformStatus,
}

#[derive(Deserialize)]
struct QrBody {
    qr: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl PlatformApiClient {
    pub fn new(base_url: &str, access_token: String, csrf_token: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            csrf_token,
        }
    }

    fn platforms_url(&self, suffix: &str) -> String {
        format!("{}/api/v1/platforms{}", self.base_url, suffix)
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::COOKIE, format!("access_token={}", self.access_token))
    }

    async fn rejected(res: Response) -> ClientError {
        let status = res.status().as_u16();
        let message = match res.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => String::new(),
        };
        ClientError::Rejected { status, message }
    }
}

#[async_trait]
impl PlatformPoller for PlatformApiClient {
    async fn create_platform(&self, name: &str, agent_id: &str) -> Result<String, ClientError> {
        let res = self.authenticated(self.client.post(self.platforms_url("")))
            .header("X-CSRF-Token", &self.csrf_token)
            .json(&CreateBody { name, agent_id })
            .send()
            .await?;

        if res.status() != StatusCode::CREATED {
            return Err(Self::rejected(res).await);
        }

        Ok(res.json::<Created>().await?.data.id)
    }

    async fn fetch_status(&self, platform_id: &str) -> Result<PlatformStatus, ClientError> {
        let res = self.authenticated(self.client.get(self.platforms_url(&format!("/{}/status", platform_id))))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(Self::rejected(res).await);
        }

        Ok(res.json::<StatusBody>().await?.status)
    }

    async fn fetch_qr(&self, platform_id: &str) -> Result<Option<String>, ClientError> {
        let res = self.authenticated(self.client.get(self.platforms_url(&format!("/{}/qr", platform_id))))
            .send()
            .await?;

        match res.status() {
            StatusCode::OK => Ok(Some(res.json::<QrBody>().await?.qr)),
            StatusCode::ACCEPTED => Ok(None),
            _ => Err(Self::rejected(res).await),
        }
    }
}
