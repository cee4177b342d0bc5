#![allow(dead_code)]

use agent_platform_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::factory::{assemble_state, Repositories},
    domain::models::{
        agent::Agent,
        session::{PollOutcome, RawSessionStatus, RestartOutcome, SessionInfo},
        tenant::Tenant,
        user::User,
    },
    domain::ports::RemoteSessionClient,
    error::AppError,
};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const TEST_WEBHOOK: &str = "https://n8n.example.com/webhook/inbound";

/// In-memory stand-in for the remote session service.
#[derive(Default)]
pub struct MockSessionClient {
    sessions: Mutex<HashMap<String, RawSessionStatus>>,
    qr_image: Mutex<Option<String>>,
    stopped: Mutex<Vec<String>>,
    pub unreachable: AtomicBool,
    pub fail_start: AtomicBool,
    pub create_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub qr_calls: AtomicUsize,
    pub restart_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl MockSessionClient {
    pub fn set_status(&self, session_id: &str, status: RawSessionStatus) {
        self.sessions.lock().unwrap().insert(session_id.to_string(), status);
    }

    pub fn status_of(&self, session_id: &str) -> Option<RawSessionStatus> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }

    pub fn set_qr(&self, image: Option<&str>) {
        *self.qr_image.lock().unwrap() = image.map(str::to_string);
    }

    pub fn stopped_sessions(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn remote_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
            + self.qr_calls.load(Ordering::SeqCst)
            + self.restart_calls.load(Ordering::SeqCst)
            + self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSessionClient for MockSessionClient {
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>, AppError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::RemoteServiceUnavailable("connection refused".into()));
        }
        Ok(self.status_of(session_id).map(|status| SessionInfo { name: session_id.to_string(), status }))
    }

    async fn create_and_start(&self, session_id: &str, _webhook_url: &str) -> Result<(), AppError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) || self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::RemoteServiceUnavailable("start rejected".into()));
        }
        self.set_status(session_id, RawSessionStatus::Starting);
        Ok(())
    }

    async fn fetch_qr_image(&self, _session_id: &str) -> Result<Option<String>, AppError> {
        self.qr_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.qr_image.lock().unwrap().clone())
    }

    async fn get_status(&self, session_id: &str) -> PollOutcome {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.get_session(session_id).await {
            Ok(Some(info)) => PollOutcome::Reported(info.status),
            Ok(None) => PollOutcome::Missing,
            Err(e) => PollOutcome::Unreachable(e.to_string()),
        }
    }

    async fn ensure_started(&self, _session_id: &str) -> RestartOutcome {
        self.restart_calls.fetch_add(1, Ordering::SeqCst);
        RestartOutcome::Requested
    }

    async fn stop(&self, session_id: &str) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.stopped.lock().unwrap().push(session_id.to_string());
        // Unreachable: the stop is lost, which callers must tolerate
        if !self.unreachable.load(Ordering::SeqCst) {
            self.set_status(session_id, RawSessionStatus::Stopped);
        }
    }
}

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

/// A customer tenant with a login and one agent.
pub struct Customer {
    pub tenant: Tenant,
    pub agent: Agent,
    pub auth: AuthHeaders,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub remote: Arc<MockSessionClient>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_session_mode("PLUS").await
    }

    pub async fn with_session_mode(mode: &str) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            waha_base_url: "http://waha.invalid".to_string(),
            waha_api_key: String::new(),
            waha_session_mode: mode.to_string(),
            waha_timeout_secs: 1,
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            default_session_limit: 5,
            bootstrap_admin_password: None,
        };

        let remote = Arc::new(MockSessionClient::default());
        let state = Arc::new(assemble_state(&config, Repositories::sqlite(&pool), remote.clone()));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            remote,
        }
    }

    pub async fn seed_tenant(&self, slug: &str, limit: i32, expiry: Option<DateTime<Utc>>, webhook_url: Option<&str>) -> Tenant {
        let mut tenant = Tenant::new(format!("Tenant {}", slug), slug.to_string(), limit);
        tenant.subscription_expiry = expiry;
        tenant.webhook_url = webhook_url.map(str::to_string);
        self.state.tenant_repo.create(&tenant).await.expect("seed tenant")
    }

    pub async fn seed_user(&self, tenant_id: &str, username: &str) -> User {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(TEST_PASSWORD.as_bytes(), &salt)
            .unwrap()
            .to_string();
        self.state.user_repo
            .create(&User::admin(tenant_id.to_string(), username.to_string(), hash))
            .await
            .expect("seed user")
    }

    pub async fn seed_agent(&self, tenant_id: &str, name: &str) -> Agent {
        self.state.agent_repo
            .create(&Agent::new(tenant_id.to_string(), name.to_string(), None))
            .await
            .expect("seed agent")
    }

    /// Tenant with an active subscription, a webhook, one agent and a logged-in admin.
    pub async fn customer(&self, slug: &str, limit: i32) -> Customer {
        let expiry = Utc::now() + chrono::Duration::days(30);
        let tenant = self.seed_tenant(slug, limit, Some(expiry), Some(TEST_WEBHOOK)).await;
        self.seed_user(&tenant.id, "admin").await;
        let agent = self.seed_agent(&tenant.id, "Support Bot").await;
        let auth = self.login(slug, "admin", TEST_PASSWORD).await;
        Customer { tenant, agent, auth }
    }

    pub async fn login(&self, tenant_slug: &str, username: &str, password: &str) -> AuthHeaders {
        let payload = serde_json::json!({
            "tenant_slug": tenant_slug,
            "username": username,
            "password": password
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let access_token = cookie_value(&response, "access_token").expect("No access_token cookie returned");

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    /// Sends an authenticated request and returns the status with the parsed body (`Null` when empty).
    pub async fn call(&self, method: &str, uri: &str, auth: &AuthHeaders, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, format!("access_token={}", auth.access_token))
            .header("X-CSRF-Token", &auth.csrf_token);

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                panic!("Failed to parse JSON: {:?}. Status: {}. Body: {:?}", e, status, String::from_utf8_lossy(&bytes))
            })
        };
        (status, json)
    }

    pub async fn create_platform(&self, customer: &Customer, name: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/api/v1/platforms",
            &customer.auth,
            Some(serde_json::json!({ "name": name, "agentId": customer.agent.id })),
        ).await
    }
}

pub fn cookie_value(response: &axum::response::Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .map(|c| c[prefix.len()..].split(';').next().unwrap_or_default().to_string())
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
