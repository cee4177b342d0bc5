use std::env;

use crate::domain::services::session_id::SessionIdStrategy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub waha_base_url: String,
    pub waha_api_key: String,
    pub waha_session_mode: String, // CORE = one fixed session, anything else = per tenant
    pub waha_timeout_secs: u64,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub default_session_limit: i32,
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            waha_base_url: env::var("WAHA_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string()),
            waha_api_key: env::var("WAHA_API_KEY").unwrap_or_default(),
            waha_session_mode: env::var("WAHA_SESSION_MODE").unwrap_or_else(|_| "PLUS".to_string()),
            waha_timeout_secs: env::var("WAHA_TIMEOUT_SECS").unwrap_or_else(|_| "15".to_string()).parse().expect("WAHA_TIMEOUT_SECS must be a number"),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.agent-platform.local".to_string()),
            default_session_limit: env::var("DEFAULT_SESSION_LIMIT")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(5)
                .clamp(1, 10),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        }
    }

    pub fn session_id_strategy(&self) -> SessionIdStrategy {
        SessionIdStrategy::from_mode(&self.waha_session_mode)
    }
}
