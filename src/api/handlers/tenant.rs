use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{
    requests::{CreateTenantRequest, UpdateSubscriptionRequest, UpdateTenantRequest},
    responses::TenantCreatedResponse
};
use crate::api::extractors::{auth::AuthUser, tenant::PathTenant};
use crate::domain::models::{tenant::{Tenant, MAX_SESSION_LIMIT, MIN_SESSION_LIMIT}, user::User};
use std::sync::Arc;
use crate::error::AppError;
use rand::{distributions::Alphanumeric, Rng};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use reqwest::Url;
use tracing::info;

pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim();
    let slug = payload.slug.trim().to_lowercase();
    if name.is_empty() || slug.is_empty() {
        return Err(AppError::Validation("Name and slug are required".into()));
    }

    let tenant = Tenant::new(name.to_string(), slug, state.config.default_session_limit);
    let created_tenant = state.tenant_repo.create(&tenant).await?;

    info!("Tenant created: {}", created_tenant.id);

    let admin_password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(admin_password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?
        .to_string();

    let admin_user = User::admin(created_tenant.id.clone(), "admin".to_string(), password_hash);
    state.user_repo.create(&admin_user).await?;

    Ok((StatusCode::CREATED, Json(TenantCreatedResponse {
        tenant_id: created_tenant.id,
        admin_username: admin_user.username,
        admin_secret: admin_password,
    })))
}

pub async fn get_current_tenant(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state.tenant_repo.find_by_id(&user.tenant_id).await?
        .ok_or(AppError::NotFound("Tenant not found".into()))?;
    Ok(Json(tenant))
}

pub async fn update_tenant(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tenant = state.tenant_repo.find_by_id(&user.tenant_id).await?
        .ok_or(AppError::NotFound("Tenant not found".into()))?;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name cannot be empty".into()));
        }
        tenant.name = name.to_string();
    }

    if let Some(webhook_url) = payload.webhook_url {
        tenant.webhook_url = normalize_webhook_url(&webhook_url)?;
    }

    let updated = state.tenant_repo.update(&tenant).await?;
    info!("Tenant updated: {}", updated.id);
    Ok(Json(updated))
}

/// Operator endpoint: renews or revokes a customer's subscription and sets its session limit.
pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    PathTenant(target): PathTenant,
    Json(payload): Json<UpdateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let caller_tenant = state.tenant_repo.find_by_id(&user.tenant_id).await?
        .ok_or(AppError::Unauthorized)?;

    if !caller_tenant.is_admin_tier() {
        return Err(AppError::Forbidden("Only platform administrators can manage subscriptions".into()));
    }

    let limit = payload.platform_session_limit.unwrap_or(target.platform_session_limit);
    if !(MIN_SESSION_LIMIT..=MAX_SESSION_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "Session limit must be between {} and {}", MIN_SESSION_LIMIT, MAX_SESSION_LIMIT
        )));
    }

    let expiry = payload.subscription_expiry.or(target.subscription_expiry);
    let updated = state.tenant_repo.update_subscription(&target.id, expiry, limit).await?;

    info!("Subscription of tenant {} set to expiry {:?}, limit {} by {}", updated.id, updated.subscription_expiry, limit, user.user_id);
    Ok(Json(updated))
}

/// Blank clears the webhook. Anything else must be an absolute http(s) URL.
fn normalize_webhook_url(raw: &str) -> Result<Option<String>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(raw)
        .map_err(|_| AppError::Validation("Webhook URL must be an absolute URL".into()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::Validation("Webhook URL must use http or https".into()));
    }

    Ok(Some(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::normalize_webhook_url;

    #[test]
    fn webhook_url_validation() {
        assert_eq!(normalize_webhook_url("  ").unwrap(), None);
        assert_eq!(
            normalize_webhook_url(" https://n8n.example.com/webhook/abc ").unwrap().as_deref(),
            Some("https://n8n.example.com/webhook/abc")
        );
        assert!(normalize_webhook_url("ftp://files.example.com").is_err());
        assert!(normalize_webhook_url("/relative/path").is_err());
    }
}
