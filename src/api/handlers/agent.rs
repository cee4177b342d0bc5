use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{requests::CreateAgentRequest, responses::DataResponse};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::agent::Agent;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let agents = state.agent_repo.list(&user.tenant_id).await?;
    Ok(Json(DataResponse { data: agents }))
}

pub async fn create_agent(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateAgentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Agent name is required".into()));
    }

    let description = payload.description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let agent = Agent::new(user.tenant_id, name.to_string(), description);
    let created = state.agent_repo.create(&agent).await?;

    info!("Agent created: {}", created.id);
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}
