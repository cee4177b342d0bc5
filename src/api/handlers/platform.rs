use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{
    requests::{CreatePlatformRequest, PlatformListParams, UpdatePlatformRequest},
    responses::{DataResponse, MessageResponse, Pagination, PlatformListResponse, PlatformResponse, QrResponse, StatusResponse},
};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::session::QrOutcome;
use crate::domain::services::platform_reconciler::PlatformChanges;
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_platform(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreatePlatformRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.reconciler
        .create(&user.tenant_id, payload.name.as_deref(), payload.agent_id.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: PlatformResponse::from(record) })))
}

pub async fn list_platforms(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PlatformListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.into_query();
    let (records, total) = state.reconciler.list(&user.tenant_id, &query).await?;

    Ok(Json(PlatformListResponse {
        data: records.into_iter().map(PlatformResponse::from).collect(),
        pagination: Pagination::new(query.page, query.limit, total),
    }))
}

pub async fn update_platform(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(platform_id): Path<String>,
    Json(payload): Json<UpdatePlatformRequest>,
) -> Result<impl IntoResponse, AppError> {
    let changes = PlatformChanges { name: payload.name, agent_id: payload.agent_id };
    let record = state.reconciler.update(&user.tenant_id, &platform_id, changes).await?;

    Ok(Json(DataResponse { data: PlatformResponse::from(record) }))
}

pub async fn delete_platform(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(platform_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.reconciler.delete(&user.tenant_id, &platform_id).await?;
    Ok(Json(MessageResponse { message: "Platform deleted".into() }))
}

/// `200 {qr}` once the code is rendered, `202 {message}` while the session is still booting.
pub async fn get_qr(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(platform_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let response = match state.reconciler.read_qr(&user.tenant_id, &platform_id).await? {
        QrOutcome::Ready(qr) => (StatusCode::OK, Json(QrResponse { qr })).into_response(),
        QrOutcome::NotReady(message) => (StatusCode::ACCEPTED, Json(MessageResponse { message })).into_response(),
    };
    Ok(response)
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(platform_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.reconciler.read_status(&user.tenant_id, &platform_id).await?;
    Ok(Json(StatusResponse::from(report)))
}
