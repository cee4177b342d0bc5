mod common;

use agent_platform_backend::infra::factory::{ensure_admin_tenant, ADMIN_TENANT_SLUG};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{cookie_value, TestApp};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.router.clone().oneshot(
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_and_tenant_settings() {
    let app = TestApp::new().await;

    let response = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/tenants")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "Bot Shop", "slug": "bot-shop" }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = parse_body(response).await;
    let admin_secret = created["admin_secret"].as_str().unwrap().to_string();
    assert_eq!(created["admin_username"], "admin");

    let auth = app.login("bot-shop", "admin", &admin_secret).await;

    let (status, tenant) = app.call("GET", "/api/v1/tenants", &auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["tier"], "customer");
    assert_eq!(tenant["platform_session_limit"], 5);
    assert!(tenant["subscription_expiry"].is_null());

    let (status, _) = app.call("PUT", "/api/v1/tenants", &auth, Some(json!({ "webhook_url": "not a url" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("PUT", "/api/v1/tenants", &auth, Some(json!({ "webhook_url": "ftp://example.com/hook" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, tenant) = app.call(
        "PUT",
        "/api/v1/tenants",
        &auth,
        Some(json!({ "name": "Bot Shop GmbH", "webhook_url": "https://n8n.example.com/webhook/x" })),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["name"], "Bot Shop GmbH");
    assert_eq!(tenant["webhook_url"], "https://n8n.example.com/webhook/x");

    // Fresh customer has no subscription yet
    let (status, agent) = app.call("POST", "/api/v1/agents", &auth, Some(json!({ "name": "Greeter" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let agent_id = agent["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.call("POST", "/api/v1/platforms", &auth, Some(json!({ "name": "Line 1", "agentId": agent_id }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, agents) = app.call("GET", "/api/v1/agents", &auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agents["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.call("POST", "/api/v1/tenants", &auth, Some(json!({ "name": "Dup", "slug": "bot-shop" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_subscription_management_requires_admin_tier() {
    let app = TestApp::new().await;
    let customer = app.customer("subscriber", 1).await;

    ensure_admin_tenant(&app.state, "operator-pass").await.unwrap();
    // Second call is a no-op
    ensure_admin_tenant(&app.state, "operator-pass").await.unwrap();
    let operator = app.login(ADMIN_TENANT_SLUG, "admin", "operator-pass").await;

    let uri = format!("/api/v1/admin/tenants/{}/subscription", customer.tenant.id);

    let (status, _) = app.call("PUT", &uri, &customer.auth, Some(json!({ "platform_session_limit": 10 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("PUT", &uri, &operator, Some(json!({ "platform_session_limit": 11 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("PUT", "/api/v1/admin/tenants/unknown/subscription", &operator, Some(json!({ "platform_session_limit": 2 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let expiry = Utc::now() + Duration::days(90);
    let (status, tenant) = app.call(
        "PUT",
        &uri,
        &operator,
        Some(json!({ "platform_session_limit": 2, "subscription_expiry": expiry })),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["platform_session_limit"], 2);

    // Raised limit takes effect for the next creation
    for name in ["One", "Two"] {
        let (status, _) = app.create_platform(&customer, name).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, body) = app.create_platform(&customer, "Three").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("2/2"));

    // Lowering the limit keeps existing platforms
    let (status, _) = app.call("PUT", &uri, &operator, Some(json!({ "platform_session_limit": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = app.call("GET", "/api/v1/platforms", &customer.auth, None).await;
    assert_eq!(list["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_requests_without_credentials_are_rejected() {
    let app = TestApp::new().await;
    let customer = app.customer("guarded", 5).await;

    let response = app.router.clone().oneshot(
        Request::builder().uri("/api/v1/platforms").body(Body::empty()).unwrap(),
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid cookie but no CSRF header on a mutating request
    let response = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/platforms")
            .header(header::COOKIE, format!("access_token={}", customer.auth.access_token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "x", "agentId": customer.agent.id }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "tenant_slug": "guarded", "username": "admin", "password": "wrong" }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_rotation_and_reuse() {
    let app = TestApp::new().await;
    app.customer("rotating", 5).await;

    let login = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({
                "tenant_slug": "rotating",
                "username": "admin",
                "password": common::TEST_PASSWORD
            }).to_string())).unwrap()
    ).await.unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let first_refresh = cookie_value(&login, "refresh_token").unwrap();

    let refresh = |token: String| {
        let router = app.router.clone();
        async move {
            router.oneshot(
                Request::builder().method("POST").uri("/api/v1/auth/refresh")
                    .header(header::COOKIE, format!("refresh_token={}", token))
                    .body(Body::empty()).unwrap()
            ).await.unwrap()
        }
    };

    let rotated = refresh(first_refresh.clone()).await;
    assert_eq!(rotated.status(), StatusCode::OK);
    let second_refresh = cookie_value(&rotated, "refresh_token").unwrap();
    assert_ne!(first_refresh, second_refresh);
    let body = parse_body(rotated).await;
    assert_eq!(body["user"]["username"], "admin");

    // Replaying the old token fails
    let replay = refresh(first_refresh).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let logout = app.router.clone().oneshot(
        Request::builder().method("POST").uri("/api/v1/auth/logout")
            .header(header::COOKIE, format!("refresh_token={}", second_refresh))
            .body(Body::empty()).unwrap()
    ).await.unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    let after_logout = refresh(second_refresh).await;
    assert_eq!(after_logout.status(), StatusCode::UNAUTHORIZED);
}
