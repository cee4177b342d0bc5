use agent_platform_backend::domain::models::session::{PollOutcome, RawSessionStatus, RestartOutcome};
use agent_platform_backend::domain::ports::RemoteSessionClient;
use agent_platform_backend::error::AppError;
use agent_platform_backend::infra::waha::waha_client::{WahaClient, QR_SELECTOR};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> WahaClient {
    WahaClient::new(server.uri(), "secret-key".into(), Duration::from_secs(2))
}

fn session(name: &str, status: &str) -> serde_json::Value {
    serde_json::json!({ "name": name, "status": status, "config": {} })
}

#[tokio::test]
async fn start_of_running_session_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/t_abc_1"))
        .and(header("X-Api-Key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session("t_abc_1", "WORKING")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/sessions/t_abc_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session("t_abc_1", "WORKING")))
        .expect(2)
        .mount(&server)
        .await;

    // Already running sessions reject the start
    Mock::given(method("POST"))
        .and(path("/api/sessions/t_abc_1/start"))
        .respond_with(ResponseTemplate::new(422).set_body_string("already started"))
        .expect(2)
        .mount(&server)
        .await;

    let waha = client(&server);
    waha.create_and_start("t_abc_1", "https://hooks.example.com/in").await.unwrap();
    waha.create_and_start("t_abc_1", "https://hooks.example.com/in").await.unwrap();
}

#[tokio::test]
async fn missing_session_is_created_with_webhook_then_started() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/t_new_1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .and(body_partial_json(serde_json::json!({
            "name": "t_new_1",
            "start": false,
            "config": { "webhooks": [{ "url": "https://hooks.example.com/in", "events": ["message", "session.status"] }] }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(session("t_new_1", "STOPPED")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/t_new_1/start"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).create_and_start("t_new_1", "https://hooks.example.com/in").await.unwrap();
}

#[tokio::test]
async fn reused_session_gets_the_new_webhook() {
    let server = MockServer::start().await;

    // Left behind by the previous holder of the shared session
    Mock::given(method("GET"))
        .and(path("/api/sessions/default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session("default", "STOPPED")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/sessions/default"))
        .and(body_partial_json(serde_json::json!({
            "config": { "webhooks": [{ "url": "https://hooks.example.com/new-tenant", "events": ["message", "session.status"] }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session("default", "STOPPED")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/default/start"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).create_and_start("default", "https://hooks.example.com/new-tenant").await.unwrap();
}

#[tokio::test]
async fn failed_webhook_update_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session("default", "STOPPED")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/sessions/default"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/default/start"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server).create_and_start("default", "https://hooks.example.com/in").await;
    assert!(matches!(result, Err(AppError::RemoteServiceUnavailable(_))));
}

#[tokio::test]
async fn failed_start_of_stopped_session_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/t_bad_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session("t_bad_1", "FAILED")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/sessions/t_bad_1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/t_bad_1/start"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client(&server).create_and_start("t_bad_1", "https://hooks.example.com/in").await;
    assert!(matches!(result, Err(AppError::RemoteServiceUnavailable(_))));
}

#[tokio::test]
async fn qr_capture_size_heuristic() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/screenshot"))
        .and(query_param("session", "tiny"))
        .and(query_param("selector", QR_SELECTOR))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 40]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/screenshot"))
        .and(query_param("session", "real"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 300]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/screenshot"))
        .and(query_param("session", "booting"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let waha = client(&server);
    assert_eq!(waha.fetch_qr_image("tiny").await.unwrap(), None);
    assert_eq!(waha.fetch_qr_image("booting").await.unwrap(), None);

    let image = waha.fetch_qr_image("real").await.unwrap().unwrap();
    assert!(image.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn status_outcomes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/scanning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session("scanning", "SCAN_QR_CODE")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let waha = client(&server);
    assert_eq!(waha.get_status("gone").await, PollOutcome::Missing);
    assert_eq!(waha.get_status("scanning").await, PollOutcome::Reported(RawSessionStatus::ScanQrCode));
    assert!(matches!(waha.get_status("broken").await, PollOutcome::Unreachable(_)));
    assert!(waha.get_session("gone").await.unwrap().is_none());
}

#[tokio::test]
async fn unreachable_service_is_tolerated_where_required() {
    // Nothing listens on this port
    let waha = WahaClient::new("http://127.0.0.1:9".into(), String::new(), Duration::from_millis(500));

    assert!(matches!(waha.get_status("any").await, PollOutcome::Unreachable(_)));
    assert!(matches!(waha.ensure_started("any").await, RestartOutcome::Failed(_)));
    waha.stop("any").await;

    let result = waha.create_and_start("any", "https://hooks.example.com/in").await;
    assert!(matches!(result, Err(AppError::RemoteServiceUnavailable(_))));
}

#[tokio::test]
async fn stop_failure_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/t_x_1/stop"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).stop("t_x_1").await;
}
