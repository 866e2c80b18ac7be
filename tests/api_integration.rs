//! Integration tests for the management API
//!
//! Runs the full router over a SQLite store in a temp directory, with a
//! Wiremock server standing in for the upstream proxy API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use traefikr::adapters::inbound::{build_router, ApiState, API_KEY_HEADER};
use traefikr::adapters::outbound::{
    SqliteResourceRepository, TomlFragmentWriter, TraefikApiClient, TraefikClientConfig,
};
use traefikr::{ResourceService, SchemaRegistry};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    _dir: TempDir,
    upstream: MockServer,
}

async fn setup(api_key: Option<&str>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("traefikr.db");
    let repo = SqliteResourceRepository::open(db_path.to_str().unwrap()).unwrap();

    let upstream = MockServer::start().await;
    let mirror = TraefikApiClient::new(TraefikClientConfig {
        base_url: upstream.uri(),
        ..Default::default()
    })
    .unwrap();

    let service = ResourceService::new(
        Arc::new(repo),
        Arc::new(mirror),
        Arc::new(SchemaRegistry::new().unwrap()),
        Arc::new(TomlFragmentWriter::disabled()),
    );
    let router = build_router(ApiState::new(Arc::new(service), api_key.map(String::from)));

    TestApp {
        router,
        _dir: dir,
        upstream,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn router_body(name: &str) -> Value {
    json!({
        "name": name,
        "config": {"rule": "Host(`example.com`)", "service": "whoami"}
    })
}

async fn mount_mirror_routers(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/http/routers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "dashboard@internal",
                "provider": "internal",
                "status": "enabled",
                "rule": "PathPrefix(`/dashboard`)",
                "service": "dashboard@internal"
            },
            {
                "name": "web@http",
                "provider": "http",
                "status": "enabled",
                "rule": "Host(`stale.example.com`)",
                "service": "old"
            }
        ])))
        .mount(server)
        .await;
}

// ===== CRUD against the store =====

#[tokio::test]
async fn test_create_then_get_from_store() {
    let app = setup(None).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/http/routers", router_body("web")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["name"], "web");
    assert_eq!(created["provider"], "http");

    let response = app
        .router
        .oneshot(get_request("/api/http/routers/web@http"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["source"], "database");
    assert_eq!(body["config"]["service"], "whoami");
}

#[tokio::test]
async fn test_get_falls_back_to_mirror() {
    let app = setup(None).await;
    mount_mirror_routers(&app.upstream).await;

    let response = app
        .router
        .oneshot(get_request("/api/http/routers/dashboard@internal"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["source"], "traefik");
    assert_eq!(body["config"]["service"], "dashboard@internal");
}

#[tokio::test]
async fn test_get_unknown_resource_is_404() {
    let app = setup(None).await;

    let response = app
        .router
        .oneshot(get_request("/api/http/routers/ghost@http"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_type_for_protocol_is_400() {
    let app = setup(None).await;

    let response = app
        .router
        .oneshot(get_request("/api/udp/tls"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid type for protocol");
}

#[tokio::test]
async fn test_duplicate_create_is_409() {
    let app = setup(None).await;

    let first = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/http/routers", router_body("web")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .router
        .oneshot(json_request("POST", "/api/http/routers", router_body("web")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_rejects_names_that_cannot_be_addressed() {
    let app = setup(None).await;

    for name in ["a@b", "schema.json"] {
        let response = app
            .router
            .clone()
            .oneshot(json_request("POST", "/api/http/routers", router_body(name)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation failed");
    }

    let response = app
        .router
        .oneshot(get_request("/api/http/routers"))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_creates_have_one_winner() {
    let app = setup(None).await;

    let requests = (0..2).map(|_| {
        app.router
            .clone()
            .oneshot(json_request("POST", "/api/http/routers", router_body("race")))
    });
    let mut statuses: Vec<StatusCode> = futures::future::join_all(requests)
        .await
        .into_iter()
        .map(|r| r.unwrap().status())
        .collect();
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
}

#[tokio::test]
async fn test_update_then_delete() {
    let app = setup(None).await;

    app.router
        .clone()
        .oneshot(json_request("POST", "/api/http/routers", router_body("web")))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/http/routers/web@http",
            json!({"config": {"rule": "Host(`new.example.com`)", "service": "whoami"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["config"]["rule"],
        "Host(`new.example.com`)"
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/http/routers/web@http")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .router
        .oneshot(get_request("/api/http/routers/web@http"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ===== Merged listing =====

#[tokio::test]
async fn test_list_merges_mirror_with_store_precedence() {
    let app = setup(None).await;
    mount_mirror_routers(&app.upstream).await;

    app.router
        .clone()
        .oneshot(json_request("POST", "/api/http/routers", router_body("web")))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/http/routers?traefik=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response).await;
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);

    let web = items
        .iter()
        .find(|v| v["config"]["service"] == "whoami")
        .unwrap();
    assert_eq!(web["source"], "database");
    assert!(items.iter().all(|v| v["config"]["service"] != "old"));
    assert!(items.iter().any(|v| v["source"] == "traefik"));

    // Without the flag only the store is consulted.
    let response = app
        .router
        .oneshot(get_request("/api/http/routers"))
        .await
        .unwrap();
    let items = body_json(response).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_survives_unreachable_mirror() {
    let app = setup(None).await;
    Mock::given(method("GET"))
        .and(path("/api/http/routers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.upstream)
        .await;

    app.router
        .clone()
        .oneshot(json_request("POST", "/api/http/routers", router_body("web")))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get_request("/api/http/routers?traefik=true"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

// ===== Entrypoints and provider document =====

#[tokio::test]
async fn test_entrypoints_passthrough_and_upstream_failure() {
    let app = setup(None).await;
    Mock::given(method("GET"))
        .and(path("/api/entrypoints"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"name": "web", "address": ":80"}])),
        )
        .up_to_n_times(2)
        .mount(&app.upstream)
        .await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/entrypoints/web"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["address"], ":80");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/entrypoints/websecure"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Mock exhausted: upstream now answers 404 for the listing.
    let response = app
        .router
        .oneshot(get_request("/api/entrypoints"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_provider_config_reflects_enabled_records() {
    let app = setup(None).await;

    app.router
        .clone()
        .oneshot(json_request("POST", "/api/http/routers", router_body("web")))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(get_request("/api/config"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"http": {"routers": {"web": {"rule": "Host(`example.com`)", "service": "whoami"}}}})
    );
}

// ===== Access control =====

#[tokio::test]
async fn test_api_key_guards_resource_routes() {
    let app = setup(Some("sk_test")).await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/http/routers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/http/routers")
                .header(API_KEY_HEADER, "sk_test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .oneshot(get_request("/api/http/routers/schema.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
