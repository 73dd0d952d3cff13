//! End-to-end tests through the HTTP router.

use api_faker::config::{parse_document, PathSource, Settings, EXAMPLE_SCHEMA};
use api_faker::server::{router, AppState, SchemaSource};
use api_faker::Schema;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;

fn schema_document() -> Value {
    json!({
        "routes": {
            "/": { "GET": { "home": true } },
            "users": {
                "GET": { "id": "int:c", "name": "string:4" },
                "POST": { "id": "int:3" },
                "(\\d+)": { "GET": { "id": "args:1", "lorem": "string:lorem" } }
            },
            "user/(\\w+)": { "GET": { "who": "args:1" } },
            "user/admin": { "GET": { "who": "second" } },
            "slow": { "GET": { "ok": true } }
        },
        "rules": {
            "global": {
                "GET": { "headers": ["X-Global: 1"], "code": 201, "delay": 100 },
                "POST": { "code": "202" }
            },
            "users": {
                "GET": {
                    "type": "array",
                    "count": 3,
                    "delay": 0,
                    "headers": ["X-Route: 2"]
                }
            },
            "slow": { "GET": { "delay": 50 } },
            "user/(\\w+)": { "GET": { "delay": 0 } },
            "user/admin": { "GET": { "delay": 0 } },
            "/": { "GET": { "delay": "zero" } }
        }
    })
}

fn app_with(settings: Settings, source: SchemaSource) -> axum::Router {
    router(Arc::new(AppState::new(settings, source)))
}

fn app() -> axum::Router {
    let schema = Schema::from_document(&schema_document()).unwrap();
    app_with(Settings::default(), SchemaSource::Preloaded(Arc::new(schema)))
}

async fn send(app: axum::Router, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_array_route_with_layered_rules() {
    let response = send(app(), Method::GET, "/?q=/users").await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-global"], "1");
    assert_eq!(response.headers()["x-route"], "2");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );

    let body = body_json(response).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 3);
    for (i, user) in users.iter().enumerate() {
        assert_eq!(user["id"], json!(i));
        assert_eq!(user["name"].as_str().unwrap().len(), 5);
    }
}

#[tokio::test]
async fn test_capture_argument() {
    let response = send(app(), Method::GET, "/?q=/users/42").await;
    let body = body_json(response).await;

    assert_eq!(body["id"], "42");
    assert_eq!(
        body["lorem"],
        "Lorem ipsum commodi autem hic eum est blanditiis dolor it."
    );
}

#[tokio::test]
async fn test_first_declared_pattern_wins() {
    // `/user/admin` is declared second, so the capture route answers.
    let response = send(app(), Method::GET, "/?q=/user/admin").await;
    assert_eq!(body_json(response).await, json!({ "who": "admin" }));

    let response = send(app(), Method::GET, "/?q=/user/bob").await;
    assert_eq!(body_json(response).await, json!({ "who": "bob" }));
}

#[tokio::test]
async fn test_missing_query_resolves_root() {
    let started = Instant::now();
    let response = send(app(), Method::GET, "/anything").await;

    // Malformed route delay falls back to the global one.
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({ "home": true }));
}

#[tokio::test]
async fn test_route_delay_overrides_global() {
    let started = Instant::now();
    let response = send(app(), Method::GET, "/?q=/slow").await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_post_uses_post_rules() {
    let response = send(app(), Method::POST, "/?q=/users").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().get("x-global").is_none());

    let id = body_json(response).await["id"].as_i64().unwrap();
    assert!((100..=999).contains(&id));
}

#[tokio::test]
async fn test_unsupported_method_message() {
    let response = send(app(), Method::POST, "/?q=/users/42").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Route not implemented for method POST (/users/(\\d+))" })
    );

    let response = send(app(), Method::DELETE, "/?q=/users").await;
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Route not implemented for method DELETE (/users)" })
    );
}

#[tokio::test]
async fn test_unknown_route_message() {
    let response = send(app(), Method::GET, "/?q=/nowhere").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Route not implemented (/nowhere)" })
    );
}

#[tokio::test]
async fn test_body_is_pretty_printed() {
    let response = send(app(), Method::GET, "/?q=/users/7").await;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.starts_with("{\n  \"id\": \"7\""));
}

#[tokio::test]
async fn test_uri_path_source() {
    let schema = Schema::from_document(&schema_document()).unwrap();
    let settings = Settings {
        path_source: PathSource::Uri,
        ..Default::default()
    };
    let app = app_with(settings, SchemaSource::Preloaded(Arc::new(schema)));

    let response = send(app, Method::GET, "/users/9").await;
    assert_eq!(body_json(response).await["id"], "9");
}

#[tokio::test]
async fn test_reload_reads_schema_per_request() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{}", json!({ "routes": { "ping": { "GET": "pong" } } })).unwrap();
    file.flush().unwrap();

    let source = SchemaSource::Reload(file.path().to_path_buf());
    let app = app_with(Settings::default(), source);

    let response = send(app.clone(), Method::GET, "/?q=/ping").await;
    assert_eq!(body_json(response).await, json!("pong"));

    std::fs::write(
        file.path(),
        json!({ "routes": { "ping": { "GET": "changed" } } }).to_string(),
    )
    .unwrap();

    let response = send(app, Method::GET, "/?q=/ping").await;
    assert_eq!(body_json(response).await, json!("changed"));
}

#[tokio::test]
async fn test_reload_without_routes() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{}", json!({ "rules": {} })).unwrap();
    file.flush().unwrap();

    let app = app_with(
        Settings::default(),
        SchemaSource::Reload(file.path().to_path_buf()),
    );

    let response = send(app, Method::GET, "/?q=/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Schema reading failed. No routes found." })
    );
}

#[tokio::test]
async fn test_yaml_schema() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "routes:\n  items:\n    GET:\n      id: \"int:c\"").unwrap();
    file.flush().unwrap();

    let app = app_with(
        Settings::default(),
        SchemaSource::Reload(file.path().to_path_buf()),
    );

    let response = send(app, Method::GET, "/?q=/items").await;
    assert_eq!(body_json(response).await, json!({ "id": 0 }));
}

#[tokio::test]
async fn test_nested_rule_applies_to_nested_route() {
    let document = parse_document(Path::new("schema.json"), EXAMPLE_SCHEMA).unwrap();
    let schema = Schema::from_document(&document).unwrap();
    let app = app_with(Settings::default(), SchemaSource::Preloaded(Arc::new(schema)));

    let started = Instant::now();
    let response = send(app, Method::GET, "/?q=/users/7/posts").await;

    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(response.headers()["x-powered-by"], "api-faker");

    let body = body_json(response).await;
    let posts = body.as_array().unwrap();
    assert_eq!(posts.len(), 3);
    for (i, post) in posts.iter().enumerate() {
        assert_eq!(post["id"], json!(i));
        assert_eq!(post["author"], "7");
    }
}

#[tokio::test]
async fn test_reload_recovers_once_schema_appears() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    let app = app_with(Settings::default(), SchemaSource::Reload(path.clone()));

    let response = send(app.clone(), Method::GET, "/?q=/ping").await;
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Schema reading failed. No routes found." })
    );

    std::fs::write(&path, json!({ "routes": { "ping": { "GET": "pong" } } }).to_string()).unwrap();

    let response = send(app, Method::GET, "/?q=/ping").await;
    assert_eq!(body_json(response).await, json!("pong"));
}
