//! Integration tests for mesh-keys

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use mesh_keys::config::Snapshot;
use mesh_keys::forward::FORWARD_ERROR_BODY;
use mesh_keys::server::create_server_router;
use std::collections::HashMap;
use std::net::SocketAddr;
use tower::ServiceExt;

/// Start an upstream server on an ephemeral port
async fn spawn_upstream() -> SocketAddr {
    let upstream = Router::new()
        .route(
            "/ok",
            get(|| async {
                (
                    StatusCode::CREATED,
                    [(header::CONTENT_TYPE, "application/json")],
                    r#"{"ok":true}"#,
                )
            }),
        )
        .route(
            "/busy",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    addr
}

/// An address nothing listens on
async fn unreachable_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn app(pairs: &[(&str, String)]) -> Router {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let snapshot = Snapshot::from_vars(&vars).unwrap();
    create_server_router(&snapshot).unwrap()
}

async fn get_path(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_forward_relays_upstream_status_and_body() {
    let upstream = spawn_upstream().await;
    let app = app(&[
        ("FORWARD_KEYS", "svc".to_string()),
        ("SVC_URL", format!("http://{}/ok", upstream)),
    ]);

    let (status, content_type, body) = get_path(app, "/forward/svc").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, r#"{"ok":true}"#);
}

#[tokio::test]
async fn test_forward_relays_upstream_error_status() {
    let upstream = spawn_upstream().await;
    let app = app(&[
        ("FORWARD_KEYS", "svc".to_string()),
        ("SVC_URL", format!("http://{}/busy", upstream)),
    ]);

    let (status, _, body) = get_path(app, "/forward/svc").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "try later");
}

#[tokio::test]
async fn test_forward_unreachable_upstream_is_406() {
    let addr = unreachable_addr().await;
    let app = app(&[
        ("FORWARD_KEYS", "svc".to_string()),
        ("SVC_URL", format!("http://{}/down", addr)),
    ]);

    let (status, _, body) = get_path(app, "/forward/svc").await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body, FORWARD_ERROR_BODY);
}

#[tokio::test]
async fn test_forward_timeout_is_406() {
    // Accepts connections but never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let app = app(&[
        ("FORWARD_KEYS", "slow".to_string()),
        ("SLOW_URL", format!("http://{}/hang", addr)),
        ("FORWARD_TIMEOUT_SECS", "1".to_string()),
    ]);

    let (status, _, body) = get_path(app, "/forward/slow").await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body, FORWARD_ERROR_BODY);
}

#[tokio::test]
async fn test_forward_without_url_is_404() {
    let app = app(&[("FORWARD_KEYS", "svc".to_string())]);

    let (status, _, _) = get_path(app, "/forward/svc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_keys_and_forwards_together() {
    let upstream = spawn_upstream().await;
    let app = app(&[
        ("KEYS", "foo, bar".to_string()),
        ("BAR_VALUE", "hello".to_string()),
        ("FORWARD_KEYS", "svc,missing".to_string()),
        ("SVC_URL", format!("http://{}/ok", upstream)),
    ]);

    let (status, content_type, body) = get_path(app.clone(), "/key/foo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, r#"{"value":"foo"}"#);

    let (_, _, body) = get_path(app.clone(), "/key/bar").await;
    assert_eq!(body, r#"{"value":"hello"}"#);

    let (status, _, _) = get_path(app.clone(), "/forward/svc").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, _) = get_path(app, "/forward/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_key_style_key_variant() {
    let app = app(&[
        ("KEYS", "foo".to_string()),
        ("FOO_VALUE", "hello".to_string()),
        ("KEY_STYLE", "key".to_string()),
    ]);

    let (status, _, body) = get_path(app, "/key/foo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"key":"foo"}"#);
}

#[tokio::test]
async fn test_served_over_tcp() {
    let upstream = spawn_upstream().await;
    let app = app(&[
        ("KEYS", "foo".to_string()),
        ("FORWARD_KEYS", "svc".to_string()),
        ("SVC_URL", format!("http://{}/ok", upstream)),
    ]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let key = client
        .get(format!("http://{}/key/foo", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(key.status().as_u16(), 200);
    assert_eq!(key.text().await.unwrap(), r#"{"value":"foo"}"#);

    let forward = client
        .get(format!("http://{}/forward/svc", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(forward.status().as_u16(), 201);
    assert_eq!(forward.text().await.unwrap(), r#"{"ok":true}"#);
}
