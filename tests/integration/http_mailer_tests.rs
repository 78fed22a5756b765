//! `HttpMailer` against a local axum stub of the email API.
//!
//! Uses an ephemeral port; each test gets its own stub server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use due_notify::delivery::http::HttpMailer;
use due_notify::delivery::{EmailMessage, MailDelivery};
use due_notify::AppError;

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn spawn_stub(status: StatusCode, response: Value) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/emails",
            post(
                move |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| {
                    let response = response.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_owned);
                        captured.requests.lock().expect("lock").push((auth, body));
                        (status, Json(response)).into_response()
                    }
                },
            ),
        )
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}/emails"), captured)
}

fn message() -> EmailMessage {
    EmailMessage {
        to: "dev@example.com".into(),
        subject: "Reminder".into(),
        html: "<p>hi</p>".into(),
    }
}

#[tokio::test]
async fn accepted_send_returns_provider_id() {
    let (endpoint, captured) = spawn_stub(StatusCode::OK, json!({"id": "em_123"})).await;
    let mailer = HttpMailer::new(
        endpoint,
        "key-abc",
        "Board <noreply@example.com>",
        Duration::from_secs(5),
    )
    .expect("mailer");

    let receipt = mailer.send(&message()).await.expect("send");
    assert_eq!(receipt.id, "em_123");

    let requests = captured.requests.lock().expect("lock").clone();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer key-abc"));
    assert_eq!(body["from"], "Board <noreply@example.com>");
    assert_eq!(body["to"], json!(["dev@example.com"]));
    assert_eq!(body["subject"], "Reminder");
    assert_eq!(body["html"], "<p>hi</p>");
}

#[tokio::test]
async fn non_success_status_is_delivery_error() {
    let (endpoint, _captured) = spawn_stub(
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({"message": "invalid to address"}),
    )
    .await;
    let mailer = HttpMailer::new(endpoint, "k", "noreply@example.com", Duration::from_secs(5))
        .expect("mailer");

    let err = mailer.send(&message()).await.expect_err("rejected");
    match err {
        AppError::Delivery(msg) => {
            assert!(msg.contains("422"), "status in message: {msg}");
            assert!(msg.contains("invalid to address"), "body in message: {msg}");
        }
        other => panic!("expected delivery error, got {other}"),
    }
}

#[tokio::test]
async fn response_without_id_is_delivery_error() {
    let (endpoint, _captured) = spawn_stub(StatusCode::OK, json!({"ok": true})).await;
    let mailer = HttpMailer::new(endpoint, "k", "noreply@example.com", Duration::from_secs(5))
        .expect("mailer");

    let err = mailer.send(&message()).await.expect_err("malformed");
    assert!(matches!(err, AppError::Delivery(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_delivery_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mailer = HttpMailer::new(
        format!("http://{addr}/emails"),
        "k",
        "noreply@example.com",
        Duration::from_secs(2),
    )
    .expect("mailer");

    let err = mailer.send(&message()).await.expect_err("connection refused");
    assert!(matches!(err, AppError::Delivery(_)));
}
