//! Wire tests for registry submission against a local axum server.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use patra_core::{AIModel, ModelCard, RegistryClient};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    hits: AtomicUsize,
    last_body: Mutex<Option<String>>,
    last_content_type: Mutex<Option<String>>,
}

async fn upload(
    State(rec): State<Arc<Recorder>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    rec.hits.fetch_add(1, Ordering::SeqCst);
    *rec.last_content_type.lock().unwrap() = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let doc: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    *rec.last_body.lock().unwrap() = Some(body);
    Json(json!({"status": "stored", "model_card_id": format!("{}-{}", doc["name"].as_str().unwrap_or(""), doc["version"].as_str().unwrap_or(""))}))
}

async fn reject(State(rec): State<Arc<Recorder>>) -> (StatusCode, Json<Value>) {
    rec.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "database unavailable"})))
}

async fn not_json(State(rec): State<Arc<Recorder>>) -> &'static str {
    rec.hits.fetch_add(1, Ordering::SeqCst);
    "stored, thanks"
}

async fn spawn_registry() -> (SocketAddr, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let app = Router::new()
        .route("/upload_mc", post(upload))
        .route("/reject", post(reject))
        .route("/plain", post(not_json))
        .with_state(rec.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, rec)
}

fn valid_card() -> ModelCard {
    ModelCard {
        name: "IrisNet".into(),
        version: "1.0".into(),
        short_description: "Iris species classifier".into(),
        full_description: "A random forest trained on the iris dataset".into(),
        keywords: "iris, random forest".into(),
        author: "d2i".into(),
        input_type: "Tabular".into(),
        category: "classification".into(),
        ai_model: Some(AIModel {
            name: "iris-rf".into(),
            version: "1.0".into(),
            description: "Random forest, 100 trees".into(),
            owner: "d2i".into(),
            location: "https://example.org/models/iris-rf.pkl".into(),
            license: "BSD-3-Clause".into(),
            framework: "sklearn".into(),
            model_type: "random_forest".into(),
            test_accuracy: 0.96,
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_submit_valid_card_returns_registry_reply() {
    let (addr, rec) = spawn_registry().await;
    let card = valid_card();

    let reply = card
        .submit(&format!("http://{addr}/upload_mc"))
        .await
        .unwrap();

    assert_eq!(
        reply,
        Some(json!({"status": "stored", "model_card_id": "IrisNet-1.0"}))
    );
    assert_eq!(rec.hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        rec.last_content_type.lock().unwrap().as_deref(),
        Some("application/json")
    );
    assert_eq!(
        rec.last_body.lock().unwrap().as_deref(),
        Some(card.to_json().unwrap().as_str())
    );
}

#[tokio::test]
async fn test_submit_invalid_card_makes_no_request() {
    let (addr, rec) = spawn_registry().await;
    let card = ModelCard {
        name: String::new(),
        ..valid_card()
    };

    let reply = card
        .submit(&format!("http://{addr}/upload_mc"))
        .await
        .unwrap();

    assert_eq!(reply, None);
    assert_eq!(rec.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submit_server_error_returns_none() {
    let (addr, rec) = spawn_registry().await;
    let client = RegistryClient::with_timeout(Duration::from_secs(5)).unwrap();

    let reply = client
        .submit(&valid_card(), &format!("http://{addr}/reject"))
        .await
        .unwrap();

    assert_eq!(reply, None);
    assert_eq!(rec.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_submit_non_json_reply_returns_none() {
    let (addr, rec) = spawn_registry().await;
    let reply = valid_card()
        .submit(&format!("http://{addr}/plain"))
        .await
        .unwrap();
    assert_eq!(reply, None);
    assert_eq!(rec.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_submit_connection_refused_returns_none() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reply = valid_card()
        .submit(&format!("http://{addr}/upload_mc"))
        .await
        .unwrap();
    assert_eq!(reply, None);
}
