use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::DateTime;
use serde_json::{Value, json};
use tower::ServiceExt;

use std::sync::Arc;

use super::error::ALLOWED_METHODS;
use crate::{
    models::{FileRecord, NoteDocument},
    repository::{MemoryRepository, Repository, StoreError},
    router,
    service::CapsuleService,
};

struct FailingRepository;

fn broken() -> StoreError {
    StoreError::Document(serde_json::from_str::<Value>("{").unwrap_err())
}

#[async_trait]
impl Repository for FailingRepository {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn get_all_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        Err(broken())
    }

    async fn create_files(&self, _files: &[FileRecord]) -> Result<(), StoreError> {
        Err(broken())
    }

    async fn get_note(&self) -> Result<Option<NoteDocument>, StoreError> {
        Err(broken())
    }

    async fn upsert_note(&self, _note: &NoteDocument) -> Result<(), StoreError> {
        Err(broken())
    }
}

fn app_with(repo: Arc<dyn Repository>) -> Router {
    router::build(Arc::new(CapsuleService::new(repo)), &[])
}

fn app() -> Router {
    app_with(Arc::new(MemoryRepository::default()))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: Option<String>) -> Reply {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body)
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply {
        status,
        headers,
        body,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    send_raw(app, method, uri, body.map(|b| b.to_string())).await
}

async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> Reply {
    send(app, Method::POST, uri, Some(body)).await
}

fn assert_iso_timestamp(value: &Value) {
    let raw = value.as_str().expect("timestamp is a string");
    assert!(
        DateTime::parse_from_rfc3339(raw).is_ok(),
        "not ISO-8601: {raw}"
    );
}

#[tokio::test]
async fn posted_file_is_listed_with_server_timestamp() {
    let app = app();

    let created = post(&app, "/files", json!({"name": "letter-to-future-me.txt"})).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["name"], "letter-to-future-me.txt");
    assert_iso_timestamp(&created.body["timestamp"]);

    let listed = get(&app, "/files").await;
    assert_eq!(listed.status, StatusCode::OK);
    let files = listed.body.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0], created.body);
}

#[tokio::test]
async fn empty_store_lists_no_files() {
    let listed = get(&app(), "/files").await;

    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn file_without_name_is_rejected_and_nothing_changes() {
    let app = app();
    post(&app, "/files", json!({"name": "keep.png"})).await;
    let before = get(&app, "/files").await.body;

    for body in [json!({}), json!({"name": ""}), json!({"name": null})] {
        let rejected = post(&app, "/files", body).await;
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
        assert_eq!(rejected.body, json!({"error": "File name is required"}));
    }

    assert_eq!(get(&app, "/files").await.body, before);
}

#[tokio::test]
async fn client_timestamp_is_replaced() {
    let created = post(
        &app(),
        "/files",
        json!({"name": "old.jpg", "timestamp": "1970-01-01T00:00:00.000Z"}),
    )
    .await;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_ne!(created.body["timestamp"], "1970-01-01T00:00:00.000Z");
    assert_iso_timestamp(&created.body["timestamp"]);
}

#[tokio::test]
async fn batch_persists_every_entry() {
    let app = app();

    let created = post(&app, "/files", json!([{"name": "x"}, {"name": "y"}])).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let batch = created.body.as_array().unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0]["name"], "x");
    assert_eq!(batch[1]["name"], "y");
    for entry in batch {
        assert_iso_timestamp(&entry["timestamp"]);
    }

    assert_eq!(get(&app, "/files").await.body, created.body);
}

#[tokio::test]
async fn batch_with_invalid_entry_persists_nothing() {
    let app = app();

    for body in [
        json!([{"name": "x"}, {}]),
        json!([{"name": "x"}, "y"]),
        json!([]),
    ] {
        let rejected = post(&app, "/files", body).await;
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
        assert!(rejected.body["error"].is_string());
    }

    assert_eq!(get(&app, "/files").await.body, json!([]));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app();

    let not_json = send_raw(&app, Method::POST, "/files", Some("{name:".to_string())).await;
    assert_eq!(not_json.status, StatusCode::BAD_REQUEST);

    let scalar = post(&app, "/files", json!("x")).await;
    assert_eq!(scalar.status, StatusCode::BAD_REQUEST);

    let wrong_type = post(&app, "/notes", json!({"note": 42})).await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_bodies_keep_their_own_status() {
    let app = app();

    let no_content_type = send_raw(&app, Method::POST, "/notes", None).await;
    assert_eq!(no_content_type.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(no_content_type.body["error"].is_string());

    let oversized = post(&app, "/notes", json!({"note": "a".repeat(3 * 1024 * 1024)})).await;
    assert_eq!(oversized.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(get(&app, "/notes").await.body, json!({}));

    let long_name = "a".repeat(3 * 1024 * 1024);
    let oversized_batch = post(&app, "/files", json!([{"name": long_name}])).await;
    assert_eq!(oversized_batch.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(get(&app, "/files").await.body, json!([]));
}

#[tokio::test]
async fn empty_store_has_empty_note() {
    let note = get(&app(), "/notes").await;

    assert_eq!(note.status, StatusCode::OK);
    assert_eq!(note.body, json!({}));
}

#[tokio::test]
async fn latest_note_overwrites_previous() {
    let app = app();

    let saved = post(&app, "/notes", json!({"note": "a"})).await;
    assert_eq!(saved.status, StatusCode::CREATED);
    assert_eq!(saved.body, json!({"message": "Note saved successfully"}));
    post(&app, "/notes", json!({"note": "b"})).await;

    let note = get(&app, "/notes").await;
    assert_eq!(note.status, StatusCode::OK);
    let fields = note.body.as_object().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["note"], "b");
    assert_iso_timestamp(&fields["timestamp"]);
}

#[tokio::test]
async fn note_without_content_is_rejected() {
    let app = app();

    for body in [json!({}), json!({"note": ""})] {
        let rejected = post(&app, "/notes", body).await;
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
        assert_eq!(rejected.body, json!({"error": "Note content is required"}));
    }

    assert_eq!(get(&app, "/notes").await.body, json!({}));
}

#[tokio::test]
async fn unsupported_methods_advertise_get_and_post() {
    let app = app();

    for uri in ["/files", "/notes"] {
        for method in [Method::DELETE, Method::PUT, Method::PATCH] {
            let reply = send(&app, method.clone(), uri, None).await;

            assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(reply.headers[header::ALLOW], ALLOWED_METHODS);
            assert_eq!(
                reply.body,
                json!({"error": format!("Method {method} Not Allowed")})
            );
        }
    }
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let app = app();
    post(&app, "/files", json!({"name": "a"})).await;
    post(&app, "/notes", json!({"note": "hello"})).await;

    let files = get(&app, "/files").await.body;
    let note = get(&app, "/notes").await.body;
    for _ in 0..3 {
        assert_eq!(get(&app, "/files").await.body, files);
        assert_eq!(get(&app, "/notes").await.body, note);
    }
}

#[tokio::test]
async fn store_failures_are_generic_500s() {
    let app = app_with(Arc::new(FailingRepository));
    let expected = json!({"error": "Internal Server Error"});

    let replies = [
        get(&app, "/files").await,
        post(&app, "/files", json!({"name": "x"})).await,
        get(&app, "/notes").await,
        post(&app, "/notes", json!({"note": "x"})).await,
    ];

    for reply in replies {
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body, expected);
    }
}

#[tokio::test]
async fn validation_runs_before_the_store() {
    let app = app_with(Arc::new(FailingRepository));

    let rejected = post(&app, "/files", json!({})).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cross_origin_reads_are_allowed() {
    let request = Request::builder()
        .uri("/files")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn configured_origins_restrict_cors() {
    let app = router::build(
        Arc::new(CapsuleService::new(Arc::new(MemoryRepository::default()))),
        &["http://capsule.test".to_string()],
    );
    let request = Request::builder()
        .uri("/notes")
        .header(header::ORIGIN, "http://elsewhere.test")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

#[tokio::test]
async fn root_answers_health_checks() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
