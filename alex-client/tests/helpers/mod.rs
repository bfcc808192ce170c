//! In-process mock of the meeting-processing backend
//!
//! Serves the four endpoints the client consumes on an ephemeral port and
//! records what it received.

#![allow(dead_code)]

use alex_client::AppState;
use alex_common::config::ClientSettings;
use alex_common::events::EventBus;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Meeting id whose detail endpoint always answers 404
pub const MISSING_MEETING_ID: i64 = 404;

/// One multipart field as received
#[derive(Debug, Clone)]
pub struct UploadField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    /// Statuses returned by successive detail requests; the last one repeats
    pub statuses: Arc<Mutex<VecDeque<String>>>,
    pub failure_message: Arc<Mutex<Option<String>>>,
    pub reject_uploads: Arc<Mutex<bool>>,
    pub detail_delay: Arc<Mutex<Duration>>,
    pub upload_delay: Arc<Mutex<Duration>>,
    pub list_hits: Arc<AtomicUsize>,
    pub list_limits: Arc<Mutex<Vec<Option<String>>>>,
    pub detail_hits: Arc<AtomicUsize>,
    pub followup_hits: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    pub uploads: Arc<Mutex<Vec<Vec<UploadField>>>>,
}

impl MockBackend {
    pub fn with_statuses(statuses: &[&str]) -> Self {
        let backend = Self::default();
        backend.set_statuses(statuses);
        backend
    }

    pub fn set_statuses(&self, statuses: &[&str]) {
        *self.statuses.lock().unwrap() = statuses.iter().map(|s| s.to_string()).collect();
    }

    pub fn list_hits(&self) -> usize {
        self.list_hits.load(Ordering::SeqCst)
    }

    pub fn detail_hits(&self) -> usize {
        self.detail_hits.load(Ordering::SeqCst)
    }

    fn next_status(&self) -> String {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap_or_else(|| "done".to_string())
        }
    }

    /// Start serving; returns the base URL
    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route("/meetings", get(list_meetings).post(create_meeting))
            .route("/meetings/:id", get(get_meeting))
            .route("/agents/meeting-followup", post(followup))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

pub fn meeting_json(id: i64, title: &str, status: &str) -> Value {
    let summary = if status == "done" {
        Value::from("Agreed on the Q3 roadmap.")
    } else {
        Value::Null
    };
    json!({
        "id": id,
        "title": title,
        "status": status,
        "created_at": "2025-06-01T09:30:00",
        "audio_url": null,
        "transcript": null,
        "summary": summary,
        "source_agent": "alex-dashboard",
        "action_items": []
    })
}

fn meetings_list() -> Value {
    let mut sync = meeting_json(9, "Sync", "done");
    sync["action_items"] = json!([
        {
            "id": 1, "description": "Send notes", "owner": "Ana",
            "due_date": "2020-01-01", "status": "Completed"
        },
        {
            "id": 2, "description": "Book room", "owner": "Ben",
            "due_date": "2020-01-01", "status": "pending"
        },
        {"id": 3, "description": "Draft plan", "owner": null, "due_date": null, "status": ""}
    ]);
    let mut retro = meeting_json(8, "Retro", "failed");
    retro["source_agent"] = Value::Null;
    json!([sync, retro, meeting_json(7, "Kickoff", "done")])
}

async fn list_meetings(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    backend.list_hits.fetch_add(1, Ordering::SeqCst);
    backend
        .list_limits
        .lock()
        .unwrap()
        .push(params.get("limit").cloned());
    Json(meetings_list())
}

async fn get_meeting(State(backend): State<MockBackend>, Path(id): Path<i64>) -> Response {
    backend.detail_hits.fetch_add(1, Ordering::SeqCst);
    if id == MISSING_MEETING_ID {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response();
    }

    let current = backend.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    backend.max_in_flight.fetch_max(current, Ordering::SeqCst);
    let delay = *backend.detail_delay.lock().unwrap();
    tokio::time::sleep(delay).await;
    backend.in_flight.fetch_sub(1, Ordering::SeqCst);

    let status = backend.next_status();
    let mut meeting = meeting_json(id, "Sync", &status);
    if status == "failed" {
        meeting["error_message"] = json!(backend.failure_message.lock().unwrap().clone());
    }
    Json(meeting).into_response()
}

async fn create_meeting(State(backend): State<MockBackend>, mut multipart: Multipart) -> Response {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap().to_vec();
        fields.push(UploadField {
            name,
            file_name,
            content_type,
            data,
        });
    }
    backend.uploads.lock().unwrap().push(fields);

    let delay = *backend.upload_delay.lock().unwrap();
    tokio::time::sleep(delay).await;

    if *backend.reject_uploads.lock().unwrap() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "disk full"})),
        )
            .into_response();
    }
    Json(json!({"meeting_id": 9, "status": "pending"})).into_response()
}

async fn followup(State(backend): State<MockBackend>, Json(body): Json<Value>) -> Json<Value> {
    backend.followup_hits.fetch_add(1, Ordering::SeqCst);
    json!({
        "summary": format!("Summary of: {}", body["transcript"].as_str().unwrap_or_default()),
        "action_items": [{"description": "Follow up", "owner": "Ana"}],
        "metadata": body["metadata"].clone()
    })
    .into()
}

/// Settings with short intervals suited to tests
pub fn test_settings(base_url: &str) -> ClientSettings {
    ClientSettings {
        api_base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(20),
        navigation_delay: Duration::from_millis(40),
        list_stale_time: Duration::from_secs(30),
        log_level: "debug".to_string(),
    }
}

pub async fn test_app(backend: &MockBackend) -> AppState {
    let base_url = backend.serve().await;
    AppState::new(test_settings(&base_url), EventBus::new(256)).unwrap()
}
