#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method};
use axum::routing::any;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value, json};
use tempfile::TempDir;
use uuid::Uuid;

use casebridge::auth::jwt::{self, Claims};
use casebridge::clock::FixedClock;
use casebridge::config::{CaseManagementDefaults, Config, FileConfig};
use casebridge::db::{FormInput, GroupInput, HandlerInput, MemoryStore, Store};
use casebridge::files::StreamWrappers;
use casebridge::models::{
    ContactGroup, FileStatus, Form, Handler, ManagedFile, NewFile, Submission,
};
use casebridge::state::AppState;

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";
pub const BASE_URL: &str = "http://casebridge.test";
pub const DEFAULT_AUTH_HEADER: &str = "Bearer default-token";
pub const RETRIEVAL_FOLDER: &str = "private://casemanagement/covid-business-grants";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// The moment the test clock is frozen at, on [`today`].
pub fn now() -> NaiveDateTime {
    today().and_hms_opt(9, 30, 5).unwrap()
}

// ── Remote case-management stand-in ─────────────────────────────

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub authorization: Option<String>,
    pub body: Value,
}

struct BackendState {
    status: AtomicU16,
    requests: Mutex<Vec<CapturedRequest>>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<BackendState>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}/cases", self.addr)
    }

    pub fn set_status(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn capture(
    State(state): State<Arc<BackendState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> axum::http::StatusCode {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        authorization,
        body,
    });
    axum::http::StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap()
}

pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(BackendState {
        status: AtomicU16::new(200),
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/cases", any(capture))
        .route("/other", any(capture))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, state }
}

// ── Store returning rows the way Postgres JSONB does ────────────

/// Delegates to the in-memory store but hands submission rows back with
/// object keys in `JSONB` order: shorter keys first, then bytewise.
pub struct JsonbOrderStore(pub Arc<MemoryStore>);

pub fn jsonb_order(map: &Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    entries
        .into_iter()
        .map(|(key, value)| (key.clone(), jsonb_value(value)))
        .collect()
}

fn jsonb_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(jsonb_order(map)),
        Value::Array(items) => Value::Array(items.iter().map(jsonb_value).collect()),
        other => other.clone(),
    }
}

fn jsonb_row(mut submission: Submission) -> Submission {
    submission.data = jsonb_order(&submission.data);
    submission
}

#[async_trait]
impl Store for JsonbOrderStore {
    async fn list_forms(&self) -> Result<Vec<Form>, sqlx::Error> {
        self.0.list_forms().await
    }

    async fn find_form(&self, id: &str) -> Result<Option<Form>, sqlx::Error> {
        self.0.find_form(id).await
    }

    async fn create_form(&self, input: &FormInput) -> Result<Form, sqlx::Error> {
        self.0.create_form(input).await
    }

    async fn update_form(&self, input: &FormInput) -> Result<Option<Form>, sqlx::Error> {
        self.0.update_form(input).await
    }

    async fn delete_form(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.0.delete_form(id).await
    }

    async fn list_handlers(&self, form_id: &str) -> Result<Vec<Handler>, sqlx::Error> {
        self.0.list_handlers(form_id).await
    }

    async fn create_handler(
        &self,
        form_id: &str,
        input: &HandlerInput,
    ) -> Result<Handler, sqlx::Error> {
        self.0.create_handler(form_id, input).await
    }

    async fn delete_handler(&self, form_id: &str, id: Uuid) -> Result<bool, sqlx::Error> {
        self.0.delete_handler(form_id, id).await
    }

    async fn list_groups(&self) -> Result<Vec<ContactGroup>, sqlx::Error> {
        self.0.list_groups().await
    }

    async fn find_group(&self, id: &str) -> Result<Option<ContactGroup>, sqlx::Error> {
        self.0.find_group(id).await
    }

    async fn create_group(&self, input: &GroupInput) -> Result<ContactGroup, sqlx::Error> {
        self.0.create_group(input).await
    }

    async fn update_group(&self, input: &GroupInput) -> Result<Option<ContactGroup>, sqlx::Error> {
        self.0.update_group(input).await
    }

    async fn delete_group(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.0.delete_group(id).await
    }

    async fn find_file(&self, fid: i64) -> Result<Option<ManagedFile>, sqlx::Error> {
        self.0.find_file(fid).await
    }

    async fn find_file_by_uri(&self, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
        self.0.find_file_by_uri(uri).await
    }

    async fn create_file(&self, file: &NewFile) -> Result<ManagedFile, sqlx::Error> {
        self.0.create_file(file).await
    }

    async fn relocate_file(&self, fid: i64, uri: &str) -> Result<Option<ManagedFile>, sqlx::Error> {
        self.0.relocate_file(fid, uri).await
    }

    async fn create_submission(&self, submission: &Submission) -> Result<Submission, sqlx::Error> {
        self.0.create_submission(submission).await.map(jsonb_row)
    }

    async fn list_submissions(&self, form_id: &str) -> Result<Vec<Submission>, sqlx::Error> {
        let rows = self.0.list_submissions(form_id).await?;
        Ok(rows.into_iter().map(jsonb_row).collect())
    }
}

// ── Application under test ──────────────────────────────────────

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub wrappers: StreamWrappers,
    pub backend: MockBackend,
    root: TempDir,
}

pub fn test_config(root: &std::path::Path, post_url: &str) -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: BASE_URL.to_string(),
        case_management: CaseManagementDefaults {
            post_url: post_url.to_string(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        },
        files: FileConfig {
            private_dir: root.join("private"),
            public_dir: root.join("public"),
            temp_dir: root.join("tmp"),
            retrieval_folder: RETRIEVAL_FOLDER.to_string(),
        },
        max_body_size: 1_048_576,
        http_timeout_secs: 5,
        log_level: "warn".to_string(),
    }
}

/// Spawn the app on a random port, backed by the in-memory store and a
/// throwaway directory tree.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_store(|store| store as Arc<dyn Store>).await
}

/// Like [`spawn_app`], but the app talks to whatever `wrap` builds around
/// the in-memory store. Fixtures are still written straight to the
/// in-memory store.
pub async fn spawn_app_with_store<F>(wrap: F) -> TestApp
where
    F: FnOnce(Arc<MemoryStore>) -> Arc<dyn Store>,
{
    let backend = spawn_backend().await;
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(root.path(), &backend.url());
    let wrappers = StreamWrappers::from_config(&config.files);

    let store = Arc::new(MemoryStore::new());
    let shared = wrap(store.clone());
    let state = AppState::new(shared, config, Arc::new(FixedClock(now())))
        .expect("Failed to build state");
    let app = casebridge::build_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        store,
        wrappers,
        backend,
        root,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn token(&self, role: &str) -> String {
        let claims = Claims::new(Uuid::now_v7(), role, chrono::Duration::hours(1));
        jwt::encode_token(&claims, JWT_SECRET).unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token("admin")
    }

    pub fn realpath(&self, uri: &str) -> PathBuf {
        self.wrappers.realpath(uri).unwrap()
    }

    pub async fn create_form(&self, id: &str, title: &str, elements: Value, settings: Value) -> Form {
        let input = FormInput {
            id: id.to_string(),
            title: title.to_string(),
            category: Some("test".to_string()),
            elements: serde_json::from_value(elements).unwrap(),
            settings: serde_json::from_value(settings).unwrap(),
        };
        self.store.create_form(&input).await.unwrap()
    }

    pub async fn add_handler(&self, form_id: &str, handler_type: &str, config: Value, position: i32) -> Handler {
        let input = HandlerInput {
            handler_type: handler_type.to_string(),
            label: String::new(),
            config,
            position,
            enabled: true,
        };
        self.store.create_handler(form_id, &input).await.unwrap()
    }

    /// Write a document under `private://uploads/` and record it.
    pub async fn store_document(&self, filename: &str, contents: &[u8]) -> i64 {
        let uri = format!("private://uploads/{}/{filename}", Uuid::now_v7());
        let path = self.realpath(&uri);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        let file = self
            .store
            .create_file(&NewFile {
                owner: None,
                filename: filename.to_string(),
                uri,
                filemime: "text/plain".to_string(),
                status: FileStatus::Temporary,
            })
            .await
            .unwrap();
        file.fid
    }

    pub async fn submit_json(&self, form_id: &str, data: &Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/v1/forms/{form_id}/submit")))
            .json(data)
            .send()
            .await
            .expect("submit json failed")
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}
