use crate::platform::{PlatformClient, PlatformError};
use crate::types::{Entity, EntityPage, WriteObject};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub fn entity_page(ids: &[&str]) -> EntityPage {
    EntityPage {
        total_count: ids.len() as u64,
        entities: ids
            .iter()
            .map(|id| Entity {
                entity_id: id.to_string(),
            })
            .collect(),
        next_page_key: None,
    }
}

/// In-memory platform. Unknown selectors match nothing.
#[derive(Default)]
pub struct FakePlatform {
    pages: HashMap<String, Result<EntityPage, (StatusCode, String)>>,
    write_failure: Option<(StatusCode, String)>,
    queried: Mutex<Vec<String>>,
    written: Mutex<Vec<serde_json::Value>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(self, selector: &str, ids: &[&str]) -> Self {
        self.with_page(selector, entity_page(ids))
    }

    pub fn with_page(mut self, selector: &str, page: EntityPage) -> Self {
        self.pages.insert(selector.to_string(), Ok(page));
        self
    }

    pub fn with_query_failure(mut self, selector: &str, status: StatusCode, body: &str) -> Self {
        self.pages
            .insert(selector.to_string(), Err((status, body.to_string())));
        self
    }

    pub fn with_write_failure(mut self, status: StatusCode, body: &str) -> Self {
        self.write_failure = Some((status, body.to_string()));
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    pub fn written_batches(&self) -> Vec<serde_json::Value> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn query_entities(&self, entity_selector: &str) -> Result<EntityPage, PlatformError> {
        self.queried
            .lock()
            .unwrap()
            .push(entity_selector.to_string());

        match self.pages.get(entity_selector) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err((status, body))) => Err(PlatformError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(entity_page(&[])),
        }
    }

    async fn write_settings(&self, objects: &[WriteObject<'_>]) -> Result<(), PlatformError> {
        self.written
            .lock()
            .unwrap()
            .push(serde_json::to_value(objects).unwrap());

        match &self.write_failure {
            Some((status, body)) => Err(PlatformError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct MockState {
    entities: HashMap<String, Vec<String>>,
    entity_failures: HashMap<String, (StatusCode, String)>,
    write_failure: Option<(StatusCode, String)>,
    authorization_headers: Vec<String>,
    written: Vec<serde_json::Value>,
}

type SharedState = Arc<Mutex<MockState>>;

/// HTTP server mimicking the entities and settings objects endpoints, bound to
/// an ephemeral local port.
pub struct MockPlatformServer {
    addr: SocketAddr,
    state: SharedState,
    handle: tokio::task::JoinHandle<()>,
}

impl MockPlatformServer {
    pub async fn start() -> Self {
        let state = SharedState::default();
        let app = Router::new()
            .route("/api/v2/entities", get(entities_handler))
            .route("/api/v2/settings/objects", post(settings_objects_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockPlatformServer {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn add_entities(&self, selector: &str, ids: &[&str]) {
        self.state.lock().unwrap().entities.insert(
            selector.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
    }

    pub fn fail_entities(&self, selector: &str, status: StatusCode, body: &str) {
        self.state
            .lock()
            .unwrap()
            .entity_failures
            .insert(selector.to_string(), (status, body.to_string()));
    }

    pub fn fail_writes(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().write_failure = Some((status, body.to_string()));
    }

    pub fn authorization_headers(&self) -> Vec<String> {
        self.state.lock().unwrap().authorization_headers.clone()
    }

    pub fn written_batches(&self) -> Vec<serde_json::Value> {
        self.state.lock().unwrap().written.clone()
    }
}

impl Drop for MockPlatformServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record_authorization(state: &mut MockState, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorization_headers.push(value.to_string());
    }
}

async fn entities_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    record_authorization(&mut state, &headers);

    let selector = params.get("entitySelector").cloned().unwrap_or_default();
    if let Some((status, body)) = state.entity_failures.get(&selector) {
        return (*status, body.clone()).into_response();
    }

    let ids = state.entities.get(&selector).cloned().unwrap_or_default();
    Json(serde_json::json!({
        "totalCount": ids.len(),
        "pageSize": 50,
        "entities": ids
            .iter()
            .map(|id| serde_json::json!({"entityId": id, "displayName": id}))
            .collect::<Vec<_>>(),
    }))
    .into_response()
}

async fn settings_objects_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    record_authorization(&mut state, &headers);
    state.written.push(body);

    if let Some((status, body)) = &state.write_failure {
        return (*status, body.clone()).into_response();
    }

    Json(serde_json::json!([{"code": 200}])).into_response()
}

/// Collects formatted log output of everything logged at debug level or
/// above while the returned guard is alive on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn start() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(Arc::clone(&self.0))
    }
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer lock poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
