//! In-process stand-in for the feed API: history, ticket and stream endpoints.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, RawQuery, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use wxfeed_client::{codec, Endpoints, Record};

/// What the stream endpoint does with each accepted connection.
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Send these payloads, then close the stream
    SendThenClose(Vec<String>),
    /// Send these payloads, then keep the stream open until the client leaves
    SendThenHold(Vec<String>),
}

pub struct MockState {
    required_auth: Option<String>,
    history_status: Mutex<StatusCode>,
    history_body: Mutex<String>,
    history_requests: Mutex<Vec<(String, Option<String>)>>,
    ticket_failures: AtomicUsize,
    ticket_requests: AtomicUsize,
    connections: AtomicUsize,
    stream_queries: Mutex<Vec<String>>,
    script: Mutex<StreamScript>,
}

pub struct MockUpstream {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        Self::start_with_auth(None).await
    }

    /// Start a server that answers 401 unless `Authorization` equals `required_auth`.
    pub async fn start_with_auth(required_auth: Option<&str>) -> Self {
        let state = Arc::new(MockState {
            required_auth: required_auth.map(str::to_string),
            history_status: Mutex::new(StatusCode::OK),
            history_body: Mutex::new("[]".to_string()),
            history_requests: Mutex::new(Vec::new()),
            ticket_failures: AtomicUsize::new(0),
            ticket_requests: AtomicUsize::new(0),
            connections: AtomicUsize::new(0),
            stream_queries: Mutex::new(Vec::new()),
            script: Mutex::new(StreamScript::SendThenClose(Vec::new())),
        });

        let app = Router::new()
            .route("/list/:key", get(history_handler))
            .route("/sub/:channel", get(ticket_handler))
            .route("/ws/sub", get(stream_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock upstream");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(
            format!("http://{}", self.addr),
            format!("ws://{}", self.addr),
        )
    }

    pub fn set_history(&self, status: StatusCode, body: &str) {
        *self.state.history_status.lock().unwrap() = status;
        *self.state.history_body.lock().unwrap() = body.to_string();
    }

    /// Reject the next `n` ticket requests with 503.
    pub fn fail_tickets(&self, n: usize) {
        self.state.ticket_failures.store(n, Ordering::SeqCst);
    }

    pub fn set_script(&self, script: StreamScript) {
        *self.state.script.lock().unwrap() = script;
    }

    pub fn ticket_requests(&self) -> usize {
        self.state.ticket_requests.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn history_requests(&self) -> Vec<(String, Option<String>)> {
        self.state.history_requests.lock().unwrap().clone()
    }

    pub fn stream_queries(&self) -> Vec<String> {
        self.state.stream_queries.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Encode a record the way the real transport frames it.
pub fn frame(record: &Record) -> String {
    codec::encode_frame(record).unwrap()
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    match &state.required_auth {
        None => true,
        Some(expected) => {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                == Some(expected.as_str())
        }
    }
}

async fn history_handler(
    State(state): State<Arc<MockState>>,
    Path(key): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    state.history_requests.lock().unwrap().push((key, query));
    let status = *state.history_status.lock().unwrap();
    let body = state.history_body.lock().unwrap().clone();
    (status, body).into_response()
}

async fn ticket_handler(
    State(state): State<Arc<MockState>>,
    Path(channel): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let n = state.ticket_requests.fetch_add(1, Ordering::SeqCst) + 1;
    if state.ticket_failures.load(Ordering::SeqCst) > 0 {
        state.ticket_failures.fetch_sub(1, Ordering::SeqCst);
        return (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response();
    }

    (StatusCode::OK, format!("channel={}&ticket={}\n", channel, n)).into_response()
}

async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<MockState>>,
    RawQuery(query): RawQuery,
) -> Response {
    state
        .stream_queries
        .lock()
        .unwrap()
        .push(query.unwrap_or_default());
    state.connections.fetch_add(1, Ordering::SeqCst);

    let script = state.script.lock().unwrap().clone();
    ws.on_upgrade(move |socket| run_script(socket, script))
}

async fn run_script(mut socket: WebSocket, script: StreamScript) {
    let (payloads, hold) = match script {
        StreamScript::SendThenClose(payloads) => (payloads, false),
        StreamScript::SendThenHold(payloads) => (payloads, true),
    };

    for payload in payloads {
        if socket.send(Message::Text(payload)).await.is_err() {
            return;
        }
    }

    if hold {
        while let Some(Ok(_)) = socket.recv().await {}
    } else {
        let _ = socket.send(Message::Close(None)).await;
    }
}
