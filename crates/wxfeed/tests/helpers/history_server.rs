//! Minimal history endpoint: serves canned `/list/{channel}:{metric}:.list` bodies.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use wxfeed_client::Endpoints;

#[derive(Default)]
struct HistoryState {
    bodies: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

pub struct HistoryServer {
    pub addr: SocketAddr,
    state: Arc<HistoryState>,
    handle: JoinHandle<()>,
}

impl HistoryServer {
    pub async fn start() -> Self {
        let state = Arc::new(HistoryState::default());
        let app = Router::new()
            .route("/list/:key", get(list_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind history server");
        let addr = listener.local_addr().expect("history server addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("history server");
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

    /// Serve `body` for `channel:metric`. Unknown keys answer 404.
    pub fn set(&self, channel: &str, metric: &str, body: &str) {
        self.state
            .bodies
            .lock()
            .unwrap()
            .insert(format!("{}:{}:.list", channel, metric), body.to_string());
    }

    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for HistoryServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn list_handler(
    State(state): State<Arc<HistoryState>>,
    Path(key): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    state.requests.lock().unwrap().push((key.clone(), query));
    match state.bodies.lock().unwrap().get(&key) {
        Some(body) => (StatusCode::OK, body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
