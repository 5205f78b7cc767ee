//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A mock cluster API serving discovery for `kubevirt.io/v1` and a single
/// namespaced watch feed.
pub struct MockCluster {
    pub addr: SocketAddr,
    /// Query parameters (plus `namespace`) of every accepted watch request.
    pub watch_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockCluster {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

#[derive(Clone)]
struct MockState {
    token: &'static str,
    feed: Arc<String>,
    hold_open: bool,
    watch_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

/// Start the mock API server. Requests must carry `token` as bearer token.
pub async fn start_mock_cluster(token: &'static str, feed: String) -> MockCluster {
    start(token, feed, false).await
}

/// Like [`start_mock_cluster`], but the watch response never ends after
/// `feed` has been sent.
pub async fn start_open_mock_cluster(token: &'static str, feed: String) -> MockCluster {
    start(token, feed, true).await
}

async fn start(token: &'static str, feed: String, hold_open: bool) -> MockCluster {
    let watch_requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        token,
        feed: Arc::new(feed),
        hold_open,
        watch_requests: watch_requests.clone(),
    };

    let app = Router::new()
        .route("/apis/kubevirt.io/v1", get(discovery))
        .route(
            "/apis/kubevirt.io/v1/namespaces/{namespace}/virtualmachineinstances",
            get(watch),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockCluster { addr, watch_requests }
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", state.token))
        .unwrap_or(false)
}

async fn discovery(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    Json(json!({
        "kind": "APIResourceList",
        "groupVersion": "kubevirt.io/v1",
        "resources": [
            { "name": "virtualmachineinstances/console", "kind": "VirtualMachineInstance", "namespaced": true },
            { "name": "virtualmachineinstances", "kind": "VirtualMachineInstance", "namespaced": true },
            { "name": "virtualmachines", "kind": "VirtualMachine", "namespaced": true }
        ]
    }))
    .into_response()
}

async fn watch(
    State(state): State<MockState>,
    Path(namespace): Path<String>,
    headers: HeaderMap,
    Query(mut query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    query.insert("namespace".to_string(), namespace);
    state.watch_requests.lock().unwrap().push(query);

    let feed = state.feed.as_str().to_owned();
    let body = if state.hold_open {
        let chunks = stream::once(async move { Ok::<_, std::io::Error>(format!("{feed}\n")) })
            .chain(stream::pending());
        Body::from_stream(chunks)
    } else {
        Body::from(feed)
    };

    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// A virtual machine instance document with the given transition history.
pub fn vmi(namespace: &str, name: &str, phase: &str, history: &[(&str, &str)]) -> Value {
    let history: Vec<Value> = history
        .iter()
        .map(|(phase, at)| json!({ "phase": phase, "phaseTransitionTimestamp": at }))
        .collect();
    json!({
        "apiVersion": "kubevirt.io/v1",
        "kind": "VirtualMachineInstance",
        "metadata": { "namespace": namespace, "name": name },
        "status": { "phase": phase, "phaseTransitionTimestamps": history }
    })
}

/// One watch feed line.
pub fn event(kind: &str, object: Value) -> String {
    json!({ "type": kind, "object": object }).to_string()
}
