// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use crate::config::Config;
use crate::kubernetes::ApiClient;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

type Key = (String, String);

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub query: Option<String>,
    pub body: Vec<u8>,
}

/// A mock HTTP service that replays scripted responses per method and path.
///
/// Each path holds a queue of responses. Every call consumes the head of the
/// queue until one response is left, which then answers all later calls.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<Key, VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<HashMap<Key, Vec<RecordedRequest>>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses.into());
        self
    }

    /// Answer GET requests for the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.script("GET", path, vec![(status, body.to_string())])
    }

    /// Answer successive GET requests with successive responses
    pub fn on_get_sequence(self, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.script("GET", path, responses)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.script("POST", path, vec![(status, body.to_string())])
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.script("DELETE", path, vec![(status, body.to_string())])
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    pub fn into_api_client(self) -> ApiClient {
        ApiClient::new(self.into_client())
    }

    /// Requests received for the method and path, in arrival order
    pub fn requests(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests(method, path).len()
    }

    /// Total number of requests received for any path
    pub fn total(&self) -> usize {
        self.requests.lock().unwrap().values().map(Vec::len).sum()
    }

    fn next_response(&self, key: &Key) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let key = (req.method().to_string(), req.uri().path().to_string());
        let content_type = req
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let query = req.uri().query().map(str::to_string);

        let response = self.next_response(&key);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = req
                .into_body()
                .collect()
                .await
                .map_err(|e| -> tower::BoxError { e.to_string().into() })?
                .to_bytes()
                .to_vec();
            requests
                .lock()
                .unwrap()
                .entry(key)
                .or_default()
                .push(RecordedRequest {
                    content_type,
                    query,
                    body,
                });

            let (status, body) = response.unwrap_or_else(|| {
                (
                    404,
                    r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#
                        .to_string(),
                )
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Install the process-wide rustls provider the binary installs in `main`.
/// Later calls in the same test process are no-ops.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Configuration with short polls and no file lookups
pub fn test_config() -> Config {
    let mut config = Config::from_lookup(|key| {
        match key {
            "E2E_TOKEN" => Some("test-token"),
            "E2E_CA_CERT_FILE" => Some(""),
            "E2E_CONTROLLER_IMAGE" => Some("registry.local/snapshot-controller:test"),
            _ => None,
        }
        .map(str::to_string)
    })
    .unwrap();
    config.poll.attempts = 3;
    config
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// A Deployment or StatefulSet reporting `ready` ready replicas
pub fn workload_json(name: &str, ready: Option<i32>) -> String {
    let status = match ready {
        Some(n) => serde_json::json!({ "replicas": 3, "readyReplicas": n }),
        None => serde_json::json!({ "replicas": 3 }),
    };
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name },
        "status": status
    })
    .to_string()
}

/// A Snapshot or Restore in the given phase; `None` leaves the status empty
pub fn phase_json(name: &str, phase: Option<&str>) -> String {
    let status = match phase {
        Some(p) => serde_json::json!({ "phase": p }),
        None => serde_json::json!({}),
    };
    serde_json::json!({
        "apiVersion": "clustersnapshot.hatoba/v1alpha1",
        "kind": "Snapshot",
        "metadata": { "name": name },
        "status": status
    })
    .to_string()
}

/// A list response holding one item per name
pub fn list_json(names: &[&str]) -> String {
    let items: Vec<_> = names
        .iter()
        .map(|n| serde_json::json!({ "metadata": { "name": n } }))
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "List",
        "metadata": {},
        "items": items
    })
    .to_string()
}

/// A pod with the given IP
pub fn pod_json(name: &str, ip: Option<&str>) -> String {
    let status = match ip {
        Some(ip) => serde_json::json!({ "phase": "Running", "podIP": ip }),
        None => serde_json::json!({ "phase": "Pending" }),
    };
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": { "name": name },
        "status": status
    })
    .to_string()
}
