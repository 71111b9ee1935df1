// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory Kubernetes API server for namespaces and secrets.

use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A stateful fake of the core/v1 namespace and secret endpoints.
///
/// Clones share state, so a test keeps one handle for assertions and turns
/// another into a `kube::Client`.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    namespaces: BTreeSet<String>,
    secrets: BTreeMap<(String, String), Secret>,
    failures: HashMap<(String, String), u16>,
    requests: Vec<(String, String)>,
    next_version: u64,
}

impl FakeState {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(self, name: &str) -> Self {
        self.state.lock().unwrap().namespaces.insert(name.to_string());
        self
    }

    /// Seed a secret; its namespace is created implicitly
    pub fn with_secret(self, secret: Secret) -> Self {
        self.put_secret(secret);
        self
    }

    /// Answer `method path` with the given status code instead of serving it.
    /// Watch requests are matched with the method `WATCH`.
    pub fn fail_on(self, method: &str, path: &str, status: u16) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((method.to_string(), path.to_string()), status);
        self
    }

    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    pub fn add_namespace(&self, name: &str) {
        self.state.lock().unwrap().namespaces.insert(name.to_string());
    }

    /// Insert or overwrite a secret out-of-band
    pub fn put_secret(&self, mut secret: Secret) {
        let mut state = self.state.lock().unwrap();
        let namespace = secret.namespace().unwrap_or_default();
        secret.metadata.resource_version = Some(state.bump_version());
        state.namespaces.insert(namespace.clone());
        state
            .secrets
            .insert((namespace, secret.name_any()), secret);
    }

    /// Delete a secret out-of-band
    pub fn remove_secret(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .secrets
            .remove(&(namespace.to_string(), name.to_string()));
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Every request served so far, as `(method, path)`; watches are `WATCH`
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Every non-GET request served so far
    pub fn mutations(&self) -> Vec<(String, String)> {
        self.requests()
            .into_iter()
            .filter(|(method, _)| method != "GET" && method != "WATCH")
            .collect()
    }

    /// Non-GET requests that targeted the given namespace
    pub fn mutations_in(&self, namespace: &str) -> Vec<(String, String)> {
        let prefix = format!("/api/v1/namespaces/{namespace}/");
        self.mutations()
            .into_iter()
            .filter(|(_, path)| path.starts_with(&prefix))
            .collect()
    }

    fn handle(&self, method: &str, path: &str, query: &str, body: &[u8]) -> (u16, Vec<u8>) {
        let watching = method == "GET"
            && query
                .split('&')
                .any(|param| param == "watch=true" || param == "watch=1");
        let method = if watching { "WATCH" } else { method };
        let mut state = self.state.lock().unwrap();
        state.requests.push((method.to_string(), path.to_string()));

        if let Some(code) = state
            .failures
            .get(&(method.to_string(), path.to_string()))
        {
            return (*code, status_json(*code, "InternalError", "injected failure"));
        }

        // An idle watch that the server closed without events
        if watching {
            return (200, Vec::new());
        }

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match (method, segments.as_slice()) {
            ("GET", ["api", "v1", "namespaces"]) => {
                let items: Vec<serde_json::Value> = state
                    .namespaces
                    .iter()
                    .map(|name| serde_json::to_value(namespace(name)).unwrap())
                    .collect();
                (200, list_json("NamespaceList", items))
            }
            ("GET", ["api", "v1", "namespaces", ns, "secrets"]) => {
                let items: Vec<serde_json::Value> = state
                    .secrets
                    .iter()
                    .filter(|((n, _), _)| n.as_str() == *ns)
                    .map(|(_, s)| serde_json::to_value(s).unwrap())
                    .collect();
                (200, list_json("SecretList", items))
            }
            ("GET", ["api", "v1", "namespaces", ns, "secrets", name]) => {
                match state.secrets.get(&(ns.to_string(), name.to_string())) {
                    Some(secret) => (200, serde_json::to_vec(secret).unwrap()),
                    None => (404, not_found_json("secrets", name)),
                }
            }
            ("POST", ["api", "v1", "namespaces", ns, "secrets"]) => {
                let mut secret: Secret = serde_json::from_slice(body).unwrap();
                let key = (ns.to_string(), secret.name_any());
                if state.secrets.contains_key(&key) {
                    return (
                        409,
                        status_json(409, "AlreadyExists", "secret already exists"),
                    );
                }
                secret.metadata.namespace = Some(ns.to_string());
                secret.metadata.resource_version = Some(state.bump_version());
                let response = serde_json::to_vec(&secret).unwrap();
                state.secrets.insert(key, secret);
                (201, response)
            }
            ("PUT", ["api", "v1", "namespaces", ns, "secrets", name]) => {
                let key = (ns.to_string(), name.to_string());
                let Some(existing) = state.secrets.get(&key) else {
                    return (404, not_found_json("secrets", name));
                };
                let mut secret: Secret = serde_json::from_slice(body).unwrap();
                if secret.metadata.resource_version.is_some()
                    && secret.metadata.resource_version != existing.metadata.resource_version
                {
                    return (409, status_json(409, "Conflict", "resource version mismatch"));
                }
                secret.metadata.resource_version = Some(state.bump_version());
                let response = serde_json::to_vec(&secret).unwrap();
                state.secrets.insert(key, secret);
                (200, response)
            }
            ("DELETE", ["api", "v1", "namespaces", ns, "secrets", name]) => {
                match state.secrets.remove(&(ns.to_string(), name.to_string())) {
                    Some(secret) => (200, serde_json::to_vec(&secret).unwrap()),
                    None => (404, not_found_json("secrets", name)),
                }
            }
            _ => (404, not_found_json("resource", path)),
        }
    }
}

impl Service<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(tower::BoxError::from)?
                .to_bytes();
            let (status, body) = server.handle(
                parts.method.as_str(),
                parts.uri.path(),
                parts.uri.query().unwrap_or_default(),
                &bytes,
            );
            let response = Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body))?;
            Ok(response)
        })
    }
}

/// Build a secret fixture with the given annotations and a single data key
pub fn secret(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: (!annotations.is_empty()).then(|| {
                annotations
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            }),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "password".to_string(),
            k8s_openapi::ByteString(b"s3cr3t".to_vec()),
        )])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn list_json(kind: &str, items: Vec<serde_json::Value>) -> Vec<u8> {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
    .into_bytes()
}

fn status_json(code: u16, reason: &str, message: &str) -> Vec<u8> {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
    .into_bytes()
}

fn not_found_json(resource: &str, name: &str) -> Vec<u8> {
    status_json(404, "NotFound", &format!("{resource} \"{name}\" not found"))
}
