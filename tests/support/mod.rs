//! Test harness: an in-process engine listening on a real Unix socket.
//!
//! The mock records every request it receives (method, path, headers, body)
//! and answers from a canned-response table, so tests can assert both what
//! the proxy forwarded and what it refused to forward.

#![allow(dead_code)]

use hyper::service::service_fn;
use hyper::{Body, Request, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use swarm_tenant_proxy_core::TenantInfo;
use swarm_tenant_proxy_engine::EngineClient;
use swarm_tenant_proxy_http::{Proxy, RegistryAuth};
use tokio::net::UnixListener;

static NEXT_SOCKET: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path_and_query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("recorded body must be json")
    }
}

#[derive(Clone)]
struct Canned {
    status: u16,
    body: Vec<u8>,
}

pub struct MockEngine {
    dir: PathBuf,
    socket: PathBuf,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Mutex<HashMap<(String, String), Canned>>>,
    accept: tokio::task::JoinHandle<()>,
}

// === impl MockEngine ===

impl MockEngine {
    pub async fn spawn() -> Self {
        let dir = std::env::temp_dir().join(format!(
            "swarm-tenant-proxy-test-{}-{}",
            std::process::id(),
            NEXT_SOCKET.fetch_add(1, Ordering::SeqCst),
        ));
        std::fs::create_dir_all(&dir).expect("failed to create socket dir");
        let socket = dir.join("engine.sock");
        let listener = UnixListener::bind(&socket).expect("failed to bind engine socket");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let responses: Arc<Mutex<HashMap<(String, String), Canned>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let accept = {
            let requests = requests.clone();
            let responses = responses.clone();
            tokio::spawn(async move {
                loop {
                    let (stream, _addr) = match listener.accept().await {
                        Ok(conn) => conn,
                        Err(_) => break,
                    };
                    let requests = requests.clone();
                    let responses = responses.clone();
                    tokio::spawn(async move {
                        let svc = service_fn(move |req: Request<Body>| {
                            let requests = requests.clone();
                            let responses = responses.clone();
                            async move {
                                Ok::<_, Infallible>(serve(req, &requests, &responses).await)
                            }
                        });
                        let _ = hyper::server::conn::Http::new()
                            .serve_connection(stream, svc)
                            .await;
                    });
                }
            })
        };

        Self {
            dir,
            socket,
            requests,
            responses,
            accept,
        }
    }

    /// Registers a canned JSON response for an exact method and path (query
    /// strings are ignored for matching).
    pub fn on(&self, method: &str, path: &str, status: u16, body: Value) {
        self.on_bytes(method, path, status, body.to_string().into_bytes());
    }

    pub fn on_bytes(&self, method: &str, path: &str, status: u16, body: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), Canned { status, body });
    }

    pub fn client(&self) -> EngineClient {
        EngineClient::new(&self.socket)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path (sans query) matches.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| {
                r.method == method
                    && r.path_and_query.split('?').next().unwrap_or_default() == path
            })
            .collect()
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.accept.abort();
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

async fn serve(
    req: Request<Body>,
    requests: &Mutex<Vec<RecordedRequest>>,
    responses: &Mutex<HashMap<(String, String), Canned>>,
) -> Response<Body> {
    let (parts, body) = req.into_parts();
    let bytes = hyper::body::to_bytes(body).await.unwrap_or_default();
    requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        headers: parts
            .headers
            .iter()
            .map(|(n, v)| {
                (
                    n.to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: bytes.to_vec(),
    });

    let key = (parts.method.to_string(), parts.uri.path().to_string());
    let canned = responses.lock().unwrap().get(&key).cloned();
    match canned {
        Some(c) => Response::builder()
            .status(c.status)
            .header("content-type", "application/json")
            .body(Body::from(c.body))
            .unwrap(),
        None => Response::builder()
            .status(404)
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message":"not found"}"#))
            .unwrap(),
    }
}

/// The default test tenant: `acme`, prefix `acme`, every engine mount type
/// allowed, the `local` volume driver, and `ingress` allow-listed.
pub fn tenant() -> TenantInfo {
    TenantInfo {
        tenant: "acme".to_string(),
        name_prefix: "acme".to_string(),
        allowed_volume_drivers: vec!["local".to_string()],
        allowed_mount_types: vec!["bind", "volume", "tmpfs", "npipe", "cluster"]
            .into_iter()
            .map(String::from)
            .collect(),
        allow_port_expose: false,
        allow_listed_networks: vec!["ingress".to_string()],
        only_known_registries: false,
    }
}

pub async fn proxy() -> (MockEngine, Proxy) {
    proxy_with(tenant(), RegistryAuth::default()).await
}

pub async fn proxy_with(tenant: TenantInfo, registry_auth: RegistryAuth) -> (MockEngine, Proxy) {
    let engine = MockEngine::spawn().await;
    let proxy = Proxy::new(tenant, engine.client(), registry_auth);
    (engine, proxy)
}

/// Builds a registry-auth store by round-tripping through a real overrides
/// file, the same way the runtime loads one.
pub fn registry_auth(overrides: Value) -> RegistryAuth {
    let path = std::env::temp_dir().join(format!(
        "swarm-tenant-proxy-auth-{}-{}.json",
        std::process::id(),
        NEXT_SOCKET.fetch_add(1, Ordering::SeqCst),
    ));
    std::fs::write(&path, overrides.to_string()).expect("failed to write overrides");
    let auth = RegistryAuth::load(&path);
    let _ = std::fs::remove_file(&path);
    auth
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(path: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

pub fn post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn put(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(rsp: Response<Body>) -> Value {
    let bytes = hyper::body::to_bytes(rsp.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body must be json")
}

/// The `message` field of an error response.
pub async fn message(rsp: Response<Body>) -> String {
    body_json(rsp).await["message"]
        .as_str()
        .expect("error body must carry a message")
        .to_string()
}
