use crate::api;
use crate::transport::UnixConnector;
use hyper::header::HeaderValue;
use hyper::{Body, HeaderMap, Method, Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Header carrying base64url-encoded registry credentials to the engine.
pub const AUTH_HEADER: &str = "x-registry-auth";

/// Header carrying a full registry config map; never forwarded.
pub const AUTH_CONFIG_HEADER: &str = "x-registry-config";

/// Client for the engine's control socket.
///
/// Cheap to clone; all clones share one pooled connection set.
#[derive(Clone, Debug)]
pub struct EngineClient {
    client: hyper::Client<UnixConnector, Body>,
}

/// A raw forwarded request. Headers are passed as given: callers sanitize
/// before dialing.
#[derive(Debug)]
pub struct DialOptions {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Body,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("engine transport error: {0}")]
    Transport(#[from] hyper::Error),

    #[error("invalid engine request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("failed to decode engine response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("engine returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

// === impl EngineClient ===

impl EngineClient {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        let client = hyper::Client::builder().build(UnixConnector::new(socket_path));
        Self { client }
    }

    /// The authority is a placeholder: the connector dials the socket no
    /// matter what, and hyper derives the outgoing Host header from it.
    fn uri(path_and_query: &str) -> Result<Uri, Error> {
        Uri::builder()
            .scheme("http")
            .authority("engine")
            .path_and_query(path_and_query)
            .build()
            .map_err(Into::into)
    }

    /// Issues a GET and decodes the JSON response, surfacing engine error
    /// bodies as [`Error::Api`].
    pub async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, Error> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(Self::uri(path_and_query)?)
            .body(Body::empty())?;
        let rsp = self.client.request(req).await?;
        let status = rsp.status();
        let bytes = hyper::body::to_bytes(rsp.into_body()).await?;
        if !status.is_success() {
            return Err(Error::Api {
                status,
                message: error_message(&bytes),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn inspect_service(&self, id: &str) -> Result<api::SpecResource, Error> {
        self.get_json(&format!("/services/{}", id)).await
    }

    pub async fn inspect_task(&self, id: &str) -> Result<api::TaskView, Error> {
        self.get_json(&format!("/tasks/{}", id)).await
    }

    pub async fn inspect_network(&self, id: &str) -> Result<api::NetworkView, Error> {
        self.get_json(&format!("/networks/{}", id)).await
    }

    pub async fn inspect_secret(&self, id: &str) -> Result<api::SpecResource, Error> {
        self.get_json(&format!("/secrets/{}", id)).await
    }

    pub async fn inspect_config(&self, id: &str) -> Result<api::SpecResource, Error> {
        self.get_json(&format!("/configs/{}", id)).await
    }

    pub async fn inspect_volume(&self, name: &str) -> Result<api::VolumeView, Error> {
        self.get_json(&format!("/volumes/{}", name)).await
    }

    pub async fn list_services(&self) -> Result<Vec<Value>, Error> {
        self.get_json("/services").await
    }

    /// Asks the engine whether the configured credentials may pull `image`.
    /// Success means the distribution endpoint answered 2xx; anything else
    /// carries the engine's message back to the caller.
    pub async fn distribution_probe(
        &self,
        image: &str,
        auth: Option<&HeaderValue>,
    ) -> Result<(), Error> {
        let mut req = Request::builder()
            .method(Method::GET)
            .uri(Self::uri(&format!("/distribution/{}/json", image))?);
        if let Some(value) = auth {
            req = req.header(AUTH_HEADER, value.clone());
        }
        let rsp = self.client.request(req.body(Body::empty())?).await?;
        let status = rsp.status();
        if status.is_success() {
            return Ok(());
        }
        let bytes = hyper::body::to_bytes(rsp.into_body()).await?;
        Err(Error::Api {
            status,
            message: error_message(&bytes),
        })
    }

    /// Byte-level forwarding. The response's headers are available before its
    /// body, so callers can stream without buffering.
    pub async fn dial(&self, options: DialOptions) -> Result<Response<Body>, Error> {
        let DialOptions {
            method,
            path_and_query,
            headers,
            body,
        } = options;
        let mut req = Request::builder()
            .method(method)
            .uri(Self::uri(&path_and_query)?)
            .body(body)?;
        *req.headers_mut() = headers;
        Ok(self.client.request(req).await?)
    }
}

fn error_message(bytes: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct Message {
        message: String,
    }
    match serde_json::from_slice::<Message>(bytes) {
        Ok(m) => m.message,
        Err(_) => String::from_utf8_lossy(bytes).trim().to_string(),
    }
}
