//! Request handlers, one module per resource kind. They compose the oracle,
//! the validator, and the engine client; every path ends in a forwarded
//! engine call or a typed denial.

pub(crate) mod distribution;
pub(crate) mod networks;
pub(crate) mod secrets;
pub(crate) mod services;
pub(crate) mod tasks;
pub(crate) mod volumes;

use crate::error::Error;
use crate::{auth, stream, Proxy};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::{Body, Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use swarm_tenant_proxy_engine::{self as engine, DialOptions, AUTH_HEADER};

/// The original path and query, forwarded verbatim (version prefix, list
/// filters, and optimistic-concurrency tokens included).
pub(crate) fn path_and_query(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

pub(crate) async fn read_json<T: DeserializeOwned>(body: Body) -> Result<T, Error> {
    let bytes = hyper::body::to_bytes(body).await?;
    serde_json::from_slice(&bytes).map_err(Error::Body)
}

pub(crate) fn json_response<T: Serialize>(value: &T) -> Response<Body> {
    let body = serde_json::to_vec(value).expect("json response must serialize");
    Response::builder()
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("json response must be valid")
}

/// Forwards a request unchanged apart from header sanitization. Client
/// registry credentials never cross.
pub(crate) async fn forward(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, body) = req.into_parts();
    let mut headers = stream::request_headers(&parts.headers);
    auth::strip_client_auth(&mut headers);
    let rsp = proxy
        .client
        .dial(DialOptions {
            method: parts.method.clone(),
            path_and_query: path_and_query(&parts),
            headers,
            body,
        })
        .await?;
    Ok(stream::response(rsp))
}

/// Forwards with the validated, stamped body in place of the client's, and
/// optionally with brokered registry credentials.
pub(crate) async fn forward_with_body<T: Serialize>(
    proxy: &Proxy,
    parts: &Parts,
    body: &T,
    registry_auth: Option<HeaderValue>,
) -> Result<Response<Body>, Error> {
    let bytes = serde_json::to_vec(body).map_err(Error::Encode)?;
    let mut headers = stream::request_headers(&parts.headers);
    auth::strip_client_auth(&mut headers);
    headers.remove(CONTENT_LENGTH);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(value) = registry_auth {
        headers.insert(AUTH_HEADER, value);
    }
    let rsp = proxy
        .client
        .dial(DialOptions {
            method: parts.method.clone(),
            path_and_query: path_and_query(parts),
            headers,
            body: Body::from(bytes),
        })
        .await?;
    Ok(stream::response(rsp))
}

/// Resolves pull credentials for `image` and verifies them against the
/// engine's distribution endpoint before any service create/update commits.
pub(crate) async fn broker_registry_auth(
    proxy: &Proxy,
    image: Option<&str>,
) -> Result<Option<HeaderValue>, Error> {
    let image = match image {
        Some(image) => image,
        None => return Ok(None),
    };
    let registry = auth::resolve_registry(image);
    let creds = proxy.registry_auth.lookup(registry);
    if creds.is_none() && proxy.tenant.only_known_registries {
        return Err(Error::UnknownRegistry(registry.to_string()));
    }
    let header = creds
        .filter(|c| !c.is_anonymous())
        .map(|c| c.header_value());
    match proxy.client.distribution_probe(image, header.as_ref()).await {
        Ok(()) => Ok(header),
        Err(engine::Error::Api { message, .. }) => Err(Error::ProbeDenied(message)),
        Err(error) => Err(Error::Engine(error)),
    }
}
