//! Byte-level passthrough.
//!
//! Forwarded responses keep the engine's status and headers and hand the body
//! through without buffering; hyper ends the engine-side stream when the
//! client goes away. Hop-by-hop headers describe one connection and never
//! cross the proxy in either direction.

use hyper::header::{HeaderMap, HeaderName};
use hyper::{Body, Response};

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Headers to carry on an outbound engine request. The Host header is
/// dropped too: hyper derives it from the engine URI.
pub(crate) fn request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) && name.as_str() != "host" {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Re-heads an engine response for the client: status and headers first,
/// then the body as an unbuffered stream.
pub(crate) fn response(engine_rsp: Response<Body>) -> Response<Body> {
    let (parts, body) = engine_rsp.into_parts();
    let mut out = Response::new(body);
    *out.status_mut() = parts.status;
    let headers = out.headers_mut();
    for (name, value) in &parts.headers {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    out
}
