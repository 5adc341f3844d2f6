use super::{broker_registry_auth, path_and_query};
use crate::error::Error;
use crate::{auth, stream, Proxy};
use hyper::{Body, Request, Response};
use swarm_tenant_proxy_engine::{DialOptions, AUTH_HEADER};

/// Distribution lookup: gate on known registries, probe pull permission,
/// then stream the engine's answer through with brokered credentials only.
pub(crate) async fn lookup(
    proxy: &Proxy,
    req: Request<Body>,
    image: String,
) -> Result<Response<Body>, Error> {
    let registry_auth = broker_registry_auth(proxy, Some(&image)).await?;
    let (parts, body) = req.into_parts();
    let mut headers = stream::request_headers(&parts.headers);
    auth::strip_client_auth(&mut headers);
    if let Some(value) = registry_auth {
        headers.insert(AUTH_HEADER, value);
    }
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
