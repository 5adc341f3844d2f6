//! Secrets and configs share a body shape, an API shape, and the tenant
//! policy; one handler serves both kinds.

use super::{forward, forward_with_body, json_response, path_and_query, read_json};
use crate::error::{self, Error};
use crate::routes::Crud;
use crate::Proxy;
use hyper::{Body, Request, Response};
use serde::Deserialize;
use serde_json::Value;
use swarm_tenant_proxy_core::ResourceKind;
use swarm_tenant_proxy_engine::api;

pub(crate) async fn handle(
    proxy: &Proxy,
    kind: ResourceKind,
    op: Crud,
    req: Request<Body>,
) -> Result<Response<Body>, Error> {
    match op {
        Crud::Create => create(proxy, req).await,
        Crud::List => list(proxy, kind, req).await,
        Crud::Inspect(id) => {
            if !proxy.oracle().is_owned(kind, &id).await {
                // 404, not 403: stack deploys inspect before create and
                // abort on a Forbidden.
                return Err(Error::NotOwnedMasked(kind));
            }
            forward(proxy, req).await
        }
        Crud::Update(id) => update(proxy, kind, &id, req).await,
        Crud::Delete(id) => {
            if !proxy.oracle().is_owned(kind, &id).await {
                return Err(Error::NotOwned(kind));
            }
            forward(proxy, req).await
        }
        Crud::Logs(_) => Ok(error::not_found()),
    }
}

async fn create(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, body) = req.into_parts();
    let mut body: api::SecretSpec = read_json(body).await?;
    proxy.validator().secret_create(&mut body)?;
    forward_with_body(proxy, &parts, &body, None).await
}

async fn update(
    proxy: &Proxy,
    kind: ResourceKind,
    id: &str,
    req: Request<Body>,
) -> Result<Response<Body>, Error> {
    if !proxy.oracle().is_owned(kind, id).await {
        return Err(Error::NotOwned(kind));
    }
    let (parts, body) = req.into_parts();
    let mut body: api::SecretSpec = read_json(body).await?;
    proxy.validator().secret_update(&mut body);
    forward_with_body(proxy, &parts, &body, None).await
}

async fn list(
    proxy: &Proxy,
    kind: ResourceKind,
    req: Request<Body>,
) -> Result<Response<Body>, Error> {
    let (parts, _body) = req.into_parts();
    let items: Vec<Value> = proxy.client.get_json(&path_and_query(&parts)).await?;
    let owned: Vec<Value> = items
        .into_iter()
        .filter(|item| match api::SpecResource::deserialize(item) {
            Ok(s) => proxy.tenant.owns(kind, &s.spec.name, &s.spec.labels),
            Err(_) => false,
        })
        .collect();
    Ok(json_response(&owned))
}
