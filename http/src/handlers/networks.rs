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
    op: Crud,
    req: Request<Body>,
) -> Result<Response<Body>, Error> {
    match op {
        Crud::Create => create(proxy, req).await,
        Crud::List => list(proxy, req).await,
        Crud::Inspect(id) => {
            if !proxy.oracle().is_owned_network(&id, true).await {
                return Err(Error::NotOwned(ResourceKind::Network));
            }
            forward(proxy, req).await
        }
        Crud::Delete(id) => {
            // Allow-listing authorizes reference, never mutation.
            if !proxy.oracle().is_owned(ResourceKind::Network, &id).await {
                return Err(Error::NotOwned(ResourceKind::Network));
            }
            forward(proxy, req).await
        }
        Crud::Update(_) | Crud::Logs(_) => Ok(error::not_found()),
    }
}

async fn create(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, body) = req.into_parts();
    let mut body: api::NetworkCreateBody = read_json(body).await?;
    proxy.validator().network_create(&mut body)?;
    forward_with_body(proxy, &parts, &body, None).await
}

async fn list(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, _body) = req.into_parts();
    let items: Vec<Value> = proxy.client.get_json(&path_and_query(&parts)).await?;
    let visible: Vec<Value> = items
        .into_iter()
        .filter(|item| match api::NetworkView::deserialize(item) {
            Ok(n) => {
                proxy.tenant.owns(ResourceKind::Network, &n.name, &n.labels)
                    || proxy.tenant.is_network_allow_listed(&n.name)
            }
            Err(_) => false,
        })
        .collect();
    Ok(json_response(&visible))
}
