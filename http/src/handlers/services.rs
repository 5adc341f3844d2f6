use super::{
    broker_registry_auth, forward, forward_with_body, json_response, path_and_query, read_json,
};
use crate::error::Error;
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
        Crud::Update(id) => update(proxy, &id, req).await,
        Crud::Inspect(id) | Crud::Delete(id) | Crud::Logs(id) => {
            if !proxy.oracle().is_owned(ResourceKind::Service, &id).await {
                return Err(Error::NotOwned(ResourceKind::Service));
            }
            forward(proxy, req).await
        }
    }
}

async fn create(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, body) = req.into_parts();
    let mut spec: api::ServiceSpec = read_json(body).await?;
    proxy.validator().service_create(&mut spec).await?;
    let registry_auth = broker_registry_auth(proxy, spec.image()).await?;
    forward_with_body(proxy, &parts, &spec, registry_auth).await
}

async fn update(proxy: &Proxy, id: &str, req: Request<Body>) -> Result<Response<Body>, Error> {
    if !proxy.oracle().is_owned(ResourceKind::Service, id).await {
        return Err(Error::NotOwned(ResourceKind::Service));
    }
    let (parts, body) = req.into_parts();
    let mut spec: api::ServiceSpec = read_json(body).await?;
    proxy.validator().service_update(&mut spec).await?;
    let registry_auth = broker_registry_auth(proxy, spec.image()).await?;
    forward_with_body(proxy, &parts, &spec, registry_auth).await
}

async fn list(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, _body) = req.into_parts();
    let items: Vec<Value> = proxy.client.get_json(&path_and_query(&parts)).await?;
    let owned: Vec<Value> = items
        .into_iter()
        .filter(|item| match api::SpecResource::deserialize(item) {
            Ok(s) => proxy
                .tenant
                .owns(ResourceKind::Service, &s.spec.name, &s.spec.labels),
            Err(_) => false,
        })
        .collect();
    Ok(json_response(&owned))
}
