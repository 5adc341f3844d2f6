use super::{forward, forward_with_body, json_response, path_and_query, read_json};
use crate::error::{self, Error};
use crate::routes::Crud;
use crate::Proxy;
use hyper::{Body, Request, Response};
use serde::Deserialize;
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
        Crud::Update(name) => update(proxy, &name, req).await,
        Crud::Inspect(name) | Crud::Delete(name) => {
            if !proxy.oracle().is_owned(ResourceKind::Volume, &name).await {
                return Err(Error::NotOwned(ResourceKind::Volume));
            }
            forward(proxy, req).await
        }
        Crud::Logs(_) => Ok(error::not_found()),
    }
}

async fn create(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, body) = req.into_parts();
    let mut body: api::VolumeCreateBody = read_json(body).await?;
    proxy.validator().volume_create(&mut body).await?;
    forward_with_body(proxy, &parts, &body, None).await
}

/// Cluster-volume update; the `version` query token rides along verbatim.
async fn update(proxy: &Proxy, name: &str, req: Request<Body>) -> Result<Response<Body>, Error> {
    if !proxy.oracle().is_owned(ResourceKind::Volume, name).await {
        return Err(Error::NotOwned(ResourceKind::Volume));
    }
    let (parts, body) = req.into_parts();
    let mut body: api::VolumeUpdateBody = read_json(body).await?;
    proxy.validator().volume_update(&mut body).await?;
    forward_with_body(proxy, &parts, &body, None).await
}

async fn list(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, _body) = req.into_parts();
    let mut list: api::VolumeList = proxy.client.get_json(&path_and_query(&parts)).await?;
    if let Some(volumes) = list.volumes.as_mut() {
        volumes.retain(|item| match api::VolumeView::deserialize(item) {
            Ok(v) => proxy.tenant.owns(ResourceKind::Volume, &v.name, &v.labels),
            Err(_) => false,
        });
    }
    Ok(json_response(&list))
}
