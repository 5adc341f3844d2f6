use super::{forward, json_response, path_and_query};
use crate::error::{self, Error};
use crate::routes::Crud;
use crate::Proxy;
use ahash::AHashSet;
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
        Crud::List => list(proxy, req).await,
        Crud::Inspect(id) | Crud::Logs(id) => {
            if !proxy.oracle().is_task_of_owned_service(&id).await {
                return Err(Error::NotOwned(ResourceKind::Task));
            }
            forward(proxy, req).await
        }
        // Tasks are engine-managed; there is nothing else to serve.
        Crud::Create | Crud::Update(_) | Crud::Delete(_) => Ok(error::not_found()),
    }
}

/// A task is visible iff its parent service is owned. The owned-service set
/// is resolved once per list rather than once per task.
async fn list(proxy: &Proxy, req: Request<Body>) -> Result<Response<Body>, Error> {
    let (parts, _body) = req.into_parts();
    let services = proxy.client.list_services().await?;
    let owned_services: AHashSet<String> = services
        .iter()
        .filter_map(|item| api::SpecResource::deserialize(item).ok())
        .filter(|s| {
            proxy
                .tenant
                .owns(ResourceKind::Service, &s.spec.name, &s.spec.labels)
        })
        .map(|s| s.id)
        .collect();

    let tasks: Vec<Value> = proxy.client.get_json(&path_and_query(&parts)).await?;
    let visible: Vec<Value> = tasks
        .into_iter()
        .filter(|item| match api::TaskView::deserialize(item) {
            Ok(t) => owned_services.contains(&t.service_id),
            Err(_) => false,
        })
        .collect();
    Ok(json_response(&visible))
}
