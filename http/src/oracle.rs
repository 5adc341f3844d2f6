//! The ownership oracle.
//!
//! Stateless: every question round-trips to the engine, which stays the
//! source of truth. Concurrent callers may observe different snapshots; the
//! engine's own optimistic-concurrency checks make that safe.

use std::sync::Arc;
use swarm_tenant_proxy_core::{ResourceKind, TenantInfo};
use swarm_tenant_proxy_engine::EngineClient;
use tracing::debug;

#[derive(Clone)]
pub struct Oracle {
    client: EngineClient,
    tenant: Arc<TenantInfo>,
}

// === impl Oracle ===

impl Oracle {
    pub fn new(client: EngineClient, tenant: Arc<TenantInfo>) -> Self {
        Self { client, tenant }
    }

    /// Whether the identified resource belongs to this tenant. Any engine
    /// error (including not-found) reads as "not owned": the caller sees a
    /// uniform denial rather than a 403-vs-500 split.
    pub async fn is_owned(&self, kind: ResourceKind, id: &str) -> bool {
        let owned = match kind {
            ResourceKind::Service => return self.owns_service(id).await,
            ResourceKind::Task => return self.is_task_of_owned_service(id).await,
            ResourceKind::Network => self
                .client
                .inspect_network(id)
                .await
                .map(|n| self.tenant.owns(kind, &n.name, &n.labels)),
            ResourceKind::Secret => self
                .client
                .inspect_secret(id)
                .await
                .map(|s| self.tenant.owns(kind, &s.spec.name, &s.spec.labels)),
            ResourceKind::Config => self
                .client
                .inspect_config(id)
                .await
                .map(|c| self.tenant.owns(kind, &c.spec.name, &c.spec.labels)),
            ResourceKind::Volume => self
                .client
                .inspect_volume(id)
                .await
                .map(|v| self.tenant.owns(kind, &v.name, &v.labels)),
        };
        match owned {
            Ok(owned) => owned,
            Err(error) => {
                debug!(%kind, %id, %error, "inspect failed; not owned");
                false
            }
        }
    }

    /// A task is visible iff its parent service is owned.
    pub async fn is_task_of_owned_service(&self, task_id: &str) -> bool {
        match self.client.inspect_task(task_id).await {
            Ok(task) => self.owns_service(&task.service_id).await,
            Err(error) => {
                debug!(%task_id, %error, "task inspect failed; not owned");
                false
            }
        }
    }

    /// Network ownership, optionally honoring the allow-list. The allow-list
    /// applies to reads and to referencing a network from a service spec,
    /// never to mutation; `target` may be a name or an engine id, so the
    /// inspected name is checked against the list as well.
    pub async fn is_owned_network(&self, target: &str, include_allow_listed: bool) -> bool {
        if include_allow_listed && self.tenant.is_network_allow_listed(target) {
            return true;
        }
        match self.client.inspect_network(target).await {
            Ok(net) => {
                self.tenant.owns(ResourceKind::Network, &net.name, &net.labels)
                    || (include_allow_listed && self.tenant.is_network_allow_listed(&net.name))
            }
            Err(error) => {
                debug!(%target, %error, "network inspect failed; not owned");
                false
            }
        }
    }

    async fn owns_service(&self, id: &str) -> bool {
        match self.client.inspect_service(id).await {
            Ok(svc) => self
                .tenant
                .owns(ResourceKind::Service, &svc.spec.name, &svc.spec.labels),
            Err(error) => {
                debug!(%id, %error, "service inspect failed; not owned");
                false
            }
        }
    }
}
