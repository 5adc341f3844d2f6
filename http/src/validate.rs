//! Spec validation and tenant-label stamping.
//!
//! Two responsibilities in strict order: reject anything the policy refuses,
//! then stamp the tenant label into every position the engine persists
//! labels (top-level, container spec, volume options). Validation failures
//! never reach the engine.

use crate::error::Error;
use crate::oracle::Oracle;
use hyper::StatusCode;
use std::sync::Arc;
use swarm_tenant_proxy_core::{ResourceKind, TenantInfo};
use swarm_tenant_proxy_engine::{self as engine, api, EngineClient};

pub struct Validator {
    tenant: Arc<TenantInfo>,
    oracle: Oracle,
    client: EngineClient,
}

// === impl Validator ===

impl Validator {
    pub fn new(tenant: Arc<TenantInfo>, oracle: Oracle, client: EngineClient) -> Self {
        Self {
            tenant,
            oracle,
            client,
        }
    }

    /// Create-only name rule: present, non-empty, and carrying the prefix.
    pub fn check_name(&self, name: Option<&str>) -> Result<(), Error> {
        let name = name.unwrap_or("");
        if name.is_empty() {
            return Err(Error::NameRequired);
        }
        if !self.tenant.is_resource_name_allowed(name) {
            return Err(Error::NamePrefix {
                name: name.to_string(),
                prefix: self.tenant.name_prefix.clone(),
            });
        }
        Ok(())
    }

    pub async fn service_create(&self, spec: &mut api::ServiceSpec) -> Result<(), Error> {
        self.check_name(spec.name.as_deref())?;
        self.service_spec(spec).await
    }

    /// Updates keep the existing name; everything else re-validates.
    pub async fn service_update(&self, spec: &mut api::ServiceSpec) -> Result<(), Error> {
        self.service_spec(spec).await
    }

    async fn service_spec(&self, spec: &mut api::ServiceSpec) -> Result<(), Error> {
        let targets: Vec<String> = spec.network_targets().map(str::to_string).collect();
        for target in &targets {
            if !self.oracle.is_owned_network(target, true).await {
                return Err(Error::NetworkNotOwned(target.clone()));
            }
        }

        match spec.task_template.as_mut() {
            None => return Err(Error::ContainerSpecRequired),
            Some(template) => {
                let runtime = template.runtime.as_deref();
                if template.container_spec.is_none()
                    && !matches!(runtime, Some("plugin") | Some("attachment"))
                {
                    return Err(Error::ContainerSpecRequired);
                }
                if let Some(container) = template.container_spec.as_mut() {
                    self.check_secret_refs(container).await?;
                    self.check_config_refs(container).await?;
                    if let Some(mounts) = container.mounts.as_mut() {
                        for mount in mounts.iter_mut() {
                            self.check_mount(mount).await?;
                        }
                    }
                }
            }
        }

        if let Some(endpoint) = &spec.endpoint_spec {
            let publishes = endpoint.ports.as_ref().is_some_and(|p| !p.is_empty());
            if publishes && !self.tenant.allow_port_expose {
                return Err(Error::PortExposeDenied);
            }
        }

        self.tenant.stamp(spec.labels_mut());
        if let Some(container) = spec
            .task_template
            .as_mut()
            .and_then(|t| t.container_spec.as_mut())
        {
            self.tenant.stamp(container.labels_mut());
        }
        Ok(())
    }

    async fn check_secret_refs(&self, container: &api::ContainerSpec) -> Result<(), Error> {
        let refs: Vec<(String, String)> = container
            .secrets
            .iter()
            .flatten()
            .map(|r| reference_ids(r.secret_id.as_deref(), r.secret_name.as_deref()))
            .collect();
        for (id, shown) in refs {
            if !self.oracle.is_owned(ResourceKind::Secret, &id).await {
                return Err(Error::SecretNotOwned(shown));
            }
        }
        Ok(())
    }

    async fn check_config_refs(&self, container: &api::ContainerSpec) -> Result<(), Error> {
        let refs: Vec<(String, String)> = container
            .configs
            .iter()
            .flatten()
            .map(|r| reference_ids(r.config_id.as_deref(), r.config_name.as_deref()))
            .collect();
        for (id, shown) in refs {
            if !self.oracle.is_owned(ResourceKind::Config, &id).await {
                return Err(Error::ConfigNotOwned(shown));
            }
        }
        Ok(())
    }

    /// Mount policy. Volume-backed mounts whose source already exists must
    /// be owned; a source the engine does not know yet is accepted, and the
    /// stamped `VolumeOptions.Labels` make the engine-materialized volume
    /// owned from birth.
    async fn check_mount(&self, mount: &mut api::Mount) -> Result<(), Error> {
        // The engine treats an absent type as a volume mount.
        let kind = mount.kind.clone().unwrap_or_else(|| "volume".to_string());
        if !self.tenant.is_mount_type_known(&kind) {
            return Err(Error::MountTypeUnsupported(kind));
        }
        if !self.tenant.is_mount_type_allowed(&kind) {
            return Err(Error::MountTypeDisallowed(kind));
        }
        if kind != "volume" && kind != "cluster" {
            return Ok(());
        }

        if let Some(source) = mount.source.clone() {
            match self.client.inspect_volume(&source).await {
                Ok(v) => {
                    if !self.tenant.owns(ResourceKind::Volume, &v.name, &v.labels) {
                        return Err(Error::VolumeNotOwned(source));
                    }
                }
                Err(engine::Error::Api { status, .. }) if status == StatusCode::NOT_FOUND => {}
                Err(error) => return Err(error.into()),
            }
        }
        self.tenant.stamp(mount.volume_labels_mut());
        Ok(())
    }

    pub fn network_create(&self, body: &mut api::NetworkCreateBody) -> Result<(), Error> {
        self.check_name(body.name.as_deref())?;
        self.tenant
            .stamp(body.labels.get_or_insert_with(Default::default));
        Ok(())
    }

    /// Secret and config creates share a body shape and the same rules.
    pub fn secret_create(&self, body: &mut api::SecretSpec) -> Result<(), Error> {
        self.check_name(body.name.as_deref())?;
        self.tenant
            .stamp(body.labels.get_or_insert_with(Default::default));
        Ok(())
    }

    pub fn secret_update(&self, body: &mut api::SecretSpec) {
        self.tenant
            .stamp(body.labels.get_or_insert_with(Default::default));
    }

    pub async fn volume_create(&self, body: &mut api::VolumeCreateBody) -> Result<(), Error> {
        self.check_name(body.name.as_deref())?;
        let driver = body.driver.as_deref().unwrap_or("");
        if driver.is_empty() {
            return Err(Error::DriverRequired);
        }
        if !self.tenant.is_volume_driver_allowed(driver) {
            return Err(Error::DriverDisallowed(driver.to_string()));
        }
        if let Some(cluster) = body.cluster_volume_spec.as_mut() {
            self.check_cluster_secrets(cluster).await?;
            self.tenant
                .stamp(cluster.labels.get_or_insert_with(Default::default));
        }
        self.tenant
            .stamp(body.labels.get_or_insert_with(Default::default));
        Ok(())
    }

    pub async fn volume_update(&self, body: &mut api::VolumeUpdateBody) -> Result<(), Error> {
        if let Some(spec) = body.spec.as_mut() {
            self.check_cluster_secrets(spec).await?;
            self.tenant
                .stamp(spec.labels.get_or_insert_with(Default::default));
        }
        Ok(())
    }

    async fn check_cluster_secrets(&self, spec: &api::ClusterVolumeSpec) -> Result<(), Error> {
        let refs: Vec<String> = spec
            .access_mode
            .iter()
            .flat_map(|m| m.secrets.iter().flatten())
            .filter_map(|s| s.secret.clone())
            .collect();
        for id in refs {
            if !self.oracle.is_owned(ResourceKind::Secret, &id).await {
                return Err(Error::SecretNotOwned(id));
            }
        }
        Ok(())
    }
}

/// The id the engine is asked about and the identifier shown in denials.
/// References usually carry both an id and a name; either alone suffices.
fn reference_ids(id: Option<&str>, name: Option<&str>) -> (String, String) {
    let lookup = id.or(name).unwrap_or_default().to_string();
    let shown = name.or(id).unwrap_or_default().to_string();
    (lookup, shown)
}
