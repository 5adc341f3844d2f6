#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

/// Label key marking the owning tenant on every resource created through the
/// proxy. Cooperating tooling (stack deployers, cleanup jobs) key off the
/// same string.
pub const TENANT_LABEL: &str = "com.swarm-tenant-proxy.tenant";

/// Mount types the engine understands. Anything else in a task template is a
/// malformed spec rather than a policy violation.
pub const KNOWN_MOUNT_TYPES: [&str; 5] = ["bind", "volume", "tmpfs", "npipe", "cluster"];

/// The resource kinds the proxy fronts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Service,
    Task,
    Network,
    Secret,
    Config,
    Volume,
}

/// Holds the tenant policy configuration.
///
/// Read once at startup and shared immutably across all request handlers;
/// changing any of this requires a restart.
#[derive(Clone, Debug)]
pub struct TenantInfo {
    /// The tenant label value identifying this tenant.
    pub tenant: String,

    /// Prefix required on every name created through the proxy.
    ///
    /// Defaults to the tenant label value. For volumes this check is
    /// load-bearing: some volume drivers drop labels, so the name is the only
    /// reliable ownership witness.
    pub name_prefix: String,

    /// Volume drivers accepted on volume create.
    pub allowed_volume_drivers: Vec<String>,

    /// Mount types accepted in service task templates.
    pub allowed_mount_types: Vec<String>,

    /// Whether services may publish ports.
    pub allow_port_expose: bool,

    /// Shared networks (e.g. an ingress network) that services may reference
    /// without owning them. Never honored for mutation.
    pub allow_listed_networks: Vec<String>,

    /// When set, images from registries without stored credentials are
    /// rejected outright.
    pub only_known_registries: bool,
}

// === impl ResourceKind ===

impl ResourceKind {
    /// Whether the ownership predicate for this kind includes the name-prefix
    /// rule. Tasks are engine-named and owned through their parent service.
    pub fn uses_name_prefix(&self) -> bool {
        !matches!(self, ResourceKind::Task)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Service => "Service".fmt(f),
            ResourceKind::Task => "Task".fmt(f),
            ResourceKind::Network => "Network".fmt(f),
            ResourceKind::Secret => "Secret".fmt(f),
            ResourceKind::Config => "Config".fmt(f),
            ResourceKind::Volume => "Volume".fmt(f),
        }
    }
}

// === impl TenantInfo ===

impl TenantInfo {
    /// Whether a label map carries this tenant's ownership label.
    pub fn labels_match(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(TENANT_LABEL).map(String::as_str) == Some(self.tenant.as_str())
    }

    /// The full ownership predicate over an inspected resource.
    pub fn owns(&self, kind: ResourceKind, name: &str, labels: &BTreeMap<String, String>) -> bool {
        if !self.labels_match(labels) {
            return false;
        }
        !kind.uses_name_prefix() || name.starts_with(&self.name_prefix)
    }

    /// Whether a client-chosen name is acceptable for a create.
    pub fn is_resource_name_allowed(&self, name: &str) -> bool {
        !name.is_empty() && name.starts_with(&self.name_prefix)
    }

    pub fn is_network_allow_listed(&self, name: &str) -> bool {
        self.allow_listed_networks.iter().any(|n| n == name)
    }

    pub fn is_mount_type_known(&self, mount_type: &str) -> bool {
        KNOWN_MOUNT_TYPES.contains(&mount_type)
    }

    pub fn is_mount_type_allowed(&self, mount_type: &str) -> bool {
        self.allowed_mount_types.iter().any(|t| t == mount_type)
    }

    pub fn is_volume_driver_allowed(&self, driver: &str) -> bool {
        self.allowed_volume_drivers.iter().any(|d| d == driver)
    }

    /// Merges the tenant label into a label map. A client-supplied value for
    /// the tenant key is overwritten, never trusted.
    pub fn stamp(&self, labels: &mut BTreeMap<String, String>) {
        labels.insert(TENANT_LABEL.to_string(), self.tenant.clone());
    }
}
