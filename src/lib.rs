#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use swarm_tenant_proxy_core::{ResourceKind, TenantInfo, TENANT_LABEL};
pub use swarm_tenant_proxy_engine as engine;
pub use swarm_tenant_proxy_http::{Proxy, RegistryAuth, RegistryCredentials};
pub use swarm_tenant_proxy_runtime::Args;
