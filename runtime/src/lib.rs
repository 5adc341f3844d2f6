#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Process wiring: configuration, logging, and the serve loop.

mod signal;

use anyhow::{bail, Result};
use clap::Parser;
use futures::future;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use swarm_tenant_proxy_core::TenantInfo;
use swarm_tenant_proxy_engine::EngineClient;
use swarm_tenant_proxy_http::{Proxy, RegistryAuth};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[clap(name = "swarm-tenant-proxy", about = "Per-tenant authorizing engine API proxy")]
pub struct Args {
    #[clap(long, default_value = "swarm_tenant_proxy=info,warn", env = "PROXY_LOG")]
    log_level: String,

    /// The tenant label value; every ownership decision keys off it.
    #[clap(long, env = "TENANT_NAME")]
    tenant_name: Option<String>,

    /// Superseded by --tenant-name; still honored for old deployments.
    #[clap(long, env = "OWNER_LABEL_VALUE", hide = true)]
    owner_label_value: Option<String>,

    /// Prefix required on created resource names. Defaults to the tenant
    /// name.
    #[clap(long, env = "NAME_PREFIX")]
    name_prefix: Option<String>,

    #[clap(
        long,
        default_value = "local",
        env = "ALLOWED_REGULAR_VOLUMES_DRIVERS"
    )]
    allowed_regular_volumes_drivers: Csv,

    #[clap(
        long,
        default_value = "bind,volume,tmpfs,npipe,cluster",
        env = "ALLOWED_VOLUME_TYPES"
    )]
    allowed_volume_types: Csv,

    #[clap(long, default_value = "false", env = "ALLOW_PORT_EXPOSE")]
    allow_port_expose: Switch,

    /// Shared networks services may reference without owning them.
    #[clap(long, default_value = "", env = "SERVICE_ALLOW_LISTED_NETWORKS")]
    service_allow_listed_networks: Csv,

    #[clap(long, default_value = "false", env = "ONLY_KNOWN_REGISTRIES")]
    only_known_registries: Switch,

    #[clap(
        long,
        default_value = "/run/secrets/registry_auth_overrides",
        env = "REGISTRY_AUTH_OVERRIDES_PATH"
    )]
    registry_auth_overrides_path: PathBuf,

    #[clap(long, default_value = "0.0.0.0:2375", env = "PROXY_LISTEN_ADDR")]
    listen_addr: SocketAddr,

    #[clap(long, default_value = "/var/run/docker.sock", env = "ENGINE_SOCKET_PATH")]
    engine_socket: PathBuf,
}

// === impl Args ===

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            tenant_name,
            owner_label_value,
            name_prefix,
            allowed_regular_volumes_drivers,
            allowed_volume_types,
            allow_port_expose,
            service_allow_listed_networks,
            only_known_registries,
            registry_auth_overrides_path,
            listen_addr,
            engine_socket,
        } = self;

        tracing_subscriber::registry()
            .with(EnvFilter::try_new(log_level)?)
            .with(fmt::layer())
            .init();

        let tenant = match tenant_name.or(owner_label_value) {
            Some(tenant) if !tenant.is_empty() => tenant,
            _ => bail!("TENANT_NAME must be set"),
        };
        let name_prefix = name_prefix
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| tenant.clone());

        let tenant_info = TenantInfo {
            tenant: tenant.clone(),
            name_prefix,
            allowed_volume_drivers: allowed_regular_volumes_drivers.0,
            allowed_mount_types: allowed_volume_types.0,
            allow_port_expose: allow_port_expose.0,
            allow_listed_networks: service_allow_listed_networks.0,
            only_known_registries: only_known_registries.0,
        };

        let registry_auth = RegistryAuth::load(&registry_auth_overrides_path);
        let client = EngineClient::new(&engine_socket);
        let proxy = Proxy::new(tenant_info, client, registry_auth);

        let make_svc = hyper::service::make_service_fn(move |_conn| {
            let proxy = proxy.clone();
            future::ok::<_, Infallible>(proxy)
        });
        let server = hyper::server::Server::try_bind(&listen_addr)?.serve(make_svc);
        info!(addr = %listen_addr, %tenant, engine = %engine_socket.display(), "proxy listening");
        server.with_graceful_shutdown(signal::shutdown()).await?;
        Ok(())
    }
}

/// Comma-separated values; empty entries are dropped, so `""` parses to an
/// empty list.
#[derive(Clone, Debug)]
struct Csv(Vec<String>);

impl std::str::FromStr for Csv {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(
            s.split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }
}

/// A boolean flag that also reads the `1`/`0` form used in container
/// environments.
#[derive(Copy, Clone, Debug)]
struct Switch(bool);

impl std::str::FromStr for Switch {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(Self(true)),
            "" | "0" | "false" => Ok(Self(false)),
            other => bail!("expected one of 1, true, 0, false; got {other:?}"),
        }
    }
}
