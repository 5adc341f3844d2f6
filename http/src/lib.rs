#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! The proxy's HTTP surface: a hyper service that classifies each request,
//! enforces the tenant-ownership policy, rewrites specs, and forwards to the
//! engine, streaming responses through without buffering.

pub mod auth;
mod error;
mod handlers;
mod oracle;
pub mod routes;
mod stream;
mod validate;

pub use self::auth::{RegistryAuth, RegistryCredentials};
pub use self::error::Error;
pub use self::oracle::Oracle;

use self::routes::Route;
use self::validate::Validator;
use futures::future;
use hyper::{Body, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;
use std::task;
use swarm_tenant_proxy_core::{ResourceKind, TenantInfo};
use swarm_tenant_proxy_engine::EngineClient;
use tracing::{debug, info, info_span, Instrument};

/// One tenant's proxy. Cheap to clone: all clones share the frozen tenant
/// configuration, the engine client's connection pool, and the read-only
/// registry-auth map.
#[derive(Clone)]
pub struct Proxy {
    pub(crate) tenant: Arc<TenantInfo>,
    pub(crate) client: EngineClient,
    pub(crate) registry_auth: Arc<RegistryAuth>,
}

// === impl Proxy ===

impl Proxy {
    pub fn new(tenant: TenantInfo, client: EngineClient, registry_auth: RegistryAuth) -> Self {
        Self {
            tenant: Arc::new(tenant),
            client,
            registry_auth: Arc::new(registry_auth),
        }
    }

    pub(crate) fn oracle(&self) -> Oracle {
        Oracle::new(self.client.clone(), self.tenant.clone())
    }

    pub(crate) fn validator(&self) -> Validator {
        Validator::new(self.tenant.clone(), self.oracle(), self.client.clone())
    }

    /// Serves one request. Denials and failures render as the engine-style
    /// `{"message": ...}` body with the mapped status.
    pub async fn handle(self, req: Request<Body>) -> Response<Body> {
        let route = match routes::parse(req.method(), req.uri().path()) {
            Some(route) => route,
            None => {
                debug!("refusing unrouted request");
                return error::not_found();
            }
        };
        match self.dispatch(route, req).await {
            Ok(rsp) => rsp,
            Err(error) => {
                info!(%error, status = %error.status(), "request refused");
                error.into_response()
            }
        }
    }

    async fn dispatch(&self, route: Route, req: Request<Body>) -> Result<Response<Body>, Error> {
        match route {
            Route::Ping | Route::Version | Route::Info | Route::Nodes | Route::NodeInspect => {
                handlers::forward(self, req).await
            }
            Route::Distribution { image } => handlers::distribution::lookup(self, req, image).await,
            Route::Service(op) => handlers::services::handle(self, op, req).await,
            Route::Task(op) => handlers::tasks::handle(self, op, req).await,
            Route::Network(op) => handlers::networks::handle(self, op, req).await,
            Route::Secret(op) => {
                handlers::secrets::handle(self, ResourceKind::Secret, op, req).await
            }
            Route::Config(op) => {
                handlers::secrets::handle(self, ResourceKind::Config, op, req).await
            }
            Route::Volume(op) => handlers::volumes::handle(self, op, req).await,
        }
    }
}

impl hyper::service::Service<Request<Body>> for Proxy {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> task::Poll<Result<(), Infallible>> {
        task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let proxy = self.clone();
        let span = info_span!("request", method = %req.method(), path = req.uri().path());
        Box::pin(async move { Ok(proxy.handle(req).await) }.instrument(span))
    }
}
