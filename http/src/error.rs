use hyper::header::CONTENT_TYPE;
use hyper::{Body, Response, StatusCode};
use swarm_tenant_proxy_core::ResourceKind;
use swarm_tenant_proxy_engine as engine;
use thiserror::Error;

/// Everything a handler can refuse or fail with, mapped onto the status
/// taxonomy clients see. Messages name the offending entity; they are the
/// contract with orchestrator clients, so they change carefully.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Name is required")]
    NameRequired,

    #[error("Name {name} does not start with required prefix {prefix}")]
    NamePrefix { name: String, prefix: String },

    #[error("TaskTemplate.ContainerSpec is required")]
    ContainerSpecRequired,

    #[error("Mount type {0} is not supported")]
    MountTypeUnsupported(String),

    #[error("Mount type {0} is not allowed")]
    MountTypeDisallowed(String),

    #[error("Volume driver is required")]
    DriverRequired,

    #[error("Volume driver {0} is not allowed")]
    DriverDisallowed(String),

    #[error("invalid request body: {0}")]
    Body(#[source] serde_json::Error),

    #[error("Access denied: {0} is not owned.")]
    NotOwned(ResourceKind),

    /// Same denial as [`Error::NotOwned`] but surfaced as 404. Stack
    /// deployers inspect secrets and configs before creating them and treat
    /// 403 as fatal, so for those two kinds the resource is reported absent.
    #[error("Access denied: {0} is not owned.")]
    NotOwnedMasked(ResourceKind),

    #[error("Volume {0} is not owned")]
    VolumeNotOwned(String),

    #[error("Network {0} is not owned")]
    NetworkNotOwned(String),

    #[error("Secret {0} is not owned")]
    SecretNotOwned(String),

    #[error("Config {0} is not owned")]
    ConfigNotOwned(String),

    #[error("Exposing ports is not allowed")]
    PortExposeDenied,

    #[error("Access denied: no credentials known for registry {0}")]
    UnknownRegistry(String),

    #[error("Access denied: {0}")]
    ProbeDenied(String),

    #[error("failed to read request body: {0}")]
    Request(#[from] hyper::Error),

    #[error("failed to encode engine request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] engine::Error),
}

// === impl Error ===

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NameRequired
            | Error::NamePrefix { .. }
            | Error::ContainerSpecRequired
            | Error::MountTypeUnsupported(_)
            | Error::MountTypeDisallowed(_)
            | Error::DriverRequired
            | Error::DriverDisallowed(_)
            | Error::Body(_) => StatusCode::BAD_REQUEST,

            Error::NotOwned(_)
            | Error::VolumeNotOwned(_)
            | Error::NetworkNotOwned(_)
            | Error::SecretNotOwned(_)
            | Error::ConfigNotOwned(_)
            | Error::PortExposeDenied
            | Error::UnknownRegistry(_)
            | Error::ProbeDenied(_) => StatusCode::FORBIDDEN,

            Error::NotOwnedMasked(_) => StatusCode::NOT_FOUND,

            Error::Request(_) | Error::Encode(_) | Error::Engine(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn into_response(self) -> Response<Body> {
        json_message(self.status(), &self.to_string())
    }
}

/// Renders an error body the way the engine renders its own.
pub fn json_message(status: StatusCode, message: &str) -> Response<Body> {
    let body = serde_json::json!({ "message": message }).to_string();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("error response must be valid")
}

pub fn not_found() -> Response<Body> {
    json_message(StatusCode::NOT_FOUND, "page not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_and_config_inspect_denials_read_as_absent() {
        assert_eq!(
            Error::NotOwnedMasked(ResourceKind::Secret).status(),
            StatusCode::NOT_FOUND,
        );
        assert_eq!(
            Error::NotOwnedMasked(ResourceKind::Secret).to_string(),
            "Access denied: Secret is not owned.",
        );
        assert_eq!(
            Error::NotOwned(ResourceKind::Service).status(),
            StatusCode::FORBIDDEN,
        );
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        assert_eq!(Error::NameRequired.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::MountTypeUnsupported("squashfs".into()).status(),
            StatusCode::BAD_REQUEST,
        );
        assert_eq!(Error::PortExposeDenied.status(), StatusCode::FORBIDDEN);
    }
}
