//! Registry credential brokering.
//!
//! The proxy never trusts client-supplied registry credentials: the
//! `X-Registry-Auth` and `X-Registry-Config` headers are stripped from every
//! inbound request, and only credentials loaded from the overrides file at
//! startup are ever sent to the engine.

use ahash::AHashMap as HashMap;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hyper::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use swarm_tenant_proxy_engine::{AUTH_CONFIG_HEADER, AUTH_HEADER};
use tracing::{debug, warn};

/// Registry assumed when an image reference names none.
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Credentials for one registry host, as stored in the overrides file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegistryCredentials {
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub serveraddress: Option<String>,
}

/// Read-only registry-host → credentials map, built once at startup.
#[derive(Clone, Debug, Default)]
pub struct RegistryAuth {
    overrides: HashMap<String, RegistryCredentials>,
}

// === impl RegistryAuth ===

impl RegistryAuth {
    /// Loads the overrides file. A missing or malformed file yields an empty
    /// map; startup proceeds either way.
    pub fn load(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %path.display(), %error, "no registry auth overrides");
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(overrides) => Self { overrides },
            Err(error) => {
                warn!(path = %path.display(), %error, "malformed registry auth overrides; ignoring");
                Self::default()
            }
        }
    }

    pub fn lookup(&self, registry: &str) -> Option<&RegistryCredentials> {
        self.overrides.get(registry)
    }
}

// === impl RegistryCredentials ===

impl RegistryCredentials {
    /// Anonymous credentials are looked up (the registry is "known") but
    /// never injected into a request.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous || self.username.is_none()
    }

    /// Encodes the credentials the way the engine expects them:
    /// base64url-wrapped JSON.
    pub fn header_value(&self) -> HeaderValue {
        #[derive(Serialize)]
        struct AuthPayload<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            username: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            password: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            email: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            serveraddress: Option<&'a str>,
        }
        let payload = AuthPayload {
            username: self.username.as_deref(),
            password: self.password.as_deref(),
            email: self.email.as_deref(),
            serveraddress: self.serveraddress.as_deref(),
        };
        let json = serde_json::to_vec(&payload).expect("credential payload must serialize");
        HeaderValue::from_str(&URL_SAFE.encode(json)).expect("base64 is a valid header value")
    }
}

/// The registry an image reference pulls from: the segment before the first
/// slash, defaulting to the public hub.
pub fn resolve_registry(image: &str) -> &str {
    match image.split_once('/') {
        Some((registry, _)) => registry,
        None => DEFAULT_REGISTRY,
    }
}

/// Drops any client-supplied registry credentials.
pub fn strip_client_auth(headers: &mut HeaderMap) {
    headers.remove(AUTH_HEADER);
    headers.remove(AUTH_CONFIG_HEADER);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolution() {
        assert_eq!(resolve_registry("nginx"), DEFAULT_REGISTRY);
        assert_eq!(resolve_registry("nginx:1.25"), DEFAULT_REGISTRY);
        assert_eq!(
            resolve_registry("registry.example.com/app:1"),
            "registry.example.com",
        );
        assert_eq!(
            resolve_registry("registry.example.com:5000/team/app"),
            "registry.example.com:5000",
        );
    }

    #[test]
    fn header_value_is_base64url_json() {
        let creds = RegistryCredentials {
            username: Some("bob".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let value = creds.header_value();
        let decoded = URL_SAFE.decode(value.as_bytes()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(json["username"], "bob");
        assert_eq!(json["password"], "hunter2");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn anonymity() {
        assert!(RegistryCredentials::default().is_anonymous());
        assert!(RegistryCredentials {
            anonymous: true,
            username: Some("bob".to_string()),
            ..Default::default()
        }
        .is_anonymous());
        assert!(!RegistryCredentials {
            username: Some("bob".to_string()),
            ..Default::default()
        }
        .is_anonymous());
    }

    #[test]
    fn strips_both_credential_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, HeaderValue::from_static("Zm9v"));
        headers.insert(AUTH_CONFIG_HEADER, HeaderValue::from_static("e30="));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        strip_client_auth(&mut headers);
        assert!(headers.get(AUTH_HEADER).is_none());
        assert!(headers.get(AUTH_CONFIG_HEADER).is_none());
        assert!(headers.get("accept").is_some());
    }

    #[test]
    fn missing_overrides_file_is_empty() {
        let auth = RegistryAuth::load(Path::new("/nonexistent/registry_auth_overrides"));
        assert!(auth.lookup("registry.example.com").is_none());
    }
}
