#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Engine client adapter.
//!
//! The engine's control API is served on a local Unix socket; this crate owns
//! that socket. It exposes a small typed surface (inspects and lists, used
//! for ownership decisions) and a raw [`EngineClient::dial`] for byte-level
//! forwarding with streaming responses.

pub mod api;
mod client;
mod transport;

pub use self::client::{DialOptions, EngineClient, Error, AUTH_CONFIG_HEADER, AUTH_HEADER};
pub use self::transport::UnixConnector;
