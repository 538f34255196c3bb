//! # Host Bridge Traits
//!
//! Abstraction traits that the host environment implements for the
//! OneDrive storage crates: HTTP transport, durable key/value options,
//! and a fast-expiring cache.
//!
//! The core crates (`core-config`, `provider-onedrive`, `core-delivery`)
//! only ever talk to these traits, so tests can script responses and
//! deployments can swap storage backends without touching the core.

pub mod error;
pub mod http;
pub mod storage;

pub use error::{BridgeError, Result};
pub use http::{HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{SettingsStore, TransientCache};
