//! # Host Bridge Implementations
//!
//! Production implementations of the `bridge-traits` seams:
//!
//! - [`ReqwestHttpClient`] — HTTP transport with bounded connect/total
//!   timeouts and streaming file bodies
//! - [`SqliteSettingsStore`] — durable key/value options on SQLite
//! - [`MemoryTransientCache`] — process-local TTL cache

pub mod cache;
pub mod http;
pub mod settings;

pub use cache::MemoryTransientCache;
pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
