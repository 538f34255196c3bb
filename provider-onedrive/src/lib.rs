//! # OneDrive Provider
//!
//! Microsoft Graph API client for the OneDrive storage integration.
//!
//! ## Overview
//!
//! This crate provides:
//! - OAuth2 authorization-code and refresh-token flows against the
//!   consumers-tenant endpoints
//! - A single valid-token gate with an exactly-once re-auth retry on 401
//! - Folder listing with verbatim next-link pagination
//! - Path-to-id resolution and short-lived download-URL lookup
//! - Buffered and streamed content uploads

pub mod client;
pub mod error;
pub mod graph_model;
pub mod oauth;
pub mod types;

pub use client::{GraphClient, API_URL};
pub use error::{GraphError, Result};
pub use oauth::{TokenGrant, AUTH_URL, SCOPES, TOKEN_URL};
pub use types::{
    display_path, AccountInfo, FileEntry, FolderInfo, FolderRef, FolderSummary, UploadedItem,
    DRIVE_ROOT_PREFIX,
};
