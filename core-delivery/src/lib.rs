//! # Delivery Adapters
//!
//! The host-facing entry points around the Graph client:
//!
//! - [`Downloader`] — maps a stored file reference to a short-lived signed
//!   download URL at request time, passing non-OneDrive references through
//!   untouched
//! - [`Uploader`] — validates an inbound file (extension, content sniff,
//!   size) and streams it to a target folder
//! - [`browse`] — listing helpers for the file-browser UI (sorting and
//!   display formatting)

pub mod browse;
pub mod downloader;
pub mod error;
pub mod uploader;
pub mod validation;

#[cfg(test)]
mod test_util;

pub use downloader::Downloader;
pub use error::{DeliveryError, Result};
pub use uploader::{UploadedFile, Uploader, DEFAULT_MAX_UPLOAD_SIZE};
pub use validation::ValidationError;
