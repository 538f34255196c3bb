//! Domain types produced by the Graph client.

use crate::graph_model::DriveItem;
use chrono::{DateTime, Utc};
use std::fmt;

/// Structural prefix Graph puts in front of every `parentReference.path`.
///
/// Stored display paths were produced by stripping this exact literal, so
/// the strip must stay byte-for-byte identical.
pub const DRIVE_ROOT_PREFIX: &str = "/drive/root:";

/// Reference to a OneDrive folder: the drive root, or an opaque item id.
///
/// Item ids are provider-assigned and carry no semantic structure; they are
/// never parsed, only passed back to the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderRef {
    Root,
    Id(String),
}

impl FolderRef {
    /// Parse the stored form: empty string and `"root"` are the root
    /// sentinel, anything else is an opaque id.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "root" {
            FolderRef::Root
        } else {
            FolderRef::Id(trimmed.to_string())
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, FolderRef::Root)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FolderRef::Root => "root",
            FolderRef::Id(id) => id,
        }
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FolderRef {
    fn from(raw: &str) -> Self {
        FolderRef::parse(raw)
    }
}

/// One entry of a folder listing. Request-scoped; never persisted.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub id: String,
    /// Slash-delimited display path with the structural prefix stripped.
    pub path: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub is_folder: bool,
    /// Short-lived signed URL when the listing response happened to carry
    /// one; saves a metadata round trip at download time.
    pub download_url: Option<String>,
}

impl FileEntry {
    pub(crate) fn from_item(item: DriveItem) -> Self {
        let path = display_path(
            item.parent_reference.as_ref().and_then(|p| p.path.as_deref()),
            &item.name,
        );

        FileEntry {
            path,
            size: item.size.unwrap_or(0),
            modified: item
                .last_modified_date_time
                .as_deref()
                .and_then(parse_timestamp),
            is_folder: item.folder.is_some(),
            download_url: item.download_url,
            name: item.name,
            id: item.id,
        }
    }
}

/// Folder id/name pair for dropdown population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub id: String,
    pub name: String,
}

/// Result of a single-round-trip folder lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub name: String,
    pub path: String,
    /// `None` for the drive root itself; `Some(FolderRef::Root)` when the
    /// folder's parent is the root.
    pub parent: Option<FolderRef>,
}

/// Metadata of a created or overwritten item returned by an upload.
#[derive(Debug, Clone)]
pub struct UploadedItem {
    pub id: String,
    pub name: String,
    pub parent_path: Option<String>,
}

impl UploadedItem {
    /// Display path of the uploaded file, reconstructed the same way the
    /// listing paths are. An upload into the root yields `"/<name>"`.
    pub fn display_path(&self) -> String {
        let parent = self.parent_path.as_deref().unwrap_or("");
        let parent = parent.strip_prefix(DRIVE_ROOT_PREFIX).unwrap_or(parent);
        format!("{}/{}", parent.trim_end_matches('/'), self.name)
    }
}

/// Profile of the connected Microsoft account.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub id: String,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
}

/// Join a Graph parent path and item name into a display path, stripping
/// the fixed structural prefix.
pub fn display_path(parent_path: Option<&str>, name: &str) -> String {
    let raw = match parent_path {
        Some(parent) => format!("{}/{}", parent, name),
        None => format!("/{}", name),
    };
    match raw.strip_prefix(DRIVE_ROOT_PREFIX) {
        Some(stripped) => stripped.to_string(),
        None => raw,
    }
}

pub(crate) fn parse_timestamp(rfc3339: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(rfc3339)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
