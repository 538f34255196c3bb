//! Wire-format models for the Graph endpoints this crate calls.
//!
//! One response type per endpoint, decoded with required-field validation:
//! a field the operation cannot work without is non-optional, so its
//! absence fails the call instead of silently defaulting.

use serde::Deserialize;

/// Children listing page (`/children` endpoints).
#[derive(Debug, Deserialize)]
pub(crate) struct DriveItemList {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    /// Opaque continuation URL, followed verbatim.
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// A drive item as returned by listings and uploads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveItem {
    pub id: String,
    pub name: String,
    pub size: Option<u64>,
    pub last_modified_date_time: Option<String>,
    pub folder: Option<FolderFacet>,
    pub parent_reference: Option<ParentReference>,
    #[serde(rename = "@microsoft.graph.downloadUrl")]
    pub download_url: Option<String>,
}

/// Present on an item iff it is a folder.
#[derive(Debug, Deserialize)]
pub(crate) struct FolderFacet {
    #[serde(rename = "childCount")]
    #[allow(dead_code)]
    pub child_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParentReference {
    pub id: Option<String>,
    pub path: Option<String>,
}

/// `$select=id,folder,parentReference` projection used by path resolution.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemHandle {
    pub id: String,
    pub folder: Option<FolderFacet>,
    #[serde(rename = "parentReference")]
    pub parent_reference: Option<ParentReference>,
}

/// `$select=id,name,@microsoft.graph.downloadUrl` projection.
#[derive(Debug, Deserialize)]
pub(crate) struct DownloadTarget {
    #[allow(dead_code)]
    pub id: String,
    #[allow(dead_code)]
    pub name: String,
    #[serde(rename = "@microsoft.graph.downloadUrl")]
    pub download_url: Option<String>,
}

/// `$select=id,name,parentReference` projection used by folder info.
#[derive(Debug, Deserialize)]
pub(crate) struct FolderDetails {
    #[allow(dead_code)]
    pub id: String,
    pub name: String,
    #[serde(rename = "parentReference")]
    pub parent_reference: Option<ParentReference>,
}

/// `/me` profile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountDto {
    pub id: String,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
}
