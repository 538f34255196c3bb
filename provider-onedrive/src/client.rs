//! Graph API client.
//!
//! Every authenticated request flows through one token gate
//! ([`GraphClient::valid_access_token`]) and one response policy: a 401 is
//! retried exactly once after a refresh, a 403 is a terminal permission
//! failure, and every other non-2xx (or transport failure) is terminal for
//! that call.
//!
//! Token state is process-global. Two operations racing on an expired
//! token may both refresh; the store resolves that as idempotent
//! last-write-wins, and the identity platform keeps superseded refresh
//! tokens valid for a grace window.

use crate::error::{GraphError, Result};
use crate::graph_model::{
    AccountDto, DownloadTarget, DriveItem, DriveItemList, FolderDetails, ItemHandle,
};
use crate::oauth::{self, TokenGrant};
use crate::types::{
    display_path, AccountInfo, FileEntry, FolderInfo, FolderRef, FolderSummary, UploadedItem,
    DRIVE_ROOT_PREFIX,
};
use bridge_traits::http::{HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_config::{ConfigStore, URL_PREFIX};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Graph API base.
pub const API_URL: &str = "https://graph.microsoft.com/v1.0";

/// Encode set equivalent to classic rawurlencode: everything but
/// unreserved characters. Stored display paths were produced under these
/// rules, so lookups must encode the same way.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Dropdown-scale cap for folder listings. A deliberate UI bound, not a
/// completeness guarantee.
const MAX_FOLDERS: usize = 50;

#[derive(Clone)]
struct Payload {
    body: HttpBody,
    content_type: &'static str,
}

/// Authenticated Microsoft Graph client.
pub struct GraphClient {
    http: Arc<dyn HttpClient>,
    config: Arc<ConfigStore>,
}

impl GraphClient {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<ConfigStore>) -> Self {
        Self { http, config }
    }

    /// The backing configuration store.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Authorization URL for the operator's consent redirect.
    ///
    /// The caller appends its CSRF `state` parameter.
    pub async fn authorization_url(&self, redirect_uri: &str) -> Result<String> {
        let client_id = self.config.client_id().await?;
        if client_id.is_empty() {
            return Err(GraphError::NoCredentials);
        }
        Ok(oauth::build_authorization_url(&client_id, redirect_uri))
    }

    /// Exchange the authorization code delivered to the redirect URI.
    ///
    /// A rejected or expired code is an expected outcome and comes back as
    /// [`GraphError::TokenExchangeFailed`].
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant> {
        let client_id = self.config.client_id().await?;
        let client_secret = self.config.client_secret().await?;
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(GraphError::NoCredentials);
        }

        oauth::exchange_code(
            self.http.as_ref(),
            &client_id,
            &client_secret,
            code,
            redirect_uri,
        )
        .await
    }

    /// Exchange the code and persist the granted token set.
    pub async fn connect_with_code(&self, code: &str, redirect_uri: &str) -> Result<()> {
        let grant = self.exchange_code(code, redirect_uri).await?;
        self.config
            .save_tokens(&grant.access_token, &grant.refresh_token, grant.expires_in)
            .await?;
        Ok(())
    }

    /// Drop all stored tokens.
    pub async fn disconnect(&self) -> Result<()> {
        self.config.clear_tokens().await?;
        Ok(())
    }

    /// Refresh the access token from the stored refresh token.
    ///
    /// On success the new token set is persisted and `true` is returned.
    /// Any failure — missing refresh token, non-200 response, transport
    /// error — returns `false` and leaves the stored tokens untouched; no
    /// partial overwrite.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> bool {
        let inputs = match self.refresh_inputs().await {
            Ok(Some(inputs)) => inputs,
            Ok(None) => {
                debug!("No refresh token or credentials available");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Could not read stored state for token refresh");
                return false;
            }
        };
        let (client_id, client_secret, refresh_token) = inputs;

        let grant = match oauth::refresh_grant(
            self.http.as_ref(),
            &client_id,
            &client_secret,
            &refresh_token,
        )
        .await
        {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return false;
            }
        };

        if let Err(e) = self
            .config
            .save_tokens(&grant.access_token, &grant.refresh_token, grant.expires_in)
            .await
        {
            warn!(error = %e, "Failed to persist refreshed tokens");
            return false;
        }

        true
    }

    async fn refresh_inputs(&self) -> Result<Option<(String, String, String)>> {
        let Some(refresh_token) = self.config.refresh_token().await? else {
            return Ok(None);
        };
        let client_id = self.config.client_id().await?;
        let client_secret = self.config.client_secret().await?;
        if client_id.is_empty() || client_secret.is_empty() {
            return Ok(None);
        }
        Ok(Some((client_id, client_secret, refresh_token)))
    }

    /// The single gate every authenticated request passes through.
    ///
    /// An expired token triggers exactly one refresh attempt; a failed
    /// refresh fails the call.
    pub async fn valid_access_token(&self) -> Result<String> {
        if self.config.is_token_expired().await? {
            if self.config.refresh_token().await?.is_none() {
                return Err(GraphError::NotAuthenticated);
            }
            if !self.refresh_access_token().await {
                return Err(GraphError::TokenRefreshFailed(
                    "could not refresh the expired access token".to_string(),
                ));
            }
        }

        self.config
            .access_token()
            .await?
            .ok_or(GraphError::NotAuthenticated)
    }

    fn endpoint_url(endpoint: &str) -> String {
        // Pagination next-links arrive absolute and are followed verbatim
        if endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", API_URL, endpoint)
        }
    }

    async fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: Option<Payload>,
        token: &str,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(method, Self::endpoint_url(endpoint))
            .bearer_token(token)
            .header("Accept", "application/json");

        if let Some(payload) = payload {
            request = request.header("Content-Type", payload.content_type);
            request.body = Some(payload.body);
        }

        self.http
            .execute(request)
            .await
            .map_err(|e| GraphError::Transport(e.to_string()))
    }

    fn check_status(endpoint: &str, response: HttpResponse) -> Result<HttpResponse> {
        match response.status {
            200 | 201 => Ok(response),
            403 => {
                warn!(endpoint = endpoint, "Graph API permission denied");
                Err(GraphError::PermissionDenied {
                    endpoint: endpoint.to_string(),
                })
            }
            status => {
                warn!(endpoint = endpoint, status = status, "Graph request failed");
                Err(GraphError::RequestFailed {
                    endpoint: endpoint.to_string(),
                    status,
                })
            }
        }
    }

    /// Authorized request with the one-shot re-auth.
    ///
    /// Written as an explicit try / refresh / try-once-more sequence so the
    /// "exactly one retry" invariant is structural: a 401 on the second
    /// attempt cannot reach another refresh.
    async fn authorized_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: Option<Payload>,
    ) -> Result<HttpResponse> {
        let token = self.valid_access_token().await?;
        let response = self.send(method, endpoint, payload.clone(), &token).await?;
        if response.status != 401 {
            return Self::check_status(endpoint, response);
        }

        debug!(endpoint = endpoint, "Access token rejected, refreshing once");
        if !self.refresh_access_token().await {
            return Err(GraphError::NotAuthenticated);
        }
        let token = self
            .config
            .access_token()
            .await?
            .ok_or(GraphError::NotAuthenticated)?;

        let retry = self.send(method, endpoint, payload, &token).await?;
        if retry.status == 401 {
            warn!(endpoint = endpoint, "Still unauthorized after token refresh");
            return Err(GraphError::NotAuthenticated);
        }
        Self::check_status(endpoint, retry)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self
            .authorized_request(HttpMethod::Get, endpoint, None)
            .await?;
        response.json().map_err(|e| GraphError::Malformed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    /// List one folder's immediate children, aggregating every page before
    /// returning — downstream tables sort the complete set. Returns an
    /// empty listing when not connected.
    #[instrument(skip(self))]
    pub async fn list_files(&self, folder: &FolderRef) -> Result<Vec<FileEntry>> {
        if !self.config.is_connected().await? {
            debug!("Not connected, returning empty listing");
            return Ok(Vec::new());
        }

        let mut endpoint = match folder {
            FolderRef::Root => "/me/drive/root/children".to_string(),
            FolderRef::Id(id) => format!("/me/drive/items/{}/children", id),
        };

        let mut items: Vec<DriveItem> = Vec::new();
        loop {
            let page: DriveItemList = self.get_json(&endpoint).await?;
            items.extend(page.value);
            match page.next_link {
                Some(next) => endpoint = next,
                None => break,
            }
        }

        debug!(count = items.len(), "Listed folder children");
        Ok(items.into_iter().map(FileEntry::from_item).collect())
    }

    /// Folders-only listing for dropdown population, capped at 50 entries.
    /// Paging stops at the cap even if more folders exist server-side.
    #[instrument(skip(self))]
    pub async fn list_folders(&self, parent: &FolderRef) -> Result<Vec<FolderSummary>> {
        if !self.config.is_connected().await? {
            return Ok(Vec::new());
        }

        let query = format!("?$filter=folder ne null&$top={}", MAX_FOLDERS);
        let mut endpoint = match parent {
            FolderRef::Root => format!("/me/drive/root/children{}", query),
            FolderRef::Id(id) => format!("/me/drive/items/{}/children{}", id, query),
        };

        let mut folders = Vec::new();
        loop {
            let page: DriveItemList = self.get_json(&endpoint).await?;
            for item in page.value {
                if item.folder.is_some() {
                    folders.push(FolderSummary {
                        id: item.id,
                        name: item.name,
                    });
                    if folders.len() >= MAX_FOLDERS {
                        return Ok(folders);
                    }
                }
            }
            match page.next_link {
                Some(next) => endpoint = next,
                None => break,
            }
        }

        Ok(folders)
    }

    /// Folder name, display path, and parent reference in one round trip.
    /// The root is answered locally without a network call.
    pub async fn folder_info(&self, folder: &FolderRef) -> Result<FolderInfo> {
        let FolderRef::Id(id) = folder else {
            return Ok(FolderInfo {
                name: "root".to_string(),
                path: String::new(),
                parent: None,
            });
        };

        let endpoint = format!("/me/drive/items/{}?$select=id,name,parentReference", id);
        let details: FolderDetails = self.get_json(&endpoint).await?;

        let parent_path = details
            .parent_reference
            .as_ref()
            .and_then(|p| p.path.as_deref());
        let path = display_path(parent_path, &details.name);

        let parent = match details.parent_reference.as_ref().and_then(|p| p.id.as_ref()) {
            Some(parent_id) if parent_path != Some(DRIVE_ROOT_PREFIX) => {
                Some(FolderRef::Id(parent_id.clone()))
            }
            // Parent is the root, or parent info is missing entirely
            _ => Some(FolderRef::Root),
        };

        Ok(FolderInfo {
            name: details.name,
            path,
            parent,
        })
    }

    /// Resolve a slash-delimited display path to a folder reference.
    ///
    /// Empty paths (after stripping the scheme marker and slashes) resolve
    /// to the root without a network call. A path that names a file
    /// resolves to the file's parent folder — a folder browser may be
    /// handed a stale file path.
    #[instrument(skip(self))]
    pub async fn folder_id_by_path(&self, path: &str) -> Result<FolderRef> {
        let cleaned = path.strip_prefix(URL_PREFIX).unwrap_or(path);
        let cleaned = cleaned.trim_matches('/');
        if cleaned.is_empty() {
            return Ok(FolderRef::Root);
        }

        let endpoint = format!(
            "/me/drive/root:/{}?$select=id,folder,parentReference",
            encode_path(cleaned)
        );

        let handle: ItemHandle = match self.get_json(&endpoint).await {
            Ok(handle) => handle,
            Err(GraphError::RequestFailed { status, .. }) => {
                return Err(GraphError::PathResolution(format!(
                    "no item at '{}' (HTTP {})",
                    cleaned, status
                )));
            }
            Err(other) => return Err(other),
        };

        if handle.folder.is_some() {
            return Ok(FolderRef::Id(handle.id));
        }

        match handle.parent_reference.and_then(|p| p.id) {
            Some(parent_id) => Ok(FolderRef::Id(parent_id)),
            None => Ok(FolderRef::Root),
        }
    }

    /// Resolve a stored reference — an opaque item id or a display path —
    /// to a short-lived signed download URL.
    ///
    /// References without a slash are tried as an item id first; if that
    /// misses and the reference looks like a bare filename, it is retried
    /// as a root-relative path. Earlier releases stored bare filenames, so
    /// the shim keeps those products downloadable.
    #[instrument(skip(self))]
    pub async fn download_url(&self, reference: &str) -> Result<String> {
        const SELECT: &str = "?$select=id,name,@microsoft.graph.downloadUrl";

        if reference.contains('/') {
            let path = reference.trim_matches('/');
            let endpoint = format!("/me/drive/root:/{}{}", encode_path(path), SELECT);
            let target: DownloadTarget = self.get_json(&endpoint).await?;
            return target.download_url.ok_or_else(|| {
                GraphError::PathResolution(format!("no download URL for '{}'", reference))
            });
        }

        let endpoint = format!("/me/drive/items/{}{}", reference, SELECT);
        match self.get_json::<DownloadTarget>(&endpoint).await {
            Ok(target) => {
                if let Some(url) = target.download_url {
                    return Ok(url);
                }
            }
            Err(GraphError::RequestFailed { .. }) | Err(GraphError::Malformed { .. }) => {}
            Err(other) => return Err(other),
        }

        if reference.contains('.') {
            let endpoint = format!(
                "/me/drive/root:/{}{}",
                utf8_percent_encode(reference, PATH_SEGMENT),
                SELECT
            );
            let target: DownloadTarget = self.get_json(&endpoint).await?;
            if let Some(url) = target.download_url {
                return Ok(url);
            }
        }

        Err(GraphError::PathResolution(format!(
            "could not resolve '{}' to a download URL",
            reference
        )))
    }

    fn upload_endpoint(folder: &FolderRef, filename: &str) -> String {
        let encoded = utf8_percent_encode(filename, PATH_SEGMENT);
        match folder {
            FolderRef::Root => format!("/me/drive/root:/{}:/content", encoded),
            FolderRef::Id(id) => format!("/me/drive/items/{}:/{}:/content", id, encoded),
        }
    }

    /// Upload in-memory content, overwriting any item with the same name.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload_file(
        &self,
        filename: &str,
        content: Bytes,
        folder: &FolderRef,
    ) -> Result<UploadedItem> {
        let endpoint = Self::upload_endpoint(folder, filename);
        self.finish_upload(&endpoint, HttpBody::Bytes(content)).await
    }

    /// Upload a file from disk, streaming the content so large products
    /// never sit in memory.
    #[instrument(skip(self, source))]
    pub async fn upload_file_stream(
        &self,
        filename: &str,
        source: &Path,
        folder: &FolderRef,
    ) -> Result<UploadedItem> {
        let endpoint = Self::upload_endpoint(folder, filename);
        self.finish_upload(&endpoint, HttpBody::File(source.to_path_buf()))
            .await
    }

    async fn finish_upload(&self, endpoint: &str, body: HttpBody) -> Result<UploadedItem> {
        let payload = Payload {
            body,
            content_type: "application/octet-stream",
        };
        let response = self
            .authorized_request(HttpMethod::Put, endpoint, Some(payload))
            .await?;

        let item: DriveItem = response.json().map_err(|e| GraphError::Malformed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        Ok(UploadedItem {
            id: item.id,
            name: item.name,
            parent_path: item.parent_reference.and_then(|p| p.path),
        })
    }

    /// Profile of the connected Microsoft account.
    pub async fn account_info(&self) -> Result<AccountInfo> {
        let account: AccountDto = self.get_json("/me").await?;
        Ok(AccountInfo {
            id: account.id,
            display_name: account.display_name,
            user_principal_name: account.user_principal_name,
        })
    }
}

/// Percent-encode each segment individually; the API parses the literal
/// slashes between them.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
