//! OAuth2 grants against the Microsoft identity platform.
//!
//! Authorization-code and refresh-token flows for a confidential client
//! (client id + secret; the redirect-handling caller owns the CSRF state
//! parameter). Expected failures — a bad or expired code, a revoked
//! refresh token — come back as typed error values, because they are
//! normal outcomes of the flow, not bugs.

use crate::error::{GraphError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use serde::Deserialize;
use std::fmt;
use tracing::debug;
use url::form_urlencoded;

/// Consumers-tenant endpoints (personal Microsoft accounts).
pub const AUTH_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/authorize";
pub const TOKEN_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";

/// Delegated permission set: file read/write, offline_access for the
/// refresh token, and the basic profile.
pub const SCOPES: &str =
    "Files.Read Files.ReadWrite Files.Read.All Files.ReadWrite.All offline_access User.Read";

/// Token set granted by the token endpoint.
///
/// `refresh_token` is empty when the response did not rotate it; the store
/// treats empty as "keep the previous one".
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

// Token values never appear in logs.
impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    error: Option<String>,
    error_description: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Build the authorization URL the operator is sent to.
///
/// The caller appends its own `state` parameter before redirecting.
pub fn build_authorization_url(client_id: &str, redirect_uri: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", SCOPES)
        .append_pair("response_mode", "query")
        .finish();

    format!("{}?{}", AUTH_URL, query)
}

/// Exchange an authorization code for a token set.
pub(crate) async fn exchange_code(
    http: &dyn HttpClient,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenGrant> {
    let params = [
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("scope", SCOPES),
    ];

    debug!("Exchanging authorization code for tokens");
    request_grant(http, &params)
        .await
        .map_err(GraphError::TokenExchangeFailed)
}

/// Obtain a fresh access token from a refresh token.
pub(crate) async fn refresh_grant(
    http: &dyn HttpClient,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenGrant> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("scope", SCOPES),
    ];

    debug!("Refreshing access token");
    request_grant(http, &params)
        .await
        .map_err(GraphError::TokenRefreshFailed)
}

async fn request_grant(
    http: &dyn HttpClient,
    params: &[(&str, &str)],
) -> std::result::Result<TokenGrant, String> {
    let body = serde_urlencoded::to_string(params)
        .map_err(|e| format!("failed to encode token request: {}", e))?;

    let request = HttpRequest::new(HttpMethod::Post, TOKEN_URL)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Bytes::from(body));

    let response = http
        .execute(request)
        .await
        .map_err(|e| format!("token endpoint unreachable: {}", e))?;

    if response.status != 200 {
        return Err(format!("token endpoint returned HTTP {}", response.status));
    }

    let payload: TokenResponse = response
        .json()
        .map_err(|e| format!("failed to parse token response: {}", e))?;

    if let Some(error) = payload.error {
        return Err(format!(
            "{}: {}",
            error,
            payload.error_description.unwrap_or_default()
        ));
    }

    let access_token = payload
        .access_token
        .ok_or_else(|| "missing access_token in response".to_string())?;

    Ok(TokenGrant {
        access_token,
        refresh_token: payload.refresh_token.unwrap_or_default(),
        expires_in: payload.expires_in,
    })
}
