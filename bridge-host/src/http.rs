//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Total request deadline applied to every call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect-phase deadline, shorter than the total so a dead host fails fast.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reqwest-based HTTP client implementation
///
/// Performs exactly one attempt per call. Timeouts and connection failures
/// surface as errors; non-2xx statuses are returned to the caller, which
/// owns the (single) re-authentication retry.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with the default timeouts
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a custom total timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent("onedrive-storage/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Wrap an already-configured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    async fn build_request(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder> {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        match request.body {
            Some(HttpBody::Bytes(bytes)) => {
                req = req.body(bytes);
            }
            Some(HttpBody::File(path)) => {
                // Stream the file instead of reading it into memory.
                let file = tokio::fs::File::open(&path).await.map_err(BridgeError::Io)?;
                let stream = tokio_util::io::ReaderStream::new(file);
                req = req.body(reqwest::Body::wrap_stream(stream));
            }
            None => {}
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        Ok(req)
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        debug!(url = %url, "Executing HTTP request");

        let req = self.build_request(request).await?;

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::Timeout(url.clone())
            } else if e.is_connect() {
                BridgeError::OperationFailed(format!("Connection failed: {}", e))
            } else {
                BridgeError::OperationFailed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        debug!(url = %url, status = status, "HTTP request completed");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
