//! The request executor shared by every endpoint.

use crate::error::{Error, Result};
use crate::transport::http::UreqTransport;
use crate::transport::{HttpRequest, Method, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

/// Public API endpoint used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://g.codefresh.io/api";

/// Content type sent with every request.
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Connection settings for a [`Client`].
///
/// Built once at the program entry point; nothing below it reads the
/// environment.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://g.codefresh.io/api`. Paths are appended as-is.
    pub api_url: String,
    /// API token, sent verbatim in `Authorization`.
    pub token: String,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Options for a single API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub path: String,
    pub method: Method,
    pub body: Vec<u8>,
    /// Query parameters; values must already be URL-safe.
    pub query: Option<BTreeMap<String, String>>,
}

impl RequestOptions {
    /// Build options for `method` on `path` with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: Vec::new(),
            query: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a raw body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Attach a JSON-encoded body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.body(encode_json(value)?))
    }

    /// Add a query parameter. Later values for the same key win.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Client for the Codefresh REST API.
///
/// The client holds no per-call state; share it behind an `Arc` when several
/// owners need it.
///
/// # Example
///
/// ```no_run
/// use cfclient::{Client, ClientConfig, RequestOptions};
///
/// let client = Client::new(ClientConfig::new(cfclient::DEFAULT_API_URL, "token"));
/// let bytes = client.execute(&RequestOptions::get("/user")).unwrap();
/// println!("{}", String::from_utf8_lossy(&bytes));
/// ```
pub struct Client {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl Client {
    /// Create a client using the blocking `ureq` transport.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Box::new(UreqTransport::new()))
    }

    /// Create a client with a custom transport (for testing).
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Box<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Get the configured API URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Build the full URL for a request.
    fn url(&self, options: &RequestOptions) -> String {
        let mut url = format!("{}{}", self.config.api_url, options.path);
        if let Some(query) = &options.query
            && !query.is_empty()
        {
            url.push_str(&to_query_string(query));
        }
        url
    }

    /// Execute a request and return the raw response body.
    ///
    /// # Errors
    ///
    /// `Error::Network` when no response was received, `Error::Status` for
    /// any status other than 200.
    pub fn execute(&self, options: &RequestOptions) -> Result<Vec<u8>> {
        let request = HttpRequest {
            method: options.method,
            url: self.url(options),
            headers: vec![
                ("Authorization".to_string(), self.config.token.clone()),
                ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
            ],
            body: options.body.clone(),
        };

        log::debug!("{} {}", request.method, request.url);
        let response = self.transport.send(&request)?;

        if response.status != 200 {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            log::debug!(
                "{} {} -> {}",
                request.method,
                request.url,
                response.status_line()
            );
            return Err(Error::status(response.status, &response.reason, body));
        }

        Ok(response.body)
    }

    /// Execute a request and decode the JSON response into `T`.
    pub fn execute_json<T: DeserializeOwned>(&self, options: &RequestOptions) -> Result<T> {
        let body = self.execute(options)?;
        decode_json(&body)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Render query parameters as `?k=v&k2=v2`.
///
/// Values are not percent-encoded.
pub fn to_query_string(query: &BTreeMap<String, String>) -> String {
    let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("?{}", pairs.join("&"))
}

/// Serialize a value to JSON bytes.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
}

/// Deserialize JSON bytes into `T`.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()))
}
