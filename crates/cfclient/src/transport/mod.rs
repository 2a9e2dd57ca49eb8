//! Transport seam between the client and the network.
//!
//! The [`Transport`] trait performs one fully buffered HTTP exchange. The
//! primary implementation is [`http::UreqTransport`]; [`MockTransport`] serves
//! canned responses from memory and records every request it sees.
//!
//! # Testing
//!
//! ```
//! use cfclient::transport::{Method, MockTransport};
//! use cfclient::{Client, ClientConfig, RequestOptions};
//!
//! let mock = MockTransport::new();
//! mock.respond(Method::Get, "/projects/p1", 200, r#"{"id":"p1"}"#);
//!
//! let client = Client::with_transport(
//!     ClientConfig::new("http://mock", "token"),
//!     Box::new(mock.clone()),
//! );
//! let body = client.execute(&RequestOptions::get("/projects/p1")).unwrap();
//! assert_eq!(body, br#"{"id":"p1"}"#);
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod http;

use crate::error::Result;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// HTTP methods used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The path part of the URL, without scheme, host or query string.
    #[must_use]
    pub fn path(&self) -> &str {
        request_path(&self.url)
    }

    /// The query string without the leading `?`, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, q)| q)
    }
}

// Authorization carries the raw token; keep it out of logs and panics.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase, e.g. `Not Found`. May be empty.
    pub reason: String,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with the canonical reason phrase for `status`.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: canonical_reason(status).to_string(),
            body: body.into(),
        }
    }

    /// Status line as printed in errors, e.g. `404 Not Found`.
    #[must_use]
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }
}

/// Transport trait for executing requests.
///
/// Implementations perform a single blocking exchange and return whatever
/// status the server produced. Status interpretation belongs to the client.
pub trait Transport: Send + Sync {
    /// Send a request and buffer the whole response.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` when no HTTP response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Mock transport for testing without network access.
///
/// Routes are matched on method and path. A route with several queued
/// responses hands them out in order; the last one is repeated. Unmatched
/// requests get a 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<Vec<MockRoute>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

#[derive(Debug)]
struct MockRoute {
    method: Method,
    path: String,
    responses: VecDeque<HttpResponse>,
}

impl MockTransport {
    /// Create a new mock with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method` and `path`.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        let response = HttpResponse::new(status, body);
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            route.responses.push_back(response);
        } else {
            routes.push(MockRoute {
                method,
                path: path.to_string(),
                responses: VecDeque::from([response]),
            });
        }
    }

    /// Every request seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests sent with `method`.
    #[must_use]
    pub fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    /// Methods of every request seen so far, in order.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| r.method)
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let path = request.path();
        let route = routes
            .iter_mut()
            .find(|r| r.method == request.method && r.path == path);

        let response = match route {
            Some(route) if route.responses.len() > 1 => route.responses.pop_front(),
            Some(route) => route.responses.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| {
            HttpResponse::new(404, format!(r#"{{"message":"no mock for {path}"}}"#))
        }))
    }
}

/// Strip scheme, authority and query from a URL.
fn request_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or("", |idx| &without_scheme[idx..]);
    path.split_once('?').map_or(path, |(p, _)| p)
}

/// Reason phrases for the statuses the API is known to return.
pub(crate) fn canonical_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}
