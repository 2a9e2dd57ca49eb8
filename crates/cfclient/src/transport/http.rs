//! Blocking HTTP transport built on `ureq`.

use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use ureq::http;

/// Transport backed by a shared `ureq` agent.
///
/// Non-2xx statuses are returned as regular responses so the client can
/// report the body verbatim. No retries, no timeouts beyond the agent
/// defaults.
pub struct UreqTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport with a default agent.
    #[must_use]
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let sent = if request.body.is_empty() {
            let req = builder
                .body(())
                .map_err(|e| Error::InvalidRequest(e.to_string()))?;
            self.agent.run(req)
        } else {
            let req = builder
                .body(request.body.as_slice())
                .map_err(|e| Error::InvalidRequest(e.to_string()))?;
            self.agent.run(req)
        };

        let mut response = sent.map_err(|e| Error::network(&request.url, e.to_string()))?;
        let status = response.status();

        let body = response.body_mut().read_to_vec().map_err(|e| {
            Error::network(
                &request.url,
                format!("failed to read body {}: {e}", status.as_u16()),
            )
        })?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
