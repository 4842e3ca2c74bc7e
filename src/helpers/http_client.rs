use std::fmt;
use std::io::Read;
use std::time::Duration;
use log::{debug, error};
use thiserror::Error;

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default upper bound for a single response body (album art included)
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Error types that can occur when interacting with HTTP clients
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("HTTP request error: {0}")]
    RequestError(String),

    #[error("Server returned HTTP status {code}")]
    Status { code: u16 },

    #[error("Failed to read response body: {0}")]
    BodyRead(String),
}

/// HTTP methods supported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read request, never carries a body
    Get,
    /// Create/submit request, carries the payload as body
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// A trait for HTTP client implementations
/// This version avoids generic methods to enable dynamic dispatch
pub trait HttpClient: Send + Sync + fmt::Debug {
    /// Send a request and read the whole response body
    ///
    /// `body` is only sent for `HttpMethod::Post`.
    fn request(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, HttpClientError>;

    /// Clone the client as a boxed trait object
    fn clone_box(&self) -> Box<dyn HttpClient>;
}

impl Clone for Box<dyn HttpClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// An HTTP client implementation using ureq
#[derive(Clone, Debug)]
pub struct UreqHttpClient {
    agent: ureq::Agent,
    timeout: Duration,
    max_body_bytes: u64,
}

impl UreqHttpClient {
    /// Create a new HTTP client with the specified timeout
    pub fn new(timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs);
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            timeout,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    /// Refuse response bodies larger than `max_body_bytes`
    pub fn with_max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for UreqHttpClient {
    /// Create a new HTTP client with default timeout (5 seconds)
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl HttpClient for UreqHttpClient {
    fn request(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, HttpClientError> {
        debug!("{} request to {}", method, url);

        let mut request = self.agent.request(method.as_str(), url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let result = match (method, body) {
            (HttpMethod::Post, Some(payload)) => request.send_bytes(payload),
            _ => request.call(),
        };

        let response = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => {
                error!("{} request to {} failed with status {}", method, url, code);
                return Err(HttpClientError::Status { code });
            }
            Err(e) => {
                error!("{} request failed: {}", method, e);
                return Err(HttpClientError::RequestError(e.to_string()));
            }
        };

        let status = response.status();
        let content_type = response.header("Content-Type").map(str::to_string);

        // The reader owns the connection and is dropped at the end of this scope.
        // Reading one byte past the limit separates an oversized body from one
        // that fits exactly.
        let mut reader = response
            .into_reader()
            .take(self.max_body_bytes.saturating_add(1));
        let mut bytes = Vec::new();
        if let Err(e) = reader.read_to_end(&mut bytes) {
            error!("Failed to read response body: {}", e);
            return Err(HttpClientError::BodyRead(e.to_string()));
        }
        if bytes.len() as u64 > self.max_body_bytes {
            error!("Response body from {} exceeds {} bytes", url, self.max_body_bytes);
            return Err(HttpClientError::BodyRead(format!(
                "response body exceeds {} bytes",
                self.max_body_bytes
            )));
        }

        debug!("Read {} bytes from {}", bytes.len(), url);

        Ok(HttpResponse {
            status,
            content_type,
            body: bytes,
        })
    }

    fn clone_box(&self) -> Box<dyn HttpClient> {
        Box::new(self.clone())
    }
}

/// Create a new HTTP client using the default implementation
pub fn new_http_client(timeout_secs: u64) -> Box<dyn HttpClient> {
    Box::new(UreqHttpClient::new(timeout_secs))
}
