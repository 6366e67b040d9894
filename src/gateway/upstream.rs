//! Upstream endpoint descriptors and the per-attempt error type.

use std::time::Duration;

/// Errors that can occur when talking to a single upstream endpoint
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request did not complete within the endpoint's timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection, DNS or TLS failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Parsing error (JSON, XML, HTML, base64)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response parsed but the upstream reported a failure in its payload
    #[error("Rejected by upstream: {0}")]
    Rejected(String),
}

impl SourceError {
    /// Build a status error, keeping only the head of the response body
    pub fn status(status: u16, body: &str) -> Self {
        SourceError::Status {
            status,
            body: truncate_chars(body.trim(), 200),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        SourceError::Rejected(reason.into())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::status(status.as_u16(), &err.to_string())
        } else {
            SourceError::Network(error_chain(&err))
        }
    }
}

/// Display an error followed by each of its causes, joined with `: `
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        cause = inner.source();
    }
    message
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

impl From<base64::DecodeError> for SourceError {
    fn from(err: base64::DecodeError) -> Self {
        SourceError::Parse(format!("base64: {}", err))
    }
}

/// Pass a response through when its status is 2xx, otherwise turn it into
/// [`SourceError::Status`] carrying the start of the body.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::status(status.as_u16(), &body))
}

/// One upstream endpoint able to answer a domain request.
///
/// `P` selects how the endpoint's response is parsed; each domain uses a
/// small `Copy` enum for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSource<P> {
    id: String,
    base_url: String,
    timeout: Duration,
    parser: P,
}

impl<P: Copy> UpstreamSource<P> {
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        parser: P,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            id: id.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            parser,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn parser(&self) -> P {
        self.parser
    }

    /// Join a path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
