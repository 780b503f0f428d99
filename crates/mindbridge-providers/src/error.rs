//! Adapter-level error taxonomy.
//!
//! Every variant is recovered at the adapter boundary and converted to
//! a `Failure` outcome; nothing here escapes an adapter's public
//! operation.

use thiserror::Error;

/// What went wrong during one vendor call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP call itself failed (connect, DNS, TLS, timeout).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status. The message is extracted best-effort from
    /// the vendor's error body, falling back to the raw body text.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The call succeeded but no usable text was present.
    #[error("{0}")]
    NoContent(String),

    /// A 2xx body that could not be decoded as the vendor shape.
    #[error("failed to parse {vendor} response: {detail}")]
    InvalidResponse {
        vendor: &'static str,
        detail: String,
    },
}

impl ProviderError {
    /// Build an `Api` error from a status and body, preferring the
    /// vendor-extracted message, then the raw body, then a generic
    /// status line.
    pub fn from_status(status: u16, body: &str, extracted: Option<String>) -> Self {
        let message = extracted
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("request failed with status {status}"));
        ProviderError::Api { status, message }
    }
}
