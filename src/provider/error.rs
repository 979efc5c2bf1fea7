//! Error types shared by the polling providers.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`ProviderError`] failures.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures that can occur while looking up server state.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build provider client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or timed out.
    #[error("failed to send provider request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The provider answered with an unexpected status code.
    #[error("unexpected provider response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be decoded.
    #[error("failed to decode provider response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The provider does not know the requested server.
    #[error("server `{address}` not found")]
    NotFound { address: String },
    /// A bulk listing failed, failing every lookup that depended on it.
    #[error("server listing failed: {reason}")]
    Listing { reason: String },
}
