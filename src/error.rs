//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for groups, peers and the HTTP transport.
///
/// Every variant carries an owned message so a single outcome can be cloned
/// out to all waiters of an in-flight load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key or malformed request path
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Group not registered on this node
    #[error("{0}")]
    NotFound(String),

    /// The loader failed; displayed verbatim
    #[error("{0}")]
    Load(String),

    /// Remote peer could not serve the key
    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    /// Programmer or deployment mistake
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// HTTP status used when the error crosses the transport boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::PeerUnavailable(_) => StatusCode::BAD_GATEWAY,
            CacheError::Load(_) | CacheError::Configuration(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
