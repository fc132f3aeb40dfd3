//! Closed error taxonomy shared across every `autoreply` crate.
//!
//! Every fallible operation in the core returns [`Result<T>`]. Kinds are
//! fixed (§7): the tool boundary maps each one to a stable JSON-RPC error
//! code, so new variants must not be added without updating that mapping
//! in the host that owns the transport.

/// The closed set of error kinds produced by the autoreply core.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("DID resolution failed: {0}")]
    DidResolveFailed(String),

    #[error("repository fetch failed: {0}")]
    RepoFetchFailed(String),

    #[error("repository parse failed: {0}")]
    RepoParseFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable string tag for each kind, used by the tool boundary to map
    /// onto JSON-RPC error codes without matching on the `Display` text.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "InvalidInput",
            Error::DidResolveFailed(_) => "DIDResolveFailed",
            Error::RepoFetchFailed(_) => "RepoFetchFailed",
            Error::RepoParseFailed(_) => "RepoParseFailed",
            Error::NotFound(_) => "NotFound",
            Error::Timeout(_) => "Timeout",
            Error::CacheError(_) => "CacheError",
            Error::Authentication(_) => "Authentication",
            Error::Internal(_) => "InternalError",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::CacheError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("json: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(Error::InvalidInput("x".into()).kind(), "InvalidInput");
        assert_eq!(Error::DidResolveFailed("x".into()).kind(), "DIDResolveFailed");
        assert_eq!(Error::RepoFetchFailed("x".into()).kind(), "RepoFetchFailed");
        assert_eq!(Error::RepoParseFailed("x".into()).kind(), "RepoParseFailed");
        assert_eq!(Error::NotFound("x".into()).kind(), "NotFound");
        assert_eq!(Error::Timeout("x".into()).kind(), "Timeout");
        assert_eq!(Error::CacheError("x".into()).kind(), "CacheError");
        assert_eq!(Error::Authentication("x".into()).kind(), "Authentication");
        assert_eq!(Error::Internal("x".into()).kind(), "InternalError");
    }

    #[test]
    fn io_error_maps_to_cache_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), "CacheError");
    }
}
