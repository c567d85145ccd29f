//! Error types for the API client.

use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The service rejected the credentials. The session has already
    /// been cleared; the caller must force re-authentication and must
    /// not retry the request automatically.
    #[error("authentication expired")]
    AuthExpired,

    /// The service answered with a non-success status or a false
    /// success flag. The message comes from the response body when it
    /// carries one.
    #[error("request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    /// No response arrived at all; a transient condition the caller may
    /// surface as such.
    #[error("network unavailable: {0}")]
    TransportUnavailable(String),

    /// The response body did not parse as the expected envelope.
    /// Distinct from transport and status failures.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An audio upload failed; all upload failure axes are folded into
    /// this one so workflows branch only on success/failure.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// The local store rejected a read or write.
    #[error("local store error: {0}")]
    Store(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if re-authentication is required.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Error::AuthExpired)
    }

    /// Returns true for transient network-level failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TransportUnavailable(_))
    }
}

impl From<voxid_store::StoreError> for Error {
    fn from(e: voxid_store::StoreError) -> Self {
        Error::Store(e.to_string())
    }
}
