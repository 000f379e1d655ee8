use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: StatusCode },

    #[error("Malformed payload from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Credential exchange failed: {0}")]
    Auth(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Fatal errors must reach the caller instead of being downgraded to a neutral value.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Auth(_))
    }
}
