//! Client-side error types.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status; `message` is its stated reason.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Post {0} is not on the wall")]
    UnknownPost(Uuid),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Wall client has shut down")]
    Closed,
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}
