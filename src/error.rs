/// Errors that might occur when using the library.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The remote API answered with a non-success status code.
    #[error("API error: status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The remote API answered with a success status but reported a failure in the body (Slack
    /// and Telegram `ok: false`, Facebook `error` objects).
    #[error("{platform} API error: {message}")]
    Platform {
        /// Which platform reported the error.
        platform: &'static str,
        /// The error message from the response body.
        message: String,
    },

    /// A credential needed for this call was not configured on the client.
    #[error("missing credentials: {0} is required")]
    MissingCredentials(&'static str),

    /// The response decoded, but a field this call depends on was absent.
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),

    /// Server-side media processing finished with an `ERROR` status. Contains the status body.
    #[error("media processing failed: {0}")]
    MediaProcessing(String),

    /// Media processing did not reach a terminal status within the polling budget.
    #[error("media processing timed out after {attempts} attempts")]
    MediaProcessingTimeout {
        /// How many status checks were made.
        attempts: u32,
    },

    /// Attempted to publish a carousel with no items.
    #[error("carousel has no media")]
    EmptyCarousel,

    /// Attempted to start an automated poster with nothing to post.
    #[error("no content to post")]
    EmptyContent,

    /// A required argument was empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// The requested resource does not exist.
    #[error("not found")]
    NotFound,

    /// The media type is not supported by this endpoint.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Google rejected an ID token.
    #[error("invalid ID token")]
    InvalidIdToken,

    /// An error while encoding or decoding JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An HTTP client error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl Error {
    /// The HTTP status code, if this error came from a non-success response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
