use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error body
    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// The server's response could not be decoded
    #[error("Unreadable response (HTTP {status}): {message}")]
    Parse { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Not logged in")]
    NotAuthenticated,
}

impl ClientError {
    /// True for a 401: the session's token is missing, expired or rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    /// Build from a non-success response body
    pub(crate) fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
            #[serde(default)]
            code: Option<String>,
        }

        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(err) => ClientError::Api {
                status: status.as_u16(),
                message: err.message,
                code: err.code,
            },
            Err(e) => ClientError::Parse {
                status: status.as_u16(),
                message: e.to_string(),
            },
        }
    }
}
