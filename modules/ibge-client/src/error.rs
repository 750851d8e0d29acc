use thiserror::Error;

pub type Result<T> = std::result::Result<T, IbgeError>;

#[derive(Debug, Error)]
pub enum IbgeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for IbgeError {
    fn from(err: reqwest::Error) -> Self {
        IbgeError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for IbgeError {
    fn from(err: serde_json::Error) -> Self {
        IbgeError::Parse(err.to_string())
    }
}
