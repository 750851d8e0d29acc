use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrasilApiError>;

#[derive(Debug, Error)]
pub enum BrasilApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BrasilApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BrasilApiError::Timeout(err.to_string())
        } else {
            BrasilApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BrasilApiError {
    fn from(err: serde_json::Error) -> Self {
        BrasilApiError::Parse(err.to_string())
    }
}
