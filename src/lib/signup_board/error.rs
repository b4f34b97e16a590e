use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("request to the activities API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid API url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to read configuration: {0}")]
    Config(#[from] figment::Error),
}

impl BoardError {
    pub fn invalid_url(url: impl ToString, reason: impl ToString) -> Self {
        BoardError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
