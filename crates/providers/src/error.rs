use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown model alias: {alias}")]
    UnknownModel { alias: String },

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API error HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed completion response: {message}")]
    MalformedResponse { message: String },
}

impl Error {
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
