use thiserror::Error;

/// Failure of one turn. Reported through the transport's error hook; the
/// user gets no reply for a failed turn.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Completion(#[from] parley_providers::Error),

    #[error(transparent)]
    Extraction(#[from] parley_media::Error),

    #[error(transparent)]
    Channel(#[from] parley_channels::Error),

    #[error(transparent)]
    History(#[from] parley_sessions::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl std::fmt::Display) -> Self {
        Self::Message {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
