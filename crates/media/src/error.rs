use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP GET failed or returned a non-success status.
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn download(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
