use {std::error::Error as StdError, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    /// The body is a URL with a suffix no backend can deliver.
    #[error("unsupported media type: {url}")]
    UnsupportedMedia { url: String },

    /// The request cannot be dispatched as given.
    #[error("invalid send request: {message}")]
    InvalidRequest { message: String },

    #[error(transparent)]
    Resolve(#[from] courier_directory::Error),

    #[error(transparent)]
    Backend(#[from] courier_backends::Error),

    /// Queue file or watcher failure.
    #[error("{context}: {source}")]
    Queue {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn unsupported_media(url: impl Into<String>) -> Self {
        Self::UnsupportedMedia { url: url.into() }
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn queue(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Queue {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
