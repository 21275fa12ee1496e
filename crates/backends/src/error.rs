use thiserror::Error;

use crate::backend::Profile;

#[derive(Debug, Error)]
pub enum Error {
    /// The active profile does not implement this operation.
    #[error("operation not supported on {profile} profile: {operation}")]
    Unsupported {
        profile: Profile,
        operation: &'static str,
    },

    /// The backend answered with a non-success application status.
    #[error("backend returned status {ret}: {msg}")]
    Status { ret: i64, msg: String },

    /// A room id the adapter has never observed (search profile keeps
    /// member snapshots only for rooms it has looked up by title).
    #[error("room {room_id} is unknown to this backend")]
    UnknownRoom { room_id: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Media download for a local-file upload failed.
    #[error(transparent)]
    Media(#[from] courier_media::Error),
}

impl Error {
    #[must_use]
    pub fn unsupported(profile: Profile, operation: &'static str) -> Self {
        Self::Unsupported { profile, operation }
    }

    #[must_use]
    pub fn status(ret: i64, msg: impl Into<String>) -> Self {
        Self::Status {
            ret,
            msg: msg.into(),
        }
    }

    #[must_use]
    pub fn unknown_room(room_id: impl Into<String>) -> Self {
        Self::UnknownRoom {
            room_id: room_id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
