use thiserror::Error;

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Contact,
    Room,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Contact => "contact",
            Self::Room => "room",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The backend refused or failed a directory refresh. The previous
    /// cache contents are left untouched.
    #[error("directory fetch failed: {source}")]
    DirectoryFetch {
        #[source]
        source: courier_backends::Error,
    },

    /// A member-list fetch for one room failed; that room's prior cache is
    /// left untouched.
    #[error("member fetch for room {room_id} failed: {source}")]
    MemberFetch {
        room_id: String,
        #[source]
        source: courier_backends::Error,
    },

    /// The name matched nothing, even after a forced refresh.
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },
}

impl Error {
    #[must_use]
    pub fn directory_fetch(source: courier_backends::Error) -> Self {
        Self::DirectoryFetch { source }
    }

    #[must_use]
    pub fn member_fetch(room_id: impl Into<String>, source: courier_backends::Error) -> Self {
        Self::MemberFetch {
            room_id: room_id.into(),
            source,
        }
    }

    #[must_use]
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
