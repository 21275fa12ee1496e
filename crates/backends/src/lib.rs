//! Backend profile adapters.
//!
//! Three incompatible messaging-platform client APIs are normalized behind
//! the [`Backend`] trait: a bulk-directory profile, a search-based profile,
//! and a direct-id profile. The dispatcher and resolver code against the
//! trait only; each adapter owns its profile's wire shape (mention
//! rendering, pagination, local-file media upload).

pub mod backend;
pub mod bulk;
pub mod direct;
pub mod error;
pub mod http;
pub mod rpc;
pub mod search;
pub mod types;

pub use {
    backend::{Backend, Profile},
    bulk::BulkBackend,
    direct::DirectBackend,
    error::{Error, Result},
    search::SearchBackend,
    types::{ContactEntry, Directory, MediaKind, Mention, OutboundMessage, RoomEntry, RoomMember},
};
