//! Directory cache and name resolution.
//!
//! [`DirectoryCache`] keeps independently-timestamped snapshots of the
//! backend directory (all entries, rooms only, friends only, and one
//! member list per room). [`Resolver`] turns names into platform ids over
//! those snapshots, with a single forced refresh on miss. Backend calls
//! are bounded to two per lookup while tolerating staleness from
//! directory changes made elsewhere.

pub mod cache;
pub mod error;
pub mod resolver;
pub mod slot;

pub use {
    cache::{DEFAULT_EXPIRY, DirectoryCache},
    error::{EntityKind, Error, Result},
    resolver::Resolver,
    slot::CacheSlot,
};
