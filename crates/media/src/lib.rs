//! Remote media retrieval for backends that upload from a local file.
//!
//! Some backend profiles accept a media URL as-is; the others need the
//! resource on disk before sending. `MediaFetcher` performs the download
//! and hands back a [`TempDownload`] guard that removes the file when it
//! goes out of scope, so cleanup happens on every exit path including a
//! failed send.

pub mod error;
pub mod fetcher;

pub use {
    error::{Error, Result},
    fetcher::{MediaFetcher, TempDownload, file_name_from_url},
};
