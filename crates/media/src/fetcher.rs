use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Name used when the URL path carries no usable basename.
const FALLBACK_FILE_NAME: &str = "download.bin";

/// Downloads remote media to a local directory.
///
/// One GET per fetch, no retry: a transport error or non-success status is
/// reported as [`Error::Download`] and nothing is written.
pub struct MediaFetcher {
    http: reqwest::Client,
    download_dir: PathBuf,
}

impl MediaFetcher {
    #[must_use]
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            download_dir: download_dir.into(),
        }
    }

    /// Fetch `url` into the download directory, named after the URL's
    /// basename. The returned guard deletes the file when dropped.
    pub async fn fetch(&self, url: &str) -> Result<TempDownload> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::download(url, e))?;
        if !resp.status().is_success() {
            return Err(Error::download(url, format!("status {}", resp.status())));
        }
        let bytes = resp.bytes().await.map_err(|e| Error::download(url, e))?;

        let path = self.download_dir.join(file_name_from_url(url));
        tokio::fs::write(&path, &bytes).await?;
        debug!(url, path = %path.display(), bytes = bytes.len(), "media downloaded");
        Ok(TempDownload { path })
    }
}

/// Basename of the URL path, with query and fragment stripped.
#[must_use]
pub fn file_name_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_owned))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_owned())
}

/// A downloaded file that is removed when the guard is dropped.
#[derive(Debug)]
pub struct TempDownload {
    path: PathBuf,
}

impl TempDownload {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDownload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove downloaded media");
        }
    }
}
