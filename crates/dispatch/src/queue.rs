use std::{path::PathBuf, sync::Arc};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    dispatcher::Dispatcher,
    error::{Error, Result},
    request::{Origin, SendRequest, normalize_receivers},
};

/// One entry of the on-disk send queue.
///
/// Producers may write `receiver_name` and `group_name` as either a single
/// string or an array of strings; both forms deserialize to a list. An
/// empty string means "not set".
#[derive(Debug, Clone, Deserialize)]
pub struct QueuedMessage {
    #[serde(default, deserialize_with = "string_or_seq")]
    pub receiver_name: Vec<String>,
    pub message: String,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub group_name: Vec<String>,
}

impl QueuedMessage {
    #[must_use]
    pub fn into_request(self) -> SendRequest {
        SendRequest {
            receivers: normalize_receivers(self.receiver_name),
            groups: self.group_name,
            body: self.message,
            origin: Origin::Queue,
        }
    }
}

fn string_or_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(items) => items,
    })
}

/// Reads the queue file, truncates it, and dispatches every entry.
///
/// Drains are serialized through the shared dispatcher lock, so a watcher
/// trigger and a manual drain never interleave.
pub struct QueueDrainer {
    path: PathBuf,
    dispatcher: Arc<Mutex<Dispatcher>>,
}

impl QueueDrainer {
    #[must_use]
    pub fn new(path: PathBuf, dispatcher: Arc<Mutex<Dispatcher>>) -> Self {
        Self { path, dispatcher }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Drains the queue file once. Returns the number of entries that
    /// were dispatched without error.
    ///
    /// A missing or empty file is a no-op. An unparseable file is logged
    /// and left untouched so the producer can inspect it.
    pub async fn drain(&self) -> Result<usize> {
        let mut dispatcher = self.dispatcher.lock().await;

        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Error::queue("reading queue file", e)),
        };
        if raw.trim().is_empty() {
            return Ok(0);
        }

        let entries: Vec<QueuedMessage> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "queue file is not valid, leaving it in place");
                return Ok(0);
            },
        };

        // Claim the batch before processing so a send failure never
        // replays earlier entries.
        tokio::fs::write(&self.path, "")
            .await
            .map_err(|e| Error::queue("truncating queue file", e))?;
        debug!(path = %self.path.display(), entries = entries.len(), "draining queue");

        let mut sent = 0;
        for entry in entries {
            let request = entry.into_request();
            match dispatcher.dispatch(&request).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    error!(error = %e, "queued message failed, continuing with the rest");
                },
            }
        }
        info!(sent, "queue drained");
        Ok(sent)
    }
}
