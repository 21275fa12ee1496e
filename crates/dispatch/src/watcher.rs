//! Filesystem watcher for the send queue.
//!
//! Watches the queue file's directory for create/modify events and triggers
//! a drain through a channel, so producers only have to write the file.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    notify_debouncer_full::{
        DebounceEventResult, Debouncer, RecommendedCache, new_debouncer, notify::RecursiveMode,
    },
    tokio::sync::mpsc,
    tracing::{debug, error, info, warn},
};

use crate::{
    error::{Error, Result},
    queue::QueueDrainer,
};

const DEBOUNCE: std::time::Duration = std::time::Duration::from_millis(500);

struct WatchState {
    // Dropping the debouncer stops the underlying notify watcher.
    _debouncer: Debouncer<notify_debouncer_full::notify::RecommendedWatcher, RecommendedCache>,
    drain_task: tokio::task::JoinHandle<()>,
}

/// Debounced watcher that drains the queue whenever its file changes.
///
/// Start and stop are idempotent so the operator commands can be repeated
/// without error. The drain itself goes through [`QueueDrainer`], which
/// serializes against manual drains. Stopping never cancels a drain: a
/// batch claimed from the queue file is always processed to completion.
pub struct QueueWatcher {
    drainer: Arc<QueueDrainer>,
    state: Option<WatchState>,
}

impl QueueWatcher {
    #[must_use]
    pub fn new(drainer: Arc<QueueDrainer>) -> Self {
        Self {
            drainer,
            state: None,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    /// Start watching. Returns `false` if the watcher was already running.
    pub fn start(&mut self) -> Result<bool> {
        if self.state.is_some() {
            info!("queue watcher already running");
            return Ok(false);
        }

        let path = self.drainer.path().to_path_buf();
        let dir = watch_dir(&path);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_owned();

        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let mut debouncer = new_debouncer(
            DEBOUNCE,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    let mut changed = false;
                    for event in events {
                        for path in &event.paths {
                            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                            if name != file_name {
                                continue;
                            }

                            use notify_debouncer_full::notify::EventKind;
                            match event.kind {
                                EventKind::Create(_) | EventKind::Modify(_) => {
                                    debug!(path = %path.display(), "queue watcher event");
                                    changed = true;
                                },
                                _ => {},
                            }
                        }
                    }
                    if changed {
                        let _ = tx.send(());
                    }
                },
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "queue watcher error");
                    }
                },
            },
        )
        .map_err(|e| Error::queue("starting queue watcher", e))?;

        debouncer
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::queue("watching queue directory", e))?;
        info!(dir = %dir.display(), file = %path.display(), "queue watcher started");

        let drainer = Arc::clone(&self.drainer);
        let drain_task = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                if let Err(e) = drainer.drain().await {
                    error!(error = %e, "queue drain failed");
                }
            }
        });

        self.state = Some(WatchState {
            _debouncer: debouncer,
            drain_task,
        });
        Ok(true)
    }

    /// Stop watching. Returns `false` if the watcher was not running.
    ///
    /// Waits for the drain task to finish whatever batch it is on. The
    /// queue file is truncated when a batch is claimed, so aborting
    /// mid-drain would drop claimed entries on the floor.
    pub async fn stop(&mut self) -> bool {
        match self.state.take() {
            Some(WatchState {
                _debouncer: debouncer,
                drain_task,
            }) => {
                // Dropping the debouncer closes the event channel; the
                // drain task finishes the current drain, sees the closed
                // channel, and exits on its own.
                drop(debouncer);
                if let Err(e) = drain_task.await {
                    warn!(error = %e, "queue drain task ended abnormally");
                }
                info!("queue watcher stopped");
                true
            },
            None => {
                info!("queue watcher is not running");
                false
            },
        }
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    }
}
