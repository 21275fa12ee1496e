//! Operator command loop on stdin.

use std::sync::Arc;

use {
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        sync::Mutex,
    },
    tracing::info,
};

use courier_dispatch::{Dispatcher, QueueDrainer, QueueWatcher, command, parse_send_command};

const WATCHDOG: &str = "watchdog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Info,
    Error,
}

/// Outcome of one operator command, surfaced to the invoking
/// conversation. Never a process exit code.
#[derive(Debug)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
}

impl Reply {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Error,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ReplyKind::Info => write!(f, "{}", self.text),
            ReplyKind::Error => write!(f, "error: {}", self.text),
        }
    }
}

const HELP: &str = "commands:
  $send_msg [names] body            send a private message
  $send_msg [names] body group[gs]  send into groups, @-mentioning names
  $start watchdog                   watch the queue file and auto-drain
  $stop watchdog                    stop watching the queue file
  $check watchdog                   report watcher state
  $help                             show this help";

pub async fn repl(
    dispatcher: Arc<Mutex<Dispatcher>>,
    drainer: Arc<QueueDrainer>,
    mut watcher: QueueWatcher,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("command loop ready, type $help for commands");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = handle_line(line, &dispatcher, &drainer, &mut watcher).await;
        println!("{reply}");
    }
    Ok(())
}

async fn handle_line(
    line: &str,
    dispatcher: &Arc<Mutex<Dispatcher>>,
    drainer: &Arc<QueueDrainer>,
    watcher: &mut QueueWatcher,
) -> Reply {
    if line.starts_with(command::SEND_COMMAND) {
        return match parse_send_command(line) {
            Ok(request) => match dispatcher.lock().await.dispatch(&request).await {
                Ok(()) => Reply::info("message sent."),
                Err(e) => Reply::error(format!("message send failed: {e}")),
            },
            Err(e) => Reply::error(format!("bad send command: {e}")),
        };
    }

    match line {
        l if l == format!("$start {WATCHDOG}") => match watcher.start() {
            Ok(true) => {
                // Catch up on entries written while the watcher was off.
                match drainer.drain().await {
                    Ok(_) => Reply::info("watchdog started."),
                    Err(e) => Reply::error(format!("watchdog started, but initial drain failed: {e}")),
                }
            },
            Ok(false) => Reply::info("watchdog is already running."),
            Err(e) => Reply::error(format!("failed to start watchdog: {e}")),
        },
        l if l == format!("$stop {WATCHDOG}") => {
            if watcher.stop().await {
                Reply::info("watchdog stopped.")
            } else {
                Reply::info("watchdog is not running.")
            }
        },
        l if l == format!("$check {WATCHDOG}") => {
            if watcher.is_running() {
                Reply::info("watchdog is running.")
            } else {
                Reply::info("watchdog is not running.")
            }
        },
        "$help" => Reply::info(HELP),
        _ => Reply::error(format!("unknown command, type $help for commands: {line}")),
    }
}
