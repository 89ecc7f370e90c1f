use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::trace::trace::TraceEvent;

enum JournalMsg {
    Line(String),
    Flush(oneshot::Sender<()>),
}

/// Append-only JSONL journal of agent decisions.
///
/// Lines go to a writer task over a channel, so `log` never blocks the
/// agent. The journal is best effort: open and write failures are reported
/// through `tracing` and never reach the agent.
pub struct TraceLogger {
    path: Option<PathBuf>,
    sink: Option<mpsc::UnboundedSender<JournalMsg>>,
}

impl TraceLogger {
    /// Open `path` for appending and start the writer on the current tokio
    /// runtime. Outside a runtime the journal is disabled.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(path = %path.display(), "no tokio runtime, trace journal disabled");
            return Self::disabled();
        };

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (tx, rx) = mpsc::unbounded_channel();
                runtime.spawn(write_journal(File::from_std(file), rx));
                Self {
                    path: Some(path.to_path_buf()),
                    sink: Some(tx),
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "trace journal disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            sink: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        match serde_json::to_string(event) {
            Ok(mut line) => {
                line.push('\n');
                if sink.send(JournalMsg::Line(line)).is_err() {
                    tracing::warn!(action = %event.action, "trace writer gone");
                }
            }
            Err(e) => {
                tracing::warn!(action = %event.action, error = %e, "unserializable trace event");
            }
        }
    }

    /// Wait until every line logged so far has reached the file.
    pub async fn flush(&self) {
        let Some(sink) = &self.sink else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if sink.send(JournalMsg::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn write_journal(mut file: File, mut rx: mpsc::UnboundedReceiver<JournalMsg>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            JournalMsg::Line(line) => {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    tracing::warn!(error = %e, "trace write failed");
                }
            }
            JournalMsg::Flush(ack) => {
                if let Err(e) = file.flush().await {
                    tracing::warn!(error = %e, "trace flush failed");
                }
                let _ = ack.send(());
            }
        }
    }
    let _ = file.flush().await;
}
