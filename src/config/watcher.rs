//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched, not the file itself: editors that save
//! by rename and ConfigMap symlink swaps replace the file's inode, which a
//! file watch would lose. Event bursts are coalesced, and an update is sent
//! only when the file content actually changed.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::GatewayConfig;

/// Quiet period after the last file event before the file is re-read.
const SETTLE: Duration = Duration::from_millis(250);

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Must be called inside a Tokio runtime.
    ///
    /// The returned watcher must be kept alive for events to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(OsStr::to_os_string);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if concerns_config(&event, file_name.as_deref()) => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let applied = std::fs::read_to_string(&self.path).ok();
        tokio::spawn(forward_changes(
            self.path.clone(),
            applied,
            event_rx,
            self.update_tx,
        ));

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Whether a directory event may have changed the config file.
fn concerns_config(event: &Event, file_name: Option<&OsStr>) -> bool {
    if event.kind.is_access() {
        return false;
    }
    event.paths.iter().any(|path| match path.file_name() {
        Some(name) => {
            Some(name) == file_name
                // ConfigMap mounts swap a `..data` symlink, not the file.
                || name.to_string_lossy().starts_with("..")
        }
        None => false,
    })
}

async fn forward_changes(
    path: PathBuf,
    mut applied: Option<String>,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<GatewayConfig>,
) {
    while events.recv().await.is_some() {
        while let Ok(Some(())) = tokio::time::timeout(SETTLE, events.recv()).await {}

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Config file unreadable, keeping current configuration");
                continue;
            }
        };
        if applied.as_deref() == Some(content.as_str()) {
            continue;
        }

        match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = ?path, "Config file changed, reloading");
                if updates.send(config).is_err() {
                    break;
                }
                applied = Some(content);
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to reload config, keeping current configuration"
                );
            }
        }
    }
}
