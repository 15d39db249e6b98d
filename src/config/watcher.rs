//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors and
//! config-management tools often replace the file (write + rename), which
//! would orphan a watch on the original inode.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::RelayConfig;

/// Monitors the configuration file and publishes every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RelayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RelayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = watch_dir(&self.path);
        let file_name = self.path.file_name().map(OsString::from);
        let mut reloader = Reloader::new(self.path.clone(), self.update_tx);
        // The running config came from this file; only later edits count.
        reloader.remember_current();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if touches_file(&event, file_name.as_deref()) {
                        reloader.reload();
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether a directory event concerns the watched file's contents.
fn touches_file(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name().is_some_and(|name| Some(name) == file_name))
}

/// Re-reads the file and forwards configs whose text actually changed.
///
/// A single save typically fires several events; unchanged content is
/// skipped so the server swaps its context once per edit.
struct Reloader {
    path: PathBuf,
    tx: mpsc::UnboundedSender<RelayConfig>,
    last_applied: Option<String>,
}

impl Reloader {
    fn new(path: PathBuf, tx: mpsc::UnboundedSender<RelayConfig>) -> Self {
        Self {
            path,
            tx,
            last_applied: None,
        }
    }

    fn remember_current(&mut self) {
        self.last_applied = fs::read_to_string(&self.path).ok();
    }

    /// Returns true when a new config was published.
    fn reload(&mut self) -> bool {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                // Mid-rename: the next event will carry the new file
                tracing::debug!(error = %e, "Config file not readable yet");
                return false;
            }
        };
        if self.last_applied.as_deref() == Some(content.as_str()) {
            return false;
        }

        tracing::info!(path = %self.path.display(), "Config file change detected, reloading");
        match parse_config(&content) {
            Ok(config) => {
                self.last_applied = Some(content);
                self.tx.send(config).is_ok()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                false
            }
        }
    }
}
