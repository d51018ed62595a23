//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself so editors
//! that save by rename-over are still picked up.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_config;
use crate::config::schema::BalancerConfig;

/// Watches one config file and hands every valid new version to a callback.
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Start watching. Invalid configs are logged and skipped.
    ///
    /// Dropping the returned watcher stops the notifications.
    pub fn spawn<F>(self, on_change: F) -> Result<RecommendedWatcher, notify::Error>
    where
        F: Fn(BalancerConfig) + Send + 'static,
    {
        let path = self.path.clone();
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event, &path) => match load_config(&path) {
                    Ok(config) => on_change(config),
                    Err(e) => tracing::error!(path = ?path, error = %e, "Rejected config change, keeping current configuration"),
                },
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// A create or modify event touching the watched file.
fn is_relevant(event: &Event, path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = path.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}
