use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::event::Event;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Removed,
    /// Either side of a rename.
    Renamed,
    /// Content or metadata changed; the listing itself is unaffected.
    Modified,
}

/// Normalized change notification for one absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSignal {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeSignal {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Whether the parent directory's listing may have changed.
    pub fn is_structural(&self) -> bool {
        !matches!(self.kind, ChangeKind::Modified)
    }
}

/// Per-directory change subscription, held by the tree.
///
/// Every expanded directory is watched; collapsing releases it.
pub trait DirWatch {
    fn watch(&mut self, dir: &Path) -> Result<()>;
    fn unwatch(&mut self, dir: &Path);
}

/// Subscription sink used when live sync is disabled.
#[derive(Debug, Default)]
pub struct NoWatch;

impl DirWatch for NoWatch {
    fn watch(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    fn unwatch(&mut self, _dir: &Path) {}
}

/// Turn a raw notify event into zero or more change signals.
pub fn normalize(event: &notify::Event) -> Vec<ChangeSignal> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        EventKind::Modify(_) => ChangeKind::Modified,
        _ => return Vec::new(),
    };
    event
        .paths
        .iter()
        .map(|path| ChangeSignal::new(path.clone(), kind))
        .collect()
}

/// Bridges OS change notifications for expanded directories into the event loop.
///
/// The notify backend thread is the producer; signals are sent one at a time
/// over the event channel and consumed only by the main loop.
pub struct WatchBridge {
    watcher: RecommendedWatcher,
    watched: HashSet<PathBuf>,
}

impl WatchBridge {
    /// Create a bridge that forwards signals to `event_tx`. Nothing is watched yet.
    pub fn new(event_tx: mpsc::UnboundedSender<Event>) -> Result<Self> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for signal in normalize(&event) {
                        if event_tx.send(Event::FsChange(signal)).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => tracing::warn!("watcher error: {}", e),
            }
        })?;

        Ok(Self {
            watcher,
            watched: HashSet::new(),
        })
    }

    /// Number of directories currently subscribed.
    #[cfg(test)]
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }
}

impl DirWatch for WatchBridge {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        if self.watched.contains(dir) {
            return Ok(());
        }
        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.watched.insert(dir.to_path_buf());
        tracing::debug!(dir = %dir.display(), "watching");
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) {
        if self.watched.remove(dir) {
            // The OS drops watches on deleted directories by itself.
            if let Err(e) = self.watcher.unwatch(dir) {
                tracing::debug!(dir = %dir.display(), "unwatch: {}", e);
            } else {
                tracing::debug!(dir = %dir.display(), "unwatched");
            }
        }
    }
}
