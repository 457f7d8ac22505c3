//! Debounced single-file change detection for the binary's watch mode.
//!
//! The rendering core performs no debouncing of its own; coalescing rapid
//! editor saves into one render pass per quiescent interval is the
//! caller's job, and this is the caller-side piece the `inkpane` binary
//! uses.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::trace;

/// Watches one document and reports debounced change readiness.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl DocumentWatcher {
    /// Create a watcher for `path`.
    ///
    /// Watches the parent directory rather than the file itself so that
    /// editors which replace-on-save keep being observed.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher cannot be created or the directory
    /// cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Canonicalize so OS-reported event paths match stored paths.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
            pending_since: None,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Returns true once a debounced change to the watched file is ready.
    pub fn take_change_ready(&mut self) -> bool {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(event) if self.is_relevant(&event) => {
                    self.pending_since = Some(Instant::now());
                }
                Ok(event) => {
                    trace!(kind = ?event.kind, "irrelevant watch event");
                }
                Err(err) => {
                    trace!(error = %err, "watch error");
                }
            }
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
