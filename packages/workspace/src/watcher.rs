use crate::state::SharedState;
use ecu_common::IGNORED_DIRS;
use ecu_parser::Dialect;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    CreateError(#[from] notify::Error),

    #[error("Watch error: {0}")]
    WatchError(String),
}

pub type WatcherResult<T> = Result<T, WatcherError>;

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> WatcherResult<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&path, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Block until the next event; `None` once the watcher is gone
    pub fn next_event(&self) -> Option<Event> {
        loop {
            match self.receiver.recv() {
                Ok(Ok(event)) => return Some(event),
                Ok(Err(e)) => tracing::warn!(error = %e, "Watch error"),
                Err(_) => return None,
            }
        }
    }

    pub fn next_event_timeout(&self, timeout: Duration) -> WatcherResult<Option<Event>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(Ok(event)) => Ok(Some(event)),
            Ok(Err(e)) => Err(WatcherError::WatchError(e.to_string())),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(WatcherError::WatchError("watcher disconnected".to_string()))
            }
        }
    }
}

/// Whether a changed path is a source file the graph tracks
pub fn is_source_path(root: &Path, path: &Path) -> bool {
    if Dialect::from_path(path).is_none() {
        return false;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    !relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .map(|name| IGNORED_DIRS.contains(&name))
            .unwrap_or(false)
    })
}

fn source_paths(root: &Path, event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => event
            .paths
            .iter()
            .filter(|path| is_source_path(root, path))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// Keep the graph in sync with edits made outside the editor.
///
/// Runs on its own thread for as long as the watcher lives.
pub fn watch_project(state: SharedState, root: PathBuf) -> WatcherResult<JoinHandle<()>> {
    let watcher = FileWatcher::new(root.clone())?;
    tracing::info!(root = %root.display(), "Watching for changes");

    Ok(std::thread::spawn(move || {
        while let Some(event) = watcher.next_event() {
            if event.need_rescan() {
                tracing::info!("Watcher dropped events, rescanning project");
                if let Err(e) = state.rescan_blocking() {
                    tracing::warn!(error = %e, "Failed to rescan project");
                }
                continue;
            }
            for path in source_paths(&root, &event) {
                tracing::debug!(path = %path.display(), "File changed on disk");
                if let Err(e) = state.invalidate_blocking(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to reload file");
                }
            }
        }
    }))
}
