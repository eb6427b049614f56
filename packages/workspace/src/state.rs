//! Shared editor state for the HTTP layer.
//!
//! Queries share the read lock. Mutations run on the blocking pool
//! under the write lock, one at a time.

use ecu_editor::{Editor, EditorError, EditorResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Background task failed: {0}")]
    Join(String),
}

impl StateError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, StateError::Editor(e) if e.is_client_error())
    }
}

pub struct WorkspaceState {
    editor: RwLock<Editor>,
}

pub type SharedState = Arc<WorkspaceState>;

impl WorkspaceState {
    pub fn new(editor: Editor) -> Self {
        Self {
            editor: RwLock::new(editor),
        }
    }

    pub fn shared(editor: Editor) -> SharedState {
        Arc::new(Self::new(editor))
    }

    /// Run a query under the read lock
    pub async fn read<T>(&self, f: impl FnOnce(&Editor) -> T) -> T {
        let editor = self.editor.read().await;
        f(&editor)
    }

    /// Run a write on the blocking pool under the write lock
    pub async fn write<T, F>(self: &Arc<Self>, f: F) -> Result<T, StateError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Editor) -> EditorResult<T> + Send + 'static,
    {
        let state = Arc::clone(self);
        let result = tokio::task::spawn_blocking(move || {
            let mut editor = state.editor.blocking_write();
            f(&mut editor)
        })
        .await
        .map_err(|e| StateError::Join(e.to_string()))?;
        Ok(result?)
    }

    /// Re-read a file from a non-async thread
    pub fn invalidate_blocking(&self, path: &Path) -> EditorResult<()> {
        self.editor.blocking_write().invalidate(path)
    }

    /// Rebuild the whole graph from a non-async thread
    pub fn rescan_blocking(&self) -> EditorResult<()> {
        self.editor.blocking_write().rescan().map(|_| ())
    }
}
