pub mod server;
pub mod state;
pub mod watcher;

pub use server::{router, serve, ApiResponse};
pub use state::{SharedState, StateError, WorkspaceState};
pub use watcher::{watch_project, FileWatcher, WatcherError, WatcherResult};
