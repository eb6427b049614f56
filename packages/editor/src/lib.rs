//! # ecu editor
//!
//! Hierarchy addressing, traversal and structural editing on top of the
//! source graph.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ graph: files, components, import edges      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ traversal: (root, hierarchy path) → node    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ mutations: edit working copies              │
//! │ pipeline: address → serialize → format      │
//! │           → write → invalidate              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ history: file snapshots for undo/redo       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecu_editor::{Editor, EditorOptions, Mutation, NoopFormatter, UpdateTextValue};
//!
//! let mut editor = Editor::open(
//!     EditorOptions::new("/path/to/project"),
//!     Arc::new(RealFileSystem),
//!     Box::new(NoopFormatter),
//! )?;
//! editor.address_project()?;
//!
//! editor.apply(Mutation::UpdateTextValue(UpdateTextValue {
//!     source_component_address: root.clone(),
//!     hierarchy_ids: vec!["1a2b:0#0".parse()?],
//!     value: "Hello".to_string(),
//! }))?;
//! editor.undo()?;
//! ```

pub mod addressing;
pub mod editor;
pub mod errors;
pub mod formatter;
pub mod hierarchy;
pub mod history;
pub mod mutations;
pub mod options;
pub mod pipeline;
pub mod traversal;

pub use addressing::{assign_addresses, assign_file_addresses};
pub use editor::{ComponentInfo, Editor, HierarchyEntry, HierarchyView, ImportInfo};
pub use errors::{EditorError, EditorResult};
pub use formatter::{CommandFormatter, FormatError, Formatter, NoopFormatter};
pub use hierarchy::{HierarchyAddress, HierarchyId, HierarchyPosition};
pub use history::{EntryState, History, HistoryEntry, UndoRedoMetadata};
pub use mutations::{
    AddComponent, CreateComponent, DeleteComponent, MoveComponent, Mutation, MutationOutput,
    UpdateAttribute, UpdateTextValue,
};
pub use options::EditorOptions;
pub use pipeline::{ChangeSet, Commit, FileSnapshot};
pub use traversal::{resolve, Found, HierarchyItem, NodeLocator, Resolution};
