pub mod init;
pub mod project;
pub mod serve;

pub use init::{init, InitArgs};
pub use project::{address, hierarchy, redo, scan, undo, HierarchyArgs};
pub use serve::{serve, ServeArgs};

use crate::config::Config;
use anyhow::Result;
use ecu_common::RealFileSystem;
use ecu_editor::Editor;
use std::path::Path;
use std::sync::Arc;

/// Open the project described by `config`
pub fn open_editor(config: &Config, cwd: &Path) -> Result<Editor> {
    let editor = Editor::open(
        config.editor_options(cwd),
        Arc::new(RealFileSystem),
        config.formatter(),
    )?;
    Ok(editor)
}
