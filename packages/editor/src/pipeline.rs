//! # Editing Pipeline
//!
//! Working copy → address → serialize → format → write → invalidate.
//!
//! Edits are made on clones of the graph's documents inside a
//! [`ChangeSet`]. Nothing touches the disk until every edit and every
//! formatter run has succeeded; if a write fails part way, the files
//! already written are restored.

use crate::addressing::assign_file_addresses;
use crate::errors::{EditorError, EditorResult};
use crate::formatter::Formatter;
use ecu_common::FileSystem;
use ecu_graph::SourceGraph;
use ecu_parser::ast::Document;
use ecu_parser::serialize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File content at one point in time; `None` means the file did not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub content: Option<String>,
}

impl FileSnapshot {
    pub fn read(fs: &dyn FileSystem, path: &Path) -> EditorResult<Self> {
        let content = if fs.is_file(path) {
            Some(fs.read_to_string(path)?)
        } else {
            None
        };
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Whether the disk still holds exactly this content
    pub fn matches_disk(&self, fs: &dyn FileSystem) -> EditorResult<bool> {
        Ok(Self::read(fs, &self.path)?.content == self.content)
    }
}

/// What a committed change did to the disk
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Commit {
    pub forward: Vec<FileSnapshot>,
    pub inverse: Vec<FileSnapshot>,
}

/// Working copies of the documents one mutation edits
pub struct ChangeSet<'g> {
    graph: &'g SourceGraph,
    documents: BTreeMap<PathBuf, Document>,
}

impl<'g> ChangeSet<'g> {
    pub fn new(graph: &'g SourceGraph) -> Self {
        Self {
            graph,
            documents: BTreeMap::new(),
        }
    }

    pub fn graph(&self) -> &'g SourceGraph {
        self.graph
    }

    fn original(&self, path: &Path) -> EditorResult<&'g Document> {
        let file = self
            .graph
            .file_by_path(path)
            .ok_or_else(|| EditorError::not_found(format!("file {}", path.display())))?;
        file.document.as_ref().ok_or_else(|| {
            EditorError::invalid(format!(
                "{} could not be parsed: {}",
                path.display(),
                file.parse_error.as_deref().unwrap_or("unknown error")
            ))
        })
    }

    /// The working copy if one exists, else the graph's document
    pub fn document(&self, path: &Path) -> EditorResult<&Document> {
        match self.documents.get(path) {
            Some(doc) => Ok(doc),
            None => self.original(path),
        }
    }

    pub fn document_mut(&mut self, path: &Path) -> EditorResult<&mut Document> {
        if !self.documents.contains_key(path) {
            let doc = self.original(path)?.clone();
            self.documents.insert(path.to_path_buf(), doc);
        }
        self.documents
            .get_mut(path)
            .ok_or_else(|| EditorError::not_found(format!("file {}", path.display())))
    }

    /// Stage a brand-new file
    pub fn create(&mut self, path: PathBuf, doc: Document) {
        self.documents.insert(path, doc);
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.documents.keys()
    }

    /// Re-address, regenerate and format every staged document
    pub fn render(
        self,
        attribute: &str,
        formatter: &dyn Formatter,
    ) -> EditorResult<Vec<(PathBuf, String)>> {
        let mut outputs = Vec::with_capacity(self.documents.len());
        for (path, mut doc) in self.documents {
            assign_file_addresses(&mut doc, &path, attribute);
            let text = formatter.format(&path, &serialize(&doc))?;
            outputs.push((path, text));
        }
        Ok(outputs)
    }
}

/// Write rendered files and re-derive them in the graph.
///
/// Returns the written content and the content it replaced.
pub fn write_outputs(
    graph: &mut SourceGraph,
    outputs: Vec<(PathBuf, String)>,
) -> EditorResult<Commit> {
    let fs = graph.fs_handle();

    let inverse = outputs
        .iter()
        .map(|(path, _)| FileSnapshot::read(fs.as_ref(), path))
        .collect::<EditorResult<Vec<_>>>()?;
    let forward: Vec<FileSnapshot> = outputs
        .into_iter()
        .map(|(path, content)| FileSnapshot {
            path,
            content: Some(content),
        })
        .collect();

    write_snapshots(graph, &forward, &inverse)?;
    Ok(Commit { forward, inverse })
}

/// Put snapshots on disk, restoring `previous` if any write fails
pub fn write_snapshots(
    graph: &mut SourceGraph,
    snapshots: &[FileSnapshot],
    previous: &[FileSnapshot],
) -> EditorResult<()> {
    let fs = graph.fs_handle();

    for (written, snapshot) in snapshots.iter().enumerate() {
        let result = match &snapshot.content {
            Some(content) => fs.write(&snapshot.path, content),
            None if fs.is_file(&snapshot.path) => fs.remove_file(&snapshot.path),
            None => Ok(()),
        };
        if let Err(source) = result {
            tracing::error!(path = %snapshot.path.display(), error = %source, "Write failed, restoring");
            restore(fs.as_ref(), &previous[..written.min(previous.len())]);
            return Err(EditorError::Write {
                path: snapshot.path.clone(),
                source,
            });
        }
    }

    for snapshot in snapshots {
        graph.invalidate(&snapshot.path)?;
        tracing::info!(path = %snapshot.path.display(), "Wrote file");
    }
    Ok(())
}

fn restore(fs: &dyn FileSystem, snapshots: &[FileSnapshot]) {
    for snapshot in snapshots {
        let result = match &snapshot.content {
            Some(content) => fs.write(&snapshot.path, content),
            None => fs.remove_file(&snapshot.path),
        };
        if let Err(e) = result {
            tracing::warn!(path = %snapshot.path.display(), error = %e, "Failed to restore file");
        }
    }
}
