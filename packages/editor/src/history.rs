//! # History
//!
//! Persistent undo/redo log stored in `<root>/.ecu/ecu-history.json`.
//!
//! Each entry keeps the mutation that produced it together with the
//! exact file contents before and after. Undo writes the "before"
//! snapshots back and redo writes the "after" ones, but only while the
//! disk still matches what the entry expects.
//!
//! A new entry discards everything that was undone; the oldest entries
//! are dropped once the log grows past its limit (0 = unlimited).

use crate::errors::{EditorError, EditorResult};
use crate::mutations::Mutation;
use crate::pipeline::{write_snapshots, Commit, FileSnapshot};
use chrono::{DateTime, Utc};
use ecu_common::FileSystem;
use ecu_graph::SourceGraph;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const HISTORY_DIR: &str = ".ecu";
pub const HISTORY_FILE: &str = "ecu-history.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Applied,
    Undone,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub mutation: Mutation,
    pub forward: Vec<FileSnapshot>,
    pub inverse: Vec<FileSnapshot>,
    pub state: EntryState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRedoMetadata {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

pub struct History {
    path: PathBuf,
    limit: usize,
    fs: Arc<dyn FileSystem>,
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Load the log under `root`, starting empty if there is none
    pub fn load(root: &Path, limit: usize, fs: Arc<dyn FileSystem>) -> EditorResult<Self> {
        let path = root.join(HISTORY_DIR).join(HISTORY_FILE);
        let entries = if fs.is_file(&path) {
            let text = fs.read_to_string(&path)?;
            match serde_json::from_str::<HistoryLog>(&text) {
                Ok(log) => log.entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable history log");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        tracing::debug!(entries = entries.len(), "Loaded history");

        Ok(Self {
            path,
            limit,
            fs,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Persist `entries`, then adopt them; memory is untouched on failure
    fn commit_entries(&mut self, entries: Vec<HistoryEntry>) -> EditorResult<()> {
        let log = serde_json::json!({ "entries": &entries });
        let text = serde_json::to_string_pretty(&log)?;
        self.fs.write(&self.path, &text).map_err(|source| EditorError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.entries = entries;
        Ok(())
    }

    /// Append a freshly applied change
    pub fn record(&mut self, description: String, mutation: Mutation, commit: Commit) -> EditorResult<()> {
        let mut entries = self.entries.clone();
        for entry in &mut entries {
            if entry.state == EntryState::Undone {
                entry.state = EntryState::Discarded;
            }
        }
        entries.push(HistoryEntry {
            description,
            timestamp: Utc::now(),
            mutation,
            forward: commit.forward,
            inverse: commit.inverse,
            state: EntryState::Applied,
        });

        if self.limit > 0 && entries.len() > self.limit {
            let excess = entries.len() - self.limit;
            entries.drain(..excess);
        }
        self.commit_entries(entries)
    }

    fn undo_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|entry| entry.state == EntryState::Applied)
    }

    fn redo_index(&self) -> Option<usize> {
        let start = self.undo_index().map(|i| i + 1).unwrap_or(0);
        self.entries[start..]
            .iter()
            .position(|entry| entry.state == EntryState::Undone)
            .map(|i| start + i)
    }

    pub fn metadata(&self) -> UndoRedoMetadata {
        let undo = self.undo_index().map(|i| &self.entries[i]);
        let redo = self.redo_index().map(|i| &self.entries[i]);
        UndoRedoMetadata {
            can_undo: undo.is_some(),
            can_redo: redo.is_some(),
            undo_description: undo.map(|entry| entry.description.clone()),
            redo_description: redo.map(|entry| entry.description.clone()),
        }
    }

    /// Revert the latest applied entry. Returns false if there is none.
    pub fn undo(&mut self, graph: &mut SourceGraph) -> EditorResult<bool> {
        let Some(index) = self.undo_index() else {
            return Ok(false);
        };
        let entry = self.entries[index].clone();
        check_disk(graph.fs(), &entry.forward)?;
        write_snapshots(graph, &entry.inverse, &entry.forward)?;

        let mut entries = self.entries.clone();
        entries[index].state = EntryState::Undone;
        if let Err(e) = self.commit_entries(entries) {
            write_snapshots(graph, &entry.forward, &entry.inverse)?;
            return Err(e);
        }
        tracing::info!(description = %entry.description, "Undid change");
        Ok(true)
    }

    /// Re-apply the earliest undone entry. Returns false if there is none.
    pub fn redo(&mut self, graph: &mut SourceGraph) -> EditorResult<bool> {
        let Some(index) = self.redo_index() else {
            return Ok(false);
        };
        let entry = self.entries[index].clone();
        check_disk(graph.fs(), &entry.inverse)?;
        write_snapshots(graph, &entry.forward, &entry.inverse)?;

        let mut entries = self.entries.clone();
        entries[index].state = EntryState::Applied;
        if let Err(e) = self.commit_entries(entries) {
            write_snapshots(graph, &entry.inverse, &entry.forward)?;
            return Err(e);
        }
        tracing::info!(description = %entry.description, "Redid change");
        Ok(true)
    }
}

fn check_disk(fs: &dyn FileSystem, expected: &[FileSnapshot]) -> EditorResult<()> {
    for snapshot in expected {
        if !snapshot.matches_disk(fs)? {
            tracing::warn!(path = %snapshot.path.display(), "File changed outside the editor");
            return Err(EditorError::HistoryConflict(snapshot.path.clone()));
        }
    }
    Ok(())
}
