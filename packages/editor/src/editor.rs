//! The editor façade: one project, its graph, its history.
//!
//! Read queries borrow the editor immutably; everything that writes
//! takes `&mut self`, which the RPC layer maps onto a read/write lock.

use crate::addressing::assign_file_addresses;
use crate::errors::{EditorError, EditorResult};
use crate::formatter::Formatter;
use crate::hierarchy::HierarchyId;
use crate::history::{History, UndoRedoMetadata};
use crate::mutations::{Mutation, MutationContext, MutationOutput, Operation};
use crate::options::EditorOptions;
use crate::pipeline::{write_outputs, write_snapshots, ChangeSet};
use crate::traversal::{resolve, HierarchyItem, Resolution};
use ecu_common::{normalize_path, FileSystem};
use ecu_graph::{ComponentNode, ScanSummary, SourceGraph};
use ecu_parser::ast::{ExportKind, ImportSpecifier};
use ecu_parser::serialize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One step of a resolved route, as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_id: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_address: Option<String>,
    pub component_name: String,
}

impl From<&HierarchyItem> for HierarchyEntry {
    fn from(item: &HierarchyItem) -> Self {
        match item {
            HierarchyItem::Component {
                address,
                name,
                label,
                ..
            } => HierarchyEntry {
                hierarchy_id: None,
                label: label.clone(),
                component_address: Some(address.clone()),
                component_name: name.clone(),
            },
            HierarchyItem::Element {
                id,
                label,
                owner_name,
                ..
            } => HierarchyEntry {
                hierarchy_id: Some(id.to_string()),
                label: label.clone(),
                component_address: None,
                component_name: owner_name.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HierarchyView {
    pub hierarchy: Vec<HierarchyEntry>,
    pub children: Vec<HierarchyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub address: String,
    pub name: String,
    pub export_kind: ExportKind,
    pub is_component: bool,
    pub file_path: PathBuf,
    pub file_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportInfo {
    pub specifier: String,
    /// Resolved target, absent for packages and unresolved paths
    pub file_address: Option<String>,
    pub path: Option<PathBuf>,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportSpecifier>,
}

pub struct Editor {
    options: EditorOptions,
    graph: SourceGraph,
    formatter: Box<dyn Formatter>,
    history: History,
}

impl Editor {
    /// Scan the project and load its history
    pub fn open(
        options: EditorOptions,
        fs: Arc<dyn FileSystem>,
        formatter: Box<dyn Formatter>,
    ) -> EditorResult<Self> {
        let mut graph = SourceGraph::new(options.root.clone(), fs.clone());
        let summary = graph.scan_all()?;
        tracing::info!(
            root = %options.root.display(),
            files = summary.files,
            components = summary.components,
            parse_failures = summary.parse_failures,
            "Scanned project"
        );
        let history = History::load(&options.root, options.history_limit, fs)?;

        Ok(Self {
            options,
            graph,
            formatter,
            history,
        })
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn graph(&self) -> &SourceGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Re-read a file changed outside the editor
    pub fn invalidate(&mut self, path: &Path) -> EditorResult<()> {
        self.graph.invalidate(path)?;
        Ok(())
    }

    /// Rebuild the graph from disk
    pub fn rescan(&mut self) -> EditorResult<ScanSummary> {
        Ok(self.graph.scan_all()?)
    }

    pub fn components_dir(&self) -> PathBuf {
        normalize_path(&self.options.root.join(&self.options.components_dir))
    }

    pub fn resolve(&self, root: &str, ids: &[HierarchyId]) -> Resolution {
        resolve(&self.graph, &self.options.address_attribute, root, ids)
    }

    /// Route to a path and the elements one level below it.
    ///
    /// Unknown roots and unresolvable paths give an empty view.
    pub fn hierarchy(&self, root: &str, ids: &[HierarchyId]) -> HierarchyView {
        match self.resolve(root, ids) {
            Resolution::Found(found) => HierarchyView {
                hierarchy: found.route.iter().map(HierarchyEntry::from).collect(),
                children: found.children.iter().map(HierarchyEntry::from).collect(),
            },
            Resolution::NotFound => {
                tracing::debug!(root, "Hierarchy path not found");
                HierarchyView::default()
            }
        }
    }

    fn component_info(&self, component: &ComponentNode) -> ComponentInfo {
        let file_address = self
            .graph
            .file_of_component(&component.address)
            .map(|file| file.address.clone())
            .unwrap_or_default();
        ComponentInfo {
            address: component.address.clone(),
            name: component.name.clone(),
            export_kind: component.export_kind,
            is_component: component.is_component,
            file_path: component.path.clone(),
            file_address,
        }
    }

    /// Every UI component in the project, by name
    pub fn components(&self) -> Vec<ComponentInfo> {
        self.graph
            .ui_components()
            .into_iter()
            .map(|component| self.component_info(component))
            .collect()
    }

    pub fn component(&self, address: &str) -> EditorResult<ComponentInfo> {
        self.graph
            .component(address)
            .map(|component| self.component_info(component))
            .ok_or_else(|| EditorError::not_found(format!("component {}", address)))
    }

    pub fn file_imports(&self, file_address: &str) -> EditorResult<Vec<ImportInfo>> {
        let file = self
            .graph
            .file(file_address)
            .ok_or_else(|| EditorError::not_found(format!("file {}", file_address)))?;
        let Some(doc) = &file.document else {
            return Ok(Vec::new());
        };

        Ok(doc
            .imports()
            .map(|import| {
                let target = self.graph.import_target(file_address, &import.source);
                ImportInfo {
                    specifier: import.source.clone(),
                    file_address: target.map(|file| file.address.clone()),
                    path: target.map(|file| file.path.clone()),
                    default: import.default.clone(),
                    namespace: import.namespace.clone(),
                    named: import.named.clone(),
                }
            })
            .collect())
    }

    /// Run a mutation through the pipeline and record it
    pub fn apply(&mut self, mutation: Mutation) -> EditorResult<MutationOutput> {
        let description = mutation.describe(&self.graph);
        let components_dir = self.components_dir();
        let cx = MutationContext {
            attribute: &self.options.address_attribute,
            components_dir: &components_dir,
        };

        let (output, outputs) = {
            let mut changes = ChangeSet::new(&self.graph);
            let output = mutation.apply(&mut changes, &cx)?;
            let outputs = changes.render(&self.options.address_attribute, self.formatter.as_ref())?;
            (output, outputs)
        };

        let commit = write_outputs(&mut self.graph, outputs)?;
        tracing::info!(
            mutation = mutation.name(),
            files = commit.forward.len(),
            "{}",
            description
        );
        if let Err(e) = self.history.record(description, mutation, commit.clone()) {
            tracing::error!(error = %e, "Failed to record change, reverting files");
            write_snapshots(&mut self.graph, &commit.inverse, &commit.forward)?;
            return Err(e);
        }
        Ok(output)
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        self.history.undo(&mut self.graph)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        self.history.redo(&mut self.graph)
    }

    pub fn undo_redo_metadata(&self) -> UndoRedoMetadata {
        self.history.metadata()
    }

    /// Address every UI component in the project.
    ///
    /// Only files whose text changes are written. Not recorded in the
    /// history. Returns the written paths.
    pub fn address_project(&mut self) -> EditorResult<Vec<PathBuf>> {
        let attribute = &self.options.address_attribute;
        let mut outputs = Vec::new();

        for file in self.graph.files() {
            let Some(doc) = &file.document else {
                continue;
            };
            if !doc.dialect.has_markup() {
                continue;
            }
            let mut doc = doc.clone();
            assign_file_addresses(&mut doc, &file.path, attribute);
            let text = serialize(&doc);
            if text != file.source {
                let text = self.formatter.format(&file.path, &text)?;
                outputs.push((file.path.clone(), text));
            }
        }

        let paths: Vec<PathBuf> = outputs.iter().map(|(path, _)| path.clone()).collect();
        if !outputs.is_empty() {
            write_outputs(&mut self.graph, outputs)?;
            tracing::info!(files = paths.len(), "Addressed project");
        }
        Ok(paths)
    }
}
