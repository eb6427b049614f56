//! # Source Graph
//!
//! Files, the components they declare and the import edges between them.
//!
//! ```text
//!   FileNode ──DeclaresComponent──▶ ComponentNode
//!      │
//!      └──────ImportsFile─────────▶ FileNode
//! ```
//!
//! The graph is built once by [`SourceGraph::scan_all`] and patched by
//! [`SourceGraph::invalidate`] after every write. Nodes are keyed by
//! path-derived addresses, so edges pointing at a re-parsed file stay
//! valid. Edges pointing at a removed file are filtered when read.

use crate::error::GraphResult;
use crate::resolver::resolve_import_path;
use ecu_common::FileSystem;
use ecu_parser::ast::{Dialect, Document, ExportKind};
use ecu_parser::{get_component_id, get_document_id, parse};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One source file
#[derive(Debug, Clone)]
pub struct FileNode {
    pub address: String,
    pub path: PathBuf,
    pub dialect: Dialect,
    /// Raw text as last read from disk
    pub source: String,
    /// `None` when the file failed to parse
    pub document: Option<Document>,
    pub parse_error: Option<String>,
}

/// One function-like declaration inside a file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub address: String,
    pub name: String,
    pub export_kind: ExportKind,
    /// Uppercase name and renders markup
    pub is_component: bool,
    pub path: PathBuf,
    /// Index of the declaring item in the file's document
    #[serde(skip)]
    pub item: usize,
}

/// `ImportsFile` edge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEdge {
    pub specifier: String,
    pub target: String,
    pub path: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub files: usize,
    pub components: usize,
    pub parse_failures: usize,
}

pub struct SourceGraph {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    files: HashMap<String, FileNode>,
    by_path: HashMap<PathBuf, String>,
    components: HashMap<String, ComponentNode>,
    /// DeclaresComponent: file address -> component addresses
    declares: HashMap<String, Vec<String>>,
    /// Reverse of `declares`
    declared_by: HashMap<String, String>,
    /// ImportsFile: file address -> edges
    imports: HashMap<String, Vec<ImportEdge>>,
}

impl SourceGraph {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
            files: HashMap::new(),
            by_path: HashMap::new(),
            components: HashMap::new(),
            declares: HashMap::new(),
            declared_by: HashMap::new(),
            imports: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn fs_handle(&self) -> Arc<dyn FileSystem> {
        self.fs.clone()
    }

    /// Walk the project and load every source file, dropping whatever an
    /// earlier scan left behind.
    ///
    /// Files that fail to read or parse are kept with no components.
    pub fn scan_all(&mut self) -> GraphResult<ScanSummary> {
        let paths = self.fs.walk(&self.root)?;
        let mut summary = ScanSummary::default();

        self.files.clear();
        self.by_path.clear();
        self.components.clear();
        self.declares.clear();
        self.declared_by.clear();
        self.imports.clear();

        for path in &paths {
            self.load_file(path)?;
        }

        let loaded: Vec<PathBuf> = self.by_path.keys().cloned().collect();
        for path in loaded {
            self.resolve_imports(&path)?;
        }

        summary.files = self.files.len();
        summary.components = self.components.len();
        summary.parse_failures = self
            .files
            .values()
            .filter(|file| file.parse_error.is_some())
            .count();

        tracing::info!(
            root = %self.root.display(),
            files = summary.files,
            components = summary.components,
            parse_failures = summary.parse_failures,
            "Source graph scan complete"
        );
        Ok(summary)
    }

    /// Re-derive a file after an external write, or drop it if it is gone
    pub fn invalidate(&mut self, path: &Path) -> GraphResult<()> {
        if Dialect::from_path(path).is_none() {
            return Ok(());
        }
        if !self.fs.is_file(path) {
            self.remove_file(path);
            return Ok(());
        }
        self.load_file(path)?;
        self.resolve_imports(path)
    }

    /// Remove a file, its components and its outgoing edges
    pub fn remove_file(&mut self, path: &Path) {
        let Some(address) = self.by_path.remove(path) else {
            return;
        };
        self.files.remove(&address);
        self.imports.remove(&address);
        for component in self.declares.remove(&address).unwrap_or_default() {
            self.components.remove(&component);
            self.declared_by.remove(&component);
        }
        tracing::debug!(path = %path.display(), "Removed file from source graph");
    }

    /// Rewrite a file's `ImportsFile` edges from its import statements.
    ///
    /// Targets not yet in the graph are discovered and loaded.
    pub fn resolve_imports(&mut self, path: &Path) -> GraphResult<()> {
        let mut pending = vec![path.to_path_buf()];
        let mut seen = HashSet::new();

        while let Some(current) = pending.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(address) = self.by_path.get(&current).cloned() else {
                continue;
            };
            let specifiers: Vec<String> = self.files[&address]
                .document
                .iter()
                .flat_map(|doc| doc.imports())
                .map(|import| import.source.clone())
                .collect();

            let mut edges = Vec::new();
            for specifier in specifiers {
                let Some(target) = resolve_import_path(&specifier, &current, self.fs.as_ref())
                else {
                    continue;
                };
                if !self.by_path.contains_key(&target) {
                    self.load_file(&target)?;
                    pending.push(target.clone());
                }
                edges.push(ImportEdge {
                    specifier,
                    target: get_document_id(&target.to_string_lossy()),
                    path: target,
                });
            }
            self.imports.insert(address, edges);
        }
        Ok(())
    }

    /// Read and parse one file, replacing its component set.
    ///
    /// Returns false when the file is not a known dialect.
    fn load_file(&mut self, path: &Path) -> GraphResult<bool> {
        let Some(dialect) = Dialect::from_path(path) else {
            return Ok(false);
        };
        let address = get_document_id(&path.to_string_lossy());

        let (source, document, parse_error) = match self.fs.read_to_string(path) {
            Ok(source) => match parse(&source, dialect) {
                Ok(doc) => (source, Some(doc), None),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse file");
                    (source, None, Some(e.to_string()))
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
                (String::new(), None, Some(e.to_string()))
            }
        };

        for component in self.declares.remove(&address).unwrap_or_default() {
            self.components.remove(&component);
            self.declared_by.remove(&component);
        }

        let declared = document
            .as_ref()
            .map(|doc| collect_components(doc, path))
            .unwrap_or_default();
        let mut component_addresses = Vec::with_capacity(declared.len());
        for component in declared {
            component_addresses.push(component.address.clone());
            self.declared_by
                .insert(component.address.clone(), address.clone());
            self.components.insert(component.address.clone(), component);
        }

        tracing::debug!(
            path = %path.display(),
            components = component_addresses.len(),
            "Loaded file"
        );

        self.declares.insert(address.clone(), component_addresses);
        self.by_path.insert(path.to_path_buf(), address.clone());
        self.files.insert(
            address.clone(),
            FileNode {
                address,
                path: path.to_path_buf(),
                dialect,
                source,
                document,
                parse_error,
            },
        );
        Ok(true)
    }

    // Lookups

    pub fn file(&self, address: &str) -> Option<&FileNode> {
        self.files.get(address)
    }

    pub fn file_by_path(&self, path: &Path) -> Option<&FileNode> {
        self.files.get(self.by_path.get(path)?)
    }

    pub fn component(&self, address: &str) -> Option<&ComponentNode> {
        self.components.get(address)
    }

    /// Components declared by a file (first neighbours)
    pub fn components_of_file(&self, file_address: &str) -> Vec<&ComponentNode> {
        self.declares
            .get(file_address)
            .map(|addresses| {
                addresses
                    .iter()
                    .filter_map(|address| self.components.get(address))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The file that declares a component (second neighbour)
    pub fn file_of_component(&self, component_address: &str) -> Option<&FileNode> {
        self.files.get(self.declared_by.get(component_address)?)
    }

    /// Outgoing `ImportsFile` edges, skipping stale targets
    pub fn imports_of(&self, file_address: &str) -> Vec<&ImportEdge> {
        self.imports
            .get(file_address)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|edge| self.files.contains_key(&edge.target))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn imported_files(&self, file_address: &str) -> Vec<&FileNode> {
        self.imports_of(file_address)
            .into_iter()
            .filter_map(|edge| self.files.get(&edge.target))
            .collect()
    }

    /// Target of an import specifier used by a file, if it resolved
    pub fn import_target(&self, file_address: &str, specifier: &str) -> Option<&FileNode> {
        self.imports_of(file_address)
            .into_iter()
            .find(|edge| edge.specifier == specifier)
            .and_then(|edge| self.files.get(&edge.target))
    }

    /// Resolve a component by (name, declaring path)
    pub fn find_component(&self, path: &Path, name: &str) -> Option<&ComponentNode> {
        self.components
            .get(&get_component_id(&path.to_string_lossy(), name))
    }

    pub fn default_component(&self, path: &Path) -> Option<&ComponentNode> {
        let file = self.file_by_path(path)?;
        self.components_of_file(&file.address)
            .into_iter()
            .find(|component| component.export_kind == ExportKind::Default)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.files.values()
    }

    /// All UI components, sorted by name then path
    pub fn ui_components(&self) -> Vec<&ComponentNode> {
        let mut components: Vec<_> = self
            .components
            .values()
            .filter(|component| component.is_component)
            .collect();
        components.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        components
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

fn collect_components(doc: &Document, path: &Path) -> Vec<ComponentNode> {
    let path_str = path.to_string_lossy();
    let mut seen = HashSet::new();
    doc.functions()
        .filter(|(_, decl)| seen.insert(decl.name.clone()))
        .map(|(item, decl)| {
            let has_markup = doc.items[item].code.has_markup();
            let uppercase = decl
                .name
                .chars()
                .next()
                .map(|c| c.is_ascii_uppercase())
                .unwrap_or(false);
            ComponentNode {
                address: get_component_id(&path_str, &decl.name),
                name: decl.name.clone(),
                export_kind: doc.export_kind_of(&decl.name),
                is_component: uppercase && has_markup,
                path: path.to_path_buf(),
                item,
            }
        })
        .collect()
}

impl std::fmt::Debug for SourceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceGraph")
            .field("root", &self.root)
            .field("files", &self.files.len())
            .field("components", &self.components.len())
            .finish()
    }
}
