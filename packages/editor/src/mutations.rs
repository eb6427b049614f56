//! # Mutations
//!
//! Structural edits addressed by hierarchy path.
//!
//! Every mutation resolves its path(s) against the graph first and
//! edits working copies only; a path that does not resolve rejects the
//! whole mutation before anything is staged.
//!
//! Positions inside a document are plain [`NodePath`]s, so edits that
//! touch one document twice fix up the second path after the first
//! edit. Import statements are inserted last because they shift item
//! indices.

use crate::errors::{EditorError, EditorResult};
use crate::hierarchy::{describe_path, HierarchyId, HierarchyPosition};
use crate::pipeline::ChangeSet;
use crate::traversal::{resolve, NodeLocator};
use ecu_common::{normalize_path, relative_specifier};
use ecu_graph::{resolve_import_path, ComponentNode, SourceGraph};
use ecu_parser::ast::*;
use ecu_parser::{get_component_id, parse, NodePath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings a mutation needs besides the graph
#[derive(Debug, Clone)]
pub struct MutationContext<'a> {
    pub attribute: &'a str,
    /// Absolute directory new components are created in
    pub components_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MutationOutput {
    Address(String),
    Addresses(Vec<String>),
    Done(bool),
}

/// One editing operation
pub trait Operation {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput>;

    /// One-line summary for the history log
    fn describe(&self, graph: &SourceGraph) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddComponent {
    pub source_component_address: String,
    pub target_component_address: String,
    pub hierarchy_ids: Vec<HierarchyId>,
    pub hierarchy_position: HierarchyPosition,
    #[serde(default)]
    pub component_delta: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteComponent {
    pub source_component_address: String,
    pub hierarchy_ids: Vec<HierarchyId>,
    #[serde(default)]
    pub component_delta: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveComponent {
    pub source_component_address: String,
    pub source_hierarchy_ids: Vec<HierarchyId>,
    pub target_hierarchy_ids: Vec<HierarchyId>,
    pub hierarchy_position: HierarchyPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextValue {
    pub source_component_address: String,
    pub hierarchy_ids: Vec<HierarchyId>,
    pub value: String,
}

/// Set a string attribute, or remove it when `value` is absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttribute {
    pub source_component_address: String,
    pub hierarchy_ids: Vec<HierarchyId>,
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponent {
    pub name: String,
}

/// Every mutation, as recorded in the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    AddComponent(AddComponent),
    DeleteComponent(DeleteComponent),
    MoveComponent(MoveComponent),
    UpdateTextValue(UpdateTextValue),
    UpdateAttribute(UpdateAttribute),
    CreateComponent(CreateComponent),
}

impl Mutation {
    fn operation(&self) -> &dyn Operation {
        match self {
            Mutation::AddComponent(op) => op,
            Mutation::DeleteComponent(op) => op,
            Mutation::MoveComponent(op) => op,
            Mutation::UpdateTextValue(op) => op,
            Mutation::UpdateAttribute(op) => op,
            Mutation::CreateComponent(op) => op,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddComponent(_) => "addComponent",
            Mutation::DeleteComponent(_) => "deleteComponent",
            Mutation::MoveComponent(_) => "moveComponent",
            Mutation::UpdateTextValue(_) => "updateTextValue",
            Mutation::UpdateAttribute(_) => "updateAttribute",
            Mutation::CreateComponent(_) => "createComponent",
        }
    }
}

impl Operation for Mutation {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput> {
        self.operation().apply(changes, cx)
    }

    fn describe(&self, graph: &SourceGraph) -> String {
        self.operation().describe(graph)
    }
}

// Shared helpers

fn locate(
    graph: &SourceGraph,
    cx: &MutationContext<'_>,
    root: &str,
    ids: &[HierarchyId],
    delta: i32,
) -> EditorResult<NodeLocator> {
    if ids.is_empty() {
        return Err(EditorError::invalid("a hierarchy path is required"));
    }
    let found = resolve(graph, cx.attribute, root, ids)
        .found()
        .ok_or_else(|| EditorError::not_found(format!("hierarchy path {}", describe_path(ids))))?;
    found.select(delta).cloned().ok_or_else(|| {
        EditorError::not_found(format!(
            "component delta {} at {}",
            delta,
            describe_path(ids)
        ))
    })
}

fn place(doc: &mut Document, path: &NodePath, node: Node, position: HierarchyPosition) -> bool {
    match position {
        HierarchyPosition::Before => doc.insert_sibling(path, node, false),
        HierarchyPosition::After => doc.insert_sibling(path, node, true),
        HierarchyPosition::Children => doc.append_child(path, node),
        HierarchyPosition::Parent => match node {
            Node::Element(mut wrapper) => doc.replace_node(path, move |existing| {
                wrapper.push_child(existing);
                Node::Element(wrapper)
            }),
            _ => false,
        },
    }
}

/// Insert an import statement after the existing ones.
///
/// Blank lines that followed the last import stay after the new one.
fn insert_import(doc: &mut Document, decl: ImportDecl, mut statement: String) {
    let index = doc.import_insertion_index();
    if index == 0 {
        statement.push('\n');
    } else if let Some(Segment::Raw(text)) = doc.items[index - 1].code.segments.last_mut() {
        let content_len = text.trim_end().len();
        if let Some(newline) = text[content_len..].find('\n') {
            let cut = content_len + newline + 1;
            statement.push_str(&text[cut..]);
            text.truncate(cut);
        }
    }
    doc.items.insert(
        index,
        Item {
            kind: ItemKind::Import(decl),
            code: Code::raw(statement),
        },
    );
}

fn binding_statement(local: &str, kind: ExportKind, imported: &str, specifier: &str) -> Option<(ImportDecl, String)> {
    let mut decl = ImportDecl {
        source: specifier.to_string(),
        ..ImportDecl::default()
    };
    let statement = match kind {
        ExportKind::Default => {
            decl.default = Some(local.to_string());
            format!("import {} from \"{}\";\n", local, specifier)
        }
        ExportKind::Named => {
            decl.named.push(ImportSpecifier {
                imported: imported.to_string(),
                local: local.to_string(),
            });
            if imported == local {
                format!("import {{ {} }} from \"{}\";\n", local, specifier)
            } else {
                format!("import {{ {} as {} }} from \"{}\";\n", imported, local, specifier)
            }
        }
        ExportKind::None => return None,
    };
    Some((decl, statement))
}

fn is_bound(doc: &Document, name: &str) -> bool {
    doc.imports().any(|import| import.binds(name)) || doc.find_function(name).is_some()
}

/// Local name under which `component` is usable from `file`, and the
/// import needed to make it so
fn component_binding(
    graph: &SourceGraph,
    doc: &Document,
    file: &Path,
    component: &ComponentNode,
) -> EditorResult<(String, Option<(ImportDecl, String)>)> {
    if component.path == file {
        return Ok((component.name.clone(), None));
    }

    for import in doc.imports().filter(|import| import.is_relative()) {
        let target = resolve_import_path(&import.source, file, graph.fs());
        if target.as_deref() != Some(component.path.as_path()) {
            continue;
        }
        let existing = match component.export_kind {
            ExportKind::Default => import.default.clone(),
            ExportKind::Named => import
                .named
                .iter()
                .find(|specifier| specifier.imported == component.name)
                .map(|specifier| specifier.local.clone()),
            ExportKind::None => None,
        };
        if let Some(local) = existing {
            return Ok((local, None));
        }
    }

    if is_bound(doc, &component.name) {
        return Err(EditorError::invalid(format!(
            "{} is already bound in {}",
            component.name,
            file.display()
        )));
    }
    let specifier = relative_specifier(file, &component.path);
    let import = binding_statement(&component.name, component.export_kind, &component.name, &specifier)
        .ok_or_else(|| EditorError::invalid(format!("{} is not exported", component.name)))?;
    Ok((component.name.clone(), Some(import)))
}

/// Import needed in `to_doc` for an element moved from `from_file`
fn carried_import(
    graph: &SourceGraph,
    from_doc: &Document,
    from_file: &Path,
    to_doc: &Document,
    to_file: &Path,
    node: &Node,
) -> Option<(ImportDecl, String)> {
    let local = node.as_element()?.base_name();
    if is_bound(to_doc, local) {
        return None;
    }
    let import = from_doc
        .imports()
        .filter(|import| import.is_relative())
        .find(|import| import.binds(local))?;
    let target = resolve_import_path(&import.source, from_file, graph.fs())?;
    let specifier = relative_specifier(to_file, &target);

    if import.default.as_deref() == Some(local) {
        return binding_statement(local, ExportKind::Default, local, &specifier);
    }
    if import.namespace.as_deref() == Some(local) {
        let decl = ImportDecl {
            namespace: Some(local.to_string()),
            source: specifier.clone(),
            ..ImportDecl::default()
        };
        return Some((decl, format!("import * as {} from \"{}\";\n", local, specifier)));
    }
    let named = import.named.iter().find(|specifier| specifier.local == local)?;
    binding_statement(local, ExportKind::Named, &named.imported, &specifier)
}

fn text_node(value: &str) -> Node {
    if value.contains(['{', '}', '<', '>', '\n']) {
        Node::Expression(Code::raw(quote_js_string(value)))
    } else {
        Node::Text(value.to_string())
    }
}

/// Text an editor user sees: raw text or a string literal container
fn is_text_content(node: &Node) -> bool {
    match node {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Expression(code) if !code.has_markup() => {
            let script = code.script_text();
            let script = script.trim();
            script.len() >= 2
                && ['"', '\'', '`']
                    .iter()
                    .any(|quote| script.starts_with(*quote) && script.ends_with(*quote))
        }
        _ => false,
    }
}

fn component_label(graph: &SourceGraph, address: &str) -> String {
    graph
        .component(address)
        .map(|component| component.name.clone())
        .unwrap_or_else(|| address.to_string())
}

// Operations

impl Operation for AddComponent {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput> {
        let graph = changes.graph();
        let component = graph.component(&self.target_component_address).ok_or_else(|| {
            EditorError::not_found(format!("component {}", self.target_component_address))
        })?;
        let locator = locate(
            graph,
            cx,
            &self.source_component_address,
            &self.hierarchy_ids,
            self.component_delta,
        )?;

        let (local, import) =
            component_binding(graph, changes.document(&locator.file)?, &locator.file, component)?;

        let doc = changes.document_mut(&locator.file)?;
        let node = Node::Element(Element::new(local));
        if !place(doc, &locator.path, node, self.hierarchy_position) {
            return Err(EditorError::invalid(format!(
                "cannot add {} {} {}",
                component.name,
                self.hierarchy_position,
                describe_path(&self.hierarchy_ids)
            )));
        }
        if let Some((decl, statement)) = import {
            insert_import(doc, decl, statement);
        }
        Ok(MutationOutput::Address(locator.owner))
    }

    fn describe(&self, graph: &SourceGraph) -> String {
        format!(
            "Add <{}> {} {}",
            component_label(graph, &self.target_component_address),
            self.hierarchy_position,
            describe_path(&self.hierarchy_ids)
        )
    }
}

impl Operation for DeleteComponent {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput> {
        let locator = locate(
            changes.graph(),
            cx,
            &self.source_component_address,
            &self.hierarchy_ids,
            self.component_delta,
        )?;
        changes
            .document_mut(&locator.file)?
            .remove_node(&locator.path)
            .ok_or_else(|| {
                EditorError::invalid(format!("cannot delete {}", describe_path(&self.hierarchy_ids)))
            })?;
        Ok(MutationOutput::Address(locator.owner))
    }

    fn describe(&self, _graph: &SourceGraph) -> String {
        format!("Delete {}", describe_path(&self.hierarchy_ids))
    }
}

impl Operation for MoveComponent {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput> {
        let graph = changes.graph();
        let root = &self.source_component_address;
        let source = locate(graph, cx, root, &self.source_hierarchy_ids, 0)?;
        let target = locate(graph, cx, root, &self.target_hierarchy_ids, 0)?;
        let same_file = source.file == target.file;

        if same_file && target.path.starts_with(&source.path) {
            return Err(EditorError::invalid("cannot move an element into itself"));
        }

        let node = changes
            .document_mut(&source.file)?
            .remove_node(&source.path)
            .ok_or_else(|| EditorError::invalid("source is not a movable node"))?;

        let target_path = if same_file {
            target
                .path
                .adjust_after_removal(&source.path)
                .ok_or_else(|| EditorError::invalid("target is inside the moved element"))?
        } else {
            target.path.clone()
        };

        let import = if same_file {
            None
        } else {
            carried_import(
                graph,
                changes.document(&source.file)?,
                &source.file,
                changes.document(&target.file)?,
                &target.file,
                &node,
            )
        };

        let doc = changes.document_mut(&target.file)?;
        if !place(doc, &target_path, node, self.hierarchy_position) {
            return Err(EditorError::invalid(format!(
                "cannot move {} {}",
                self.hierarchy_position,
                describe_path(&self.target_hierarchy_ids)
            )));
        }
        if let Some((decl, statement)) = import {
            insert_import(doc, decl, statement);
        }

        let mut owners = vec![source.owner];
        if !owners.contains(&target.owner) {
            owners.push(target.owner);
        }
        Ok(MutationOutput::Addresses(owners))
    }

    fn describe(&self, _graph: &SourceGraph) -> String {
        format!(
            "Move {} {} {}",
            describe_path(&self.source_hierarchy_ids),
            self.hierarchy_position,
            describe_path(&self.target_hierarchy_ids)
        )
    }
}

impl Operation for UpdateTextValue {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput> {
        let locator = locate(
            changes.graph(),
            cx,
            &self.source_component_address,
            &self.hierarchy_ids,
            0,
        )?;
        let element = changes
            .document_mut(&locator.file)?
            .element_mut(&locator.path)
            .ok_or_else(|| EditorError::invalid("target is not an element"))?;

        let content: Vec<usize> = element
            .children
            .iter()
            .enumerate()
            .filter(|(_, child)| is_text_content(child))
            .map(|(index, _)| index)
            .collect();

        let (Some(&first), Some(&last)) = (content.first(), content.last()) else {
            // Only whitespace or markup: fill the first blank slot
            let blank = element.children.iter().position(|child| matches!(child, Node::Text(_)));
            match (blank, text_node(&self.value)) {
                (Some(index), Node::Text(value)) => {
                    if let Node::Text(old) = &mut element.children[index] {
                        old.push_str(&value);
                    }
                }
                (_, node) => element.push_child(node),
            }
            return Ok(MutationOutput::Done(true));
        };

        // Keep the indentation around the old text
        let leading = match &element.children[first] {
            Node::Text(old) => old[..old.len() - old.trim_start().len()].to_string(),
            _ => String::new(),
        };
        let trailing = match &element.children[last] {
            Node::Text(old) => old[old.trim_end().len()..].to_string(),
            _ => String::new(),
        };
        let replacement = match text_node(&self.value) {
            Node::Text(value) => vec![Node::Text(format!("{}{}{}", leading, value, trailing))],
            node => [Node::Text(leading), node, Node::Text(trailing)]
                .into_iter()
                .filter(|node| !matches!(node, Node::Text(text) if text.is_empty()))
                .collect(),
        };

        for index in content.into_iter().rev() {
            element.children.remove(index);
        }
        for (offset, node) in replacement.into_iter().enumerate() {
            element.children.insert(first + offset, node);
        }
        Ok(MutationOutput::Done(true))
    }

    fn describe(&self, _graph: &SourceGraph) -> String {
        format!(
            "Update text of {} to {:?}",
            describe_path(&self.hierarchy_ids),
            self.value
        )
    }
}

impl Operation for UpdateAttribute {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput> {
        if self.name == cx.attribute {
            return Err(EditorError::invalid(format!("{} is managed by the editor", self.name)));
        }
        if self.name.is_empty() || self.name.contains(char::is_whitespace) {
            return Err(EditorError::invalid(format!("bad attribute name {:?}", self.name)));
        }
        let locator = locate(
            changes.graph(),
            cx,
            &self.source_component_address,
            &self.hierarchy_ids,
            0,
        )?;
        let element = changes
            .document_mut(&locator.file)?
            .element_mut(&locator.path)
            .ok_or_else(|| EditorError::invalid("target is not an element"))?;

        let changed = match &self.value {
            Some(value) => {
                element.set_attribute(&self.name, value);
                true
            }
            None => element.remove_attribute(&self.name),
        };
        Ok(MutationOutput::Done(changed))
    }

    fn describe(&self, _graph: &SourceGraph) -> String {
        match &self.value {
            Some(value) => format!(
                "Set {}={:?} on {}",
                self.name,
                value,
                describe_path(&self.hierarchy_ids)
            ),
            None => format!("Remove {} from {}", self.name, describe_path(&self.hierarchy_ids)),
        }
    }
}

/// Source of a freshly created component
pub fn component_template(name: &str) -> String {
    format!(
        "import type {{ ComponentProps }} from \"react\";\n\nexport default function {name}(props: ComponentProps<\"div\">) {{\n  return <div {{...props}}>A div component</div>;\n}}\n"
    )
}

fn is_component_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl CreateComponent {
    pub fn path(&self, components_dir: &Path) -> PathBuf {
        normalize_path(&components_dir.join(format!("{}.tsx", self.name)))
    }
}

impl Operation for CreateComponent {
    fn apply(&self, changes: &mut ChangeSet<'_>, cx: &MutationContext<'_>) -> EditorResult<MutationOutput> {
        if !is_component_name(&self.name) {
            return Err(EditorError::invalid(format!(
                "{:?} is not a valid component name",
                self.name
            )));
        }
        let path = self.path(cx.components_dir);
        if changes.graph().fs().exists(&path) || changes.graph().file_by_path(&path).is_some() {
            return Err(EditorError::invalid(format!("{} already exists", path.display())));
        }

        let source = component_template(&self.name);
        let doc = parse(&source, Dialect::Tsx).map_err(|source| EditorError::Parse {
            path: path.clone(),
            source,
        })?;
        let address = get_component_id(&path.to_string_lossy(), &self.name);
        changes.create(path, doc);
        Ok(MutationOutput::Address(address))
    }

    fn describe(&self, _graph: &SourceGraph) -> String {
        format!("Create component {}", self.name)
    }
}
