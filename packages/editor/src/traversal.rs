//! # Traversal Engine
//!
//! Resolves `(root component, hierarchy path)` to a node location by
//! walking the rendered tree in document order:
//!
//! ```text
//!   Root.tsx  <main>            Root:0#0
//!               <Card>  ──────▶ Card.tsx  <section>   Card:0#0
//!                                           {children} ─┐
//!                 <p>  ◀────────────────────────────────┘  Root:0_0#0
//! ```
//!
//! A path is the chain of addressed elements from the root down to the
//! target, as they nest once rendered. Every addressed element bumps a
//! per-traversal occurrence counter, so repeated instances of an
//! imported component yield distinct ids. Elements bound by a relative
//! import are crossed into; a `{children}` placeholder inside the
//! crossed component walks the caller's literal children back in the
//! caller's frame.

use crate::hierarchy::{HierarchyAddress, HierarchyId};
use ecu_common::{ChildrenPlaceholderCounter, Visitor};
use ecu_graph::{ComponentNode, FileNode, SourceGraph};
use ecu_parser::ast::{Code, Document, Element, Node};
use ecu_parser::{NodePath, Step};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::rc::Rc;

/// Where a node lives: file, position in the file's tree, owning component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLocator {
    pub file: PathBuf,
    pub path: NodePath,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HierarchyItem {
    /// Entered a component declared in `file`
    Component {
        address: String,
        name: String,
        label: String,
        file: PathBuf,
    },
    /// Reached an addressed element
    Element {
        id: HierarchyId,
        label: String,
        owner_address: String,
        owner_name: String,
        locator: NodeLocator,
    },
}

impl HierarchyItem {
    pub fn label(&self) -> &str {
        match self {
            HierarchyItem::Component { label, .. } | HierarchyItem::Element { label, .. } => label,
        }
    }

    pub fn id(&self) -> Option<&HierarchyId> {
        match self {
            HierarchyItem::Element { id, .. } => Some(id),
            HierarchyItem::Component { .. } => None,
        }
    }
}

/// A reference element the traversal crossed through
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub locator: NodeLocator,
    pub component: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Found {
    pub route: Vec<HierarchyItem>,
    /// `None` for an empty path
    pub target: Option<NodeLocator>,
    /// Crossings enclosing the target, outermost first
    pub crossings: Vec<Crossing>,
    pub files: Vec<PathBuf>,
    /// Addressed elements one level below the target
    pub children: Vec<HierarchyItem>,
}

impl Found {
    /// Pick the node a `componentDelta` refers to.
    ///
    /// `0` is the target itself, `-k` the k-th enclosing reference
    /// element counting outward.
    pub fn select(&self, delta: i32) -> Option<&NodeLocator> {
        if delta > 0 {
            return None;
        }
        if delta == 0 {
            return self.target.as_ref();
        }
        let k = delta.unsigned_abs() as usize;
        let index = self.crossings.len().checked_sub(k)?;
        self.crossings.get(index).map(|crossing| &crossing.locator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Found),
    NotFound,
}

impl Resolution {
    pub fn found(self) -> Option<Found> {
        match self {
            Resolution::Found(found) => Some(found),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Default,
    Named(String),
    Namespace,
}

/// Local name -> (declaring file, how it was imported)
#[derive(Debug, Default)]
struct ImportTable {
    entries: HashMap<String, (PathBuf, Binding)>,
}

impl ImportTable {
    fn build(graph: &SourceGraph, file: &FileNode, doc: &Document) -> Self {
        let mut entries = HashMap::new();
        for import in doc.imports().filter(|import| import.is_relative()) {
            let Some(target) = graph.import_target(&file.address, &import.source) else {
                tracing::debug!(
                    file = %file.path.display(),
                    specifier = %import.source,
                    "Import target missing"
                );
                continue;
            };
            if let Some(local) = &import.default {
                entries.insert(local.clone(), (target.path.clone(), Binding::Default));
            }
            if let Some(local) = &import.namespace {
                entries.insert(local.clone(), (target.path.clone(), Binding::Namespace));
            }
            for specifier in &import.named {
                let binding = if specifier.imported == "default" {
                    Binding::Default
                } else {
                    Binding::Named(specifier.imported.clone())
                };
                entries.insert(specifier.local.clone(), (target.path.clone(), binding));
            }
        }
        Self { entries }
    }

    fn lookup<'g>(&self, graph: &'g SourceGraph, element_name: &str) -> Option<&'g ComponentNode> {
        let (base, member) = match element_name.split_once('.') {
            Some((base, member)) => (base, Some(member)),
            None => (element_name, None),
        };
        let (path, binding) = self.entries.get(base)?;
        let component = match (binding, member) {
            (Binding::Default, None) => graph.default_component(path),
            (Binding::Named(name), None) => graph.find_component(path, name),
            (Binding::Namespace, Some(member)) => graph.find_component(path, member),
            _ => None,
        }?;
        component.is_component.then_some(component)
    }
}

struct Slot<'g> {
    frame: usize,
    element: &'g Element,
    path: NodePath,
}

struct Frame<'g> {
    file: &'g FileNode,
    component: &'g ComponentNode,
    imports: Rc<ImportTable>,
    chain: Vec<Crossing>,
    slot: Option<Slot<'g>>,
    /// Number of `{children}` placeholders in the declaration
    forwards: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    /// On the requested route with this many ids matched
    On(usize),
    /// Off the route; only counting occurrences
    Off,
    /// Directly below the terminal; addressed elements are children
    Collect,
}

struct Terminal {
    locator: NodeLocator,
    chain: Vec<Crossing>,
}

struct Traversal<'g> {
    graph: &'g SourceGraph,
    attribute: &'g str,
    request: &'g [HierarchyId],
    frames: Vec<Frame<'g>>,
    imports: HashMap<String, Rc<ImportTable>>,
    occurrences: HashMap<String, usize>,
    labels: Vec<HashMap<String, usize>>,
    route: Vec<HierarchyItem>,
    children: Vec<HierarchyItem>,
    terminal: Option<Terminal>,
    ambiguous: bool,
}

/// Resolve a hierarchy path starting at `root`.
///
/// An empty path resolves to the root component itself, with its
/// top-level elements as children.
pub fn resolve(
    graph: &SourceGraph,
    attribute: &str,
    root: &str,
    request: &[HierarchyId],
) -> Resolution {
    let Some(component) = graph.component(root) else {
        return Resolution::NotFound;
    };
    let Some(file) = graph.file_of_component(root) else {
        return Resolution::NotFound;
    };

    let mut traversal = Traversal {
        graph,
        attribute,
        request,
        frames: Vec::new(),
        imports: HashMap::new(),
        occurrences: HashMap::new(),
        labels: vec![HashMap::new()],
        route: Vec::new(),
        children: Vec::new(),
        terminal: None,
        ambiguous: false,
    };

    let label = traversal.next_label(&component.name);
    traversal.route.push(HierarchyItem::Component {
        address: component.address.clone(),
        name: component.name.clone(),
        label,
        file: file.path.clone(),
    });

    let ctx = if request.is_empty() {
        Ctx::Collect
    } else {
        Ctx::On(0)
    };
    let _ = traversal.enter(file, component, Vec::new(), None, ctx, false);
    traversal.finish(file)
}

impl<'g> Traversal<'g> {
    fn finish(mut self, root_file: &FileNode) -> Resolution {
        if self.ambiguous {
            tracing::debug!("Ambiguous children pass-through, treating as not found");
            return Resolution::NotFound;
        }
        let mut files = vec![root_file.path.clone()];
        let (target, crossings) = match self.terminal.take() {
            Some(terminal) => (Some(terminal.locator), terminal.chain),
            None if self.request.is_empty() => (None, Vec::new()),
            None => return Resolution::NotFound,
        };

        for crossing in &crossings {
            let declaring = self
                .graph
                .file_of_component(&crossing.component)
                .map(|file| file.path.clone());
            for path in std::iter::once(crossing.locator.file.clone()).chain(declaring) {
                if !files.contains(&path) {
                    files.push(path);
                }
            }
        }
        if let Some(locator) = &target {
            if !files.contains(&locator.file) {
                files.push(locator.file.clone());
            }
        }

        Resolution::Found(Found {
            route: self.route,
            target,
            crossings,
            files,
            children: self.children,
        })
    }

    fn imports_for(&mut self, file: &'g FileNode, doc: &'g Document) -> Rc<ImportTable> {
        let graph = self.graph;
        self.imports
            .entry(file.address.clone())
            .or_insert_with(|| Rc::new(ImportTable::build(graph, file, doc)))
            .clone()
    }

    fn next_label(&mut self, name: &str) -> String {
        let index = self
            .labels
            .last_mut()
            .map(|scope| {
                let counter = scope.entry(name.to_string()).or_insert(0);
                let index = *counter;
                *counter += 1;
                index
            })
            .unwrap_or(0);
        format!("{}[{}]", name, index)
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self) -> ControlFlow<()>) -> ControlFlow<()> {
        self.labels.push(HashMap::new());
        let flow = f(self);
        self.labels.pop();
        flow
    }

    fn enter(
        &mut self,
        file: &'g FileNode,
        component: &'g ComponentNode,
        chain: Vec<Crossing>,
        slot: Option<Slot<'g>>,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        let Some(doc) = file.document.as_ref() else {
            return ControlFlow::Continue(());
        };
        let Some(item) = doc.items.get(component.item) else {
            return ControlFlow::Continue(());
        };

        let mut placeholders = ChildrenPlaceholderCounter::default();
        placeholders.visit_code(&item.code);

        let imports = self.imports_for(file, doc);
        self.frames.push(Frame {
            file,
            component,
            imports,
            chain,
            slot,
            forwards: placeholders.count,
        });
        let frame = self.frames.len() - 1;

        tracing::trace!(component = %component.name, ?ctx, "Entering component");
        let base = NodePath::new(vec![Step::Item(component.item)]);
        let flow = self.walk_code(frame, &item.code, &base, ctx, ambiguous);

        self.frames.pop();
        flow
    }

    fn walk_code(
        &mut self,
        frame: usize,
        code: &'g Code,
        path: &NodePath,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        for (index, node) in code.markup() {
            self.walk_node(frame, node, path.join(Step::Segment(index)), ctx, ambiguous)?;
        }
        ControlFlow::Continue(())
    }

    fn walk_node(
        &mut self,
        frame: usize,
        node: &'g Node,
        path: NodePath,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        match node {
            Node::Element(element) => self.walk_element(frame, element, path, ctx, ambiguous),
            Node::Fragment(fragment) => {
                for (index, child) in fragment.children.iter().enumerate() {
                    self.walk_node(frame, child, path.join(Step::Child(index)), ctx, ambiguous)?;
                }
                ControlFlow::Continue(())
            }
            Node::Expression(code) if code.is_children_placeholder() => {
                self.pass_through(frame, ctx, ambiguous)
            }
            Node::Expression(code) => self.walk_code(frame, code, &path, ctx, ambiguous),
            Node::Text(_) => ControlFlow::Continue(()),
        }
    }

    /// Walk the caller's literal children in the caller's frame
    fn pass_through(&mut self, frame: usize, ctx: Ctx, ambiguous: bool) -> ControlFlow<()> {
        let Some(slot) = self.frames[frame].slot.as_ref() else {
            return ControlFlow::Continue(());
        };
        let (outer, element, base) = (slot.frame, slot.element, slot.path.clone());
        let ambiguous = ambiguous || self.frames[frame].forwards > 1;

        for (index, child) in element.children.iter().enumerate() {
            self.walk_node(outer, child, base.join(Step::Child(index)), ctx, ambiguous)?;
        }
        ControlFlow::Continue(())
    }

    fn walk_element(
        &mut self,
        frame: usize,
        element: &'g Element,
        path: NodePath,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        if let Some((file, component)) = self.reference_target(frame, element) {
            return self.cross(frame, element, path, file, component, ctx, ambiguous);
        }
        match element
            .string_attribute(self.attribute)
            .and_then(|raw| HierarchyAddress::parse(&raw))
        {
            Some(address) => self.visit_addressed(frame, element, path, address, ctx, ambiguous),
            None => self.walk_contents(frame, element, &path, ctx, ambiguous),
        }
    }

    /// Attribute markup first, then children, as the addressing walk does
    fn walk_contents(
        &mut self,
        frame: usize,
        element: &'g Element,
        path: &NodePath,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        self.walk_attributes(frame, element, path, ctx, ambiguous)?;
        for (index, child) in element.children.iter().enumerate() {
            self.walk_node(frame, child, path.join(Step::Child(index)), ctx, ambiguous)?;
        }
        ControlFlow::Continue(())
    }

    fn walk_attributes(
        &mut self,
        frame: usize,
        element: &'g Element,
        path: &NodePath,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        for (index, attribute) in element.attributes.iter().enumerate() {
            if let Some(code) = attribute.code() {
                let base = path.join(Step::Attribute(index));
                self.walk_code(frame, code, &base, ctx, ambiguous)?;
            }
        }
        ControlFlow::Continue(())
    }

    fn reference_target(
        &self,
        frame: usize,
        element: &Element,
    ) -> Option<(&'g FileNode, &'g ComponentNode)> {
        let current = &self.frames[frame];
        let component = current.imports.lookup(self.graph, &element.name)?;

        let recursive = component.address == current.component.address
            || current
                .chain
                .iter()
                .any(|crossing| crossing.component == component.address);
        if recursive {
            tracing::debug!(component = %component.name, "Skipping recursive component");
            return None;
        }

        let file = self.graph.file_of_component(&component.address)?;
        file.document.as_ref()?;
        Some((file, component))
    }

    #[allow(clippy::too_many_arguments)]
    fn cross(
        &mut self,
        frame: usize,
        element: &'g Element,
        path: NodePath,
        file: &'g FileNode,
        component: &'g ComponentNode,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        self.walk_attributes(frame, element, &path, ctx, ambiguous)?;

        let label = self.next_label(&component.name);
        let outer = &self.frames[frame];
        let mut chain = outer.chain.clone();
        chain.push(Crossing {
            locator: NodeLocator {
                file: outer.file.path.clone(),
                path: path.clone(),
                owner: outer.component.address.clone(),
            },
            component: component.address.clone(),
            name: component.name.clone(),
        });

        let route_len = self.route.len();
        if let Ctx::On(_) = ctx {
            self.route.push(HierarchyItem::Component {
                address: component.address.clone(),
                name: component.name.clone(),
                label,
                file: file.path.clone(),
            });
        }

        let slot = Slot {
            frame,
            element,
            path,
        };
        let flow = self.enter(file, component, chain, Some(slot), ctx, ambiguous);
        if flow.is_continue() {
            self.route.truncate(route_len);
        }
        flow
    }

    fn visit_addressed(
        &mut self,
        frame: usize,
        element: &'g Element,
        path: NodePath,
        address: HierarchyAddress,
        ctx: Ctx,
        ambiguous: bool,
    ) -> ControlFlow<()> {
        let counter = self.occurrences.entry(address.to_string()).or_insert(0);
        let id = HierarchyId::new(address, *counter);
        *counter += 1;

        let label = self.next_label(&element.name);
        let current = &self.frames[frame];
        let locator = NodeLocator {
            file: current.file.path.clone(),
            path: path.clone(),
            owner: current.component.address.clone(),
        };
        let item = HierarchyItem::Element {
            id: id.clone(),
            label,
            owner_address: current.component.address.clone(),
            owner_name: current.component.name.clone(),
            locator: locator.clone(),
        };

        match ctx {
            Ctx::Collect => {
                // Unreachable by `resolve`, so not offered
                if !ambiguous {
                    self.children.push(item);
                }
                self.scoped(|t| t.walk_contents(frame, element, &path, Ctx::Off, ambiguous))
            }
            Ctx::On(matched) if self.request.get(matched) == Some(&id) => {
                if matched + 1 == self.request.len() {
                    if ambiguous {
                        self.ambiguous = true;
                        return ControlFlow::Break(());
                    }
                    tracing::debug!(%id, file = %locator.file.display(), "Resolved hierarchy path");
                    self.route.push(item);
                    self.terminal = Some(Terminal {
                        locator,
                        chain: self.frames[frame].chain.clone(),
                    });
                    let _ = self.scoped(|t| {
                        t.walk_contents(frame, element, &path, Ctx::Collect, ambiguous)
                    });
                    return ControlFlow::Break(());
                }

                let route_len = self.route.len();
                self.route.push(item);
                let flow = self.scoped(|t| {
                    t.walk_contents(frame, element, &path, Ctx::On(matched + 1), ambiguous)
                });
                if flow.is_continue() {
                    self.route.truncate(route_len);
                }
                flow
            }
            _ => self.scoped(|t| t.walk_contents(frame, element, &path, Ctx::Off, ambiguous)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(n: usize) -> NodeLocator {
        NodeLocator {
            file: PathBuf::from(format!("/p/{}.tsx", n)),
            path: NodePath::default(),
            owner: n.to_string(),
        }
    }

    #[test]
    fn test_select_component_delta() {
        let found = Found {
            target: Some(locator(0)),
            crossings: vec![
                Crossing {
                    locator: locator(1),
                    component: "a".to_string(),
                    name: "A".to_string(),
                },
                Crossing {
                    locator: locator(2),
                    component: "b".to_string(),
                    name: "B".to_string(),
                },
            ],
            ..Found::default()
        };
        assert_eq!(found.select(0), Some(&locator(0)));
        assert_eq!(found.select(-1), Some(&locator(2)));
        assert_eq!(found.select(-2), Some(&locator(1)));
        assert_eq!(found.select(-3), None);
        assert_eq!(found.select(1), None);
    }
}
