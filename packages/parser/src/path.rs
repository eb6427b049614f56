//! Positional locators for markup nodes inside a [`Document`].
//!
//! A [`NodePath`] is only meaningful for the tree it was computed
//! against. Any structural edit invalidates paths that pass through the
//! edited container; use [`NodePath::adjust_after_removal`] when two
//! edits must be applied to the same tree.

use crate::ast::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    /// Top-level item of the document
    Item(usize),
    /// Markup segment inside a code block
    Segment(usize),
    /// Child of an element or fragment
    Child(usize),
    /// Attribute of an element (followed by a `Segment`)
    Attribute(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodePath(pub Vec<Step>);

impl NodePath {
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn join(&self, step: Step) -> Self {
        let mut steps = self.0.clone();
        steps.push(step);
        Self(steps)
    }

    pub fn parent_steps(&self) -> &[Step] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    pub fn last(&self) -> Option<Step> {
        self.0.last().copied()
    }

    /// Item index the path starts from
    pub fn item(&self) -> Option<usize> {
        match self.0.first() {
            Some(Step::Item(index)) => Some(*index),
            _ => None,
        }
    }

    pub fn starts_with(&self, other: &NodePath) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Recompute this path after the node at `removed` was detached.
    ///
    /// Returns `None` when this path pointed into the removed subtree.
    pub fn adjust_after_removal(&self, removed: &NodePath) -> Option<NodePath> {
        if self.starts_with(removed) {
            return None;
        }
        let depth = removed.0.len();
        let mut steps = self.0.clone();
        let Some(Step::Child(removed_index)) = removed.last() else {
            return Some(NodePath(steps));
        };
        if steps.len() >= depth && steps[..depth - 1] == removed.0[..depth - 1] {
            if let Step::Child(index) = steps[depth - 1] {
                if index > removed_index {
                    steps[depth - 1] = Step::Child(index - 1);
                }
            }
        }
        Some(NodePath(steps))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match step {
                Step::Item(n) => write!(f, "item{}", n)?,
                Step::Segment(n) => write!(f, "seg{}", n)?,
                Step::Child(n) => write!(f, "{}", n)?,
                Step::Attribute(n) => write!(f, "attr{}", n)?,
            }
        }
        Ok(())
    }
}

enum Cursor<'a> {
    Code(&'a Code),
    Node(&'a Node),
    Attribute(&'a Attribute),
}

enum CursorMut<'a> {
    Code(&'a mut Code),
    Node(&'a mut Node),
    Attribute(&'a mut Attribute),
}

fn markup_segment(code: &Code, index: usize) -> Option<&Node> {
    match code.segments.get(index)? {
        Segment::Markup(node) => Some(node),
        Segment::Raw(_) => None,
    }
}

fn markup_segment_mut(code: &mut Code, index: usize) -> Option<&mut Node> {
    match code.segments.get_mut(index)? {
        Segment::Markup(node) => Some(node),
        Segment::Raw(_) => None,
    }
}

fn step<'a>(cursor: Cursor<'a>, step: Step) -> Option<Cursor<'a>> {
    match (cursor, step) {
        (Cursor::Code(code), Step::Segment(i)) => markup_segment(code, i).map(Cursor::Node),
        (Cursor::Node(Node::Element(element)), Step::Child(i)) => {
            element.children.get(i).map(Cursor::Node)
        }
        (Cursor::Node(Node::Fragment(fragment)), Step::Child(i)) => {
            fragment.children.get(i).map(Cursor::Node)
        }
        (Cursor::Node(Node::Element(element)), Step::Attribute(i)) => {
            element.attributes.get(i).map(Cursor::Attribute)
        }
        (Cursor::Node(Node::Expression(code)), Step::Segment(i)) => {
            markup_segment(code, i).map(Cursor::Node)
        }
        (Cursor::Attribute(attr), Step::Segment(i)) => {
            attr.code().and_then(|code| markup_segment(code, i)).map(Cursor::Node)
        }
        _ => None,
    }
}

fn step_mut<'a>(cursor: CursorMut<'a>, step: Step) -> Option<CursorMut<'a>> {
    match (cursor, step) {
        (CursorMut::Code(code), Step::Segment(i)) => {
            markup_segment_mut(code, i).map(CursorMut::Node)
        }
        (CursorMut::Node(Node::Element(element)), Step::Child(i)) => {
            element.children.get_mut(i).map(CursorMut::Node)
        }
        (CursorMut::Node(Node::Fragment(fragment)), Step::Child(i)) => {
            fragment.children.get_mut(i).map(CursorMut::Node)
        }
        (CursorMut::Node(Node::Element(element)), Step::Attribute(i)) => {
            element.attributes.get_mut(i).map(CursorMut::Attribute)
        }
        (CursorMut::Node(Node::Expression(code)), Step::Segment(i)) => {
            markup_segment_mut(code, i).map(CursorMut::Node)
        }
        (CursorMut::Attribute(attr), Step::Segment(i)) => attr
            .code_mut()
            .and_then(|code| markup_segment_mut(code, i))
            .map(CursorMut::Node),
        _ => None,
    }
}

impl Document {
    fn cursor(&self, steps: &[Step]) -> Option<Cursor<'_>> {
        let (first, rest) = steps.split_first()?;
        let Step::Item(index) = first else {
            return None;
        };
        let mut cursor = Cursor::Code(&self.items.get(*index)?.code);
        for s in rest {
            cursor = step(cursor, *s)?;
        }
        Some(cursor)
    }

    fn cursor_mut(&mut self, steps: &[Step]) -> Option<CursorMut<'_>> {
        let (first, rest) = steps.split_first()?;
        let Step::Item(index) = first else {
            return None;
        };
        let mut cursor = CursorMut::Code(&mut self.items.get_mut(*index)?.code);
        for s in rest {
            cursor = step_mut(cursor, *s)?;
        }
        Some(cursor)
    }

    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        match self.cursor(&path.0)? {
            Cursor::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        match self.cursor_mut(&path.0)? {
            CursorMut::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn element(&self, path: &NodePath) -> Option<&Element> {
        self.node(path)?.as_element()
    }

    pub fn element_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
        self.node_mut(path)?.as_element_mut()
    }

    /// Detach the node at `path`.
    ///
    /// Children are removed from their parent. A markup root embedded in
    /// script code is replaced with `null` so the surrounding expression
    /// stays valid.
    pub fn remove_node(&mut self, path: &NodePath) -> Option<Node> {
        let last = path.last()?;
        match (self.cursor_mut(path.parent_steps())?, last) {
            (CursorMut::Node(Node::Element(element)), Step::Child(i))
                if i < element.children.len() =>
            {
                Some(element.children.remove(i))
            }
            (CursorMut::Node(Node::Fragment(fragment)), Step::Child(i))
                if i < fragment.children.len() =>
            {
                Some(fragment.children.remove(i))
            }
            (cursor, Step::Segment(i)) => {
                let code = match cursor {
                    CursorMut::Code(code) => code,
                    CursorMut::Node(Node::Expression(code)) => code,
                    CursorMut::Attribute(attr) => attr.code_mut()?,
                    _ => return None,
                };
                match code.segments.get(i) {
                    Some(Segment::Markup(_)) => {}
                    _ => return None,
                }
                match std::mem::replace(&mut code.segments[i], Segment::Raw("null".to_string())) {
                    Segment::Markup(node) => Some(node),
                    Segment::Raw(_) => None,
                }
            }
            _ => None,
        }
    }

    /// Insert `node` next to the node at `path`.
    ///
    /// A markup root embedded in script code has no sibling list, so it
    /// is wrapped in a fragment together with the new node.
    pub fn insert_sibling(&mut self, path: &NodePath, node: Node, after: bool) -> bool {
        let Some(last) = path.last() else {
            return false;
        };
        if let Step::Segment(_) = last {
            return self.replace_node(path, |existing| {
                let children = if after {
                    vec![existing, node]
                } else {
                    vec![node, existing]
                };
                Node::Fragment(Fragment::new(children))
            });
        }
        let Step::Child(i) = last else {
            return false;
        };
        let index = if after { i + 1 } else { i };
        match self.cursor_mut(path.parent_steps()) {
            Some(CursorMut::Node(Node::Element(element))) if i < element.children.len() => {
                element.children.insert(index, node);
                true
            }
            Some(CursorMut::Node(Node::Fragment(fragment))) if i < fragment.children.len() => {
                fragment.children.insert(index, node);
                true
            }
            _ => false,
        }
    }

    /// Replace the node at `path` with the result of `f`
    pub fn replace_node(&mut self, path: &NodePath, f: impl FnOnce(Node) -> Node) -> bool {
        match self.node_mut(path) {
            Some(slot) => {
                let existing = std::mem::replace(slot, Node::Text(String::new()));
                *slot = f(existing);
                true
            }
            None => false,
        }
    }

    /// Append `node` as the last child of the element or fragment at `path`
    pub fn append_child(&mut self, path: &NodePath, node: Node) -> bool {
        match self.node_mut(path) {
            Some(Node::Element(element)) => {
                element.push_child(node);
                true
            }
            Some(Node::Fragment(fragment)) => {
                fragment.children.push(node);
                true
            }
            _ => false,
        }
    }
}
