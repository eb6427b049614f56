use ecu_parser::ast::*;

/// Visitor pattern for traversing markup immutably
///
/// The default methods walk the whole tree in syntax order: an element's
/// attribute expressions come before its children. Override specific
/// visit_* methods to act on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_code(&mut self, code: &Code) {
        walk_code(self, code);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_element(self, element);
    }

    fn visit_fragment(&mut self, fragment: &Fragment) {
        walk_fragment(self, fragment);
    }

    fn visit_text(&mut self, _text: &str) {
        // Leaf node, no children to walk
    }

    fn visit_expression(&mut self, code: &Code) {
        walk_code(self, code);
    }
}

/// Mutable visitor pattern for transforming markup
///
/// Same traversal order as [`Visitor`].
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, doc: &mut Document) {
        walk_document_mut(self, doc);
    }

    fn visit_code_mut(&mut self, code: &mut Code) {
        walk_code_mut(self, code);
    }

    fn visit_node_mut(&mut self, node: &mut Node) {
        walk_node_mut(self, node);
    }

    fn visit_element_mut(&mut self, element: &mut Element) {
        walk_element_mut(self, element);
    }

    fn visit_fragment_mut(&mut self, fragment: &mut Fragment) {
        walk_fragment_mut(self, fragment);
    }

    fn visit_expression_mut(&mut self, code: &mut Code) {
        walk_code_mut(self, code);
    }
}

// Default walk implementations for immutable visitor

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for item in &doc.items {
        visitor.visit_code(&item.code);
    }
}

pub fn walk_code<V: Visitor>(visitor: &mut V, code: &Code) {
    for (_, node) in code.markup() {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Element(element) => visitor.visit_element(element),
        Node::Fragment(fragment) => visitor.visit_fragment(fragment),
        Node::Text(text) => visitor.visit_text(text),
        Node::Expression(code) => visitor.visit_expression(code),
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Element) {
    for attribute in &element.attributes {
        if let Some(code) = attribute.code() {
            visitor.visit_code(code);
        }
    }
    for child in &element.children {
        visitor.visit_node(child);
    }
}

pub fn walk_fragment<V: Visitor>(visitor: &mut V, fragment: &Fragment) {
    for child in &fragment.children {
        visitor.visit_node(child);
    }
}

// Default walk implementations for mutable visitor

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, doc: &mut Document) {
    for item in &mut doc.items {
        visitor.visit_code_mut(&mut item.code);
    }
}

pub fn walk_code_mut<V: VisitorMut>(visitor: &mut V, code: &mut Code) {
    for segment in &mut code.segments {
        if let Segment::Markup(node) = segment {
            visitor.visit_node_mut(node);
        }
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut Node) {
    match node {
        Node::Element(element) => visitor.visit_element_mut(element),
        Node::Fragment(fragment) => visitor.visit_fragment_mut(fragment),
        Node::Text(_) => {}
        Node::Expression(code) => visitor.visit_expression_mut(code),
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut Element) {
    for attribute in &mut element.attributes {
        if let Some(code) = attribute.code_mut() {
            visitor.visit_code_mut(code);
        }
    }
    for child in &mut element.children {
        visitor.visit_node_mut(child);
    }
}

pub fn walk_fragment_mut<V: VisitorMut>(visitor: &mut V, fragment: &mut Fragment) {
    for child in &mut fragment.children {
        visitor.visit_node_mut(child);
    }
}

/// Count `{children}` placeholders, the points where a component
/// forwards the markup it was given
#[derive(Default)]
pub struct ChildrenPlaceholderCounter {
    pub count: usize,
}

impl Visitor for ChildrenPlaceholderCounter {
    fn visit_expression(&mut self, code: &Code) {
        if code.is_children_placeholder() {
            self.count += 1;
        }
        walk_code(self, code);
    }
}
