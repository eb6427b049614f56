use crate::ast::*;

/// Serializer converts the syntax tree back to source code.
///
/// Parsed nodes keep their original trivia, so an unmodified document
/// is reproduced byte-for-byte. Nodes built by edits use compact
/// defaults (`<Name />`, `</Name>`) and are left to the formatter.
pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Serialize a Document to source code
    pub fn serialize(mut self, doc: &Document) -> String {
        for item in &doc.items {
            self.write_code(&item.code);
        }
        self.output
    }

    /// Serialize a single node
    pub fn serialize_node(mut self, node: &Node) -> String {
        self.write_node(node);
        self.output
    }

    fn write_code(&mut self, code: &Code) {
        for segment in &code.segments {
            match segment {
                Segment::Raw(text) => self.output.push_str(text),
                Segment::Markup(node) => self.write_node(node),
            }
        }
    }

    fn write_node(&mut self, node: &Node) {
        match node {
            Node::Element(element) => self.write_element(element),
            Node::Fragment(fragment) => {
                self.output.push_str("<>");
                for child in &fragment.children {
                    self.write_node(child);
                }
                match &fragment.closing {
                    Some(closing) => self.output.push_str(closing),
                    None => self.output.push_str("</>"),
                }
            }
            Node::Text(text) => self.output.push_str(text),
            Node::Expression(code) => {
                self.output.push('{');
                self.write_code(code);
                self.output.push('}');
            }
        }
    }

    fn write_element(&mut self, element: &Element) {
        self.output.push('<');
        self.output.push_str(&element.name);
        for attribute in &element.attributes {
            self.output.push_str(&attribute.leading);
            match &attribute.kind {
                AttributeKind::Named { name, eq, value } => {
                    self.output.push_str(name);
                    if let Some(value) = value {
                        if eq.is_empty() {
                            self.output.push('=');
                        } else {
                            self.output.push_str(eq);
                        }
                        match value {
                            AttrValue::String(raw) => self.output.push_str(raw),
                            AttrValue::Expression(code) => {
                                self.output.push('{');
                                self.write_code(code);
                                self.output.push('}');
                            }
                        }
                    }
                }
                AttributeKind::Spread(code) => {
                    self.output.push('{');
                    self.write_code(code);
                    self.output.push('}');
                }
            }
        }
        self.output.push_str(&element.trailing);

        if element.self_closing {
            self.output.push_str("/>");
            return;
        }

        self.output.push('>');
        for child in &element.children {
            self.write_node(child);
        }
        match &element.closing {
            Some(closing) => self.output.push_str(closing),
            None => {
                self.output.push_str("</");
                self.output.push_str(&element.name);
                self.output.push('>');
            }
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a document back to source text
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}
