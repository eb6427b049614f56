use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source dialects the graph understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    Tsx,
    Jsx,
    Ts,
    Js,
    Css,
}

/// Extensions tried, in order, when resolving an import specifier
pub const RESOLVE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "css"];

impl Dialect {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "tsx" => Some(Dialect::Tsx),
            "jsx" => Some(Dialect::Jsx),
            "ts" => Some(Dialect::Ts),
            "js" | "mjs" => Some(Dialect::Js),
            "css" => Some(Dialect::Css),
            _ => None,
        }
    }

    /// Whether `<` in expression position opens markup
    pub fn has_markup(&self) -> bool {
        matches!(self, Dialect::Tsx | Dialect::Jsx | Dialect::Js)
    }

    pub fn is_script(&self) -> bool {
        !matches!(self, Dialect::Css)
    }
}

/// Root document node.
///
/// Concatenating every item's code reproduces the original text exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub dialect: Dialect,
    pub items: Vec<Item>,
}

impl Document {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            items: Vec::new(),
        }
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.items.iter().filter_map(|item| match &item.kind {
            ItemKind::Import(import) => Some(import),
            _ => None,
        })
    }

    /// Function declarations paired with their item index
    pub fn functions(&self) -> impl Iterator<Item = (usize, &FunctionDecl)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match &item.kind {
                ItemKind::Function(decl) => Some((index, decl)),
                _ => None,
            })
    }

    pub fn find_function(&self, name: &str) -> Option<(usize, &FunctionDecl)> {
        self.functions().find(|(_, decl)| decl.name == name)
    }

    /// Resolve the export kind of a declaration, including trailing
    /// `export default Name` and `export { Name }` statements.
    pub fn export_kind_of(&self, name: &str) -> ExportKind {
        let mut kind = ExportKind::None;
        for item in &self.items {
            match &item.kind {
                ItemKind::Function(decl) if decl.name == name => {
                    if decl.export != ExportKind::None {
                        kind = decl.export;
                    }
                }
                ItemKind::ExportDefault(target) if target == name => kind = ExportKind::Default,
                ItemKind::ExportNamed(names)
                    if kind == ExportKind::None && names.iter().any(|n| n == name) =>
                {
                    kind = ExportKind::Named
                }
                _ => {}
            }
        }
        kind
    }

    /// Index just past the last import item, where new imports go
    pub fn import_insertion_index(&self) -> usize {
        self.items
            .iter()
            .rposition(|item| matches!(item.kind, ItemKind::Import(_)))
            .map(|index| index + 1)
            .unwrap_or(0)
    }
}

/// A top-level statement and its exact source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub code: Code,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Import(ImportDecl),
    Function(FunctionDecl),
    /// `export default Name;`
    ExportDefault(String),
    /// `export { A, B };` (local names)
    ExportNamed(Vec<String>),
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportDecl {
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<ImportSpecifier>,
    /// Specifier without quotes
    pub source: String,
}

impl ImportDecl {
    pub fn is_relative(&self) -> bool {
        self.source.starts_with("./") || self.source.starts_with("../") || self.source == "."
    }

    /// Every local binding this import introduces
    pub fn locals(&self) -> impl Iterator<Item = &str> {
        self.default
            .iter()
            .chain(self.namespace.iter())
            .map(String::as_str)
            .chain(self.named.iter().map(|s| s.local.as_str()))
    }

    pub fn binds(&self, local: &str) -> bool {
        self.locals().any(|l| l == local)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub imported: String,
    pub local: String,
}

/// Function-like declaration (function, arrow const, class)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub export: ExportKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    Default,
    Named,
    None,
}

/// Script text interleaved with markup trees
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Code {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Raw(String),
    Markup(Node),
}

impl Code {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Raw(text.into())],
        }
    }

    pub fn has_markup(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Markup(_)))
    }

    /// Markup roots directly inside this code, with their segment index
    pub fn markup(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| match segment {
                Segment::Markup(node) => Some((index, node)),
                Segment::Raw(_) => None,
            })
    }

    /// Raw text with markup omitted
    pub fn script_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Raw(text) => Some(text.as_str()),
                Segment::Markup(_) => None,
            })
            .collect()
    }

    /// Whether this is a `children` / `props.children` placeholder
    pub fn is_children_placeholder(&self) -> bool {
        if self.has_markup() {
            return false;
        }
        matches!(self.script_text().trim(), "children" | "props.children")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Fragment(Fragment),
    /// Raw JSX text, entities untouched
    Text(String),
    /// `{...}` container; the code excludes the braces
    Expression(Code),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Fragment(fragment) => &fragment.children,
            _ => &[],
        }
    }

    /// Concatenated text of direct text children
    pub fn text_content(&self) -> String {
        self.children()
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<String>()
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Whitespace between the last attribute and `>` / `/>`
    pub trailing: String,
    pub children: Vec<Node>,
    pub self_closing: bool,
    /// Original closing tag; regenerated from `name` when absent
    pub closing: Option<String>,
}

impl Element {
    /// A new self-closing element: `<Name />`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            trailing: " ".to_string(),
            children: Vec::new(),
            self_closing: true,
            closing: None,
        }
    }

    /// Leading identifier of the tag name (`UI` for `<UI.Button>`)
    pub fn base_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name() == Some(name))
    }

    /// Value of a string-literal attribute, quotes removed
    pub fn string_attribute(&self, name: &str) -> Option<String> {
        match &self.attribute(name)?.kind {
            AttributeKind::Named {
                value: Some(AttrValue::String(raw)),
                ..
            } => Some(unquote(raw)),
            _ => None,
        }
    }

    /// Set a string attribute, replacing an existing one in place
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let value = AttrValue::from_str_value(value);
        if let Some(attr) = self
            .attributes
            .iter_mut()
            .find(|attr| attr.name() == Some(name))
        {
            attr.kind = AttributeKind::Named {
                name: name.to_string(),
                eq: "=".to_string(),
                value: Some(value),
            };
            return;
        }
        self.attributes.push(Attribute {
            leading: " ".to_string(),
            kind: AttributeKind::Named {
                name: name.to_string(),
                eq: "=".to_string(),
                value: Some(value),
            },
        });
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|attr| attr.name() != Some(name));
        before != self.attributes.len()
    }

    /// Append a child, opening a self-closing tag if needed
    pub fn push_child(&mut self, node: Node) {
        if self.self_closing {
            self.self_closing = false;
            self.trailing = self.trailing.trim_end().to_string();
            self.closing = None;
        }
        self.children.push(node);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub children: Vec<Node>,
    pub closing: Option<String>,
}

impl Fragment {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            closing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Whitespace before the attribute
    pub leading: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Named { name, .. } => Some(name),
            AttributeKind::Spread(_) => None,
        }
    }

    /// Code carried by an expression value or spread
    pub fn code(&self) -> Option<&Code> {
        match &self.kind {
            AttributeKind::Named {
                value: Some(AttrValue::Expression(code)),
                ..
            }
            | AttributeKind::Spread(code) => Some(code),
            _ => None,
        }
    }

    pub fn code_mut(&mut self) -> Option<&mut Code> {
        match &mut self.kind {
            AttributeKind::Named {
                value: Some(AttrValue::Expression(code)),
                ..
            }
            | AttributeKind::Spread(code) => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    Named {
        name: String,
        /// `=` with surrounding whitespace, empty for boolean attributes
        eq: String,
        value: Option<AttrValue>,
    },
    /// `{...props}`; the code excludes the braces
    Spread(Code),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Raw literal including quotes
    String(String),
    Expression(Code),
}

impl AttrValue {
    /// Quote a value for an attribute, falling back to an expression
    /// container when both quote characters occur.
    pub fn from_str_value(value: &str) -> Self {
        if !value.contains('"') {
            AttrValue::String(format!("\"{}\"", value))
        } else if !value.contains('\'') {
            AttrValue::String(format!("'{}'", value))
        } else {
            AttrValue::Expression(Code::raw(quote_js_string(value)))
        }
    }
}

/// Quote a string as a JS string literal
pub fn quote_js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut element = Element::new("div");
        element.set_attribute("className", "a");
        element.set_attribute("id", "x");
        element.set_attribute("className", "b");

        assert_eq!(element.attributes.len(), 2);
        assert_eq!(element.attributes[0].name(), Some("className"));
        assert_eq!(element.string_attribute("className"), Some("b".to_string()));
    }

    #[test]
    fn test_attribute_value_quoting() {
        assert_eq!(
            AttrValue::from_str_value("plain"),
            AttrValue::String("\"plain\"".to_string())
        );
        assert_eq!(
            AttrValue::from_str_value("say \"hi\""),
            AttrValue::String("'say \"hi\"'".to_string())
        );
        assert!(matches!(
            AttrValue::from_str_value("it's \"quoted\""),
            AttrValue::Expression(_)
        ));
    }

    #[test]
    fn test_children_placeholder() {
        assert!(Code::raw(" children ").is_children_placeholder());
        assert!(Code::raw("props.children").is_children_placeholder());
        assert!(!Code::raw("items.length").is_children_placeholder());
    }

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path(Path::new("a/B.tsx")), Some(Dialect::Tsx));
        assert_eq!(Dialect::from_path(Path::new("a/b.css")), Some(Dialect::Css));
        assert_eq!(Dialect::from_path(Path::new("a/b.md")), None);
        assert!(!Dialect::Ts.has_markup());
    }
}
