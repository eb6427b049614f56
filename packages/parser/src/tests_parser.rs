use crate::*;

const CARD: &str = r#"import React from "react";
import Title from './Title';

export default function Card({ title, children }) {
  const ready = items.length > 0 && /x+/g.test(title);
  return (
    <div className="card" data-ecu="abc:0">
      <Title text={title} />
      {ready ? <span>ok</span> : null}
      {children}
    </div>
  );
}
"#;

fn element(doc: &Document, steps: Vec<Step>) -> &Element {
    doc.element(&NodePath::new(steps)).expect("element at path")
}

#[test]
fn test_items_are_split_at_top_level_statements() {
    let doc = parse(CARD, Dialect::Tsx).unwrap();
    assert_eq!(doc.items.len(), 3);
    assert!(matches!(doc.items[0].kind, ItemKind::Import(_)));
    assert!(matches!(doc.items[1].kind, ItemKind::Import(_)));
    assert_eq!(
        doc.items[2].kind,
        ItemKind::Function(FunctionDecl {
            name: "Card".to_string(),
            export: ExportKind::Default,
        })
    );
}

#[test]
fn test_markup_tree_shape() {
    let doc = parse(CARD, Dialect::Tsx).unwrap();
    let roots: Vec<_> = doc.items[2].code.markup().collect();
    assert_eq!(roots.len(), 1);
    let (segment, _) = roots[0];

    let div = element(&doc, vec![Step::Item(2), Step::Segment(segment)]);
    assert_eq!(div.name, "div");
    assert_eq!(div.string_attribute("className").as_deref(), Some("card"));
    assert_eq!(div.string_attribute("data-ecu").as_deref(), Some("abc:0"));

    let kinds: Vec<&str> = div
        .children
        .iter()
        .map(|child| match child {
            Node::Element(_) => "element",
            Node::Fragment(_) => "fragment",
            Node::Text(_) => "text",
            Node::Expression(_) => "expression",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["text", "element", "text", "expression", "text", "expression", "text"]
    );

    let Node::Expression(conditional) = &div.children[3] else {
        panic!("expected expression container");
    };
    assert_eq!(conditional.markup().count(), 1);

    let Node::Expression(children) = &div.children[5] else {
        panic!("expected children placeholder");
    };
    assert!(children.is_children_placeholder());
}

#[test]
fn test_comparison_is_not_markup() {
    let source = "const ok = a <b && c > d;\nconst re = x / y / z;\n";
    let doc = parse(source, Dialect::Tsx).unwrap();
    assert_eq!(doc.items.len(), 2);
    assert!(doc.items.iter().all(|item| !item.code.has_markup()));
}

#[test]
fn test_generic_calls_are_not_markup() {
    let source = "export function App() {\n  const [v] = useState<string>(\"\");\n  return <p>{v}</p>;\n}\n";
    let doc = parse(source, Dialect::Tsx).unwrap();
    assert_eq!(doc.items[0].code.markup().count(), 1);
}

#[test]
fn test_ts_files_have_no_markup() {
    let source = "export const cast = <T,>(value: unknown) => value as T;\n";
    let doc = parse(source, Dialect::Ts).unwrap();
    assert!(!doc.items[0].code.has_markup());
}

#[test]
fn test_strings_and_comments_hide_angle_brackets() {
    let source = "const a = \"<div>\";\n// return <div>\nconst b = `<span>${x}</span>`;\n";
    let doc = parse(source, Dialect::Tsx).unwrap();
    assert!(doc.items.iter().all(|item| !item.code.has_markup()));
}

#[test]
fn test_fragments_and_nested_markup_in_attributes() {
    let source = "const App = () => (\n  <>\n    <Layout header={<Header />} />\n  </>\n);\n";
    let doc = parse(source, Dialect::Jsx).unwrap();
    let (segment, node) = doc.items[0].code.markup().next().unwrap();
    let Node::Fragment(fragment) = node else {
        panic!("expected fragment");
    };
    let layout = fragment.children.iter().find_map(Node::as_element).unwrap();
    assert_eq!(layout.name, "Layout");
    assert!(layout.self_closing);
    let header = layout.attributes[0].code().unwrap();
    assert_eq!(header.markup().count(), 1);

    let path = NodePath::new(vec![
        Step::Item(0),
        Step::Segment(segment),
        Step::Child(1),
        Step::Attribute(0),
        Step::Segment(header.markup().next().unwrap().0),
    ]);
    assert_eq!(doc.element(&path).unwrap().name, "Header");
}

#[test]
fn test_mismatched_closing_tag() {
    let err = parse("const a = <div></span>;\n", Dialect::Tsx).unwrap_err();
    assert!(matches!(err, ParseError::MismatchedTag { .. }));
}

#[test]
fn test_unclosed_element() {
    let err = parse("const a = <div>\n", Dialect::Tsx).unwrap_err();
    assert!(matches!(err, ParseError::InvalidSyntax { .. }));
}

#[test]
fn test_unbraced_markup_attribute_is_rejected() {
    let err = parse("const a = <A icon=<B /> />;\n", Dialect::Tsx).unwrap_err();
    assert!(matches!(err, ParseError::InvalidSyntax { .. }));
}

#[test]
fn test_css_is_opaque() {
    let doc = parse(".a { color: red; }\n", Dialect::Css).unwrap();
    assert_eq!(doc.items.len(), 1);
    assert_eq!(doc.items[0].kind, ItemKind::Other);
}

#[test]
fn test_export_kind_resolution() {
    let source = "function Button() {\n  return <button />;\n}\n\nexport default Button;\n";
    let doc = parse(source, Dialect::Tsx).unwrap();
    assert_eq!(doc.export_kind_of("Button"), ExportKind::Default);
    assert_eq!(doc.import_insertion_index(), 0);
}

#[test]
fn test_node_editing_helpers() {
    let source = "const A = () => (\n  <ul>\n    <li>a</li>\n    <li>b</li>\n  </ul>\n);\n";
    let mut doc = parse(source, Dialect::Tsx).unwrap();
    let (segment, _) = doc.items[0].code.markup().next().unwrap();
    let ul = NodePath::new(vec![Step::Item(0), Step::Segment(segment)]);

    let first_li = ul.join(Step::Child(1));
    let removed = doc.remove_node(&first_li).unwrap();
    assert_eq!(removed.text_content(), "a");

    assert!(doc.append_child(&ul, removed));
    let out = serialize(&doc);
    assert!(out.contains("<li>b</li>\n  <li>a</li></ul>"));

    // Root markup has no sibling list, so it gets wrapped
    assert!(doc.insert_sibling(&ul, Node::Element(Element::new("hr")), true));
    let out = serialize(&doc);
    assert!(out.contains("(\n  <><ul>"));
    assert!(out.contains("</ul><hr /></>\n);"));

    let root = doc.remove_node(&ul).unwrap();
    assert!(matches!(root, Node::Fragment(_)));
    assert_eq!(serialize(&doc), "const A = () => (\n  null\n);\n");
}
