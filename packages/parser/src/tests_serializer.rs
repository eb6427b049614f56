/// Tests to verify the serializer reproduces parsed sources exactly
use crate::*;

fn assert_roundtrip(source: &str, dialect: Dialect) {
    let doc = parse(source, dialect).unwrap_or_else(|e| panic!("Failed to parse {:?}: {}", source, e));
    assert_eq!(serialize(&doc), source);
}

#[test]
fn test_roundtrip_component_file() {
    assert_roundtrip(
        r#"import { useState } from "react";
import Button from "./Button";

/** Counter with a label */
export function Counter({ label }: { label: string }) {
  const [count, setCount] = useState<number>(0);
  return (
    <div className='counter'   data-ecu="1a2b:0">
      <Button onClick={() => setCount(count + 1)} disabled>
        {label}: {count}
      </Button>
      {count > 10 && <p>That&apos;s a lot</p>}
    </div >
  );
}

export default Counter;
"#,
        Dialect::Tsx,
    );
}

#[test]
fn test_roundtrip_odd_spacing() {
    assert_roundtrip(
        "const A = () => <a href = \"/\" {...rest} >x</ a>;\n",
        Dialect::Jsx,
    );
    assert_roundtrip("const B = () => <><br/></>;\n", Dialect::Jsx);
}

#[test]
fn test_roundtrip_map_callbacks() {
    assert_roundtrip(
        "export const List = ({ items }) => (\n  <ul>\n    {items.map((item) => (\n      <li key={item.id}>{item.name}</li>\n    ))}\n  </ul>\n);\n",
        Dialect::Tsx,
    );
}

#[test]
fn test_roundtrip_plain_typescript() {
    assert_roundtrip(
        "export type Props = { size: Array<number> };\nexport const half = (n: number) => n / 2;\n",
        Dialect::Ts,
    );
}

#[test]
fn test_generated_nodes_use_defaults() {
    let mut element = Element::new("Card");
    assert_eq!(Serializer::new().serialize_node(&Node::Element(element.clone())), "<Card />");

    element.push_child(Node::Text("Hi".to_string()));
    element.set_attribute("title", "x");
    assert_eq!(
        Serializer::new().serialize_node(&Node::Element(element)),
        "<Card title=\"x\">Hi</Card>"
    );
}
