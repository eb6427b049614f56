//! # Hierarchy Addressing
//!
//! Writes `<owner>:<seg>_<seg>` onto every markup element a component
//! owns. Positions count addressed siblings only:
//!
//! - fragments and `{...}` containers are transparent;
//! - elements bound by a relative import are references to another
//!   component's tree. They get no address and take no position, and
//!   their literal children continue in the enclosing position space.
//!   A generated `key` (`<owner>~<n>`) tells repeated references apart
//!   unless the author already set one.
//!
//! The walk order matches [`crate::traversal`], which relies on it.

use crate::hierarchy::HierarchyAddress;
use ecu_common::{walk_element_mut, VisitorMut};
use ecu_parser::ast::{Document, Element};
use ecu_parser::get_component_id;
use std::collections::HashSet;
use std::path::Path;

/// Local names bound by relative imports
pub fn relative_references(doc: &Document) -> HashSet<String> {
    doc.imports()
        .filter(|import| import.is_relative())
        .flat_map(|import| import.locals().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Whether `value` looks like a key written by [`assign_addresses`]
pub fn is_generated_key(value: &str) -> bool {
    match value.rsplit_once('~') {
        Some((owner, n)) => {
            !owner.is_empty()
                && owner.chars().all(|c| c.is_ascii_hexdigit())
                && !n.is_empty()
                && n.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

#[derive(Default)]
struct Level {
    prefix: Vec<usize>,
    next: usize,
}

struct Addresser<'a> {
    owner: &'a str,
    attribute: &'a str,
    references: &'a HashSet<String>,
    level: Level,
    keys: usize,
    addressed: usize,
}

impl Addresser<'_> {
    fn mark_reference(&mut self, element: &mut Element) {
        let generated = format!("{}~{}", self.owner, self.keys);
        self.keys += 1;

        let authored = match element.attribute("key") {
            None => false,
            Some(_) => element
                .string_attribute("key")
                .map(|value| !is_generated_key(&value))
                .unwrap_or(true),
        };
        if !authored {
            element.set_attribute("key", &generated);
        }
    }
}

impl VisitorMut for Addresser<'_> {
    fn visit_element_mut(&mut self, element: &mut Element) {
        if self.references.contains(element.base_name()) {
            self.mark_reference(element);
            walk_element_mut(self, element);
            return;
        }

        let mut segments = self.level.prefix.clone();
        segments.push(self.level.next);
        self.level.next += 1;

        let address = HierarchyAddress::new(self.owner, segments.clone());
        element.set_attribute(self.attribute, &address.to_string());
        self.addressed += 1;

        let parent = std::mem::replace(
            &mut self.level,
            Level {
                prefix: segments,
                next: 0,
            },
        );
        walk_element_mut(self, element);
        self.level = parent;
    }
}

/// Rewrite the addresses inside one declaration.
///
/// Returns the number of elements addressed.
pub fn assign_addresses(doc: &mut Document, item: usize, owner: &str, attribute: &str) -> usize {
    let references = relative_references(doc);
    let Some(item) = doc.items.get_mut(item) else {
        return 0;
    };
    let mut addresser = Addresser {
        owner,
        attribute,
        references: &references,
        level: Level::default(),
        keys: 0,
        addressed: 0,
    };
    addresser.visit_code_mut(&mut item.code);
    addresser.addressed
}

/// Rewrite the addresses of every UI component declared in a file
pub fn assign_file_addresses(doc: &mut Document, path: &Path, attribute: &str) -> usize {
    if !doc.dialect.has_markup() {
        return 0;
    }
    let path_str = path.to_string_lossy();
    let owners: Vec<(usize, String)> = doc
        .functions()
        .filter(|(item, decl)| {
            decl.name.starts_with(|c: char| c.is_ascii_uppercase())
                && doc.items[*item].code.has_markup()
        })
        .map(|(item, decl)| (item, get_component_id(&path_str, &decl.name)))
        .collect();

    owners
        .iter()
        .map(|(item, owner)| assign_addresses(doc, *item, owner, attribute))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecu_parser::{parse, serialize, Dialect};

    const ATTR: &str = "data-ecu";

    fn addressed(source: &str) -> String {
        let mut doc = parse(source, Dialect::Tsx).unwrap();
        let item = doc.find_function("App").map(|(i, _)| i).unwrap();
        assign_addresses(&mut doc, item, "abc", ATTR);
        serialize(&doc)
    }

    #[test]
    fn test_nested_segments() {
        let out = addressed("const App = () => <div><p>a</p><p><b /></p></div>;\n");
        assert_eq!(
            out,
            "const App = () => <div data-ecu=\"abc:0\"><p data-ecu=\"abc:0_0\">a</p><p data-ecu=\"abc:0_1\"><b data-ecu=\"abc:0_1_0\" /></p></div>;\n"
        );
    }

    #[test]
    fn test_fragments_and_expressions_are_transparent() {
        let out = addressed(
            "const App = () => <><a />{ok ? <b /> : <i />}</>;\n",
        );
        assert_eq!(
            out,
            "const App = () => <><a data-ecu=\"abc:0\" />{ok ? <b data-ecu=\"abc:1\" /> : <i data-ecu=\"abc:2\" />}</>;\n"
        );
    }

    #[test]
    fn test_references_are_skipped_but_keyed() {
        let out = addressed(
            "import Card from \"./Card\";\nconst App = () => <main><Card><p /></Card><Card key=\"user\" /></main>;\n",
        );
        assert_eq!(
            out,
            "import Card from \"./Card\";\nconst App = () => <main data-ecu=\"abc:0\"><Card key=\"abc~0\"><p data-ecu=\"abc:0_0\" /></Card><Card key=\"user\" /></main>;\n"
        );
    }

    #[test]
    fn test_package_components_are_addressed() {
        let out = addressed(
            "import { Button } from \"ui-kit\";\nconst App = () => <Button />;\n",
        );
        assert!(out.contains("<Button data-ecu=\"abc:0\" />"));
    }

    #[test]
    fn test_stale_addresses_are_rewritten() {
        let out = addressed("const App = () => <div data-ecu=\"old:7\"><p data-ecu=\"x\" /></div>;\n");
        assert_eq!(
            out,
            "const App = () => <div data-ecu=\"abc:0\"><p data-ecu=\"abc:0_0\" /></div>;\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let source = "import Card from \"./Card\";\nexport default function App() {\n  return (\n    <section>\n      <Card>{items.map((i) => <li key={i}>{i}</li>)}</Card>\n      <footer />\n    </section>\n  );\n}\n";
        let once = addressed(source);
        assert_eq!(addressed(&once), once);
    }

    #[test]
    fn test_file_addresses_cover_ui_components_only() {
        let mut doc = parse(
            "function helper() { return <i />; }\nexport function A() { return <a />; }\nexport function B() { return <b />; }\n",
            Dialect::Tsx,
        )
        .unwrap();
        let count = assign_file_addresses(&mut doc, Path::new("/p/X.tsx"), ATTR);
        assert_eq!(count, 2);

        let out = serialize(&doc);
        let a = get_component_id("/p/X.tsx", "A");
        assert!(out.contains(&format!("<a data-ecu=\"{}:0\" />", a)));
        assert!(out.contains("<i />"));
    }

    #[test]
    fn test_generated_key_detection() {
        assert!(is_generated_key("1f2e~3"));
        assert!(!is_generated_key("user"));
        assert!(!is_generated_key("row~x"));
        assert!(!is_generated_key("~1"));
    }
}
