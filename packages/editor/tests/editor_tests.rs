use ecu_common::{FileSystem, MockFileSystem, RealFileSystem};
use ecu_editor::{
    AddComponent, CreateComponent, DeleteComponent, Editor, EditorError, EditorOptions,
    HierarchyId, HierarchyPosition, MoveComponent, Mutation, MutationOutput, NoopFormatter,
    UpdateAttribute, UpdateTextValue,
};
use ecu_parser::get_component_id;
use std::path::Path;
use std::sync::Arc;

const ROOT: &str = r#"import Child from "./Child";

export default function Root() {
  return (
    <div>
      <Child />
    </div>
  );
}
"#;

const CHILD: &str = r#"export default function Child() {
  return <span>Hello</span>;
}
"#;

const CARD_ROOT: &str = r#"import Card from "./Card";

export default function Root() {
  return (
    <main>
      <Card>
        <p>Inside</p>
      </Card>
    </main>
  );
}
"#;

const CARD: &str = r#"export default function Card({ children }) {
  return <section className="card">{children}</section>;
}
"#;

fn open(fs: &Arc<MockFileSystem>) -> Editor {
    let mut editor =
        Editor::open(EditorOptions::new("/p"), fs.clone(), Box::new(NoopFormatter)).unwrap();
    editor.address_project().unwrap();
    editor
}

fn project(files: &[(&str, &str)]) -> Arc<MockFileSystem> {
    let fs = Arc::new(MockFileSystem::new());
    for (name, source) in files {
        fs.add_file(format!("/p/{}", name), *source);
    }
    fs
}

fn component(name: &str) -> String {
    get_component_id(&format!("/p/{}.tsx", name), name)
}

fn id(owner: &str, segments: &str, occurrence: usize) -> HierarchyId {
    format!("{}:{}#{}", owner, segments, occurrence).parse().unwrap()
}

fn read(fs: &MockFileSystem, name: &str) -> String {
    fs.contents(&Path::new("/p").join(name)).unwrap()
}

fn update_text(root: &str, ids: Vec<HierarchyId>, value: &str) -> Mutation {
    Mutation::UpdateTextValue(UpdateTextValue {
        source_component_address: root.to_string(),
        hierarchy_ids: ids,
        value: value.to_string(),
    })
}

#[test]
fn test_address_project_writes_addresses() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let (root, child) = (component("Root"), component("Child"));

    let root_text = read(&fs, "Root.tsx");
    assert!(root_text.contains(&format!("<div data-ecu=\"{}:0\">", root)));
    assert!(root_text.contains(&format!("<Child key=\"{}~0\" />", root)));
    assert_eq!(
        read(&fs, "Child.tsx"),
        format!(
            "export default function Child() {{\n  return <span data-ecu=\"{}:0\">Hello</span>;\n}}\n",
            child
        )
    );

    // Already addressed: nothing to write, nothing recorded
    assert!(editor.address_project().unwrap().is_empty());
    assert!(!editor.undo_redo_metadata().can_undo);
}

#[test]
fn test_hierarchy_listing() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let editor = open(&fs);
    let (root, child) = (component("Root"), component("Child"));

    let view = editor.hierarchy(&root, &[]);
    assert_eq!(view.hierarchy.len(), 1);
    assert_eq!(view.hierarchy[0].label, "Root[0]");
    assert_eq!(view.hierarchy[0].component_address.as_deref(), Some(root.as_str()));
    let children: Vec<_> = view
        .children
        .iter()
        .map(|entry| entry.hierarchy_id.clone().unwrap())
        .collect();
    assert_eq!(children, vec![format!("{}:0#0", root)]);

    // The reference is transparent: Child's span is listed under the div
    let view = editor.hierarchy(&root, &[id(&root, "0", 0)]);
    assert_eq!(view.children.len(), 1);
    assert_eq!(
        view.children[0].hierarchy_id.as_deref(),
        Some(format!("{}:0#0", child).as_str())
    );
    assert_eq!(view.children[0].component_name, "Child");

    let view = editor.hierarchy(&root, &[id(&root, "0", 0), id(&child, "0", 0)]);
    let labels: Vec<_> = view.hierarchy.iter().map(|entry| entry.label.as_str()).collect();
    assert_eq!(labels, vec!["Root[0]", "div[0]", "Child[0]", "span[0]"]);
    assert!(view.children.is_empty());

    let missing = editor.hierarchy(&root, &[id(&root, "7", 0)]);
    assert!(missing.hierarchy.is_empty() && missing.children.is_empty());
    assert!(editor.hierarchy("nope", &[]).hierarchy.is_empty());
}

#[test]
fn test_text_edit_in_child_component() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let (root, child) = (component("Root"), component("Child"));
    let root_before = read(&fs, "Root.tsx");

    let output = editor
        .apply(update_text(&root, vec![id(&root, "0", 0), id(&child, "0", 0)], "World"))
        .unwrap();
    assert_eq!(output, MutationOutput::Done(true));

    assert!(read(&fs, "Child.tsx").contains(&format!("<span data-ecu=\"{}:0\">World</span>", child)));
    assert_eq!(read(&fs, "Root.tsx"), root_before);

    let meta = editor.undo_redo_metadata();
    assert!(meta.can_undo);
    assert!(meta.undo_description.unwrap().contains("World"));
}

#[test]
fn test_children_pass_through_edits_outer_file() {
    let fs = project(&[("Root.tsx", CARD_ROOT), ("Card.tsx", CARD)]);
    let mut editor = open(&fs);
    let (root, card) = (component("Root"), component("Card"));
    let card_before = read(&fs, "Card.tsx");
    let root_before = read(&fs, "Root.tsx");

    let path = vec![id(&root, "0", 0), id(&card, "0", 0), id(&root, "0_0", 0)];
    let found = editor.resolve(&root, &path).found().unwrap();
    let target = found.target.unwrap();
    assert_eq!(target.file, Path::new("/p/Root.tsx"));
    assert_eq!(target.owner, root);
    assert_eq!(found.crossings.len(), 1);
    assert_eq!(found.crossings[0].name, "Card");
    assert!(found.files.contains(&Path::new("/p/Card.tsx").to_path_buf()));

    editor.apply(update_text(&root, path, "Changed")).unwrap();
    assert!(read(&fs, "Root.tsx").contains(&format!("<p data-ecu=\"{}:0_0\">Changed</p>", root)));
    assert_eq!(read(&fs, "Card.tsx"), card_before);

    // Attribute edit inside the card leaves the outer file alone
    editor.undo().unwrap();
    assert_eq!(read(&fs, "Root.tsx"), root_before);
    editor
        .apply(Mutation::UpdateAttribute(UpdateAttribute {
            source_component_address: root.clone(),
            hierarchy_ids: vec![id(&root, "0", 0), id(&card, "0", 0)],
            name: "className".to_string(),
            value: Some("card wide".to_string()),
        }))
        .unwrap();
    assert!(read(&fs, "Card.tsx").contains("className=\"card wide\""));
    assert_eq!(read(&fs, "Root.tsx"), root_before);
}

#[test]
fn test_address_attribute_is_not_editable() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let root = component("Root");

    let err = editor
        .apply(Mutation::UpdateAttribute(UpdateAttribute {
            source_component_address: root.clone(),
            hierarchy_ids: vec![id(&root, "0", 0)],
            name: "data-ecu".to_string(),
            value: Some("x".to_string()),
        }))
        .unwrap_err();
    assert!(err.is_client_error());
}

#[test]
fn test_remove_attribute() {
    let fs = project(&[("Root.tsx", CARD_ROOT), ("Card.tsx", CARD)]);
    let mut editor = open(&fs);
    let (root, card) = (component("Root"), component("Card"));

    editor
        .apply(Mutation::UpdateAttribute(UpdateAttribute {
            source_component_address: root.clone(),
            hierarchy_ids: vec![id(&root, "0", 0), id(&card, "0", 0)],
            name: "className".to_string(),
            value: None,
        }))
        .unwrap();
    assert!(!read(&fs, "Card.tsx").contains("className"));
    assert_eq!(
        editor.undo_redo_metadata().undo_description.as_deref(),
        Some(format!("Remove className from {}:0#0", card).as_str())
    );
}

#[test]
fn test_component_delta_deletes_reference() {
    let fs = project(&[("Root.tsx", CARD_ROOT), ("Card.tsx", CARD)]);
    let mut editor = open(&fs);
    let (root, card) = (component("Root"), component("Card"));
    let root_before = read(&fs, "Root.tsx");

    let output = editor
        .apply(Mutation::DeleteComponent(DeleteComponent {
            source_component_address: root.clone(),
            hierarchy_ids: vec![id(&root, "0", 0), id(&card, "0", 0)],
            component_delta: -1,
        }))
        .unwrap();
    assert_eq!(output, MutationOutput::Address(root.clone()));

    let root_after = read(&fs, "Root.tsx");
    assert!(!root_after.contains("<Card"));
    assert!(!root_after.contains("Inside"));
    assert!(root_after.contains("<main"));
    assert!(editor.graph().component(&card).is_some());

    assert!(editor.undo().unwrap());
    assert_eq!(read(&fs, "Root.tsx"), root_before);
}

#[test]
fn test_component_delta_out_of_range() {
    let fs = project(&[("Root.tsx", CARD_ROOT), ("Card.tsx", CARD)]);
    let mut editor = open(&fs);
    let (root, card) = (component("Root"), component("Card"));

    let err = editor
        .apply(Mutation::DeleteComponent(DeleteComponent {
            source_component_address: root.clone(),
            hierarchy_ids: vec![id(&root, "0", 0), id(&card, "0", 0)],
            component_delta: -2,
        }))
        .unwrap_err();
    assert!(matches!(err, EditorError::NotFound(_)));
}

#[test]
fn test_repeated_instances_have_distinct_occurrences() {
    let fs = project(&[
        (
            "Root.tsx",
            "import { Item } from \"./Item\";\n\nexport default function Root() {\n  return <ul><Item /><Item /><Item /></ul>;\n}\n",
        ),
        (
            "Item.tsx",
            "export function Item() {\n  return <li>item</li>;\n}\n",
        ),
    ]);
    let editor = open(&fs);
    let (root, item) = (component("Root"), component("Item"));

    let view = editor.hierarchy(&root, &[id(&root, "0", 0)]);
    let ids: Vec<_> = view
        .children
        .iter()
        .map(|entry| entry.hierarchy_id.clone().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            format!("{}:0#0", item),
            format!("{}:0#1", item),
            format!("{}:0#2", item),
        ]
    );

    let first = editor
        .resolve(&root, &[id(&root, "0", 0), id(&item, "0", 0)])
        .found()
        .unwrap();
    let third = editor
        .resolve(&root, &[id(&root, "0", 0), id(&item, "0", 2)])
        .found()
        .unwrap();
    assert_eq!(first.target, third.target);
    assert_ne!(first.crossings[0].locator, third.crossings[0].locator);

    let labels: Vec<_> = view.children.iter().map(|entry| entry.label.as_str()).collect();
    assert_eq!(labels, vec!["li[0]", "li[1]", "li[2]"]);
}

#[test]
fn test_failed_mutation_changes_nothing() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let root = component("Root");
    let before = (read(&fs, "Root.tsx"), read(&fs, "Child.tsx"));

    let err = editor
        .apply(Mutation::DeleteComponent(DeleteComponent {
            source_component_address: root.clone(),
            hierarchy_ids: vec![id(&root, "0", 0), id(&root, "9", 0)],
            component_delta: 0,
        }))
        .unwrap_err();
    assert!(matches!(err, EditorError::NotFound(_)));

    let err = editor
        .apply(update_text("missing", vec![id(&root, "0", 0)], "x"))
        .unwrap_err();
    assert!(err.is_client_error());

    assert_eq!((read(&fs, "Root.tsx"), read(&fs, "Child.tsx")), before);
    assert!(!editor.undo_redo_metadata().can_undo);
    assert!(fs.contents(Path::new("/p/.ecu/ecu-history.json")).is_none());
}

#[test]
fn test_undo_redo_symmetry() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let (root, child) = (component("Root"), component("Child"));
    let path = vec![id(&root, "0", 0), id(&child, "0", 0)];
    let original = read(&fs, "Child.tsx");

    editor.apply(update_text(&root, path.clone(), "One")).unwrap();
    let changed = read(&fs, "Child.tsx");

    assert!(editor.undo().unwrap());
    assert_eq!(read(&fs, "Child.tsx"), original);
    assert!(editor.undo_redo_metadata().can_redo);

    assert!(editor.redo().unwrap());
    assert_eq!(read(&fs, "Child.tsx"), changed);
    assert!(!editor.redo().unwrap());

    // A new change after an undo drops the redo entry
    editor.undo().unwrap();
    editor.apply(update_text(&root, path, "Two")).unwrap();
    let meta = editor.undo_redo_metadata();
    assert!(!meta.can_redo);
    assert!(meta.undo_description.unwrap().contains("Two"));

    // The graph follows the files
    let span = editor
        .resolve(&root, &[id(&root, "0", 0), id(&child, "0", 0)])
        .found()
        .and_then(|found| found.target)
        .unwrap();
    assert_eq!(span.file, Path::new("/p/Child.tsx"));
}

#[test]
fn test_undo_refuses_after_external_change() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let (root, child) = (component("Root"), component("Child"));

    editor
        .apply(update_text(&root, vec![id(&root, "0", 0), id(&child, "0", 0)], "Mine"))
        .unwrap();
    fs.add_file("/p/Child.tsx", "export default function Child() { return null; }\n");

    let err = editor.undo().unwrap_err();
    assert!(matches!(err, EditorError::HistoryConflict(ref path) if path == Path::new("/p/Child.tsx")));
    assert_eq!(
        read(&fs, "Child.tsx"),
        "export default function Child() { return null; }\n"
    );
}

#[test]
fn test_add_component_inserts_import() {
    let fs = project(&[
        ("Root.tsx", ROOT),
        ("Child.tsx", CHILD),
        ("Badge.tsx", "export function Badge() {\n  return <b>new</b>;\n}\n"),
    ]);
    let mut editor = open(&fs);
    let (root, child, badge) = (component("Root"), component("Child"), component("Badge"));

    let output = editor
        .apply(Mutation::AddComponent(AddComponent {
            source_component_address: root.clone(),
            target_component_address: badge.clone(),
            hierarchy_ids: vec![id(&root, "0", 0)],
            hierarchy_position: HierarchyPosition::Children,
            component_delta: 0,
        }))
        .unwrap();
    assert_eq!(output, MutationOutput::Address(root.clone()));

    let text = read(&fs, "Root.tsx");
    assert!(text.starts_with(
        "import Child from \"./Child\";\nimport { Badge } from \"./Badge\";\n\nexport default function Root()"
    ));
    assert!(text.contains(&format!("<Badge key=\"{}~1\" />", root)));

    let view = editor.hierarchy(&root, &[id(&root, "0", 0)]);
    let ids: Vec<_> = view
        .children
        .iter()
        .map(|entry| entry.hierarchy_id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec![format!("{}:0#0", child), format!("{}:0#0", badge)]);

    // A second add reuses the import
    editor
        .apply(Mutation::AddComponent(AddComponent {
            source_component_address: root.clone(),
            target_component_address: badge.clone(),
            hierarchy_ids: vec![id(&root, "0", 0)],
            hierarchy_position: HierarchyPosition::Children,
            component_delta: 0,
        }))
        .unwrap();
    assert_eq!(read(&fs, "Root.tsx").matches("from \"./Badge\"").count(), 1);
}

#[test]
fn test_add_component_wraps_and_places_siblings() {
    let fs = project(&[
        ("Root.tsx", ROOT),
        ("Child.tsx", CHILD),
        ("Badge.tsx", "export function Badge() {\n  return <b>new</b>;\n}\n"),
    ]);
    let mut editor = open(&fs);
    let (root, badge) = (component("Root"), component("Badge"));

    editor
        .apply(Mutation::AddComponent(AddComponent {
            source_component_address: root.clone(),
            target_component_address: badge.clone(),
            hierarchy_ids: vec![id(&root, "0", 0)],
            hierarchy_position: HierarchyPosition::Parent,
            component_delta: 0,
        }))
        .unwrap();
    let text = read(&fs, "Root.tsx");
    assert!(text.contains(&format!("<Badge key=\"{}~0\"><div data-ecu=\"{}:0\">", root, root)));
    assert!(text.contains("</div></Badge>"));

    editor.undo().unwrap();
    editor
        .apply(Mutation::AddComponent(AddComponent {
            source_component_address: root.clone(),
            target_component_address: badge.clone(),
            hierarchy_ids: vec![id(&root, "0", 0)],
            hierarchy_position: HierarchyPosition::Before,
            component_delta: 0,
        }))
        .unwrap();
    // A root element has no sibling list, so both end up in a fragment
    let text = read(&fs, "Root.tsx");
    assert!(text.contains(&format!("<><Badge key=\"{}~0\" /><div data-ecu=\"{}:0\">", root, root)));
}

#[test]
fn test_move_within_file() {
    let page = "export default function Page() {\n  return (\n    <div>\n      <h1>Title</h1>\n      <p>Body</p>\n    </div>\n  );\n}\n";
    let fs = project(&[("Page.tsx", page)]);
    let mut editor = open(&fs);
    let p = component("Page");

    let output = editor
        .apply(Mutation::MoveComponent(MoveComponent {
            source_component_address: p.clone(),
            source_hierarchy_ids: vec![id(&p, "0", 0), id(&p, "0_1", 0)],
            target_hierarchy_ids: vec![id(&p, "0", 0), id(&p, "0_0", 0)],
            hierarchy_position: HierarchyPosition::Before,
        }))
        .unwrap();
    assert_eq!(output, MutationOutput::Addresses(vec![p.clone()]));

    let text = read(&fs, "Page.tsx");
    assert!(text.find("Body").unwrap() < text.find("Title").unwrap());
    assert!(text.contains(&format!("<p data-ecu=\"{}:0_0\">Body</p>", p)));
    assert!(text.contains(&format!("<h1 data-ecu=\"{}:0_1\">Title</h1>", p)));

    let err = editor
        .apply(Mutation::MoveComponent(MoveComponent {
            source_component_address: p.clone(),
            source_hierarchy_ids: vec![id(&p, "0", 0)],
            target_hierarchy_ids: vec![id(&p, "0", 0), id(&p, "0_0", 0)],
            hierarchy_position: HierarchyPosition::Children,
        }))
        .unwrap_err();
    assert!(matches!(err, EditorError::InvalidRequest(_)));
}

#[test]
fn test_delete_root_element_leaves_null() {
    let page = "export default function Page() {\n  return (\n    <div>x</div>\n  );\n}\n";
    let fs = project(&[("Page.tsx", page)]);
    let mut editor = open(&fs);
    let p = component("Page");

    editor
        .apply(Mutation::DeleteComponent(DeleteComponent {
            source_component_address: p.clone(),
            hierarchy_ids: vec![id(&p, "0", 0)],
            component_delta: 0,
        }))
        .unwrap();
    assert_eq!(
        read(&fs, "Page.tsx"),
        "export default function Page() {\n  return (\n    null\n  );\n}\n"
    );
}

#[test]
fn test_text_with_markup_characters_is_quoted() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let (root, child) = (component("Root"), component("Child"));

    editor
        .apply(update_text(&root, vec![id(&root, "0", 0), id(&child, "0", 0)], "a < b"))
        .unwrap();
    assert!(read(&fs, "Child.tsx").contains(">{\"a < b\"}</span>"));
}

#[test]
fn test_text_edit_replaces_quoted_text() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);
    let (root, child) = (component("Root"), component("Child"));
    let path = vec![id(&root, "0", 0), id(&child, "0", 0)];

    editor.apply(update_text(&root, path.clone(), "a < b")).unwrap();
    editor.apply(update_text(&root, path.clone(), "plain")).unwrap();
    assert!(read(&fs, "Child.tsx").contains(&format!("<span data-ecu=\"{}:0\">plain</span>", child)));

    editor.apply(update_text(&root, path, "x {y}")).unwrap();
    let source = read(&fs, "Child.tsx");
    assert!(source.contains(">{\"x {y}\"}</span>"));
    assert!(!source.contains("plain"));
}

#[test]
fn test_text_edit_keeps_indentation_and_markup() {
    let card = "export default function Card() {\n  return (\n    <p>\n      Old text\n      <b>bold</b>\n    </p>\n  );\n}\n";
    let fs = project(&[("Card.tsx", card)]);
    let mut editor = open(&fs);
    let c = component("Card");

    editor.apply(update_text(&c, vec![id(&c, "0", 0)], "New text")).unwrap();
    let source = read(&fs, "Card.tsx");
    assert!(source.contains("\n      New text\n      <b"));
    assert!(!source.contains("Old text"));
    assert!(source.contains(">bold</b>"));
}

#[test]
fn test_create_component() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);

    let output = editor
        .apply(Mutation::CreateComponent(CreateComponent {
            name: "Hero".to_string(),
        }))
        .unwrap();
    let hero = get_component_id("/p/src/components/Hero.tsx", "Hero");
    assert_eq!(output, MutationOutput::Address(hero.clone()));

    let text = fs.contents(Path::new("/p/src/components/Hero.tsx")).unwrap();
    assert!(text.starts_with("import type { ComponentProps } from \"react\";\n"));
    assert!(text.contains(&format!("<div {{...props}} data-ecu=\"{}:0\">A div component</div>", hero)));
    assert!(editor.components().iter().any(|info| info.name == "Hero"));

    let err = editor
        .apply(Mutation::CreateComponent(CreateComponent {
            name: "Hero".to_string(),
        }))
        .unwrap_err();
    assert!(matches!(err, EditorError::InvalidRequest(_)));

    editor.undo().unwrap();
    assert!(fs.contents(Path::new("/p/src/components/Hero.tsx")).is_none());
    assert!(editor.component(&hero).is_err());
}

#[test]
fn test_component_queries() {
    let fs = project(&[("Root.tsx", CARD_ROOT), ("Card.tsx", CARD)]);
    let editor = open(&fs);

    let names: Vec<_> = editor.components().into_iter().map(|info| info.name).collect();
    assert_eq!(names, vec!["Card", "Root"]);

    let info = editor.component(&component("Root")).unwrap();
    let imports = editor.file_imports(&info.file_address).unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].specifier, "./Card");
    assert_eq!(imports[0].default.as_deref(), Some("Card"));
    assert_eq!(imports[0].path.as_deref(), Some(Path::new("/p/Card.tsx")));

    assert!(matches!(
        editor.file_imports("nope"),
        Err(EditorError::NotFound(_))
    ));
}

#[test]
fn test_history_survives_reopen() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let (root, child) = (component("Root"), component("Child"));
    {
        let mut editor = open(&fs);
        editor
            .apply(update_text(&root, vec![id(&root, "0", 0), id(&child, "0", 0)], "Saved"))
            .unwrap();
    }

    let mut editor = open(&fs);
    assert!(editor.undo_redo_metadata().can_undo);
    assert!(editor.undo().unwrap());
    assert!(read(&fs, "Child.tsx").contains(">Hello</span>"));
}

#[test]
fn test_real_project_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Root.tsx"), ROOT).unwrap();
    std::fs::write(dir.path().join("Child.tsx"), CHILD).unwrap();

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let mut editor =
        Editor::open(EditorOptions::new(dir.path()), fs, Box::new(NoopFormatter)).unwrap();
    assert_eq!(editor.address_project().unwrap().len(), 2);

    let root_path = dir.path().join("Root.tsx");
    let child_path = dir.path().join("Child.tsx");
    let root = get_component_id(&root_path.to_string_lossy(), "Root");
    let child = get_component_id(&child_path.to_string_lossy(), "Child");

    editor
        .apply(update_text(&root, vec![id(&root, "0", 0), id(&child, "0", 0)], "Disk"))
        .unwrap();
    assert!(std::fs::read_to_string(&child_path).unwrap().contains(">Disk</span>"));
    assert!(dir.path().join(".ecu/ecu-history.json").is_file());
}

#[test]
fn test_unsaved_history_reverts_the_change() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Root.tsx"), ROOT).unwrap();
    std::fs::write(dir.path().join("Child.tsx"), CHILD).unwrap();

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let mut editor =
        Editor::open(EditorOptions::new(dir.path()), fs, Box::new(NoopFormatter)).unwrap();
    editor.address_project().unwrap();

    // The log directory cannot be created over a plain file
    std::fs::write(dir.path().join(".ecu"), "not a directory").unwrap();

    let child_path = dir.path().join("Child.tsx");
    let before = std::fs::read_to_string(&child_path).unwrap();
    let root = get_component_id(&dir.path().join("Root.tsx").to_string_lossy(), "Root");
    let child = get_component_id(&child_path.to_string_lossy(), "Child");

    let err = editor
        .apply(update_text(&root, vec![id(&root, "0", 0), id(&child, "0", 0)], "Lost"))
        .unwrap_err();
    assert!(matches!(err, EditorError::Write { .. }));

    assert_eq!(std::fs::read_to_string(&child_path).unwrap(), before);
    assert_eq!(editor.graph().file_by_path(&child_path).unwrap().source, before);
    assert!(!editor.undo_redo_metadata().can_undo);
}

#[test]
fn test_rescan_forgets_deleted_components() {
    let fs = project(&[("Root.tsx", ROOT), ("Child.tsx", CHILD)]);
    let mut editor = open(&fs);

    fs.remove_file(Path::new("/p/Child.tsx")).unwrap();
    editor.rescan().unwrap();

    let names: Vec<_> = editor.components().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Root"]);
    assert!(editor.component(&component("Child")).is_err());
}

#[test]
fn test_double_forwarding_is_not_listed() {
    let fs = project(&[
        (
            "Root.tsx",
            "import Twice from \"./Twice\";\n\nexport default function Root() {\n  return <main><Twice><p>x</p></Twice></main>;\n}\n",
        ),
        (
            "Twice.tsx",
            "export default function Twice({ children }) {\n  return <div>{children}{children}</div>;\n}\n",
        ),
    ]);
    let editor = open(&fs);
    let (root, twice) = (component("Root"), component("Twice"));
    let path = vec![id(&root, "0", 0), id(&twice, "0", 0)];

    assert!(editor.resolve(&root, &path).is_found());
    let view = editor.hierarchy(&root, &path);
    assert_eq!(view.hierarchy.last().unwrap().label, "div[0]");
    assert!(view.children.is_empty());

    let mut through = path.clone();
    through.push(id(&root, "0_0", 0));
    assert!(!editor.resolve(&root, &through).is_found());
}

const SIBLINGS: &str = r#"function Child({ children }) {
  return <b>{children}</b>;
}

export default function Root() {
  return (
    <>
      <Child>Hi</Child>
      <Child>Hi</Child>
    </>
  );
}
"#;

#[test]
fn test_sibling_text_edit_keeps_addresses() {
    let fs = project(&[("Root.tsx", SIBLINGS)]);
    let mut editor = open(&fs);
    let root = component("Root");

    let ids = |editor: &Editor| -> Vec<String> {
        editor
            .hierarchy(&root, &[])
            .children
            .iter()
            .map(|entry| entry.hierarchy_id.clone().unwrap())
            .collect()
    };
    let before = ids(&editor);
    assert_eq!(before, vec![format!("{}:0#0", root), format!("{}:1#0", root)]);

    editor.apply(update_text(&root, vec![id(&root, "0", 0)], "Bye")).unwrap();

    assert_eq!(ids(&editor), before);
    let source = read(&fs, "Root.tsx");
    assert!(source.contains(&format!("<Child data-ecu=\"{}:0\">Bye</Child>", root)));
    assert!(source.contains(&format!("<Child data-ecu=\"{}:1\">Hi</Child>", root)));
}

/// Every id a listing offers resolves, and resolving it reports the same id
fn assert_listing_resolves(editor: &Editor, root: &str, path: Vec<HierarchyId>, depth: usize) {
    let view = editor.hierarchy(root, &path);
    for entry in &view.children {
        let child: HierarchyId = entry.hierarchy_id.as_deref().unwrap().parse().unwrap();
        let mut next = path.clone();
        next.push(child);

        let found = editor.resolve(root, &next).found();
        assert!(found.is_some(), "listed id does not resolve: {:?}", next);
        let route = editor.hierarchy(root, &next).hierarchy;
        assert_eq!(route.last().unwrap().hierarchy_id, entry.hierarchy_id);
        assert_eq!(route.last().unwrap().label, entry.label);

        if depth > 0 {
            assert_listing_resolves(editor, root, next, depth - 1);
        }
    }
}

#[test]
fn test_every_listed_id_resolves() {
    let fs = project(&[
        (
            "Root.tsx",
            r#"import Card from "./Card";
import { Item } from "./Item";

export default function Root() {
  return (
    <main>
      <Card>
        <p>Inside</p>
        <Item />
      </Card>
      <ul>
        <Item />
        <Item />
      </ul>
    </main>
  );
}
"#,
        ),
        ("Card.tsx", CARD),
        ("Item.tsx", "export function Item() {\n  return <li><span>item</span></li>;\n}\n"),
    ]);
    let editor = open(&fs);
    let root = component("Root");

    assert_eq!(editor.hierarchy(&root, &[]).children.len(), 1);
    assert_listing_resolves(&editor, &root, Vec::new(), 6);
}
