use super::open_editor;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use ecu_editor::{Editor, HierarchyId};
use std::path::Path;

pub fn scan(cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let editor = open_editor(&config, cwd)?;
    let graph = editor.graph();

    println!(
        "{} {} files, {} components",
        "✓".green(),
        graph.file_count(),
        graph.component_count()
    );
    for file in graph.files().filter(|file| file.parse_error.is_some()) {
        println!(
            "  {} {}: {}",
            "✗".red(),
            file.path.display(),
            file.parse_error.as_deref().unwrap_or_default()
        );
    }
    for component in editor.components() {
        println!(
            "  {} {} {}",
            component.address.dimmed(),
            component.name.bright_white(),
            component.file_path.display()
        );
    }
    Ok(())
}

pub fn address(cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut editor = open_editor(&config, cwd)?;
    let written = editor.address_project()?;

    for path in &written {
        println!("  {} {}", "✓".green(), path.display());
    }
    println!("Addressed {} file(s)", written.len());
    Ok(())
}

#[derive(Debug, Args)]
pub struct HierarchyArgs {
    /// Root component, by address or name
    pub component: String,

    /// Hierarchy ids (`<address>#<occurrence>`)
    pub ids: Vec<String>,
}

fn find_component(editor: &Editor, key: &str) -> Result<String> {
    if editor.graph().component(key).is_some() {
        return Ok(key.to_string());
    }
    let matches: Vec<_> = editor
        .components()
        .into_iter()
        .filter(|component| component.name == key)
        .collect();
    match matches.as_slice() {
        [component] => Ok(component.address.clone()),
        [] => Err(anyhow!("No component named {}", key)),
        _ => Err(anyhow!("{} is ambiguous; use a component address", key)),
    }
}

pub fn hierarchy(args: HierarchyArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let editor = open_editor(&config, cwd)?;
    let root = find_component(&editor, &args.component)?;
    let ids = args
        .ids
        .iter()
        .map(|raw| raw.parse::<HierarchyId>())
        .collect::<Result<Vec<_>, _>>()?;

    let view = editor.hierarchy(&root, &ids);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub fn undo(cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut editor = open_editor(&config, cwd)?;
    let description = editor.undo_redo_metadata().undo_description;
    if editor.undo()? {
        println!("{} Undid: {}", "✓".green(), description.unwrap_or_default());
    } else {
        println!("{}", "Nothing to undo".yellow());
    }
    Ok(())
}

pub fn redo(cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut editor = open_editor(&config, cwd)?;
    let description = editor.undo_redo_metadata().redo_description;
    if editor.redo()? {
        println!("{} Redid: {}", "✓".green(), description.unwrap_or_default());
    } else {
        println!("{}", "Nothing to redo".yellow());
    }
    Ok(())
}
