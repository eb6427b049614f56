use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Source directory scanned for components
    #[arg(short, long, default_value = ".")]
    pub src_dir: String,

    /// Directory new components are created in
    #[arg(short, long)]
    pub components_dir: Option<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing ecu project...".bright_blue().bold());

    let mut config = Config {
        src_dir: args.src_dir,
        ..Config::default()
    };
    if let Some(components_dir) = args.components_dir {
        config.components_dir = components_dir;
    }

    let components_dir = cwd.join(&config.components_dir);
    if !components_dir.exists() {
        fs::create_dir_all(&components_dir)?;
        println!("  {} Created {}/", "✓".green(), config.components_dir);
    }

    // Write config file
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: ecu address");
    println!("  2. Run: ecu serve");

    Ok(())
}
