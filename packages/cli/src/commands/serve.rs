use super::open_editor;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ecu_workspace::{serve as serve_api, watch_project, WorkspaceState};
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Do not watch the project for external edits
    #[arg(long)]
    pub no_watch: bool,
}

pub fn serve(args: ServeArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", args.host, port).parse()?;

    let mut editor = open_editor(&config, cwd)?;
    let addressed = editor.address_project()?;
    let root = editor.options().root.clone();

    println!("{}", "🚀 Starting ecu server...".bright_blue().bold());
    println!("   Root:      {}", root.display());
    println!("   Addressed: {} file(s)", addressed.len());
    println!("   API:       http://{}/api", addr.to_string().cyan());

    let state = WorkspaceState::shared(editor);
    let _watcher = if args.no_watch {
        None
    } else {
        Some(watch_project(state.clone(), root)?)
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve_api(state, addr))?;
    Ok(())
}
