use ecu_common::normalize_path;
use ecu_editor::options::{DEFAULT_ADDRESS_ATTRIBUTE, DEFAULT_COMPONENTS_DIR, DEFAULT_HISTORY_LIMIT};
use ecu_editor::{CommandFormatter, EditorOptions, Formatter, NoopFormatter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "ecu.config.json";
pub const DEFAULT_PORT: u16 = 4000;

/// ecu configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Directory scanned for components, relative to the project
    pub src_dir: String,

    /// Where new components are created
    pub components_dir: String,

    /// Attribute holding element addresses
    pub address_attribute: String,

    /// Undo entries kept (0 = unlimited)
    pub history_limit: usize,

    /// Formatter command; `{path}` is replaced with the file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<Vec<String>>,

    pub port: u16,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to source directory
    pub fn get_src_dir(&self, cwd: &Path) -> PathBuf {
        normalize_path(&cwd.join(&self.src_dir))
    }

    pub fn editor_options(&self, cwd: &Path) -> EditorOptions {
        EditorOptions {
            root: self.get_src_dir(cwd),
            components_dir: normalize_path(&cwd.join(&self.components_dir)),
            address_attribute: self.address_attribute.clone(),
            history_limit: self.history_limit,
        }
    }

    pub fn formatter(&self) -> Box<dyn Formatter> {
        match self.formatter.as_deref().and_then(CommandFormatter::new) {
            Some(formatter) => Box::new(formatter),
            None => Box::new(NoopFormatter),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: ".".to_string(),
            components_dir: DEFAULT_COMPONENTS_DIR.to_string(),
            address_attribute: DEFAULT_ADDRESS_ATTRIBUTE.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            formatter: None,
            port: DEFAULT_PORT,
        }
    }
}
