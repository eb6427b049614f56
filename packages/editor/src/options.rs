use std::path::PathBuf;

pub const DEFAULT_ADDRESS_ATTRIBUTE: &str = "data-ecu";
pub const DEFAULT_COMPONENTS_DIR: &str = "src/components";
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Settings for an [`Editor`](crate::Editor)
#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    /// Project root; scanned for sources and holds the history log
    pub root: PathBuf,
    /// Where new components are created, relative to `root`
    pub components_dir: PathBuf,
    pub address_attribute: String,
    /// Maximum history entries kept (0 = unlimited)
    pub history_limit: usize,
}

impl EditorOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            components_dir: PathBuf::from(DEFAULT_COMPONENTS_DIR),
            address_attribute: DEFAULT_ADDRESS_ATTRIBUTE.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}
