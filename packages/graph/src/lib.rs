pub mod error;
pub mod graph;
pub mod resolver;

pub use error::{GraphError, GraphResult};
pub use graph::{ComponentNode, FileNode, ImportEdge, ScanSummary, SourceGraph};
pub use resolver::{is_relative_specifier, resolve_import_path};
