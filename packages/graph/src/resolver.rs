/// Import specifier resolution
///
/// Relative specifiers are resolved against the importing file's
/// directory. Omitted extensions and directory `index` files are tried
/// in the order of `RESOLVE_EXTENSIONS`.
use ecu_common::{normalize_path, FileSystem};
use ecu_parser::ast::{Dialect, RESOLVE_EXTENSIONS};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "." || specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve a relative import to an existing source file
pub fn resolve_import_path(
    specifier: &str,
    importing_file: &Path,
    fs: &dyn FileSystem,
) -> Option<PathBuf> {
    if !is_relative_specifier(specifier) {
        return None;
    }

    let base = normalize_path(&importing_file.parent()?.join(specifier));

    if Dialect::from_path(&base).is_some() && fs.is_file(&base) {
        return Some(base);
    }

    for ext in RESOLVE_EXTENSIONS {
        let candidate = with_appended_extension(&base, ext);
        if fs.is_file(&candidate) {
            return Some(candidate);
        }
    }

    for ext in RESOLVE_EXTENSIONS {
        let candidate = base.join(format!("index.{}", ext));
        if fs.is_file(&candidate) {
            return Some(candidate);
        }
    }

    None
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}
