use crate::result::CommonResult;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

/// Directories never scanned for sources
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", ".ecu", "target", "dist", "build"];

/// File system abstraction for scanning, resolution and testing
pub trait FileSystem: Send + Sync {
    /// Check if a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a regular file exists
    fn is_file(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write a file, creating parent directories as needed
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Every file below `root`, skipping [`IGNORED_DIRS`], in sorted order
    fn walk(&self, root: &Path) -> CommonResult<Vec<PathBuf>>;
}

/// Real file system implementation
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn walk(&self, root: &Path) -> CommonResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry
                        .file_name()
                        .to_str()
                        .map(|name| IGNORED_DIRS.contains(&name))
                        .unwrap_or(false)
            });
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// In-memory file system for testing
#[derive(Default)]
pub struct MockFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.into(), contents.into());
        }
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.lock().ok()?.get(path).cloned()
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "mock file system lock poisoned")
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    )
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.keys().any(|file| file.starts_with(path)))
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let files = self.files.lock().map_err(|_| poisoned())?;
        files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut files = self.files.lock().map_err(|_| poisoned())?;
        files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut files = self.files.lock().map_err(|_| poisoned())?;
        files.remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }

    fn walk(&self, root: &Path) -> CommonResult<Vec<PathBuf>> {
        let files = self.files.lock().map_err(|_| poisoned())?;
        Ok(files
            .keys()
            .filter(|path| path.starts_with(root))
            .filter(|path| {
                path.strip_prefix(root)
                    .map(|relative| {
                        !relative.components().any(|c| {
                            c.as_os_str()
                                .to_str()
                                .map(|name| IGNORED_DIRS.contains(&name))
                                .unwrap_or(false)
                        })
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

/// Lexically normalize a path, folding `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Relative import specifier from `from_file` to `to_file`, without extension
pub fn relative_specifier(from_file: &Path, to_file: &Path) -> String {
    let from_dir: Vec<_> = from_file
        .parent()
        .map(|dir| dir.components().collect())
        .unwrap_or_default();
    let target = to_file.with_extension("");
    let to: Vec<_> = target.components().collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from_dir.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().to_string());
    }

    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}
