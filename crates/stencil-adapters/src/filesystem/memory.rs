//! In-memory filesystem adapter for testing.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use stencil_core::{
    application::{ApplicationError, ports::Filesystem},
    error::StencilResult,
};

/// In-memory filesystem for testing.
///
/// Clones share the same files, so a test can keep one handle and give
/// another to the cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    reads: Arc<AtomicUsize>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file.
    pub fn write_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.as_ref().to_path_buf(), content.into());
        }
    }

    /// Delete a file; returns whether it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files
            .write()
            .map(|mut files| files.remove(path.as_ref()).is_some())
            .unwrap_or(false)
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path.as_ref()))
            .unwrap_or(false)
    }

    /// Number of `read` calls so far, successful or not.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// List all files.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files
            .read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Filesystem for MemoryFilesystem {
    fn read(&self, path: &Path) -> StencilResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let files = self
            .files
            .read()
            .map_err(|_| ApplicationError::CacheLockError)?;

        files.get(path).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "File does not exist".into(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_remove() {
        let fs = MemoryFilesystem::new();
        fs.write_file("/t/a.html", "hello");

        assert!(fs.exists("/t/a.html"));
        assert_eq!(fs.read(Path::new("/t/a.html")).unwrap(), b"hello");
        assert!(fs.remove("/t/a.html"));
        assert!(fs.read(Path::new("/t/a.html")).is_err());
        assert_eq!(fs.read_count(), 2);
    }

    #[test]
    fn clones_share_files() {
        let fs = MemoryFilesystem::new();
        let other = fs.clone();
        other.write_file("/t/b.html", "shared");
        assert_eq!(fs.list_files(), vec![PathBuf::from("/t/b.html")]);
    }
}
