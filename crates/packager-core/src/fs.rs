//! Filesystem primitives used by the creator and the package manager

use crate::error::{PackagerError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem operations the scaffolding core depends on
pub trait Filesystem {
    fn is_directory(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Create a directory; with `recursive`, missing parents too
    fn make_directory(&self, path: &Path, recursive: bool) -> Result<()>;

    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Immediate subdirectories of `path`, sorted by name
    fn list_directories(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Remove everything inside `path`, keeping the directory itself
    fn clean_directory(&self, path: &Path) -> Result<()>;

    /// Remove `path` and everything inside it
    fn delete_directory(&self, path: &Path) -> Result<()>;

    /// Whether `path` is a directory with no entries
    fn is_empty_directory(&self, path: &Path) -> bool;

    /// Read a file as UTF-8 text
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| {
            PackagerError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }
}

/// [`Filesystem`] backed by the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn make_directory(&self, path: &Path, recursive: bool) -> Result<()> {
        let result = if recursive {
            std::fs::create_dir_all(path)
        } else {
            std::fs::create_dir(path)
        };
        result.map_err(|e| PackagerError::io(path, e))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| PackagerError::io(path, e))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        std::fs::write(path, contents).map_err(|e| PackagerError::io(path, e))
    }

    fn list_directories(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let err = std::io::Error::other(e.to_string());
                PackagerError::io(path, err)
            })?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }
        Ok(dirs)
    }

    fn clean_directory(&self, path: &Path) -> Result<()> {
        let entries = std::fs::read_dir(path).map_err(|e| PackagerError::io(path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PackagerError::io(path, e))?;
            let entry_path = entry.path();
            let result = if entry_path.is_dir() {
                std::fs::remove_dir_all(&entry_path)
            } else {
                std::fs::remove_file(&entry_path)
            };
            result.map_err(|e| PackagerError::io(&entry_path, e))?;
        }
        Ok(())
    }

    fn delete_directory(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir_all(path).map_err(|e| PackagerError::io(path, e))
    }

    fn is_empty_directory(&self, path: &Path) -> bool {
        std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false)
    }
}

/// Create a directory unless it already exists
pub fn ensure_directory<F: Filesystem + ?Sized>(fs: &F, path: &Path) -> Result<()> {
    if !fs.is_directory(path) {
        fs.make_directory(path, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");
        let fs = LocalFilesystem;

        ensure_directory(&fs, &dir).unwrap();
        fs.write_file(&dir.join("keep.txt"), b"data").unwrap();
        ensure_directory(&fs, &dir).unwrap();

        assert!(fs.is_directory(&dir));
        assert_eq!(fs.read_file(&dir.join("keep.txt")).unwrap(), b"data");
    }

    #[test]
    fn test_list_directories_skips_files() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        fs.make_directory(&tmp.path().join("laravel_5.0"), false).unwrap();
        fs.make_directory(&tmp.path().join("default"), false).unwrap();
        fs.write_file(&tmp.path().join("README"), b"").unwrap();

        let names: Vec<String> = fs
            .list_directories(tmp.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["default", "laravel_5.0"]);
    }

    #[test]
    fn test_clean_directory_keeps_root() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let scratch = tmp.path().join("scratch");
        fs.make_directory(&scratch.join("nested"), true).unwrap();
        fs.write_file(&scratch.join("trace"), b"x").unwrap();

        fs.clean_directory(&scratch).unwrap();

        assert!(fs.is_directory(&scratch));
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_directory() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let vendor = tmp.path().join("acme");
        fs.make_directory(&vendor.join("billing/src"), true).unwrap();

        assert!(!fs.is_empty_directory(&vendor));
        fs.delete_directory(&vendor.join("billing")).unwrap();
        assert!(fs.is_empty_directory(&vendor));
        assert!(!fs.is_empty_directory(&tmp.path().join("missing")));
    }

    #[test]
    fn test_read_to_string_rejects_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let file = tmp.path().join("bin");
        fs.write_file(&file, &[0xff, 0xfe]).unwrap();

        assert!(matches!(
            fs.read_to_string(&file),
            Err(PackagerError::IoFailure { .. })
        ));
    }
}
