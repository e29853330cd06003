//! File access seam for backend config files
//!
//! The core never touches `std::fs` directly; it goes through `ConfigStore`
//! so tests can run every read/rewrite path against an in-memory tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub trait ConfigStore {
    /// True if `path` exists and can be read
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replace the whole file with `contents`
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Real filesystem store. Writes go to a sibling temp file that is renamed
/// over the target, so a failed write never leaves a half-written config.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        path.with_file_name(format!(".{name}.tmp"))
    }
}

impl ConfigStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        fs::File::open(path).is_ok()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let temp_path = Self::temp_path(path);
        fs::write(&temp_path, contents)?;

        // Keep the mode of the file being replaced
        if let Ok(meta) = fs::metadata(path)
            && let Err(e) = fs::set_permissions(&temp_path, meta.permissions())
        {
            warn!(path = %path.display(), error = %e, "Could not keep file mode of replaced config");
        }

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        debug!(path = %path.display(), bytes = contents.len(), "Wrote config file");
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        match fs::create_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            other => other,
        }
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }
}

#[cfg(test)]
pub use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, BTreeSet};

    /// In-memory file tree used by unit tests
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        files: RefCell<BTreeMap<PathBuf, String>>,
        dirs: RefCell<BTreeSet<PathBuf>>,
        read_only: RefCell<Vec<PathBuf>>,
        writes: Cell<usize>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
            let path = path.into();
            if let Some(parent) = path.parent() {
                self.add_dirs(parent);
            }
            self.files.borrow_mut().insert(path, contents.to_string());
            self
        }

        /// Any write or mkdir below `prefix` fails with PermissionDenied
        pub fn read_only_under(self, prefix: impl Into<PathBuf>) -> Self {
            self.read_only.borrow_mut().push(prefix.into());
            self
        }

        pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
            self.files.borrow().get(path.as_ref()).cloned()
        }

        /// Number of successful file writes and copies
        pub fn write_count(&self) -> usize {
            self.writes.get()
        }

        fn add_dirs(&self, dir: &Path) {
            let mut dirs = self.dirs.borrow_mut();
            for ancestor in dir.ancestors() {
                dirs.insert(ancestor.to_path_buf());
            }
        }

        fn check_writable(&self, path: &Path) -> io::Result<()> {
            if self.read_only.borrow().iter().any(|p| path.starts_with(p)) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            Ok(())
        }

        fn check_parent(&self, path: &Path) -> io::Result<()> {
            match path.parent() {
                Some(parent) if !self.dirs.borrow().contains(parent) => {
                    Err(io::Error::new(io::ErrorKind::NotFound, "no parent directory"))
                }
                _ => Ok(()),
            }
        }
    }

    impl ConfigStore for MemoryStore {
        fn exists(&self, path: &Path) -> bool {
            self.files.borrow().contains_key(path)
        }

        fn read(&self, path: &Path) -> io::Result<String> {
            self.contents(path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }

        fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
            self.check_writable(path)?;
            self.check_parent(path)?;
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), contents.to_string());
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            if !self.dirs.borrow().contains(path) {
                self.check_writable(path)?;
            }
            self.add_dirs(path);
            Ok(())
        }

        fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
            let contents = self.read(from)?;
            self.write(to, &contents)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_write_replaces_contents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tint2rc");
        fs::write(&path, "autohide = 0\n").unwrap();

        FsStore.write(&path, "autohide = 1\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "autohide = 1\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_write_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("40-opende-input.conf");
        fs::write(&path, "Option \"Tapping\" \"false\"\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        FsStore.write(&path, "Option \"Tapping\" \"true\"\n").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_fs_write_into_missing_dir_fails_without_touching_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("picom.conf");
        assert!(FsStore.write(&path, "shadow = true\n").is_err());
        assert!(!FsStore.exists(&path));
    }

    #[test]
    fn test_fs_create_dir_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        FsStore.create_dir_all(&nested).unwrap();
        FsStore.create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_memory_store_denies_read_only_prefix() {
        let store = MemoryStore::new()
            .with_file("/etc/X11/xorg.conf.d/other.conf", "")
            .read_only_under("/etc");
        let err = store
            .write(Path::new("/etc/X11/xorg.conf.d/40.conf"), "x")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(store.write_count(), 0);
    }
}
