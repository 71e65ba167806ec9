use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on same
/// filesystem) and falls back to copy + delete for cross-device moves.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Media files addressed by paths relative to a single root directory.
///
/// Records only ever hold relative paths; this type is the one place that
/// turns them into filesystem locations.
#[derive(Debug, Clone)]
pub struct ContentStorage {
    root: PathBuf,
}

impl ContentStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative content path. Absolute paths and `..` are refused.
    pub fn absolute(&self, relative: &Path) -> Result<PathBuf, StorageError> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(StorageError::OutsideRoot(relative.to_path_buf()));
        }
        Ok(self.root.join(relative))
    }

    pub fn exists(&self, relative: &Path) -> bool {
        self.absolute(relative).map(|p| p.exists()).unwrap_or(false)
    }

    pub fn read(&self, relative: &Path) -> Result<Vec<u8>, StorageError> {
        let path = self.absolute(relative)?;
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }

    /// Writes `content` at `relative`, replacing any previous file.
    ///
    /// The bytes land in a sibling temp file first and are renamed into
    /// place, so readers never observe a half-written file.
    pub fn write(&self, relative: &Path, content: &[u8]) -> Result<PathBuf, StorageError> {
        use std::io::Write;

        let target = self.absolute(relative)?;
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        self.ensure_directory(&dir)?;

        let mut staged =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| StorageError::WriteFile {
                path: target.clone(),
                source: e,
            })?;
        staged
            .write_all(content)
            .map_err(|e| StorageError::WriteFile {
                path: target.clone(),
                source: e,
            })?;
        staged
            .persist(&target)
            .map_err(|e| StorageError::WriteFile {
                path: target.clone(),
                source: e.error,
            })?;

        Ok(relative.to_path_buf())
    }

    /// Moves an external file into the store at `relative`.
    pub fn import(&self, source: &Path, relative: &Path) -> Result<PathBuf, StorageError> {
        let target = self.absolute(relative)?;
        if let Some(parent) = target.parent() {
            self.ensure_directory(parent)?;
        }
        move_file(source, &target)?;
        Ok(relative.to_path_buf())
    }

    /// Moves a stored file to a new relative path. Moving onto itself is a no-op.
    pub fn relocate(&self, from: &Path, to: &Path) -> Result<PathBuf, StorageError> {
        if from == to {
            return Ok(to.to_path_buf());
        }
        let source = self.absolute(from)?;
        self.import(&source, to)
    }

    /// Deletes a stored file. A file that is already gone is not an error.
    pub fn remove(&self, relative: &Path) -> Result<(), StorageError> {
        let path = self.absolute(relative)?;
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(StorageError::RemoveFile { path, source: e })
            }
            _ => Ok(()),
        }
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ContentStorage::new(temp_dir.path());
        let rel = Path::new("content/1/abc_3");
        storage.write(rel, b"abc").unwrap();

        storage.remove(rel).unwrap();
        assert!(!storage.exists(rel));
        storage.remove(rel).unwrap();
        assert!(storage.remove(Path::new("../outside")).is_err());
    }

    #[test]
    fn test_write_creates_directories_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ContentStorage::new(temp_dir.path());
        let rel = Path::new("thumbnail/1/5.jpg");

        storage.write(rel, b"first").unwrap();
        storage.write(rel, b"second").unwrap();

        assert_eq!(storage.read(rel).unwrap(), b"second");
        assert!(temp_dir.path().join("thumbnail/1/5.jpg").exists());
    }

    #[test]
    fn test_relocate_moves_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ContentStorage::new(temp_dir.path());
        let from = Path::new("content/1/abc_3");
        let to = Path::new("content/1/2016-10/22-143913_abc.jpg");
        storage.write(from, b"abc").unwrap();

        let moved = storage.relocate(from, to).unwrap();

        assert_eq!(moved, to);
        assert!(!storage.exists(from));
        assert_eq!(storage.read(to).unwrap(), b"abc");
    }

    #[test]
    fn test_relocate_onto_itself_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ContentStorage::new(temp_dir.path());
        let path = Path::new("content/1/abc_3");
        storage.write(path, b"abc").unwrap();

        storage.relocate(path, path).unwrap();
        assert_eq!(storage.read(path).unwrap(), b"abc");
    }

    #[test]
    fn test_import_moves_external_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ContentStorage::new(temp_dir.path().join("root"));
        let upload = temp_dir.path().join("upload.bin");
        std::fs::write(&upload, b"data").unwrap();

        storage.import(&upload, Path::new("content/7/x_4")).unwrap();

        assert!(!upload.exists());
        assert_eq!(storage.read(Path::new("content/7/x_4")).unwrap(), b"data");
    }

    #[test]
    fn test_paths_outside_root_are_refused() {
        let storage = ContentStorage::new("/srv/media");
        assert!(storage.absolute(Path::new("../etc/passwd")).is_err());
        assert!(storage.absolute(Path::new("/etc/passwd")).is_err());
        assert!(storage.absolute(Path::new("")).is_err());
        assert_eq!(
            storage.absolute(Path::new("content/a.jpg")).unwrap(),
            PathBuf::from("/srv/media/content/a.jpg")
        );
    }
}
