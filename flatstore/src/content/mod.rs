use crate::error::{FlatstoreError, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

/// Raw-text persistence for collection content, one named blob per
/// collection. All (de)serialization is the query engine's job; a
/// content store deals only in text.
pub trait ContentStore {
    fn read(&self, collection: &str) -> Result<String>;
    fn write(&self, collection: &str, content: &str) -> Result<()>;
}

/// One `<collection>.json` file per collection under a root directory.
/// Writes go to a temporary file in the same directory and are renamed
/// into place, so a reader never observes a half-written array.
pub struct FileContentStore {
    root: PathBuf,
}

impl FileContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    /// Seed the collection's backing file with an empty array when it
    /// does not exist yet.
    pub fn ensure(&self, collection: &str) -> Result<()> {
        if !self.path_for(collection).exists() {
            self.write(collection, "[]")?;
        }
        Ok(())
    }
}

impl ContentStore for FileContentStore {
    fn read(&self, collection: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path_for(collection))?)
    }

    fn write(&self, collection: &str, content: &str) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(self.path_for(collection))
            .map_err(|e| FlatstoreError::Io(e.error))?;
        Ok(())
    }
}

/// In-memory content store, for embedding and tests.
#[derive(Default)]
pub struct MemoryContentStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, collection: &str, content: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection.to_string(), content.to_string());
    }
}

impl ContentStore for MemoryContentStore {
    fn read(&self, collection: &str) -> Result<String> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .cloned()
            .ok_or_else(|| {
                FlatstoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no content for collection '{collection}'"),
                ))
            })
    }

    fn write(&self, collection: &str, content: &str) -> Result<()> {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection.to_string(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = FileContentStore::new(tmp.path());

        store.write("users", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(store.read("users").unwrap(), r#"[{"id":"1"}]"#);
    }

    #[test]
    fn test_file_store_overwrites_in_place() {
        let tmp = TempDir::new().unwrap();
        let store = FileContentStore::new(tmp.path());

        store.write("users", "[]").unwrap();
        store.write("users", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(store.read("users").unwrap(), r#"[{"id":"1"}]"#);

        // No temp files left behind after the rename
        let leftovers = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_file_store_read_missing_collection() {
        let tmp = TempDir::new().unwrap();
        let store = FileContentStore::new(tmp.path());
        assert!(store.read("ghost").is_err());
    }

    #[test]
    fn test_ensure_seeds_empty_array_once() {
        let tmp = TempDir::new().unwrap();
        let store = FileContentStore::new(tmp.path());

        store.ensure("users").unwrap();
        assert_eq!(store.read("users").unwrap(), "[]");

        // A second ensure must not clobber existing content
        store.write("users", r#"[{"id":"1"}]"#).unwrap();
        store.ensure("users").unwrap();
        assert_eq!(store.read("users").unwrap(), r#"[{"id":"1"}]"#);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryContentStore::new();
        assert!(store.read("users").is_err());

        store.write("users", "[]").unwrap();
        assert_eq!(store.read("users").unwrap(), "[]");
    }
}
