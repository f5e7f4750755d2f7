use crate::content::FileContentStore;
use crate::error::{FlatstoreError, Result};
use crate::filter::QueryOption;
use crate::id::{self, IdGenerator, TimestampIds};
use crate::query::Query;
use crate::record::Record;
use crate::schema::{parse_schema, SchemaDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// The main entry point for flatstore.
/// Opens a data directory, parses the schema, seeds each collection's
/// backing file, and exposes the four query operations.
///
/// Writes to the same collection are serialized through one lock per
/// collection name, so concurrent callers cannot lose updates in the
/// read-modify-write span. Reads take no lock: the file store swaps
/// content in atomically, so a reader sees either the old array or the
/// new one.
pub struct Store {
    root: PathBuf,
    schema: SchemaDefinition,
    content: FileContentStore,
    ids: HashMap<String, Box<dyn IdGenerator + Send + Sync>>,
    fallback_ids: TimestampIds,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Store {
    /// Open a flatstore at the given data directory path.
    /// Parses schema.yaml and creates an empty `<collection>.json` for
    /// every declared collection that has no backing file yet.
    pub fn open(path: &str) -> Result<Self> {
        let root = PathBuf::from(path);
        if !root.is_dir() {
            return Err(FlatstoreError::Schema(format!(
                "Data directory does not exist: {}",
                root.display()
            )));
        }

        let schema_path = root.join("schema.yaml");
        if !schema_path.exists() {
            return Err(FlatstoreError::Schema(format!(
                "schema.yaml not found in {}",
                root.display()
            )));
        }
        let schema = parse_schema(&schema_path)?;

        let content = FileContentStore::new(&root);
        let mut ids: HashMap<String, Box<dyn IdGenerator + Send + Sync>> = HashMap::new();
        for (name, collection) in &schema.collections {
            content.ensure(name)?;
            ids.insert(name.clone(), id::generator_for(collection.auto_id()));
        }
        log::debug!(
            "opened store at {} with {} collection(s)",
            root.display(),
            schema.collections.len()
        );

        Ok(Store {
            root,
            schema,
            content,
            ids,
            fallback_ids: TimestampIds::new(),
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the declared collections.
    pub fn collections(&self) -> Vec<&str> {
        self.schema.collections.keys().map(|k| k.as_str()).collect()
    }

    fn collection_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(name.to_string()).or_default().clone()
    }

    fn query(&self, collection_name: &str) -> Query<'_> {
        // Unknown collections fall back to the default generator; the
        // engine raises CollectionNotFound before the generator is used.
        let ids: &dyn IdGenerator = self
            .ids
            .get(collection_name)
            .map(|g| g.as_ref() as &dyn IdGenerator)
            .unwrap_or(&self.fallback_ids);
        Query::new(&self.schema, &self.content, ids)
    }

    /// Insert a record and return its generated id.
    pub fn insert(&self, collection_name: &str, data: &Record) -> Result<String> {
        let lock = self.collection_lock(collection_name);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.query(collection_name).insert(collection_name, data)
    }

    /// Return the records matching `option.where`, in stored order.
    pub fn select(&self, collection_name: &str, option: &QueryOption) -> Result<Vec<Record>> {
        self.query(collection_name).select(collection_name, option)
    }

    /// Merge `data` over matching records; returns the matched count.
    pub fn update(
        &self,
        collection_name: &str,
        data: &Record,
        option: &QueryOption,
    ) -> Result<usize> {
        let lock = self.collection_lock(collection_name);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.query(collection_name).update(collection_name, data, option)
    }

    /// Remove matching records; returns the removed count.
    pub fn delete(&self, collection_name: &str, option: &QueryOption) -> Result<usize> {
        let lock = self.collection_lock(collection_name);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.query(collection_name).delete(collection_name, option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_test_store() -> (TempDir, Store) {
        let tmp = TempDir::new().unwrap();
        let schema = r#"
collections:
  users:
    columns:
      - { name: name, required: true }
      - { name: email, required: true }
      - { name: age }

  events:
    id: { auto: ulid }
    columns:
      - { name: kind, required: true }
      - { name: payload }
"#;
        std::fs::write(tmp.path().join("schema.yaml"), schema).unwrap();

        let store = Store::open(tmp.path().to_str().unwrap()).unwrap();
        (tmp, store)
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn option(value: serde_json::Value) -> QueryOption {
        QueryOption::filtered(value.as_object().unwrap().clone())
    }

    #[test]
    fn test_open_seeds_collection_files() {
        let (tmp, store) = setup_test_store();
        assert_eq!(store.schema().collections.len(), 2);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("users.json")).unwrap(),
            "[]"
        );
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("events.json")).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_open_missing_directory() {
        let result = Store::open("/nonexistent/flatstore-data");
        assert!(matches!(result, Err(FlatstoreError::Schema(_))));
    }

    #[test]
    fn test_open_missing_schema_file() {
        let tmp = TempDir::new().unwrap();
        let result = Store::open(tmp.path().to_str().unwrap());
        assert!(matches!(result, Err(FlatstoreError::Schema(_))));
    }

    #[test]
    fn test_insert_and_select() {
        let (_tmp, store) = setup_test_store();

        let id = store
            .insert(
                "users",
                &record(json!({ "name": "Alice", "email": "alice@test.com" })),
            )
            .unwrap();
        assert!(!id.is_empty());

        let all = store.select("users", &QueryOption::all()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["id"], json!(id));
        assert_eq!(all[0]["name"], json!("Alice"));
    }

    #[test]
    fn test_records_survive_reopen() {
        let (tmp, store) = setup_test_store();
        let id = store
            .insert(
                "users",
                &record(json!({ "name": "Alice", "email": "alice@test.com" })),
            )
            .unwrap();
        drop(store);

        let store = Store::open(tmp.path().to_str().unwrap()).unwrap();
        let matched = store.select("users", &QueryOption::by_id(&id)).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["name"], json!("Alice"));
    }

    #[test]
    fn test_update_and_delete_through_facade() {
        let (_tmp, store) = setup_test_store();
        for (name, age) in [("Alice", 34), ("Bob", 28)] {
            store
                .insert(
                    "users",
                    &record(json!({ "name": name, "email": format!("{name}@t"), "age": age })),
                )
                .unwrap();
        }

        let updated = store
            .update(
                "users",
                &record(json!({ "age": 29 })),
                &option(json!({ "name": "Bob" })),
            )
            .unwrap();
        assert_eq!(updated, 1);

        let deleted = store
            .delete("users", &option(json!({ "age": 29 })))
            .unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.select("users", &QueryOption::all()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["name"], json!("Alice"));
    }

    #[test]
    fn test_no_op_update_leaves_file_untouched() {
        let (tmp, store) = setup_test_store();
        store
            .insert(
                "users",
                &record(json!({ "name": "Alice", "email": "a@t" })),
            )
            .unwrap();
        let before = std::fs::read(tmp.path().join("users.json")).unwrap();

        let updated = store
            .update(
                "users",
                &record(json!({ "age": 1 })),
                &option(json!({ "name": "Nobody" })),
            )
            .unwrap();
        assert_eq!(updated, 0);

        let after = std::fs::read(tmp.path().join("users.json")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unknown_collection_surfaces_from_engine() {
        let (_tmp, store) = setup_test_store();
        let err = store
            .insert("posts", &record(json!({ "name": "x" })))
            .unwrap_err();
        assert!(matches!(err, FlatstoreError::CollectionNotFound(_)));
    }

    #[test]
    fn test_ulid_strategy_from_schema() {
        let (_tmp, store) = setup_test_store();
        let id = store
            .insert("events", &record(json!({ "kind": "click" })))
            .unwrap();
        assert_eq!(id.len(), 26);
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn test_concurrent_inserts_are_not_lost() {
        use std::sync::Arc;

        let (_tmp, store) = setup_test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .insert(
                            "users",
                            &record(json!({ "name": format!("u{i}"), "email": format!("u{i}@t") })),
                        )
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = store.select("users", &QueryOption::all()).unwrap();
        assert_eq!(all.len(), 8);
    }
}
