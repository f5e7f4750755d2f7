use crate::content::ContentStore;
use crate::error::{FlatstoreError, Result};
use crate::filter::{self, QueryOption};
use crate::id::IdGenerator;
use crate::record::{Record, ID_COLUMN};
use crate::schema::{CollectionDefinition, SchemaDefinition};
use serde_json::Value;

/// Schema-checked, predicate-driven CRUD over a single collection per
/// call.
///
/// Each mutating operation is one full read of the collection's
/// content followed by at most one full write, and the write is
/// skipped entirely when nothing changed. The engine itself does no
/// locking; callers that allow concurrent writers must serialize the
/// read-modify-write span per collection (the [`Store`](crate::Store)
/// facade does).
pub struct Query<'a> {
    schema: &'a SchemaDefinition,
    content: &'a dyn ContentStore,
    ids: &'a dyn IdGenerator,
}

impl<'a> Query<'a> {
    pub fn new(
        schema: &'a SchemaDefinition,
        content: &'a dyn ContentStore,
        ids: &'a dyn IdGenerator,
    ) -> Self {
        Self {
            schema,
            content,
            ids,
        }
    }

    fn collection(&self, name: &str) -> Result<&'a CollectionDefinition> {
        self.schema
            .collection(name)
            .ok_or_else(|| FlatstoreError::CollectionNotFound(name.to_string()))
    }

    fn read_records(&self, collection_name: &str) -> Result<Vec<Record>> {
        let raw = self.content.read(collection_name)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_records(&self, collection_name: &str, records: &[Record]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.content.write(collection_name, &raw)
    }

    /// Project `data` onto the collection's declared columns. An
    /// undeclared key is a hard error, not a silent drop.
    fn project_columns(
        &self,
        collection_name: &str,
        collection: &CollectionDefinition,
        data: &Record,
    ) -> Result<Record> {
        let mut projected = Record::new();
        for (key, value) in data {
            if !collection.has_column(key) {
                return Err(FlatstoreError::UnknownColumn {
                    column: key.clone(),
                    collection: collection_name.to_string(),
                });
            }
            projected.insert(key.clone(), value.clone());
        }
        Ok(projected)
    }

    /// Insert a new record and return its generated id.
    ///
    /// The id is generated here on every insert; a caller-supplied
    /// `id` value never survives. Required columns must be present in
    /// the final record or the insert fails listing every missing
    /// name.
    pub fn insert(&self, collection_name: &str, data: &Record) -> Result<String> {
        let collection = self.collection(collection_name)?;
        let projected = self.project_columns(collection_name, collection, data)?;

        let id = self.ids.next_id();
        let mut record = Record::new();
        record.insert(ID_COLUMN.to_string(), Value::String(id.clone()));
        for (key, value) in projected {
            if key != ID_COLUMN {
                record.insert(key, value);
            }
        }

        let missing: Vec<String> = collection
            .required_columns()
            .iter()
            .filter(|name| !record.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FlatstoreError::MissingRequiredFields(missing));
        }

        let mut records = self.read_records(collection_name)?;
        records.push(record);
        self.write_records(collection_name, &records)?;

        log::debug!("inserted {collection_name}/{id}");
        Ok(id)
    }

    /// Return the records matching `option.where`, in stored order.
    pub fn select(&self, collection_name: &str, option: &QueryOption) -> Result<Vec<Record>> {
        self.collection(collection_name)?;
        let records = self.read_records(collection_name)?;
        Ok(filter::filter(records, option.r#where.as_ref()))
    }

    /// Merge `data` over every record matching `option.where` and
    /// return how many records matched. Zero matches means no write.
    ///
    /// Only the changed columns are merged, so a partial update is
    /// allowed even when the merged record would no longer pass the
    /// required-column check that insert applies.
    pub fn update(
        &self,
        collection_name: &str,
        data: &Record,
        option: &QueryOption,
    ) -> Result<usize> {
        let collection = self.collection(collection_name)?;
        let changes = self.project_columns(collection_name, collection, data)?;

        let mut records = self.read_records(collection_name)?;
        let mut updated = 0;
        for record in &mut records {
            if filter::matches(record, option.r#where.as_ref()) {
                for (key, value) in &changes {
                    record.insert(key.clone(), value.clone());
                }
                updated += 1;
            }
        }

        if updated == 0 {
            return Ok(0);
        }

        self.write_records(collection_name, &records)?;
        log::debug!("updated {updated} record(s) in {collection_name}");
        Ok(updated)
    }

    /// Remove every record matching `option.where` and return how many
    /// were removed. Zero matches means no write; kept records stay in
    /// their relative order.
    pub fn delete(&self, collection_name: &str, option: &QueryOption) -> Result<usize> {
        self.collection(collection_name)?;

        let records = self.read_records(collection_name)?;
        let total = records.len();
        let kept: Vec<Record> = records
            .into_iter()
            .filter(|record| !filter::matches(record, option.r#where.as_ref()))
            .collect();

        let deleted = total - kept.len();
        if deleted == 0 {
            return Ok(0);
        }

        self.write_records(collection_name, &kept)?;
        log::debug!("deleted {deleted} record(s) from {collection_name}");
        Ok(deleted)
    }
}
