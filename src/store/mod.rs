// Record store module
// Whole-file JSON persistence for the record collection

mod error;
mod record;

pub use error::StoreError;
pub use record::{Fields, Record, ID_KEY};

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Flat-file record store.
///
/// Every operation reads the whole collection from disk and every
/// mutation rewrites the whole file; there are no partial or append
/// writes. No cross-process locking is taken, so two processes writing
/// the same file may interleave.
pub struct RecordStore {
    data_path: PathBuf,
    /// Next id to hand out. Floored at file-max + 1 on every create.
    next_id: AtomicU64,
}

impl RecordStore {
    /// Open a store backed by `data_path`.
    ///
    /// The id counter seeds from the highest numeric id already in the
    /// file, so a restarted process never hands out an id the collection
    /// still holds. An unreadable file seeds the counter at 1; the error
    /// itself resurfaces on the first operation.
    pub fn open(data_path: impl Into<PathBuf>) -> Self {
        let data_path = data_path.into();
        let seed = read_collection(&data_path)
            .map(|records| highest_numeric_id(&records) + 1)
            .unwrap_or(1);

        Self {
            data_path,
            next_id: AtomicU64::new(seed),
        }
    }

    /// Full ordered collection. An absent file is an empty collection.
    pub fn list(&self) -> Result<Vec<Record>, StoreError> {
        read_collection(&self.data_path)
    }

    /// Record with matching id.
    pub fn get(&self, id: &str) -> Result<Record, StoreError> {
        self.list()?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Assign a fresh id, append the record, and persist the collection.
    pub fn create(&self, fields: Fields) -> Result<Record, StoreError> {
        let mut records = self.list()?;
        let record = Record {
            id: self.assign_id(&records),
            fields,
        };
        records.push(record.clone());
        self.persist(&records)?;
        Ok(record)
    }

    /// Replace the fields of an existing record, keeping its id and its
    /// position in the collection.
    pub fn update(&self, id: &str, fields: Fields) -> Result<Record, StoreError> {
        let mut records = self.list()?;
        let Some(existing) = records.iter_mut().find(|record| record.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        existing.fields = fields;
        let updated = existing.clone();
        self.persist(&records)?;
        Ok(updated)
    }

    /// Remove the record with matching id and persist the collection.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.list()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }

        self.persist(&records)
    }

    /// Path of the backing file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Next id: monotonic within the process, never below file-max + 1
    /// so an externally edited file cannot cause a collision.
    fn assign_id(&self, records: &[Record]) -> String {
        let floor = highest_numeric_id(records) + 1;
        let id = self.next_id.load(Ordering::Relaxed).max(floor);
        self.next_id.store(id + 1, Ordering::Relaxed);
        id.to_string()
    }

    fn persist(&self, records: &[Record]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(records)?;
        fs::write(&self.data_path, content)?;
        Ok(())
    }
}

fn read_collection(path: &Path) -> Result<Vec<Record>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::Unavailable(e)),
    };

    Ok(serde_json::from_str(&content)?)
}

/// Highest id that parses as a number; non-numeric ids are ignored.
fn highest_numeric_id(records: &[Record]) -> u64 {
    records
        .iter()
        .filter_map(|record| record.id.parse().ok())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> RecordStore {
        RecordStore::open(dir.path().join("records.json"))
    }

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_create_then_get_returns_fields_with_fresh_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let created = store.create(fields(&[("name", "Alice")])).unwrap();
        assert_eq!(created.id, "1");

        let fetched = store.get(&created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.fields.get("name").map(String::as_str), Some("Alice"));
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.list().unwrap(), Vec::new());
    }

    #[test]
    fn test_get_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.get("42").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let created = store.create(fields(&[("name", "Alice")])).unwrap();
        store.delete(&created.id).unwrap();

        assert!(store.get(&created.id).unwrap_err().is_not_found());
        assert!(store.delete(&created.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let created = store.create(fields(&[("name", "Alice")])).unwrap();
        let new_fields = fields(&[("name", "Alicia"), ("city", "Pune")]);

        let first = store.update(&created.id, new_fields.clone()).unwrap();
        let second = store.update(&created.id, new_fields).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get(&created.id).unwrap(), second);
    }

    #[test]
    fn test_update_preserves_id_and_position() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.create(fields(&[("name", "Alice")])).unwrap();
        let second = store.create(fields(&[("name", "Bob")])).unwrap();
        store.create(fields(&[("name", "Carol")])).unwrap();

        store
            .update(&second.id, fields(&[("name", "Robert")]))
            .unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.fields["name"].clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("1".to_string(), "Alice".to_string()),
                ("2".to_string(), "Robert".to_string()),
                ("3".to_string(), "Carol".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_unknown_id_does_not_persist() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let err = store.update("9", fields(&[("name", "Ghost")])).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.list().unwrap(), Vec::new());
    }

    #[test]
    fn test_collection_round_trips_through_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let store = RecordStore::open(&path);
        store.create(fields(&[("name", "Alice")])).unwrap();
        store.create(fields(&[("name", "Bob"), ("city", "Delhi")])).unwrap();
        let written = store.list().unwrap();

        let reopened = RecordStore::open(&path);
        assert_eq!(reopened.list().unwrap(), written);
    }

    #[test]
    fn test_ids_are_not_reused_after_deleting_newest() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.create(fields(&[("name", "Alice")])).unwrap();
        let newest = store.create(fields(&[("name", "Bob")])).unwrap();
        store.delete(&newest.id).unwrap();

        let next = store.create(fields(&[("name", "Carol")])).unwrap();
        assert_eq!(next.id, "3");
    }

    #[test]
    fn test_reopen_seeds_counter_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let store = RecordStore::open(&path);
        store.create(fields(&[("name", "Alice")])).unwrap();
        store.create(fields(&[("name", "Bob")])).unwrap();

        let reopened = RecordStore::open(&path);
        let next = reopened.create(fields(&[("name", "Carol")])).unwrap();
        assert_eq!(next.id, "3");
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "not json at all").unwrap();

        let store = RecordStore::open(&path);
        let err = store.list().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_persisted_form_is_a_flat_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");

        let store = RecordStore::open(&path);
        store.create(fields(&[("name", "Alice")])).unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, serde_json::json!([{"id": "1", "name": "Alice"}]));
    }
}
