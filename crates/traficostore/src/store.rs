//! Persistent store contract and the in-memory implementation
//!
//! Lookups are by exact stored encoding. A query for `Str("123")` does not
//! match a record stored under `Int(123)`; callers that need to bridge
//! encodings try candidates in order.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::{IdentValue, Record, RecordKind};

/// Store capabilities consumed by the lookup path and the bulk loader
pub trait RecordStore: Send + Sync {
    /// Find a record by exact identifier encoding
    fn find_one(&self, kind: RecordKind, ident: &IdentValue) -> Result<Option<Record>>;

    /// List every known identifier for a kind, in their stored encodings
    fn list_ids(&self, kind: RecordKind) -> Result<Vec<IdentValue>>;

    /// Insert a record, failing with [`Error::DuplicateKey`] if its
    /// (kind, uuid) identity is already present
    fn insert(&self, record: Record) -> Result<()>;
}

/// Outcome of a bulk load
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records inserted
    pub inserted: usize,
    /// Records skipped because their identity already existed
    pub duplicates: usize,
}

/// In-memory document store holding both record populations
#[derive(Default)]
pub struct MemoryStore {
    alerts: RwLock<HashMap<IdentValue, Record>>,
    jams: RwLock<HashMap<IdentValue, Record>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn population(&self, kind: RecordKind) -> &RwLock<HashMap<IdentValue, Record>> {
        match kind {
            RecordKind::Alert => &self.alerts,
            RecordKind::Jam => &self.jams,
        }
    }

    /// Total records across both kinds
    pub fn len(&self) -> usize {
        self.alerts.read().len() + self.jams.read().len()
    }

    /// Check whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bulk-load a seed document of the form
    /// `{"alertas": [...], "atascos": [...]}`
    ///
    /// Each entry must carry a `uuid`. Duplicate identities are counted and
    /// skipped; any other error aborts the load.
    pub fn load_json(&self, doc: &Value) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();

        for (field, kind) in [("alertas", RecordKind::Alert), ("atascos", RecordKind::Jam)] {
            let entries = match doc.get(field) {
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(Error::Parse(format!("'{}' is not an array", field)));
                }
                None => continue,
            };

            for entry in entries {
                let record = Record::from_doc(kind, entry)?;
                match self.insert(record) {
                    Ok(()) => summary.inserted += 1,
                    Err(Error::DuplicateKey(_)) => summary.duplicates += 1,
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(summary)
    }
}

impl RecordStore for MemoryStore {
    fn find_one(&self, kind: RecordKind, ident: &IdentValue) -> Result<Option<Record>> {
        Ok(self.population(kind).read().get(ident).cloned())
    }

    fn list_ids(&self, kind: RecordKind) -> Result<Vec<IdentValue>> {
        Ok(self.population(kind).read().keys().cloned().collect())
    }

    fn insert(&self, record: Record) -> Result<()> {
        let mut population = self.population(record.kind).write();

        if population.contains_key(&record.uuid) {
            return Err(Error::DuplicateKey(format!(
                "{}:{}",
                record.kind.wire_name(),
                record.uuid
            )));
        }

        population.insert(record.uuid.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kind: RecordKind, uuid: IdentValue) -> Record {
        Record::from_doc(kind, &json!({ "uuid": serde_json::to_value(&uuid).unwrap() }))
            .unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let store = MemoryStore::new();
        store
            .insert(record(RecordKind::Alert, "a1".into()))
            .unwrap();

        let found = store
            .find_one(RecordKind::Alert, &"a1".into())
            .unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().uuid, IdentValue::Str("a1".to_string()));
    }

    #[test]
    fn test_find_requires_exact_encoding() {
        let store = MemoryStore::new();
        store.insert(record(RecordKind::Jam, 123u64.into())).unwrap();

        // The string form is a different key
        let as_string = store
            .find_one(RecordKind::Jam, &"123".into())
            .unwrap();
        assert!(as_string.is_none());

        let as_int = store.find_one(RecordKind::Jam, &123u64.into()).unwrap();
        assert!(as_int.is_some());
    }

    #[test]
    fn test_kinds_are_separate_populations() {
        let store = MemoryStore::new();
        store
            .insert(record(RecordKind::Alert, "x1".into()))
            .unwrap();

        let in_jams = store.find_one(RecordKind::Jam, &"x1".into()).unwrap();
        assert!(in_jams.is_none());
    }

    #[test]
    fn test_insert_duplicate() {
        let store = MemoryStore::new();
        store
            .insert(record(RecordKind::Alert, "a1".into()))
            .unwrap();

        let result = store.insert(record(RecordKind::Alert, "a1".into()));
        assert!(matches!(result, Err(Error::DuplicateKey(_))));
    }

    #[test]
    fn test_list_ids() {
        let store = MemoryStore::new();
        store
            .insert(record(RecordKind::Alert, "a1".into()))
            .unwrap();
        store
            .insert(record(RecordKind::Alert, "a2".into()))
            .unwrap();
        store.insert(record(RecordKind::Jam, 7u64.into())).unwrap();

        let mut alert_ids = store.list_ids(RecordKind::Alert).unwrap();
        alert_ids.sort_by_key(|id| id.to_string());
        assert_eq!(alert_ids, vec!["a1".into(), "a2".into()]);

        assert_eq!(store.list_ids(RecordKind::Jam).unwrap(), vec![7u64.into()]);
    }

    #[test]
    fn test_load_json_mixed_encodings() {
        let store = MemoryStore::new();
        let doc = json!({
            "alertas": [
                { "uuid": "a1", "city": "Santiago" },
                { "uuid": "a2" }
            ],
            "atascos": [
                { "uuid": 42 },
                { "uuid": "9-876" }
            ]
        });

        let summary = store.load_json(&doc).unwrap();
        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.duplicates, 0);

        assert!(store
            .find_one(RecordKind::Jam, &42u64.into())
            .unwrap()
            .is_some());
        assert!(store
            .find_one(RecordKind::Jam, &"9-876".into())
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_load_json_counts_duplicates() {
        let store = MemoryStore::new();
        let doc = json!({
            "alertas": [
                { "uuid": "a1" },
                { "uuid": "a1" },
                { "uuid": "a2" }
            ]
        });

        let summary = store.load_json(&doc).unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_load_json_rejects_malformed() {
        let store = MemoryStore::new();
        let doc = json!({ "alertas": [ { "city": "no uuid here" } ] });

        let result = store.load_json(&doc);
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
