//! Sled-backed `RecordStore`, generalizing
//! `icn_reputation::sled_store::SledReputationStore`'s single-tree,
//! bincode-encoded pattern into the multi-table + edge-table surface
//! requires.

use crate::record::Record;
use crate::store::{AtomicBatch, Operation, RecordStore};
use engagement_common::{EngagementError, Id, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Clone)]
pub struct SledStore {
    rows: sled::Tree,
    edges: sled::Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| EngagementError::Transient(format!("failed to open sled db: {e}")))?;
        let rows = db
            .open_tree("records")
            .map_err(|e| EngagementError::Transient(format!("failed to open tree: {e}")))?;
        let edges = db
            .open_tree("edges")
            .map_err(|e| EngagementError::Transient(format!("failed to open tree: {e}")))?;
        Ok(Self { rows, edges })
    }

    fn row_key(table: &str, id: &Id) -> Vec<u8> {
        format!("{table}\0{id}").into_bytes()
    }

    fn edge_key(from: &Id, label: &str) -> Vec<u8> {
        format!("{from}\0{label}").into_bytes()
    }

    fn read_row(&self, table: &str, id: &Id) -> Result<Option<Record>> {
        let bytes = self
            .rows
            .get(Self::row_key(table, id))
            .map_err(|e| EngagementError::Transient(format!("sled read failed: {e}")))?;
        match bytes {
            None => Ok(None),
            Some(ivec) => {
                let body = serde_json::from_slice(&ivec)
                    .map_err(|e| EngagementError::Serialization(e.to_string()))?;
                Ok(Some(Record {
                    id: id.clone(),
                    body,
                }))
            }
        }
    }

    fn write_row(&self, table: &str, record: &Record) -> Result<()> {
        let bytes = serde_json::to_vec(&record.body)
            .map_err(|e| EngagementError::Serialization(e.to_string()))?;
        self.rows
            .insert(Self::row_key(table, &record.id), bytes)
            .map_err(|e| EngagementError::Transient(format!("sled write failed: {e}")))?;
        Ok(())
    }

    fn read_edges(&self, from: &Id, label: &str) -> Result<Vec<Id>> {
        let bytes = self
            .edges
            .get(Self::edge_key(from, label))
            .map_err(|e| EngagementError::Transient(format!("sled read failed: {e}")))?;
        match bytes {
            None => Ok(Vec::new()),
            Some(ivec) => bincode::deserialize(&ivec)
                .map_err(|e| EngagementError::Serialization(e.to_string())),
        }
    }
}

impl RecordStore for SledStore {
    fn get<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<T> {
        self.get_opt(table, id)?
            .ok_or_else(|| EngagementError::not_found(format!("{table}:{id}")))
    }

    fn get_opt<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<Option<T>> {
        self.read_row(table, id)?.map(|r| r.decode()).transpose()
    }

    fn scan<T: DeserializeOwned>(
        &self,
        table: &str,
        predicate: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>> {
        let prefix = format!("{table}\0");
        let mut out = Vec::new();
        for entry in self.rows.scan_prefix(prefix.as_bytes()) {
            let (_, value) = entry
                .map_err(|e| EngagementError::Transient(format!("sled scan failed: {e}")))?;
            let body = serde_json::from_slice(&value)
                .map_err(|e| EngagementError::Serialization(e.to_string()))?;
            let decoded: T = serde_json::from_value(body)
                .map_err(|e| EngagementError::Serialization(e.to_string()))?;
            if predicate(&decoded) {
                out.push(decoded);
            }
        }
        Ok(out)
    }

    fn put<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()> {
        let record = Record::new(id, value)?;
        self.write_row(table, &record)?;
        self.rows
            .flush()
            .map_err(|e| EngagementError::Transient(format!("sled flush failed: {e}")))?;
        Ok(())
    }

    fn insert_unique<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()> {
        if self.read_row(table, &id)?.is_some() {
            return Err(EngagementError::UniqueConstraint(format!("{table}:{id}")));
        }
        self.put(table, id, value)
    }

    fn delete(&self, table: &str, id: &Id) -> Result<()> {
        self.rows
            .remove(Self::row_key(table, id))
            .map_err(|e| EngagementError::Transient(format!("sled delete failed: {e}")))?;
        Ok(())
    }

    fn add_edge(&self, from: &Id, label: &str, to: &Id) -> Result<()> {
        let mut current = self.read_edges(from, label)?;
        current.push(to.clone());
        let bytes = bincode::serialize(&current)
            .map_err(|e| EngagementError::Serialization(e.to_string()))?;
        self.edges
            .insert(Self::edge_key(from, label), bytes)
            .map_err(|e| EngagementError::Transient(format!("sled write failed: {e}")))?;
        Ok(())
    }

    fn edges_from(&self, from: &Id, label: &str) -> Result<Vec<Id>> {
        self.read_edges(from, label)
    }

    fn edges_to(&self, to: &Id, label: &str) -> Result<Vec<Id>> {
        let mut out = Vec::new();
        let suffix = format!("\0{label}");
        for entry in self.edges.iter() {
            let (key, value) = entry
                .map_err(|e| EngagementError::Transient(format!("sled scan failed: {e}")))?;
            let key_str = String::from_utf8_lossy(&key);
            if !key_str.ends_with(&suffix) {
                continue;
            }
            let from_str = key_str.trim_end_matches(&suffix).to_string();
            let targets: Vec<Id> = bincode::deserialize(&value)
                .map_err(|e| EngagementError::Serialization(e.to_string()))?;
            if targets.contains(to) {
                if let Ok(from) = from_str.parse::<Id>() {
                    out.push(from);
                }
            }
        }
        Ok(out)
    }

    fn commit(&self, batch: AtomicBatch) -> Result<()> {
        // Validate uniqueness constraints up front so the batch is
        // all-or-nothing even though sled writes land one at a time.
        for op in &batch.ops {
            if let Operation::InsertUnique { table, record } = op {
                if self.read_row(table, &record.id)?.is_some() {
                    return Err(EngagementError::UniqueConstraint(format!(
                        "{table}:{}",
                        record.id
                    )));
                }
            }
        }
        for op in batch.ops {
            match op {
                Operation::Put { table, record } => self.write_row(&table, &record)?,
                Operation::InsertUnique { table, record } => self.write_row(&table, &record)?,
                Operation::Delete { table, id } => self.delete(&table, &id)?,
                Operation::AddEdge { from, label, to } => self.add_edge(&from, &label, &to)?,
            }
        }
        self.rows
            .flush()
            .map_err(|e| EngagementError::Transient(format!("sled flush failed: {e}")))?;
        self.edges
            .flush()
            .map_err(|e| EngagementError::Transient(format!("sled flush failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Widget {
        name: String,
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let id = Id::new("widget", "1");
        store
            .put(
                "widgets",
                id.clone(),
                &Widget {
                    name: "gizmo".into(),
                },
            )
            .unwrap();
        let loaded: Widget = store.get("widgets", &id).unwrap();
        assert_eq!(loaded.name, "gizmo");
    }

    #[test]
    fn insert_unique_rejects_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let id = Id::new("widget", "1");
        let w = Widget { name: "a".into() };
        store.insert_unique("widgets", id.clone(), &w).unwrap();
        assert!(store.insert_unique("widgets", id, &w).is_err());
    }
}
