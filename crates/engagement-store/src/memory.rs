use crate::record::Record;
use crate::store::{AtomicBatch, Operation, RecordStore};
use engagement_common::{EngagementError, Id, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, HashMap<String, Record>>,
    edges: HashMap<(Id, String), Vec<Id>>,
}

/// In-memory `RecordStore`, generalizing `icn_eventstore::MemoryEventStore`
/// from a single append-only log into the full CRUD + graph-edge surface
/// requires. Used for tests and for a from-scratch node before
/// a durable backend is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, tables: &mut Tables, op: Operation) -> Result<()> {
        match op {
            Operation::Put { table, record } => {
                tables
                    .rows
                    .entry(table)
                    .or_default()
                    .insert(record.id.as_str().to_string(), record);
                Ok(())
            }
            Operation::InsertUnique { table, record } => {
                let bucket = tables.rows.entry(table.clone()).or_default();
                if bucket.contains_key(record.id.as_str()) {
                    return Err(EngagementError::UniqueConstraint(format!(
                        "{table}:{}",
                        record.id
                    )));
                }
                bucket.insert(record.id.as_str().to_string(), record);
                Ok(())
            }
            Operation::Delete { table, id } => {
                tables
                    .rows
                    .entry(table)
                    .or_default()
                    .remove(id.as_str());
                Ok(())
            }
            Operation::AddEdge { from, label, to } => {
                tables.edges.entry((from, label)).or_default().push(to);
                Ok(())
            }
        }
    }
}

impl RecordStore for MemoryStore {
    fn get<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<T> {
        self.get_opt(table, id)?
            .ok_or_else(|| EngagementError::not_found(format!("{table}:{id}")))
    }

    fn get_opt<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<Option<T>> {
        let tables = self.inner.read().map_err(|_| {
            EngagementError::Transient("record store lock poisoned".to_string())
        })?;
        tables
            .rows
            .get(table)
            .and_then(|bucket| bucket.get(id.as_str()))
            .map(|record| record.decode())
            .transpose()
    }

    fn scan<T: DeserializeOwned>(
        &self,
        table: &str,
        predicate: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>> {
        let tables = self.inner.read().map_err(|_| {
            EngagementError::Transient("record store lock poisoned".to_string())
        })?;
        let mut out = Vec::new();
        if let Some(bucket) = tables.rows.get(table) {
            for record in bucket.values() {
                let value: T = record.decode()?;
                if predicate(&value) {
                    out.push(value);
                }
            }
        }
        Ok(out)
    }

    fn put<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()> {
        let mut batch = AtomicBatch::new();
        batch.put(table, id, value)?;
        self.commit(batch)
    }

    fn insert_unique<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()> {
        let mut batch = AtomicBatch::new();
        batch.insert_unique(table, id, value)?;
        self.commit(batch)
    }

    fn delete(&self, table: &str, id: &Id) -> Result<()> {
        let mut batch = AtomicBatch::new();
        batch.delete(table, id.clone());
        self.commit(batch)
    }

    fn add_edge(&self, from: &Id, label: &str, to: &Id) -> Result<()> {
        let mut batch = AtomicBatch::new();
        batch.add_edge(from.clone(), label, to.clone());
        self.commit(batch)
    }

    fn edges_from(&self, from: &Id, label: &str) -> Result<Vec<Id>> {
        let tables = self.inner.read().map_err(|_| {
            EngagementError::Transient("record store lock poisoned".to_string())
        })?;
        Ok(tables
            .edges
            .get(&(from.clone(), label.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn edges_to(&self, to: &Id, label: &str) -> Result<Vec<Id>> {
        let tables = self.inner.read().map_err(|_| {
            EngagementError::Transient("record store lock poisoned".to_string())
        })?;
        Ok(tables
            .edges
            .iter()
            .filter(|((_, l), targets)| l == label && targets.contains(to))
            .map(|((from, _), _)| from.clone())
            .collect())
    }

    fn commit(&self, batch: AtomicBatch) -> Result<()> {
        // A single write-lock scope makes the whole batch atomic: either
        // every op in `batch.ops` lands or (on the first UniqueConstraint
        // failure) the lock is dropped with nothing written back, since we
        // validate uniqueness before mutating `tables`.
        let mut tables = self.inner.write().map_err(|_| {
            EngagementError::Transient("record store lock poisoned".to_string())
        })?;
        // Pre-validate uniqueness so a failure partway through the batch
        // can't leave earlier ops applied.
        for op in &batch.ops {
            if let Operation::InsertUnique { table, record } = op {
                if tables
                    .rows
                    .get(table)
                    .map(|b| b.contains_key(record.id.as_str()))
                    .unwrap_or(false)
                {
                    return Err(EngagementError::UniqueConstraint(format!(
                        "{table}:{}",
                        record.id
                    )));
                }
            }
        }
        for op in batch.ops {
            self.apply(&mut tables, op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Widget {
        id: String,
        name: String,
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        let id = Id::new("widget", "1");
        store
            .put(
                "widgets",
                id.clone(),
                &Widget {
                    id: id.as_str().to_string(),
                    name: "gizmo".into(),
                },
            )
            .unwrap();
        let loaded: Widget = store.get("widgets", &id).unwrap();
        assert_eq!(loaded.name, "gizmo");
    }

    #[test]
    fn insert_unique_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let id = Id::new("widget", "1");
        let w = Widget {
            id: id.as_str().to_string(),
            name: "a".into(),
        };
        store.insert_unique("widgets", id.clone(), &w).unwrap();
        let err = store.insert_unique("widgets", id, &w).unwrap_err();
        assert!(matches!(err, EngagementError::UniqueConstraint(_)));
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let existing = Id::new("widget", "dup");
        store
            .put(
                "widgets",
                existing.clone(),
                &Widget {
                    id: existing.as_str().to_string(),
                    name: "first".into(),
                },
            )
            .unwrap();

        let mut batch = AtomicBatch::new();
        batch
            .put(
                "widgets",
                Id::new("widget", "new"),
                &Widget {
                    id: "widget:new".into(),
                    name: "second".into(),
                },
            )
            .unwrap();
        batch
            .insert_unique(
                "widgets",
                existing.clone(),
                &Widget {
                    id: existing.as_str().to_string(),
                    name: "clobber".into(),
                },
            )
            .unwrap();

        assert!(store.commit(batch).is_err());
        // The earlier `put` in the same batch must not have landed.
        let found: Option<Widget> = store.get_opt("widgets", &Id::new("widget", "new")).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn edges_are_queryable_both_directions() {
        let store = MemoryStore::new();
        let guild = Id::new("guild", "g1");
        let member = Id::new("user", "u1");
        store
            .add_edge(&member, "responsible_for", &guild)
            .unwrap();
        assert_eq!(
            store.edges_from(&member, "responsible_for").unwrap(),
            vec![guild.clone()]
        );
        assert_eq!(
            store.edges_to(&guild, "responsible_for").unwrap(),
            vec![member]
        );
    }
}
