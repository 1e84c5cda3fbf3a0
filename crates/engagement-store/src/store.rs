use crate::record::Record;
use engagement_common::{Id, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A single staged mutation. `AtomicBatch` accumulates these and the store
/// applies all of them as one transaction ("used by C5 to
/// couple ledger insert + daily-cap increment + cached-score delta").
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert-or-replace.
    Put { table: String, record: Record },
    /// Insert that fails with `UniqueConstraint` if `id` already exists.
    InsertUnique { table: String, record: Record },
    Delete { table: String, id: Id },
    AddEdge { from: Id, label: String, to: Id },
}

/// Accumulates operations for one atomic commit. Generalizes
/// `icn_eventstore::EventStore::append`'s single-write API into a
/// multi-write unit, matching the `AtomicBatch`.
#[derive(Debug, Default, Clone)]
pub struct AtomicBatch {
    pub(crate) ops: Vec<Operation>,
}

impl AtomicBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize>(&mut self, table: &str, id: Id, value: &T) -> Result<&mut Self> {
        let record = Record::new(id, value)?;
        self.ops.push(Operation::Put {
            table: table.to_string(),
            record,
        });
        Ok(self)
    }

    pub fn insert_unique<T: Serialize>(
        &mut self,
        table: &str,
        id: Id,
        value: &T,
    ) -> Result<&mut Self> {
        let record = Record::new(id, value)?;
        self.ops.push(Operation::InsertUnique {
            table: table.to_string(),
            record,
        });
        Ok(self)
    }

    pub fn delete(&mut self, table: &str, id: Id) -> &mut Self {
        self.ops.push(Operation::Delete {
            table: table.to_string(),
            id,
        });
        self
    }

    pub fn add_edge(&mut self, from: Id, label: &str, to: Id) -> &mut Self {
        self.ops.push(Operation::AddEdge {
            from,
            label: label.to_string(),
            to,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Transactional record store consumed by every other component.
/// A single `commit` call applies every staged operation or none of
/// them.
pub trait RecordStore: Send + Sync {
    /// Fetches a typed record, returning `EngagementError::NotFound` if absent.
    fn get<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<T>;

    /// Like `get` but returns `Ok(None)` instead of `NotFound`.
    fn get_opt<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<Option<T>>;

    /// Scans a table, returning every row for which `predicate` is true.
    /// Callers re-read within their own transaction scope before branching
    /// on capacity/role-slot decisions, per the "reads within a
    /// transaction must re-read the rows they predicate on."
    fn scan<T: DeserializeOwned>(
        &self,
        table: &str,
        predicate: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>>;

    fn put<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()>;

    fn insert_unique<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()>;

    fn delete(&self, table: &str, id: &Id) -> Result<()>;

    fn add_edge(&self, from: &Id, label: &str, to: &Id) -> Result<()>;

    fn edges_from(&self, from: &Id, label: &str) -> Result<Vec<Id>>;

    fn edges_to(&self, to: &Id, label: &str) -> Result<Vec<Id>>;

    /// Applies every operation in `batch` as one all-or-nothing commit.
    fn commit(&self, batch: AtomicBatch) -> Result<()>;
}
