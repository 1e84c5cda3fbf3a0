use crate::memory::MemoryStore;
#[cfg(feature = "persist-sled")]
use crate::sled_store::SledStore;
use crate::store::{AtomicBatch, RecordStore};
use engagement_common::{Id, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Picks between the volatile and durable `RecordStore` impls at startup
/// without forcing every call site to be generic over which one was
/// chosen (names both as acceptable backends).
#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    #[cfg(feature = "persist-sled")]
    Sled(SledStore),
}

impl RecordStore for Store {
    fn get<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<T> {
        match self {
            Store::Memory(s) => s.get(table, id),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.get(table, id),
        }
    }

    fn get_opt<T: DeserializeOwned>(&self, table: &str, id: &Id) -> Result<Option<T>> {
        match self {
            Store::Memory(s) => s.get_opt(table, id),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.get_opt(table, id),
        }
    }

    fn scan<T: DeserializeOwned>(&self, table: &str, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        match self {
            Store::Memory(s) => s.scan(table, predicate),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.scan(table, predicate),
        }
    }

    fn put<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()> {
        match self {
            Store::Memory(s) => s.put(table, id, value),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.put(table, id, value),
        }
    }

    fn insert_unique<T: Serialize>(&self, table: &str, id: Id, value: &T) -> Result<()> {
        match self {
            Store::Memory(s) => s.insert_unique(table, id, value),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.insert_unique(table, id, value),
        }
    }

    fn delete(&self, table: &str, id: &Id) -> Result<()> {
        match self {
            Store::Memory(s) => s.delete(table, id),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.delete(table, id),
        }
    }

    fn add_edge(&self, from: &Id, label: &str, to: &Id) -> Result<()> {
        match self {
            Store::Memory(s) => s.add_edge(from, label, to),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.add_edge(from, label, to),
        }
    }

    fn edges_from(&self, from: &Id, label: &str) -> Result<Vec<Id>> {
        match self {
            Store::Memory(s) => s.edges_from(from, label),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.edges_from(from, label),
        }
    }

    fn edges_to(&self, to: &Id, label: &str) -> Result<Vec<Id>> {
        match self {
            Store::Memory(s) => s.edges_to(to, label),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.edges_to(to, label),
        }
    }

    fn commit(&self, batch: AtomicBatch) -> Result<()> {
        match self {
            Store::Memory(s) => s.commit(batch),
            #[cfg(feature = "persist-sled")]
            Store::Sled(s) => s.commit(batch),
        }
    }
}
