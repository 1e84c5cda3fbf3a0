//! C1 — Record Store Abstraction. A transactional CRUD + graph-edge
//! interface consumed by every other component, with an
//! in-memory implementation for tests and an opt-in `sled`-backed
//! implementation for durable single-node deployments.

pub mod backend;
pub mod memory;
pub mod record;
#[cfg(feature = "persist-sled")]
pub mod sled_store;
pub mod store;

pub use backend::Store;
pub use memory::MemoryStore;
pub use record::Record;
#[cfg(feature = "persist-sled")]
pub use sled_store::SledStore;
pub use store::{AtomicBatch, Operation, RecordStore};
