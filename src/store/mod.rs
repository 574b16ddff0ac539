//! Storage abstraction for actor state.
//!
//! Each hub actor owns exactly one [`KvStore`]. The store is an ordered
//! key-value document store with get/put semantics; all logic lives in the
//! actor, the store only persists JSON documents.

mod error;
mod file;
mod kv;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileKvStore;
pub use kv::{KvStore, load, save};
pub use memory::MemoryKvStore;
