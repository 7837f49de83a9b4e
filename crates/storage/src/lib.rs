//! Population store: durable snapshots of each generation plus the final
//! run report.
//!
//! The core treats this as an opaque key-value map keyed by generation
//! index. Backends only need to round-trip JSON; there are no query
//! semantics.

#![warn(missing_docs)]

mod json_file;
mod memory;
mod trait_;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use trait_::{PopulationStore, Result, StorageError};
