//! Job progress bookkeeping.
//!
//! The store is a process-wide keyed map from job id to progress record.
//! The orchestrator running a job is the record's only writer; the
//! polling endpoint reads it. The default implementation is in-memory,
//! so in a multi-process deployment it must be swapped for one backed
//! by a shared key-value store.

pub mod memory;
pub mod store;

pub use memory::MemoryProgressStore;
pub use store::ProgressStore;
