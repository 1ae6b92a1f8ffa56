//! Durable output: the append-only record log and the combined snapshot
//! derived from it.

pub mod log;
pub mod snapshot;

pub use log::{read_records, DurableLog};
pub use snapshot::{rebuild_snapshot, write_json_atomic, SnapshotRebuilder};
