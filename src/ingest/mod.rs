//! Ingestion module
//!
//! Consumes submitted URLs with a fixed set of workers, deduplicates them for
//! the lifetime of the pool, and keeps each address's submission count in the
//! record store.

mod pool;

pub use pool::{process_one, IngestionPool, Submitter};
