// crates/core/src/lib.rs
//! Importwatch core library.
//!
//! Pure domain logic for the import-job log pipeline: the line classifier,
//! the run-state aggregation engine, and the failed-item export formats.
//! No I/O, no async — everything here is driven by the server crate.

pub mod aggregator;
pub mod classifier;
pub mod export;
pub mod run_state;
pub mod sink;
pub mod types;

pub use aggregator::*;
pub use classifier::*;
pub use export::*;
pub use run_state::*;
pub use sink::*;
pub use types::*;
