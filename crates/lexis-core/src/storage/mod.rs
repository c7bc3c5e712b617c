//! Storage Module
//!
//! SQLite-based card store with:
//! - Memory model persisted as a JSON `[alpha, beta, t]` triple
//! - Per-card serialized reviews (one IMMEDIATE transaction each)
//! - Append-only review log

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{CardStore, Result, ReviewRecord, StorageError};
