//! `meteo-store` — durable outputs of each cycle.
//!
//! [`ReadingStore`] keeps the append-only `Readings` history in SQLite and
//! repairs a corrupt database file at startup. [`SnapshotWriter`] keeps the
//! single latest JSON document on disk.

pub mod db;
pub mod error;
pub mod snapshot;
pub mod store;

pub use error::{Result, SnapshotError, StoreError};
pub use snapshot::SnapshotWriter;
pub use store::{Bootstrap, ReadingStore, StoredReading};
