//! alertboard: alert records over an embedded ordered key-value store
//!
//! Alerts are JSON documents keyed by their ID inside a single redb
//! database file. The store supports exact lookups, overwrites, deletes,
//! prefix scans in key byte order, and streaming a consistent snapshot of
//! the whole database.
//!
//! # Features
//!
//! - **Transactional storage**: every operation is one redb transaction
//! - **Prefix scans**: ordered retrieval of every alert whose ID shares a prefix
//! - **Snapshot backups**: a point-in-time database file streamed to a sink
//! - **Swappable engines**: [`AlertStore`] has a durable and an in-memory implementation
//! - **HTTP API**: thin axum routes over the store
//!
//! # Example
//!
//! ```no_run
//! use alertboard::alerts::Alert;
//! use alertboard::storage::{AlertStore, RedbStore};
//!
//! let store = RedbStore::open("alertboard.db").unwrap();
//!
//! store.put_alert(Alert::new("disk-full-web1")).unwrap();
//! store.put_alert(Alert::new("disk-full-web2").with_status("Closed")).unwrap();
//!
//! let batch = store.alerts_by_prefix("disk-full-").unwrap();
//! println!("{} alerts: {}", batch.count, String::from_utf8_lossy(&batch.data));
//!
//! store.close();
//! ```

pub mod alerts;
pub mod api;
pub mod storage;

// Re-export commonly used types
pub use alerts::Alert;
pub use storage::{AlertBatch, AlertStore, MemoryStore, PartialScan, RedbStore, StoreError};
