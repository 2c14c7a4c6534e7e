//! Tessera - the storage-engine core of a disk-backed database kernel.
//!
//! The crate provides the pieces below the query layers of a DBMS: pages on
//! disk, a bounded in-memory buffer over them, and a clustered index.
//!
//! # Architecture
//!
//! - **Storage layer** (`storage`): page-granular disk I/O
//!   - `DiskManager`: blocking page reads/writes against the database file
//!   - `DiskScheduler`: request queue drained by a background worker thread
//!   - `storage::page`: typed codecs over raw page bytes (B+Tree leaf and
//!     internal nodes, the index header page)
//!
//! - **Buffer pool** (`buffer`): memory management for database pages
//!   - `BufferPoolManager`: read-through page cache with pin-count
//!     discipline and lazy write-back
//!   - `LruKReplacer`: LRU-K eviction policy
//!   - `FrameHeader`: per-frame metadata plus the page bytes
//!
//! - **Containers** (`container`): `ExtendibleHashTable`, a split-on-overflow
//!   hash directory, also used as the pool's page table
//!
//! - **Index** (`index`): `BPlusTree` with point lookup, sorted iteration,
//!   insertion with node splits, and deletion with redistribution/merge
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera::buffer::BufferPoolManager;
//! use tessera::common::{PageId, RecordId};
//! use tessera::index::{BPlusTree, IntegerComparator};
//! use tessera::storage::disk::DiskManager;
//!
//! let disk_manager = Arc::new(DiskManager::new("test.db").unwrap());
//! let bpm = Arc::new(BufferPoolManager::new(64, 2, disk_manager));
//!
//! let mut index = BPlusTree::new(
//!     "orders_pk",
//!     Arc::clone(&bpm),
//!     Arc::new(IntegerComparator),
//!     64,
//!     64,
//! );
//! index.insert(42, RecordId::new(PageId::new(7), 0)).unwrap();
//! assert!(index.get_value(42).unwrap().is_some());
//! ```

pub mod buffer;
pub mod common;
pub mod container;
pub mod index;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{FrameId, PageId, RecordId, Result, TesseraError};
