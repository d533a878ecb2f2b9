//! cloudsweep resource cache
//!
//! A SQLite database implementing the [`Storer`](cloudsweep_core::Storer)
//! contract. Upserts are keyed by resource id; a resource may move between
//! zones or regions but never between locality kinds.

pub mod error;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;
