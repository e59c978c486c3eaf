//! # Storage Module
//!
//! Disk-backed implementations of [`TenantStore`](crate::TenantStore).

mod redb_store;

pub use redb_store::RedbStore;
