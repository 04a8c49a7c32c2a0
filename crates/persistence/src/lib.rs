//! Persistence layer for the edsync backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The Postgres-backed store used by the import and analytics services

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::PgSyncStore;
