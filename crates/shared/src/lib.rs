//! Shared utilities and common types for the edsync backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing helpers for admin API keys
//! - Provider credential parsing
//! - Page-based pagination math

pub mod credentials;
pub mod crypto;
pub mod pagination;
