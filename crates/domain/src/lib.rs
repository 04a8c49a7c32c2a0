//! Domain layer for the edsync backend.
//!
//! This crate contains:
//! - Domain models (provider platforms, identity mappings, programs, activity)
//! - The provider import orchestrator and activity analytics services
//! - The store and gateway seams implemented by persistence and api

pub mod models;
pub mod services;
