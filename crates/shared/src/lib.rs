//! Shared types and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Commodities and exact scaled quantities
//! - Typed IDs for type-safe entity references
//! - Session run modes and domains
//! - Configuration management

pub mod config;
pub mod types;

pub use config::TallyConfig;
