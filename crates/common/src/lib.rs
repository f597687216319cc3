//! Common types for the Greeks streaming service
//!
//! This crate provides the domain types shared by the pricing pipeline,
//! the cache backends and the subscriber-facing servers.
//!
//! # Modules
//!
//! - [`types`] - Option kind, Greeks and snapshot types

pub mod types;

pub use types::*;
