//! core
//!
//! Core domain types.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, PatchId
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Validation happens at construction, never later

pub mod types;
