//! Shared utilities for the tote package manager.
//!
//! This crate provides cross-cutting concerns used by all other tote crates:
//! the unified error type, filesystem helpers, advisory catalog locks,
//! cryptographic hashing, and terminal status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod lock;
pub mod progress;
