//! # Types
//!
//! Result types produced by argument resolution.
//!
//! These are plain values with no ties to the debug-info session that
//! produced them, so they can outlive the resolver and cross threads freely.

pub mod sized;

// Re-export all public types
pub use sized::{ProbeArgs, SizedKind, SizedType};
