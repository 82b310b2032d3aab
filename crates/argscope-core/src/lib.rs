//! # argscope-core
//!
//! Function argument types from DWARF debug info, for dynamic tracing.
//!
//! A tracer attaching to a function entry needs to know how to read each
//! argument without access to the source. This crate answers two questions
//! for a function name:
//! - the C-like display string of every formal parameter (`"char* c"`)
//! - a compact sized type per parameter (`int32`, `uint64`, `int8 *`) with
//!   its declaration index, for the probe code generator
//!
//! ## Layers
//!
//! - [`dwarf`]: loading sections with `object`, reading them with `gimli`
//! - [`resolve`]: function lookup, parameter enumeration, the two type resolvers
//! - [`types`]: the plain result values

pub mod dwarf;
pub mod error;
pub mod resolve;
pub mod types;

// Re-export commonly used types
pub use dwarf::DebugSession;
pub use error::{ArgscopeError, Result};
pub use resolve::ArgResolver;
pub use types::{ProbeArgs, SizedKind, SizedType};
