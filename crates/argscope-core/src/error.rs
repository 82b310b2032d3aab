//! # Error Types
//!
//! General error handling for argument resolution.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for argscope operations
///
/// Looking up a function that does not exist is *not* an error: the public
/// operations return an empty result instead. Likewise, types the resolvers
/// do not understand degrade to an unsupported sized type. The variants below
/// cover the binary itself being unusable or its debug info being corrupt.
///
/// ## Error Categories
///
/// 1. **Binary errors**: NoDebugInfo, Object, Io
/// 2. **DWARF errors**: Dwarf, MalformedEntry
#[derive(Error, Debug)]
pub enum ArgscopeError
{
    /// The binary carries no usable compile units
    ///
    /// Callers are expected to fall back to untyped argument access.
    #[error("No debug info in {}", .0.display())]
    NoDebugInfo(PathBuf),

    /// The object container (ELF, Mach-O) could not be parsed
    ///
    /// The string carries the path and the parser's message.
    #[error("Failed to parse object file: {0}")]
    Object(String),

    /// The DWARF reader failed
    ///
    /// `context` names the operation that was in progress, e.g.
    /// `"reading .debug_info unit header"`.
    #[error("DWARF error while {context}: {source}")]
    Dwarf
    {
        /// What was being read when the error happened
        context: String,
        /// Underlying gimli error
        source: gimli::Error,
    },

    /// A debugging information entry lacks an attribute the resolver requires
    ///
    /// Well-formed compiler output never triggers this. An example is a
    /// `DW_TAG_base_type` without a `DW_AT_name`.
    #[error("Malformed DWARF entry at offset 0x{offset:x}: {reason}")]
    MalformedEntry
    {
        /// Unit-relative offset of the entry
        offset: usize,
        /// What was missing or wrong
        reason: String,
    },

    /// I/O error (for file operations, etc.)
    ///
    /// Used for errors when reading the binary from disk.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, ArgscopeError>`
///
/// ```rust
/// use argscope_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ArgscopeError>;

/// Wrap a gimli error with the operation that was being performed.
pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> ArgscopeError
{
    ArgscopeError::Dwarf {
        context: context.to_string(),
        source: err,
    }
}
