//! # Argument resolver
//!
//! The public entry point: open a binary once, then ask for the parameters
//! of functions by name.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use argscope_core::ArgResolver;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let resolver = ArgResolver::open("/usr/bin/target")?;
//!
//!     // "int a", "unsigned long b", "char* c"
//!     for param in resolver.get_function_params("add")? {
//!         println!("{param}");
//!     }
//!
//!     // a: int32 (idx 0), b: uint64 (idx 1), c: int8 * (idx 2)
//!     for (name, ty) in resolver.resolve_args("add")?.in_declaration_order() {
//!         println!("{}: {ty} (idx {})", name, ty.funcarg_idx);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Thread Safety
//!
//! Every query takes `&self` and only reads the loaded sections, so sharing
//! a resolver between threads is sound. This relaxes the usual libdw-style
//! contract where callers serialize access to one handle; no external lock
//! is needed. Each query re-parses the units it needs; nothing is cached
//! between calls.

use std::path::Path;

use tracing::{debug, info, warn};

use super::locator::locate_function;
use super::params::formal_parameters;
use super::sized_type::sized_type;
use super::type_name::{type_name, UNKNOWN_TYPE};
use crate::dwarf::{DebugSession, DieRef, UnitSet};
use crate::error::{ArgscopeError, Result};
use crate::types::{ProbeArgs, SizedType};

/// Resolves function parameter types from one binary's debug info.
#[derive(Debug)]
pub struct ArgResolver
{
    session: DebugSession,
}

impl ArgResolver
{
    /// Open the binary at `path`.
    ///
    /// ## Errors
    ///
    /// Returns [`ArgscopeError::NoDebugInfo`] when the binary has no compile
    /// units, and I/O or object parsing errors when the file is unusable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self>
    {
        let session = DebugSession::load(path)?;
        Self::from_session(session)
    }

    /// Wrap an already loaded session.
    ///
    /// ## Errors
    ///
    /// Returns [`ArgscopeError::NoDebugInfo`] when the session has no compile units.
    pub fn from_session(session: DebugSession) -> Result<Self>
    {
        let count = session.compile_unit_count()?;
        if count == 0 {
            let path = session.path().map(Path::to_path_buf).unwrap_or_default();
            debug!(path = %path.display(), "no compile units");
            return Err(ArgscopeError::NoDebugInfo(path));
        }

        info!(path = ?session.path(), compile_units = count, "opened debug info");
        Ok(Self { session })
    }

    /// Release the underlying session.
    pub fn close(self)
    {
        debug!(path = ?self.session.path(), "closing debug info");
    }

    pub fn path(&self) -> Option<&Path>
    {
        self.session.path()
    }

    pub fn session(&self) -> &DebugSession
    {
        &self.session
    }

    /// Whether any compile unit defines a function named `function`.
    ///
    /// ## Errors
    ///
    /// Propagates DWARF read failures.
    pub fn has_function(&self, function: &str) -> Result<bool>
    {
        let units = self.session.units()?;
        Ok(locate_function(&units, function)?.is_some())
    }

    /// `"<type> <name>"` for each formal parameter of `function`, in declaration order.
    ///
    /// An unknown function yields an empty list. An unnamed parameter is
    /// rendered as its type alone.
    ///
    /// ## Errors
    ///
    /// Propagates DWARF read failures and malformed type entries.
    pub fn get_function_params(&self, function: &str) -> Result<Vec<String>>
    {
        let units = self.session.units()?;
        let Some(params) = Self::parameters_of(&units, function)? else {
            return Ok(Vec::new());
        };

        let mut result = Vec::with_capacity(params.len());
        for param in params {
            let ty = match units.type_of(param)? {
                Some(type_die) => type_name(&units, type_die)?,
                None => UNKNOWN_TYPE.to_string(),
            };
            result.push(match units.name(param)? {
                Some(name) => format!("{ty} {name}"),
                None => ty,
            });
        }
        Ok(result)
    }

    /// Sized type of each named formal parameter of `function`, keyed by name.
    ///
    /// Each entry is tagged with its 0-based declaration position. Unnamed
    /// parameters still consume a position but get no entry; on a duplicate
    /// name the first parameter wins.
    ///
    /// ## Errors
    ///
    /// Propagates DWARF read failures.
    pub fn resolve_args(&self, function: &str) -> Result<ProbeArgs>
    {
        let units = self.session.units()?;
        let mut args = ProbeArgs::new();
        let Some(params) = Self::parameters_of(&units, function)? else {
            return Ok(args);
        };

        for (index, param) in params.into_iter().enumerate() {
            let ty = match units.type_of(param)? {
                Some(type_die) => sized_type(&units, type_die)?,
                None => SizedType::unsupported(),
            };

            let Some(name) = units.name(param)? else {
                warn!(function, index, "skipping unnamed parameter");
                continue;
            };
            if !args.insert(name.clone(), ty.into_funcarg(index)) {
                warn!(function, index, parameter = %name, "duplicate parameter name, keeping the first");
            }
        }
        Ok(args)
    }

    fn parameters_of(units: &UnitSet<'_>, function: &str) -> Result<Option<Vec<DieRef>>>
    {
        let Some(die) = locate_function(units, function)? else {
            return Ok(None);
        };
        let params = formal_parameters(units, die)?;
        debug!(function, count = params.len(), "enumerated formal parameters");
        Ok(Some(params))
    }
}
