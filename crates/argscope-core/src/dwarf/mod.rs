//! # Debug info provider
//!
//! Loading DWARF out of an object file and the primitive per-entry queries the
//! resolvers are written against.
//!
//! [`DebugSession`] owns the section bytes for the lifetime of a resolver.
//! [`UnitSet`] is a per-call, read-only view over the parsed units; node
//! handles ([`DieRef`]) are only meaningful against the set that produced them.

mod session;
mod units;

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian};

pub use session::DebugSession;
pub use units::{DieRef, UnitSet};

pub(crate) type OwnedReader = EndianArcSlice<RunTimeEndian>;
pub(crate) type OwnedDwarf = Dwarf<OwnedReader>;

/// Bound on every recursive walk over type references and origin chains.
pub const MAX_TYPE_REF_DEPTH: usize = 32;
