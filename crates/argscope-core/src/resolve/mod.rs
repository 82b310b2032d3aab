//! # Resolution
//!
//! The four resolution steps, each a pure function over a [`UnitSet`]:
//!
//! - [`locate_function`]: name to subprogram entry
//! - [`formal_parameters`]: subprogram to ordered parameter entries
//! - [`type_name`]: type entry to display string
//! - [`sized_type`]: type entry to [`SizedType`]
//!
//! [`ArgResolver`] composes them behind an owned [`DebugSession`].
//!
//! [`UnitSet`]: crate::dwarf::UnitSet
//! [`SizedType`]: crate::types::SizedType
//! [`DebugSession`]: crate::dwarf::DebugSession

mod binder;
mod locator;
mod params;
mod sized_type;
mod type_name;

pub use binder::ArgResolver;
pub use locator::locate_function;
pub use params::formal_parameters;
pub use sized_type::sized_type;
pub use type_name::{type_name, ANONYMOUS, UNKNOWN_TYPE};
