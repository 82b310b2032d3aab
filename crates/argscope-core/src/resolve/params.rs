//! Formal parameter enumeration.

use gimli::constants;

use crate::dwarf::{DieRef, UnitSet};
use crate::error::Result;

/// The `DW_TAG_formal_parameter` children of `function`, in declaration order.
///
/// Other children (lexical blocks, local variables, the variadic
/// `DW_TAG_unspecified_parameters` marker) are skipped.
pub fn formal_parameters(units: &UnitSet<'_>, function: DieRef) -> Result<Vec<DieRef>>
{
    let mut params = Vec::new();
    for child in units.children(function)? {
        if units.tag(child)? == constants::DW_TAG_formal_parameter {
            params.push(child);
        }
    }
    Ok(params)
}
