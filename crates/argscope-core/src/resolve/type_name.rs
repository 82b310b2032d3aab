//! Display strings for parameter types.
//!
//! Rendering follows the tracing tool's probe listing: C-like spelling with
//! pointers written `T*`, qualifiers only for `const`, and a fixed placeholder
//! for every tag the listing does not spell out.

use gimli::constants;
use tracing::warn;

use crate::dwarf::{DieRef, UnitSet, MAX_TYPE_REF_DEPTH};
use crate::error::Result;

pub const UNKNOWN_TYPE: &str = "<unknown type>";
pub const ANONYMOUS: &str = "<anonymous>";

/// Render the type rooted at `die` as a display string.
///
/// ## Errors
///
/// Returns [`crate::ArgscopeError::MalformedEntry`] for a base type or typedef
/// without a name, and propagates DWARF read failures.
pub fn type_name(units: &UnitSet<'_>, die: DieRef) -> Result<String>
{
    name_at_depth(units, die, 0)
}

fn name_at_depth(units: &UnitSet<'_>, die: DieRef, depth: usize) -> Result<String>
{
    if depth >= MAX_TYPE_REF_DEPTH {
        warn!(offset = die.offset(), "type chain exceeds depth limit while naming");
        return Ok(UNKNOWN_TYPE.to_string());
    }

    let tag = units.tag(die)?;
    match tag {
        constants::DW_TAG_base_type | constants::DW_TAG_typedef => units
            .name(die)?
            .ok_or_else(|| UnitSet::malformed(die, format!("{tag} without DW_AT_name"))),
        constants::DW_TAG_pointer_type => match units.type_of(die)? {
            Some(inner) => Ok(format!("{}*", name_at_depth(units, inner, depth + 1)?)),
            None => Ok("void*".to_string()),
        },
        constants::DW_TAG_structure_type | constants::DW_TAG_union_type | constants::DW_TAG_enumeration_type => {
            let prefix = match tag {
                constants::DW_TAG_structure_type => "struct",
                constants::DW_TAG_union_type => "union",
                _ => "enum",
            };
            let name = units.name(die)?.unwrap_or_else(|| ANONYMOUS.to_string());
            Ok(format!("{prefix} {name}"))
        }
        constants::DW_TAG_const_type => {
            let Some(inner) = units.type_of(die)? else {
                return Ok("const void".to_string());
            };
            // Only the immediately nested tag decides the qualifier placement.
            let inner_name = name_at_depth(units, inner, depth + 1)?;
            if units.tag(inner)? == constants::DW_TAG_pointer_type {
                Ok(format!("{inner_name} const"))
            } else {
                Ok(format!("const {inner_name}"))
            }
        }
        _ => Ok(UNKNOWN_TYPE.to_string()),
    }
}
