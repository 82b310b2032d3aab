//! Semantic sized types for parameter types.

use gimli::constants;
use tracing::{trace, warn};

use crate::dwarf::{DieRef, UnitSet, MAX_TYPE_REF_DEPTH};
use crate::error::Result;
use crate::types::SizedType;

/// Classify the type rooted at `die` for the probe code generator.
///
/// Typedef and qualifier layers are peeled first. Anything that is not an
/// integer, boolean, enumeration or pointer becomes
/// [`SizedType::unsupported`]; that is a normal outcome, not an error.
///
/// ## Errors
///
/// Propagates DWARF read failures only.
pub fn sized_type(units: &UnitSet<'_>, die: DieRef) -> Result<SizedType>
{
    sized_at_depth(units, die, 0)
}

fn sized_at_depth(units: &UnitSet<'_>, die: DieRef, depth: usize) -> Result<SizedType>
{
    if depth >= MAX_TYPE_REF_DEPTH {
        warn!(offset = die.offset(), "type chain exceeds depth limit while sizing");
        return Ok(SizedType::unsupported());
    }

    let peeled = units.peel_type(die)?;
    let tag = units.tag(peeled)?;
    let bits = bit_size(units, peeled)?;

    let sized = match tag {
        constants::DW_TAG_base_type => match units.encoding(peeled)? {
            Some(constants::DW_ATE_boolean | constants::DW_ATE_unsigned | constants::DW_ATE_unsigned_char) => {
                SizedType::unsigned(bits)
            }
            Some(constants::DW_ATE_signed | constants::DW_ATE_signed_char) => SizedType::signed(bits),
            _ => SizedType::unsupported(),
        },
        constants::DW_TAG_enumeration_type => SizedType::unsigned(bits),
        constants::DW_TAG_pointer_type => match units.type_of(peeled)? {
            Some(inner) => SizedType::pointer(sized_at_depth(units, inner, depth + 1)?),
            None => SizedType::pointer(SizedType::unsupported()),
        },
        _ => SizedType::unsupported(),
    };

    trace!(offset = die.offset(), %tag, %sized, "sized type");
    Ok(sized)
}

/// Explicit `DW_AT_bit_size`, else `DW_AT_byte_size * 8`, else zero.
fn bit_size(units: &UnitSet<'_>, die: DieRef) -> Result<u64>
{
    if let Some(bits) = units.udata(die, constants::DW_AT_bit_size)? {
        return Ok(bits);
    }
    Ok(units
        .udata(die, constants::DW_AT_byte_size)?
        .map_or(0, |bytes| bytes.saturating_mul(8)))
}
