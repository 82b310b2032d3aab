//! Function lookup by name.

use gimli::{constants, DwTag, EntriesTreeNode};
use tracing::debug;

use crate::dwarf::{DieRef, OwnedReader, UnitSet, MAX_TYPE_REF_DEPTH};
use crate::error::{map_dwarf_error, Result};

/// Scopes that may contain function definitions in C, C++ and Rust output.
const SCOPE_TAGS: &[DwTag] = &[
    constants::DW_TAG_namespace,
    constants::DW_TAG_module,
    constants::DW_TAG_class_type,
    constants::DW_TAG_structure_type,
    constants::DW_TAG_union_type,
];

/// Find the first subprogram named `name`, scanning compile units in section order.
///
/// Declarations are skipped so that an out-of-line C++ member definition is
/// found through its `DW_AT_specification` rather than the in-class
/// prototype. Function bodies are not searched for nested subprograms.
pub fn locate_function(units: &UnitSet<'_>, name: &str) -> Result<Option<DieRef>>
{
    for index in units.compile_unit_indices() {
        let mut tree = units
            .unit(index)
            .entries_tree(None)
            .map_err(|err| map_dwarf_error("building compile unit tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating compile unit root", err))?;
        if let Some(found) = search_scope(units, index, root, name, 0)? {
            debug!(function = name, unit = index, offset = found.offset(), "located function");
            return Ok(Some(found));
        }
    }

    debug!(function = name, "function not found in any compile unit");
    Ok(None)
}

fn search_scope(
    units: &UnitSet<'_>,
    index: usize,
    node: EntriesTreeNode<'_, '_, '_, OwnedReader>,
    name: &str,
    depth: usize,
) -> Result<Option<DieRef>>
{
    if depth >= MAX_TYPE_REF_DEPTH {
        return Ok(None);
    }

    let mut children = node.children();
    while let Some(child) = children
        .next()
        .map_err(|err| map_dwarf_error("iterating compile unit entries", err))?
    {
        let tag = child.entry().tag();
        let die = DieRef::new(index, child.entry().offset());

        if tag == constants::DW_TAG_subprogram {
            if !units.is_declaration(die)? && units.name(die)?.as_deref() == Some(name) {
                return Ok(Some(die));
            }
            continue;
        }

        if SCOPE_TAGS.contains(&tag) {
            if let Some(found) = search_scope(units, index, child, name, depth + 1)? {
                return Ok(Some(found));
            }
        }
    }

    Ok(None)
}
