//! Parsed unit view and per-entry accessors.

use gimli::{
    constants, AttributeValue, DebugTypeSignature, DebuggingInformationEntry, DwAt, DwAte, DwTag, Reader, Unit,
    UnitOffset, UnitType,
};
use tracing::warn;

use super::{OwnedDwarf, OwnedReader, MAX_TYPE_REF_DEPTH};
use crate::error::{map_dwarf_error, ArgscopeError, Result};

/// Wrapper tags that carry no representation of their own.
const PEELABLE_TAGS: &[DwTag] = &[
    constants::DW_TAG_typedef,
    constants::DW_TAG_const_type,
    constants::DW_TAG_volatile_type,
    constants::DW_TAG_restrict_type,
    constants::DW_TAG_atomic_type,
    constants::DW_TAG_immutable_type,
    constants::DW_TAG_packed_type,
    constants::DW_TAG_shared_type,
];

/// Handle to one debugging information entry inside a [`UnitSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DieRef
{
    unit: usize,
    offset: UnitOffset<usize>,
}

impl DieRef
{
    pub(crate) fn new(unit: usize, offset: UnitOffset<usize>) -> Self
    {
        Self { unit, offset }
    }

    /// Index of the owning unit within its [`UnitSet`].
    pub fn unit_index(self) -> usize
    {
        self.unit
    }

    /// Offset of the entry relative to its unit header.
    pub fn offset(self) -> usize
    {
        self.offset.0
    }
}

/// Every unit of a session, parsed for the duration of one query.
pub struct UnitSet<'a>
{
    dwarf: &'a OwnedDwarf,
    units: Vec<Unit<OwnedReader>>,
    compile_units: usize,
}

impl<'a> UnitSet<'a>
{
    pub(crate) fn load(dwarf: &'a OwnedDwarf) -> Result<Self>
    {
        let mut units = Vec::new();
        let mut headers = dwarf.units();
        while let Some(header) = headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
        {
            units.push(
                dwarf
                    .unit(header)
                    .map_err(|err| map_dwarf_error("parsing compilation unit", err))?,
            );
        }
        let compile_units = units.len();

        let mut type_headers = dwarf.type_units();
        while let Some(header) = type_headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_types unit header", err))?
        {
            units.push(dwarf.unit(header).map_err(|err| map_dwarf_error("parsing type unit", err))?);
        }

        Ok(Self {
            dwarf,
            units,
            compile_units,
        })
    }

    /// Number of units that came from `.debug_info`.
    pub fn compile_unit_count(&self) -> usize
    {
        self.compile_units
    }

    /// Indices of the `.debug_info` units, in section order.
    pub fn compile_unit_indices(&self) -> std::ops::Range<usize>
    {
        0..self.compile_units
    }

    pub(crate) fn unit(&self, index: usize) -> &Unit<OwnedReader>
    {
        &self.units[index]
    }

    pub fn entry(&self, die: DieRef) -> Result<DebuggingInformationEntry<'_, '_, OwnedReader>>
    {
        self.unit(die.unit)
            .entry(die.offset)
            .map_err(|err| map_dwarf_error("reading debugging information entry", err))
    }

    pub fn tag(&self, die: DieRef) -> Result<DwTag>
    {
        Ok(self.entry(die)?.tag())
    }

    /// Raw attribute lookup on the entry itself.
    pub fn attr_value(&self, die: DieRef, name: DwAt) -> Result<Option<AttributeValue<OwnedReader>>>
    {
        self.entry(die)?
            .attr_value(name)
            .map_err(|err| map_dwarf_error(&format!("reading {name}"), err))
    }

    pub fn has_attr(&self, die: DieRef, name: DwAt) -> Result<bool>
    {
        Ok(self.attr_value(die, name)?.is_some())
    }

    /// Unsigned constant attribute such as `DW_AT_byte_size`.
    pub fn udata(&self, die: DieRef, name: DwAt) -> Result<Option<u64>>
    {
        let attr = self
            .entry(die)?
            .attr(name)
            .map_err(|err| map_dwarf_error(&format!("reading {name}"), err))?;
        Ok(attr.and_then(|attr| attr.udata_value()))
    }

    /// `DW_AT_encoding` of a base type.
    pub fn encoding(&self, die: DieRef) -> Result<Option<DwAte>>
    {
        Ok(match self.attr_value(die, constants::DW_AT_encoding)? {
            Some(AttributeValue::Encoding(encoding)) => Some(encoding),
            Some(other) => other.udata_value().and_then(|value| u8::try_from(value).ok()).map(DwAte),
            None => None,
        })
    }

    pub fn is_declaration(&self, die: DieRef) -> Result<bool>
    {
        Ok(matches!(
            self.attr_value(die, constants::DW_AT_declaration)?,
            Some(AttributeValue::Flag(true))
        ))
    }

    /// Attribute lookup that falls back through `DW_AT_abstract_origin` and
    /// `DW_AT_specification`.
    ///
    /// The returned handle is the entry that actually carries the attribute;
    /// reference values are relative to its unit.
    pub fn integrated_attr(&self, die: DieRef, name: DwAt) -> Result<Option<(DieRef, AttributeValue<OwnedReader>)>>
    {
        let mut current = die;
        for _ in 0..MAX_TYPE_REF_DEPTH {
            if let Some(value) = self.attr_value(current, name)? {
                return Ok(Some((current, value)));
            }

            let mut origin = None;
            for link in [constants::DW_AT_abstract_origin, constants::DW_AT_specification] {
                if let Some(value) = self.attr_value(current, link)? {
                    origin = self.resolve_reference(current, value);
                    if origin.is_some() {
                        break;
                    }
                }
            }

            match origin {
                Some(next) if next != current => current = next,
                _ => return Ok(None),
            }
        }

        warn!(offset = die.offset(), attr = %name, "origin chain exceeds depth limit");
        Ok(None)
    }

    /// `DW_AT_name`, following origins like libdw's `dwarf_diename`.
    pub fn name(&self, die: DieRef) -> Result<Option<String>>
    {
        match self.integrated_attr(die, constants::DW_AT_name)? {
            Some((owner, value)) => Ok(Some(self.attr_to_string(owner, value)?)),
            None => Ok(None),
        }
    }

    /// The entry referenced by `DW_AT_type`, if any.
    ///
    /// `None` means the attribute is absent, which for a pointer or qualifier
    /// denotes `void`.
    pub fn type_of(&self, die: DieRef) -> Result<Option<DieRef>>
    {
        let Some((owner, value)) = self.integrated_attr(die, constants::DW_AT_type)? else {
            return Ok(None);
        };
        let target = self.resolve_reference(owner, value);
        if target.is_none() {
            warn!(offset = owner.offset(), "unresolvable DW_AT_type reference");
        }
        Ok(target)
    }

    /// Direct children of `die`, in sibling order.
    pub fn children(&self, die: DieRef) -> Result<Vec<DieRef>>
    {
        let mut tree = self
            .unit(die.unit)
            .entries_tree(Some(die.offset))
            .map_err(|err| map_dwarf_error("building entry tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating entry root", err))?;
        let mut children = root.children();
        let mut result = Vec::new();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating entry children", err))?
        {
            result.push(DieRef::new(die.unit, child.entry().offset()));
        }
        Ok(result)
    }

    /// Strip typedef and qualifier layers down to the representational type.
    ///
    /// A wrapper without `DW_AT_type` (e.g. `const void`) is returned as is.
    pub fn peel_type(&self, die: DieRef) -> Result<DieRef>
    {
        let mut current = die;
        for _ in 0..MAX_TYPE_REF_DEPTH {
            if !PEELABLE_TAGS.contains(&self.tag(current)?) {
                return Ok(current);
            }
            match self.type_of(current)? {
                Some(inner) => current = inner,
                None => return Ok(current),
            }
        }

        warn!(offset = die.offset(), "qualifier chain exceeds depth limit");
        Ok(current)
    }

    /// Error for an entry that lacks something the resolver requires.
    pub(crate) fn malformed(die: DieRef, reason: impl Into<String>) -> ArgscopeError
    {
        ArgscopeError::MalformedEntry {
            offset: die.offset(),
            reason: reason.into(),
        }
    }

    fn resolve_reference(&self, from: DieRef, value: AttributeValue<OwnedReader>) -> Option<DieRef>
    {
        match value {
            AttributeValue::UnitRef(offset) => Some(DieRef::new(from.unit, offset)),
            AttributeValue::DebugInfoRef(offset) => self
                .units
                .iter()
                .enumerate()
                .take(self.compile_units)
                .find_map(|(index, unit)| offset.to_unit_offset(&unit.header).map(|off| DieRef::new(index, off))),
            AttributeValue::DebugTypesRef(signature) => self.resolve_signature(signature),
            _ => None,
        }
    }

    fn resolve_signature(&self, signature: DebugTypeSignature) -> Option<DieRef>
    {
        self.units
            .iter()
            .enumerate()
            .find_map(|(index, unit)| match unit.header.type_() {
                UnitType::Type {
                    type_signature,
                    type_offset,
                }
                | UnitType::SplitType {
                    type_signature,
                    type_offset,
                } if type_signature == signature => Some(DieRef::new(index, type_offset)),
                _ => None,
            })
    }

    fn attr_to_string(&self, owner: DieRef, value: AttributeValue<OwnedReader>) -> Result<String>
    {
        let reader = self
            .dwarf
            .attr_string(self.unit(owner.unit), value)
            .map_err(|err| map_dwarf_error("resolving DWARF string", err))?;
        let owned = match reader.to_string() {
            Ok(cow) => cow.into_owned(),
            Err(_) => reader
                .to_string_lossy()
                .map_err(|err| map_dwarf_error("decoding DWARF string", err))?
                .into_owned(),
        };
        Ok(owned)
    }
}
