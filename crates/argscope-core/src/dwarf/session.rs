//! Binary loading and DWARF section ownership.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian, SectionId};
use object::{BinaryFormat, Object, ObjectKind, ObjectSection, ObjectSymbol, RelocationKind, RelocationTarget};
use tracing::{debug, trace};

use super::units::UnitSet;
use super::{OwnedDwarf, OwnedReader};
use crate::error::{map_dwarf_error, ArgscopeError, Result};

const DWARF_SECTIONS: &[SectionId] = &[
    SectionId::DebugAbbrev,
    SectionId::DebugAddr,
    SectionId::DebugInfo,
    SectionId::DebugLine,
    SectionId::DebugLineStr,
    SectionId::DebugRanges,
    SectionId::DebugRngLists,
    SectionId::DebugStr,
    SectionId::DebugStrOffsets,
    SectionId::DebugTypes,
    SectionId::DebugLoc,
    SectionId::DebugLocLists,
];

/// Section names to try for `id`: the ELF name first, then the Mach-O spelling.
fn section_aliases(id: SectionId) -> [String; 2]
{
    let elf = id.name();
    let macho = format!("__{}", elf.trim_start_matches('.'));
    [elf.to_string(), macho]
}

fn load_section_bytes(file: &object::File<'_>, id: SectionId) -> Result<Option<Arc<[u8]>>>
{
    for name in section_aliases(id) {
        if let Some(section) = file.section_by_name(&name) {
            let data = section
                .uncompressed_data()
                .map_err(|err| ArgscopeError::Object(format!("failed to read {name}: {err}")))?;
            if needs_relocation(file) {
                let mut bytes = data.into_owned();
                apply_relocations(file, &section, &mut bytes)?;
                return Ok(Some(bytes.into()));
            }
            return Ok(Some(match data {
                Cow::Borrowed(bytes) => Arc::<[u8]>::from(bytes),
                Cow::Owned(vec) => vec.into(),
            }));
        }
    }

    Ok(None)
}

/// Relocatable ELF objects (`.o`, `.ko`) keep cross-section offsets such as
/// `DW_FORM_strp` in relocation entries rather than in the section bytes.
fn needs_relocation(file: &object::File<'_>) -> bool
{
    file.format() == BinaryFormat::Elf && file.kind() == ObjectKind::Relocatable
}

/// Resolve the absolute relocations of `section` into `data`.
///
/// Debug sections of a relocatable object are laid out at address zero, so
/// the resolved value is the target's address plus the addend. Only 32- and
/// 64-bit absolute relocations occur in debug sections.
fn apply_relocations(file: &object::File<'_>, section: &object::Section<'_, '_>, data: &mut [u8]) -> Result<()>
{
    let little = file.is_little_endian();
    let name = section.name().unwrap_or("<unnamed>");
    let mut applied = 0usize;

    for (offset, reloc) in section.relocations() {
        if reloc.kind() != RelocationKind::Absolute {
            trace!(section = name, offset, kind = ?reloc.kind(), "skipping non-absolute relocation");
            continue;
        }

        let base = match reloc.target() {
            RelocationTarget::Symbol(index) => file
                .symbol_by_index(index)
                .map_err(|err| ArgscopeError::Object(format!("bad relocation symbol in {name}: {err}")))?
                .address(),
            RelocationTarget::Section(index) => file
                .section_by_index(index)
                .map_err(|err| ArgscopeError::Object(format!("bad relocation section in {name}: {err}")))?
                .address(),
            RelocationTarget::Absolute => 0,
            _ => continue,
        };

        let size = usize::from(reloc.size() / 8);
        if size != 4 && size != 8 {
            return Err(ArgscopeError::Object(format!(
                "unsupported {}-bit relocation in {name}",
                reloc.size()
            )));
        }
        let slot = usize::try_from(offset)
            .ok()
            .and_then(|start| data.get_mut(start..start.checked_add(size)?))
            .ok_or_else(|| ArgscopeError::Object(format!("relocation at 0x{offset:x} is outside {name}")))?;

        let implicit = if reloc.has_implicit_addend() {
            read_uint(slot, little)
        } else {
            0
        };
        let value = base.wrapping_add(implicit).wrapping_add_signed(reloc.addend());
        write_uint(slot, value, little)
            .ok_or_else(|| ArgscopeError::Object(format!("relocated value 0x{value:x} overflows its slot in {name}")))?;
        applied += 1;
    }

    if applied > 0 {
        debug!(section = name, relocations = applied, "applied relocations");
    }
    Ok(())
}

fn read_uint(slot: &[u8], little: bool) -> u64
{
    let mut buf = [0u8; 8];
    if little {
        buf[..slot.len()].copy_from_slice(slot);
        u64::from_le_bytes(buf)
    } else {
        buf[8 - slot.len()..].copy_from_slice(slot);
        u64::from_be_bytes(buf)
    }
}

/// `None` when `value` does not fit a 4-byte slot.
fn write_uint(slot: &mut [u8], value: u64, little: bool) -> Option<()>
{
    if slot.len() == 4 {
        let value = u32::try_from(value).ok()?;
        slot.copy_from_slice(&if little { value.to_le_bytes() } else { value.to_be_bytes() });
    } else {
        slot.copy_from_slice(&if little { value.to_le_bytes() } else { value.to_be_bytes() });
    }
    Some(())
}

/// An opened binary's DWARF sections.
///
/// This is the single resource a resolver owns. The file is read once at
/// construction and the section bytes live until the session is dropped.
pub struct DebugSession
{
    path: Option<PathBuf>,
    endian: RunTimeEndian,
    sections: HashMap<SectionId, Arc<[u8]>>,
    dwarf: OwnedDwarf,
}

impl DebugSession
{
    /// Read and parse the object file at `path`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read, is not a recognised object
    /// format, or a debug section fails to decompress. A binary without DWARF
    /// loads fine and simply reports zero compile units.
    pub fn load(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file = object::File::parse(bytes.as_slice())
            .map_err(|err| ArgscopeError::Object(format!("failed to parse {}: {err}", path.display())))?;

        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        let mut sections = HashMap::new();
        for &id in DWARF_SECTIONS {
            if let Some(data) = load_section_bytes(&file, id)? {
                sections.insert(id, data);
            }
        }
        debug!(path = %path.display(), sections = sections.len(), "loaded DWARF sections");

        let mut session = Self::build(endian, sections)?;
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    /// Build a session from section contents that were extracted elsewhere.
    ///
    /// Sections that are not supplied read as empty.
    ///
    /// ## Errors
    ///
    /// Returns an error if gimli rejects the section set.
    pub fn from_sections<I>(endian: RunTimeEndian, sections: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SectionId, Vec<u8>)>,
    {
        let sections = sections
            .into_iter()
            .map(|(id, bytes)| (id, Arc::<[u8]>::from(bytes)))
            .collect();
        Self::build(endian, sections)
    }

    fn build(endian: RunTimeEndian, sections: HashMap<SectionId, Arc<[u8]>>) -> Result<Self>
    {
        let dwarf = Dwarf::load(|id| Ok::<_, gimli::Error>(Self::reader_for(&sections, endian, id)))
            .map_err(|err| map_dwarf_error("loading DWARF sections", err))?;
        Ok(Self {
            path: None,
            endian,
            sections,
            dwarf,
        })
    }

    fn reader_for(sections: &HashMap<SectionId, Arc<[u8]>>, endian: RunTimeEndian, id: SectionId) -> OwnedReader
    {
        let data = sections
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()));
        EndianArcSlice::new(data, endian)
    }

    /// Path the session was loaded from, if it came from disk.
    pub fn path(&self) -> Option<&Path>
    {
        self.path.as_deref()
    }

    pub fn endian(&self) -> RunTimeEndian
    {
        self.endian
    }

    /// Whether the named section was present in the binary.
    pub fn has_section(&self, id: SectionId) -> bool
    {
        self.sections.get(&id).is_some_and(|data| !data.is_empty())
    }

    /// Count the unit headers in `.debug_info`.
    ///
    /// ## Errors
    ///
    /// Returns an error if a unit header is malformed.
    pub fn compile_unit_count(&self) -> Result<usize>
    {
        let mut count = 0;
        let mut headers = self.dwarf.units();
        while headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
            .is_some()
        {
            count += 1;
        }
        Ok(count)
    }

    /// Parse every unit, `.debug_info` first and then `.debug_types`, in section order.
    ///
    /// Each call parses afresh; nothing is retained between calls.
    ///
    /// ## Errors
    ///
    /// Returns an error if a unit header or abbreviation table is malformed.
    pub fn units(&self) -> Result<UnitSet<'_>>
    {
        UnitSet::load(&self.dwarf)
    }
}

impl fmt::Debug for DebugSession
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("DebugSession")
            .field("path", &self.path)
            .field("endian", &self.endian)
            .field("sections", &self.sections.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
