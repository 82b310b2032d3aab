//! DWARF fixtures synthesised with `gimli::write`.
//!
//! Tests describe the debug info they need unit by unit, then either load it
//! straight into a [`DebugSession`] or wrap it in an ELF file on disk.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use argscope_core::{ArgResolver, DebugSession};
use gimli::write::{
    AttributeValue, Dwarf, EndianVec, LineProgram, Reference, Sections, StringTable, Unit, UnitEntryId, UnitId, Writer,
};
use gimli::{DwAte, DwTag, Encoding, Format, LittleEndian, RunTimeEndian, SectionId};

pub const POINTER_SIZE: u64 = 8;

/// A set of compile units under construction.
pub struct DwarfBuilder
{
    dwarf: Dwarf,
    encoding: Encoding,
    string_table: bool,
}

impl DwarfBuilder
{
    pub fn new() -> Self
    {
        Self {
            dwarf: Dwarf::new(),
            encoding: Encoding {
                format: Format::Dwarf32,
                version: 4,
                address_size: 8,
            },
            string_table: false,
        }
    }

    /// Like [`DwarfBuilder::new`], but names go to `.debug_str` as `DW_FORM_strp`.
    pub fn with_string_table() -> Self
    {
        Self {
            string_table: true,
            ..Self::new()
        }
    }

    /// Append a compile unit; units are emitted in the order they are added.
    pub fn unit(&mut self) -> UnitId
    {
        self.dwarf.units.add(Unit::new(self.encoding, LineProgram::none()))
    }

    pub fn cu(&mut self, id: UnitId) -> CuBuilder<'_>
    {
        CuBuilder {
            unit: self.dwarf.units.get_mut(id),
            strings: self.string_table.then_some(&mut self.dwarf.strings),
        }
    }

    pub fn sections(mut self) -> Vec<(SectionId, Vec<u8>)>
    {
        let mut sections = Sections::new(EndianVec::new(LittleEndian));
        self.dwarf.write(&mut sections).expect("write DWARF");

        let mut result = Vec::new();
        sections
            .for_each(|id, data| {
                if !data.slice().is_empty() {
                    result.push((id, data.slice().to_vec()));
                }
                Ok::<(), gimli::write::Error>(())
            })
            .expect("collect sections");
        result
    }

    /// Sections as a relocatable object would carry them: every offset into
    /// another debug section is zeroed and recorded as a relocation instead.
    pub fn relocatable_sections(mut self) -> Vec<RelocatableSection>
    {
        let mut sections = Sections::new(RelocatableSection::new());
        self.dwarf.write(&mut sections).expect("write DWARF");

        let mut result = Vec::new();
        sections
            .for_each(|id, section| {
                if section.len() > 0 {
                    let mut section = section.clone();
                    section.id = Some(id);
                    result.push(section);
                }
                Ok::<(), gimli::write::Error>(())
            })
            .expect("collect sections");
        result
    }

    pub fn session(self) -> DebugSession
    {
        DebugSession::from_sections(RunTimeEndian::Little, self.sections()).expect("load session")
    }

    pub fn resolver(self) -> ArgResolver
    {
        ArgResolver::from_session(self.session()).expect("resolver over fixture")
    }
}

/// Entry-level helpers for one compile unit.
pub struct CuBuilder<'a>
{
    unit: &'a mut Unit,
    strings: Option<&'a mut StringTable>,
}

impl CuBuilder<'_>
{
    pub fn entry(&mut self, parent: Option<UnitEntryId>, tag: DwTag) -> UnitEntryId
    {
        let parent = parent.unwrap_or_else(|| self.unit.root());
        self.unit.add(parent, tag)
    }

    pub fn set(&mut self, id: UnitEntryId, attr: gimli::DwAt, value: AttributeValue)
    {
        self.unit.get_mut(id).set(attr, value);
    }

    pub fn name(&mut self, id: UnitEntryId, name: &str)
    {
        let value = match self.strings.as_deref_mut() {
            Some(strings) => AttributeValue::StringRef(strings.add(name)),
            None => AttributeValue::String(name.as_bytes().to_vec()),
        };
        self.set(id, gimli::DW_AT_name, value);
    }

    pub fn type_ref(&mut self, id: UnitEntryId, target: UnitEntryId)
    {
        self.set(id, gimli::DW_AT_type, AttributeValue::UnitRef(target));
    }

    pub fn base(&mut self, name: &str, byte_size: u64, encoding: DwAte) -> UnitEntryId
    {
        let id = self.entry(None, gimli::DW_TAG_base_type);
        self.name(id, name);
        self.set(id, gimli::DW_AT_byte_size, AttributeValue::Udata(byte_size));
        self.set(id, gimli::DW_AT_encoding, AttributeValue::Encoding(encoding));
        id
    }

    pub fn pointer(&mut self, target: Option<UnitEntryId>) -> UnitEntryId
    {
        let id = self.entry(None, gimli::DW_TAG_pointer_type);
        self.set(id, gimli::DW_AT_byte_size, AttributeValue::Udata(POINTER_SIZE));
        if let Some(target) = target {
            self.type_ref(id, target);
        }
        id
    }

    /// A wrapper tag (const, volatile, typedef without name) around `target`.
    pub fn wrap(&mut self, tag: DwTag, target: Option<UnitEntryId>) -> UnitEntryId
    {
        let id = self.entry(None, tag);
        if let Some(target) = target {
            self.type_ref(id, target);
        }
        id
    }

    pub fn typedef(&mut self, name: &str, target: UnitEntryId) -> UnitEntryId
    {
        let id = self.wrap(gimli::DW_TAG_typedef, Some(target));
        self.name(id, name);
        id
    }

    /// Struct, union or enumeration with an optional name.
    pub fn aggregate(&mut self, tag: DwTag, name: Option<&str>, byte_size: u64) -> UnitEntryId
    {
        let id = self.entry(None, tag);
        if let Some(name) = name {
            self.name(id, name);
        }
        self.set(id, gimli::DW_AT_byte_size, AttributeValue::Udata(byte_size));
        id
    }

    pub fn function(&mut self, parent: Option<UnitEntryId>, name: &str) -> UnitEntryId
    {
        let id = self.entry(parent, gimli::DW_TAG_subprogram);
        self.name(id, name);
        id
    }

    pub fn param(&mut self, function: UnitEntryId, name: Option<&str>, ty: Option<UnitEntryId>) -> UnitEntryId
    {
        let id = self.entry(Some(function), gimli::DW_TAG_formal_parameter);
        if let Some(name) = name {
            self.name(id, name);
        }
        if let Some(ty) = ty {
            self.type_ref(id, ty);
        }
        id
    }
}

/// Reference to an entry in another unit, encoded as `DW_FORM_ref_addr`.
pub fn cross_unit_ref(unit: UnitId, entry: UnitEntryId) -> AttributeValue
{
    AttributeValue::DebugInfoRef(Reference::Entry(unit, entry))
}

/// `int add(int a, unsigned long b, char *c)` in a single compile unit.
pub fn add_program() -> DwarfBuilder
{
    add_program_in(DwarfBuilder::new())
}

pub fn add_program_in(mut builder: DwarfBuilder) -> DwarfBuilder
{
    let unit = builder.unit();
    let mut cu = builder.cu(unit);

    let int = cu.base("int", 4, gimli::DW_ATE_signed);
    let ulong = cu.base("unsigned long", 8, gimli::DW_ATE_unsigned);
    let chr = cu.base("char", 1, gimli::DW_ATE_signed_char);
    let char_ptr = cu.pointer(Some(chr));

    let add = cu.function(None, "add");
    cu.type_ref(add, int);
    cu.param(add, Some("a"), Some(int));
    cu.param(add, Some("b"), Some(ulong));
    cu.param(add, Some("c"), Some(char_ptr));

    builder
}

/// Write `sections` into a relocatable x86-64 ELF at `dir/name`.
pub fn write_elf(dir: &Path, name: &str, sections: &[(SectionId, Vec<u8>)]) -> PathBuf
{
    let mut obj = object::write::Object::new(
        object::BinaryFormat::Elf,
        object::Architecture::X86_64,
        object::Endianness::Little,
    );

    let text = obj.add_section(Vec::new(), b".text".to_vec(), object::SectionKind::Text);
    obj.append_section_data(text, &[0xc3], 1);

    for (id, data) in sections {
        let section = obj.add_section(Vec::new(), id.name().as_bytes().to_vec(), object::SectionKind::Debug);
        obj.append_section_data(section, data, 1);
    }

    let path = dir.join(name);
    std::fs::write(&path, obj.write().expect("serialize ELF")).expect("write ELF");
    path
}

/// One offset field that a relocation must fill in.
#[derive(Debug, Clone)]
pub struct PendingRelocation
{
    pub offset: u64,
    pub target: SectionId,
    pub addend: i64,
    pub size: u8,
}

/// Section writer that zeroes cross-section offsets and records them.
#[derive(Debug, Clone)]
pub struct RelocatableSection
{
    pub id: Option<SectionId>,
    pub data: EndianVec<LittleEndian>,
    pub relocations: Vec<PendingRelocation>,
}

impl RelocatableSection
{
    fn new() -> Self
    {
        Self {
            id: None,
            data: EndianVec::new(LittleEndian),
            relocations: Vec::new(),
        }
    }
}

impl Writer for RelocatableSection
{
    type Endian = LittleEndian;

    fn endian(&self) -> Self::Endian
    {
        LittleEndian
    }

    fn len(&self) -> usize
    {
        self.data.len()
    }

    fn write(&mut self, bytes: &[u8]) -> gimli::write::Result<()>
    {
        self.data.write(bytes)
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> gimli::write::Result<()>
    {
        self.data.write_at(offset, bytes)
    }

    fn write_offset(&mut self, val: usize, section: SectionId, size: u8) -> gimli::write::Result<()>
    {
        self.relocations.push(PendingRelocation {
            offset: self.len() as u64,
            target: section,
            addend: val as i64,
            size,
        });
        self.write_udata(0, size)
    }

    fn write_offset_at(&mut self, offset: usize, val: usize, section: SectionId, size: u8) -> gimli::write::Result<()>
    {
        self.relocations.push(PendingRelocation {
            offset: offset as u64,
            target: section,
            addend: val as i64,
            size,
        });
        self.write_udata_at(offset, 0, size)
    }
}

/// Write `sections` into a relocatable x86-64 ELF at `dir/name`, emitting a
/// `.rela.<section>` for every recorded offset.
pub fn write_relocatable_elf(dir: &Path, name: &str, sections: &[RelocatableSection]) -> PathBuf
{
    let mut obj = object::write::Object::new(
        object::BinaryFormat::Elf,
        object::Architecture::X86_64,
        object::Endianness::Little,
    );

    let text = obj.add_section(Vec::new(), b".text".to_vec(), object::SectionKind::Text);
    obj.append_section_data(text, &[0xc3], 1);

    let mut ids = Vec::new();
    for section in sections {
        let id = section.id.expect("section id");
        let section_id = obj.add_section(Vec::new(), id.name().as_bytes().to_vec(), object::SectionKind::Debug);
        obj.append_section_data(section_id, section.data.slice(), 1);
        ids.push((id, section_id));
    }

    for (section, &(_, section_id)) in sections.iter().zip(&ids) {
        for reloc in &section.relocations {
            let target = ids
                .iter()
                .find(|(id, _)| *id == reloc.target)
                .map(|&(_, target)| target)
                .expect("relocation target section");
            let symbol = obj.section_symbol(target);
            obj.add_relocation(
                section_id,
                object::write::Relocation {
                    offset: reloc.offset,
                    symbol,
                    addend: reloc.addend,
                    flags: object::RelocationFlags::Generic {
                        kind: object::RelocationKind::Absolute,
                        encoding: object::RelocationEncoding::Generic,
                        size: reloc.size * 8,
                    },
                },
            )
            .expect("add relocation");
        }
    }

    let path = dir.join(name);
    std::fs::write(&path, obj.write().expect("serialize ELF")).expect("write ELF");
    path
}
