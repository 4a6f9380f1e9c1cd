//! The ELF collaborator: loads a PS2 executable and exposes the views
//! the recompiler consumes.
//!
//! PS2 executables are little-endian 32-bit MIPS ELF files; anything
//! else is rejected up front. Parsing is lazy where possible: the image
//! owns the file bytes and the accessors read fields on demand.
//!
//! # Examples
//!
//! ```no_run
//! let image = ps2recomp::ElfImage::open("game.elf")?;
//! for section in image.sections() {
//!     println!("{} @ {:#x}", section.name, section.address);
//! }
//! # Ok::<(), ps2recomp::ParseError>(())
//! ```

use std::collections::HashMap;
use std::path::Path;

use flagset::{flags, FlagSet};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use thiserror::Error;

const ELF_MAGIC: &[u8] = &[0x7f, b'E', b'L', b'F'];
const EI_CLASS: usize = 4;
const EI_DATA: usize = 5;
const EI_VERSION: usize = 6;

const ELF32_HEADER_SIZE: usize = 52;
const ELF32_SECTION_HEADER_SIZE: usize = 40;
const ELF32_SYMBOL_SIZE: usize = 16;
const ELF32_REL_SIZE: usize = 8;

const EM_MIPS: u16 = 8;
const SHN_UNDEF: u16 = 0;

flags! {
    /// ELF section attribute bits, from the `sh_flags` field.
    pub enum SectionFlag: u32 {
        /// Writable at run time.
        Write = 0x1,
        /// Occupies guest memory.
        Alloc = 0x2,
        /// Contains executable instructions.
        ExecInstr = 0x4,
    }
}

/// ELF section type, from the `sh_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum SectionKind {
    /// Inactive entry
    Null = 0,
    /// Program contents
    Progbits = 1,
    /// Symbol table
    SymbolTable = 2,
    /// String table
    StringTable = 3,
    /// Relocations with addends
    Rela = 4,
    /// Symbol hash table
    Hash = 5,
    /// Dynamic linking information
    Dynamic = 6,
    /// Auxiliary information
    Note = 7,
    /// Occupies no file space (BSS)
    Nobits = 8,
    /// Relocations without addends
    Rel = 9,
}

/// ELF symbol type, from the low nibble of `st_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum SymbolKind {
    /// Unspecified
    NoType = 0,
    /// Data object
    Object = 1,
    /// Executable code
    Func = 2,
    /// Section
    Section = 3,
    /// Source file name
    File = 4,
}

/// A loaded view of one section.
#[derive(Debug, Clone)]
pub struct Section {
    /// Section name from the string table.
    pub name: String,
    /// Guest virtual address.
    pub address: u32,
    /// Size in guest memory.
    pub size: u32,
    /// Offset of the data in the file, 0 for NOBITS.
    pub offset: u32,
    /// Attribute bits.
    pub flags: FlagSet<SectionFlag>,
    /// Section type from the header.
    pub kind: SectionKind,
}

impl Section {
    /// Executable code loaded into guest memory.
    pub fn is_code(&self) -> bool {
        self.flags.contains(SectionFlag::Alloc) && self.flags.contains(SectionFlag::ExecInstr)
    }

    /// Initialised data loaded into guest memory.
    pub fn is_data(&self) -> bool {
        self.kind == SectionKind::Progbits
            && self.flags.contains(SectionFlag::Alloc)
            && !self.flags.contains(SectionFlag::ExecInstr)
    }

    /// Zero-initialised memory with no file backing.
    pub fn is_bss(&self) -> bool {
        self.kind == SectionKind::Nobits && self.flags.contains(SectionFlag::Alloc)
    }

    /// Not writable by the guest.
    pub fn is_read_only(&self) -> bool {
        !self.flags.contains(SectionFlag::Write)
    }

    fn has_file_data(&self) -> bool {
        self.kind != SectionKind::Nobits && self.size > 0
    }
}

/// One symbol table entry.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Symbol name.
    pub name: String,
    /// Guest address.
    pub address: u32,
    /// Size in bytes, 0 when unknown.
    pub size: u32,
    /// Typed as a function in the symbol table.
    pub is_function: bool,
    /// Undefined here, resolved elsewhere.
    pub is_imported: bool,
    /// Defined here with global binding.
    pub is_exported: bool,
}

/// One relocation entry.
#[derive(Debug, Clone)]
pub struct Relocation {
    /// Guest address the relocation applies to.
    pub offset: u32,
    /// Raw `r_info` word.
    pub info: u32,
    /// Symbol table index.
    pub symbol: u32,
    /// Relocation type.
    pub kind: u32,
    /// Explicit addend; 0 for REL-style entries.
    pub addend: i32,
    /// Resolved symbol name, empty when the symbol is unnamed.
    pub symbol_name: String,
}

/// Errors produced while loading or reading an ELF image.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file is not an ELF file or the identification bytes are unsupported
    #[error("invalid ELF header")]
    InvalidHeader,
    /// A field held a value this reader does not accept
    #[error("invalid value in field {0}")]
    InvalidValue(&'static str),
    /// Data ended before a structure was complete
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// The file could not be read
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// An owned, parsed PS2 ELF image.
///
/// Construction validates the identification bytes and machine type and
/// eagerly extracts the section table; symbols, functions and
/// relocations are extracted from it on request.
#[derive(Debug, Clone)]
pub struct ElfImage {
    bytes: Vec<u8>,
    sections: Vec<Section>,
    entry_point: u32,
    ghidra_functions: Vec<(String, u32, u32)>,
}

impl ElfImage {
    /// Reads and parses an image from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        Self::new(std::fs::read(path)?)
    }

    /// Parses an image from bytes already in memory.
    pub fn new(bytes: Vec<u8>) -> Result<Self, ParseError> {
        if !bytes.starts_with(ELF_MAGIC) {
            return Err(ParseError::InvalidHeader);
        }
        match bytes.get(EI_CLASS) {
            Some(1) => {}
            Some(_) => return Err(ParseError::InvalidValue("ei_class")),
            None => return Err(ParseError::UnexpectedEof),
        }
        match bytes.get(EI_DATA) {
            Some(1) => {}
            Some(_) => return Err(ParseError::InvalidValue("ei_data")),
            None => return Err(ParseError::UnexpectedEof),
        }
        match bytes.get(EI_VERSION) {
            Some(1) => {}
            Some(_) => return Err(ParseError::InvalidValue("ei_version")),
            None => return Err(ParseError::UnexpectedEof),
        }
        if bytes.len() < ELF32_HEADER_SIZE {
            return Err(ParseError::UnexpectedEof);
        }

        let mut image = Self {
            bytes,
            sections: Vec::new(),
            entry_point: 0,
            ghidra_functions: Vec::new(),
        };

        if image.read_u16(18).ok_or(ParseError::UnexpectedEof)? != EM_MIPS {
            return Err(ParseError::InvalidValue("e_machine"));
        }

        image.entry_point = image.read_u32(24).ok_or(ParseError::UnexpectedEof)?;
        image.sections = image.parse_sections()?;
        Ok(image)
    }

    fn read_u16(&self, index: usize) -> Option<u16> {
        self.bytes
            .get(index..index + 2)
            .map(|b| u16::from_le_bytes(b.try_into().unwrap()))
    }

    fn read_u32(&self, index: usize) -> Option<u32> {
        self.bytes
            .get(index..index + 4)
            .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
    }

    fn parse_sections(&self) -> Result<Vec<Section>, ParseError> {
        let shoff = self.read_u32(32).ok_or(ParseError::UnexpectedEof)? as usize;
        let shentsize = self.read_u16(46).ok_or(ParseError::UnexpectedEof)? as usize;
        let shnum = self.read_u16(48).ok_or(ParseError::UnexpectedEof)? as usize;
        let shstrndx = self.read_u16(50).ok_or(ParseError::UnexpectedEof)? as usize;

        if shnum == 0 {
            return Ok(Vec::new());
        }
        if shentsize != ELF32_SECTION_HEADER_SIZE {
            return Err(ParseError::InvalidValue("e_shentsize"));
        }
        if shoff + shnum * shentsize > self.bytes.len() {
            return Err(ParseError::UnexpectedEof);
        }

        let header_field = |index: usize, field: usize| -> u32 {
            // Bounds were checked for the whole table above.
            self.read_u32(shoff + index * ELF32_SECTION_HEADER_SIZE + field)
                .unwrap_or(0)
        };

        // The section name string table is itself a section; resolve its
        // file window first.
        let strtab_off = header_field(shstrndx, 16) as usize;
        let strtab_size = header_field(shstrndx, 20) as usize;
        let strtab = self
            .bytes
            .get(strtab_off..strtab_off + strtab_size)
            .unwrap_or(&[]);

        let mut sections = Vec::with_capacity(shnum);
        for i in 0..shnum {
            let name_index = header_field(i, 0) as usize;
            let kind = SectionKind::from_u32(header_field(i, 4)).unwrap_or(SectionKind::Null);
            let flags = FlagSet::<SectionFlag>::new_truncated(header_field(i, 8));

            sections.push(Section {
                name: read_strtab(strtab, name_index),
                address: header_field(i, 12),
                size: header_field(i, 20),
                offset: header_field(i, 16),
                flags,
                kind,
            });
        }

        Ok(sections)
    }

    /// The program entry point from the ELF header.
    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    /// All sections, in table order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// True when `address` falls inside a section with file-backed data.
    pub fn is_valid_address(&self, address: u32) -> bool {
        self.section_containing(address).is_some()
    }

    /// Reads the 32-bit little-endian word at a guest address.
    pub fn read_word(&self, address: u32) -> Result<u32, ParseError> {
        let section = self
            .section_containing(address)
            .ok_or(ParseError::InvalidValue("address"))?;
        let offset = section.offset as usize + (address - section.address) as usize;
        self.read_u32(offset).ok_or(ParseError::UnexpectedEof)
    }

    fn section_containing(&self, address: u32) -> Option<&Section> {
        self.sections.iter().find(|s| {
            s.flags.contains(SectionFlag::Alloc)
                && s.has_file_data()
                && address >= s.address
                && address < s.address.wrapping_add(s.size)
        })
    }

    /// Extracts every named symbol from the symbol tables.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols = Vec::new();

        for (i, section) in self.sections.iter().enumerate() {
            if section.kind != SectionKind::SymbolTable {
                continue;
            }

            // sh_link points at the paired string table.
            let strtab = self.symtab_strings(i).unwrap_or(&[]);

            let table_off = section.offset as usize;
            let count = section.size as usize / ELF32_SYMBOL_SIZE;
            for n in 0..count {
                let base = table_off + n * ELF32_SYMBOL_SIZE;
                let Some(name_index) = self.read_u32(base) else {
                    break;
                };
                let value = self.read_u32(base + 4).unwrap_or(0);
                let size = self.read_u32(base + 8).unwrap_or(0);
                let info = *self.bytes.get(base + 12).unwrap_or(&0);
                let shndx = self.read_u16(base + 14).unwrap_or(0);

                let name = read_strtab(strtab, name_index as usize);
                if name.is_empty() {
                    continue;
                }

                let kind = SymbolKind::from_u8(info & 0xF);
                let global = (info >> 4) == 1;
                symbols.push(Symbol {
                    name,
                    address: value,
                    size,
                    is_function: kind == Some(SymbolKind::Func),
                    is_imported: shndx == SHN_UNDEF,
                    is_exported: global && shndx != SHN_UNDEF,
                });
            }
        }

        symbols
    }

    fn symtab_strings(&self, symtab_index: usize) -> Option<&[u8]> {
        let shoff = self.read_u32(32)? as usize;
        let link = self.read_u32(shoff + symtab_index * ELF32_SECTION_HEADER_SIZE + 24)? as usize;
        let section = self.sections.get(link)?;
        if section.kind != SectionKind::StringTable {
            return None;
        }
        self.bytes
            .get(section.offset as usize..(section.offset + section.size) as usize)
    }

    /// Extracts relocations from every REL-type section, resolving
    /// symbol names through the matching symbol table.
    pub fn relocations(&self) -> Vec<Relocation> {
        let symbols = self.raw_symbol_names();
        let mut relocations = Vec::new();

        for section in &self.sections {
            if section.kind != SectionKind::Rel {
                continue;
            }

            let table_off = section.offset as usize;
            let count = section.size as usize / ELF32_REL_SIZE;
            for n in 0..count {
                let base = table_off + n * ELF32_REL_SIZE;
                let Some(offset) = self.read_u32(base) else {
                    break;
                };
                let Some(info) = self.read_u32(base + 4) else {
                    break;
                };
                let symbol = info >> 8;
                relocations.push(Relocation {
                    offset,
                    info,
                    symbol,
                    kind: info & 0xFF,
                    addend: 0,
                    symbol_name: symbols
                        .get(symbol as usize)
                        .cloned()
                        .unwrap_or_default(),
                });
            }
        }

        relocations
    }

    fn raw_symbol_names(&self) -> Vec<String> {
        for (i, section) in self.sections.iter().enumerate() {
            if section.kind != SectionKind::SymbolTable {
                continue;
            }
            let strtab = self.symtab_strings(i).unwrap_or(&[]);
            let table_off = section.offset as usize;
            let count = section.size as usize / ELF32_SYMBOL_SIZE;
            return (0..count)
                .map(|n| {
                    let name_index = self
                        .read_u32(table_off + n * ELF32_SYMBOL_SIZE)
                        .unwrap_or(0);
                    read_strtab(strtab, name_index as usize)
                })
                .collect();
        }
        Vec::new()
    }

    /// Overlays a Ghidra-exported function map: one function per line,
    /// `name start end` with hex or decimal addresses. Entries replace
    /// symbol-derived functions with the same start.
    pub fn load_ghidra_map<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, ParseError> {
        let text = std::fs::read_to_string(path)?;
        let mut loaded = 0;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(name), Some(start), Some(end)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let (Some(start), Some(end)) = (parse_address(start), parse_address(end)) else {
                continue;
            };
            if end <= start {
                continue;
            }
            self.ghidra_functions.push((name.to_string(), start, end));
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Builds the function list: sized function symbols, overlaid by the
    /// Ghidra map when one was loaded, sorted by start address.
    pub fn functions(&self) -> Vec<(String, u32, u32)> {
        let mut by_start: HashMap<u32, (String, u32, u32)> = HashMap::new();

        for symbol in self.symbols() {
            if !symbol.is_function || symbol.size == 0 || symbol.is_imported {
                continue;
            }
            by_start.insert(
                symbol.address,
                (
                    symbol.name.clone(),
                    symbol.address,
                    symbol.address.wrapping_add(symbol.size),
                ),
            );
        }

        for (name, start, end) in &self.ghidra_functions {
            by_start.insert(*start, (name.clone(), *start, *end));
        }

        let mut functions: Vec<_> = by_start.into_values().collect();
        functions.sort_by_key(|f| f.1);
        functions
    }
}

fn read_strtab(strtab: &[u8], index: usize) -> String {
    let Some(tail) = strtab.get(index..) else {
        return String::new();
    };
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).into_owned()
}

fn parse_address(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}
