use crate::{Error, ParseError};
use object::{BinaryFormat, Object, ObjectKind, ObjectSection, ObjectSymbol, SymbolSection};
use std::{
    collections::{HashMap, hash_map::Entry},
    fmt, fs,
    path::Path,
};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Object,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Function => "function",
            SymbolKind::Object => "object",
        })
    }
}

/// A named definition read from an executable's symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Link-time address, before any load-time relocation.
    pub static_offset: u64,
    pub size: u64,
    pub kind: SymbolKind,
    /// Name of the defining section, empty for absolute symbols.
    pub section: String,
}

/// Whether the image is loaded at its link-time addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `ET_EXEC`: static offsets are runtime addresses.
    Fixed,
    /// `ET_DYN`: runtime addresses are static offsets plus the load base.
    PositionIndependent,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    image_kind: ImageKind,
    is_64: bool,
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Read the symbol table of the executable at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let malformed = |source: ParseError| Error::MalformedBinary {
            path: path.to_owned(),
            source,
        };

        let data = fs::read(path).map_err(|err| malformed(err.into()))?;
        let table = Self::parse(&data).map_err(malformed)?;
        debug!(
            path = %path.display(),
            symbols = table.len(),
            kind = ?table.image_kind,
            "read symbol table"
        );
        Ok(table)
    }

    /// Parse an in-memory ELF image.
    ///
    /// `.symtab` entries take precedence over `.dynsym` entries of the same
    /// name, and within a table the first definition wins. Undefined symbols
    /// and anything that is neither a function nor a data object are skipped.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let file = object::File::parse(data)?;
        if file.format() != BinaryFormat::Elf {
            return Err(ParseError::NotElf(file.format()));
        }

        let image_kind = match file.kind() {
            ObjectKind::Executable => ImageKind::Fixed,
            ObjectKind::Dynamic => ImageKind::PositionIndependent,
            other => return Err(ParseError::UnsupportedKind(other)),
        };

        let mut symbols = HashMap::new();
        for sym in file.symbols().chain(file.dynamic_symbols()) {
            let absolute = sym.section() == SymbolSection::Absolute;
            if sym.is_undefined() || !(sym.is_definition() || absolute) {
                continue;
            }
            let kind = match sym.kind() {
                object::SymbolKind::Text => SymbolKind::Function,
                object::SymbolKind::Data => SymbolKind::Object,
                _ => continue,
            };
            let name = sym.name()?;
            if name.is_empty() {
                continue;
            }

            let section = match sym.section() {
                SymbolSection::Section(index) => file.section_by_index(index)?.name()?.to_owned(),
                _ => String::new(),
            };

            match symbols.entry(name.to_owned()) {
                Entry::Occupied(_) => trace!(name, "ignoring duplicate symbol"),
                Entry::Vacant(entry) => {
                    entry.insert(Symbol {
                        name: name.to_owned(),
                        static_offset: sym.address(),
                        size: sym.size(),
                        kind,
                        section,
                    });
                }
            }
        }

        Ok(Self {
            image_kind,
            is_64: file.is_64(),
            symbols,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn image_kind(&self) -> ImageKind {
        self.image_kind
    }

    pub fn is_64(&self) -> bool {
        self.is_64
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ElfBuilder;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn sample(builder: ElfBuilder) -> ElfBuilder {
        builder
            .object("x", 0x4028, 4)
            .object("counter", 0x4030, 8)
            .function("main", 0x1000, 0x10)
            .undefined("printf")
    }

    #[test]
    fn reads_elf64_executable() {
        let table = SymbolTable::parse(&sample(ElfBuilder::elf64()).build()).unwrap();

        assert!(table.is_64());
        assert_eq!(table.image_kind(), ImageKind::Fixed);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get("x"),
            Some(&Symbol {
                name: "x".into(),
                static_offset: 0x4028,
                size: 4,
                kind: SymbolKind::Object,
                section: ".data".into(),
            })
        );
        let main = table.get("main").unwrap();
        assert_eq!(main.kind, SymbolKind::Function);
        assert_eq!(main.section, ".text");
        assert!(!table.contains("printf"));
    }

    #[test]
    fn reads_elf32_executable() {
        let table = SymbolTable::parse(&sample(ElfBuilder::elf32()).build()).unwrap();

        assert!(!table.is_64());
        assert_eq!(table.get("counter").map(|s| s.static_offset), Some(0x4030));
        assert_eq!(table.get("main").map(|s| s.size), Some(0x10));
    }

    #[test]
    fn detects_position_independent_images() {
        let image = ElfBuilder::elf64()
            .position_independent()
            .object("x", 0x4028, 4)
            .build();
        let table = SymbolTable::parse(&image).unwrap();
        assert_eq!(table.image_kind(), ImageKind::PositionIndependent);
    }

    #[test]
    fn absolute_symbols_have_no_section() {
        let image = ElfBuilder::elf64().absolute("limit", 0x40, 4).build();
        let table = SymbolTable::parse(&image).unwrap();
        let limit = table.get("limit").unwrap();
        assert_eq!(limit.static_offset, 0x40);
        assert_eq!(limit.kind, SymbolKind::Object);
        assert_eq!(limit.section, "");
    }

    #[test]
    fn first_definition_wins() {
        let image = ElfBuilder::elf64()
            .object("dup", 0x4010, 4)
            .object("dup", 0x4020, 4)
            .build();
        let table = SymbolTable::parse(&image).unwrap();
        assert_eq!(table.get("dup").map(|s| s.static_offset), Some(0x4010));
    }

    #[test]
    fn rejects_truncated_image() {
        let image = sample(ElfBuilder::elf64()).build();
        assert!(SymbolTable::parse(&image[..40]).is_err());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut image = sample(ElfBuilder::elf64()).build();
        image[0] = 0;
        assert!(SymbolTable::parse(&image).is_err());
    }

    #[test]
    fn rejects_section_table_out_of_bounds() {
        let image = sample(ElfBuilder::elf64())
            .section_table_offset(0xffff_0000)
            .build();
        assert!(SymbolTable::parse(&image).is_err());
    }

    #[test]
    fn read_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an executable").unwrap();

        let err = SymbolTable::read(file.path()).unwrap_err();
        match err {
            Error::MalformedBinary { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn read_missing_file_is_malformed() {
        let err = SymbolTable::read("/nonexistent/target").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedBinary {
                source: ParseError::Io(_),
                ..
            }
        ));
    }
}
