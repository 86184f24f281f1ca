//! Builds minimal little-endian ELF images carrying `.text`, `.data`, and a
//! `.symtab`/`.strtab` pair, enough for symbol resolution tests without a
//! toolchain.

const ET_EXEC: u16 = 2;
const ET_DYN: u16 = 3;

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;

const SHF_WRITE: u64 = 0x1;
const SHF_ALLOC: u64 = 0x2;
const SHF_EXECINSTR: u64 = 0x4;

const STB_GLOBAL: u8 = 1;
const STT_OBJECT: u8 = 1;
const STT_FUNC: u8 = 2;

const TEXT_ADDR: u64 = 0x1000;
const TEXT_SIZE: u64 = 0x100;
const DATA_ADDR: u64 = 0x4000;
const DATA_SIZE: u64 = 0x1000;

// Section indices in the emitted image.
const SHN_UNDEF: u16 = 0;
const SHN_TEXT: u16 = 1;
const SHN_DATA: u16 = 2;
const SHN_STRTAB: u32 = 4;
const SHN_SHSTRTAB: u16 = 5;
const SHN_ABS: u16 = 0xfff1;

#[derive(Debug, Clone)]
struct FixtureSymbol {
    name: String,
    value: u64,
    size: u64,
    kind: u8,
    shndx: u16,
}

#[derive(Debug, Clone)]
pub struct ElfBuilder {
    is_64: bool,
    e_type: u16,
    shoff_override: Option<u64>,
    symbols: Vec<FixtureSymbol>,
}

impl ElfBuilder {
    pub fn elf64() -> Self {
        Self {
            is_64: true,
            e_type: ET_EXEC,
            shoff_override: None,
            symbols: Vec::new(),
        }
    }

    pub fn elf32() -> Self {
        Self {
            is_64: false,
            ..Self::elf64()
        }
    }

    /// Mark the image `ET_DYN`.
    pub fn position_independent(mut self) -> Self {
        self.e_type = ET_DYN;
        self
    }

    /// A global data object in `.data`.
    pub fn object(self, name: &str, value: u64, size: u64) -> Self {
        self.symbol(name, value, size, STT_OBJECT, SHN_DATA)
    }

    /// A global function in `.text`.
    pub fn function(self, name: &str, value: u64, size: u64) -> Self {
        self.symbol(name, value, size, STT_FUNC, SHN_TEXT)
    }

    /// A global data object with an absolute value, outside any section.
    pub fn absolute(self, name: &str, value: u64, size: u64) -> Self {
        self.symbol(name, value, size, STT_OBJECT, SHN_ABS)
    }

    /// A global function reference with no definition in this image.
    pub fn undefined(self, name: &str) -> Self {
        self.symbol(name, 0, 0, STT_FUNC, SHN_UNDEF)
    }

    /// Point the section header table somewhere else, e.g. past the end of
    /// the file.
    pub fn section_table_offset(mut self, offset: u64) -> Self {
        self.shoff_override = Some(offset);
        self
    }

    fn symbol(mut self, name: &str, value: u64, size: u64, kind: u8, shndx: u16) -> Self {
        self.symbols.push(FixtureSymbol {
            name: name.to_owned(),
            value,
            size,
            kind,
            shndx,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut strtab = vec![0u8];
        let mut symtab = Vec::new();
        self.put_sym(&mut symtab, 0, 0, 0, 0, 0);
        for sym in &self.symbols {
            let name = strtab.len() as u32;
            strtab.extend_from_slice(sym.name.as_bytes());
            strtab.push(0);
            let info = (STB_GLOBAL << 4) | sym.kind;
            self.put_sym(&mut symtab, name, sym.value, sym.size, info, sym.shndx);
        }

        let mut shstrtab = vec![0u8];
        let mut section_name = |name: &str| {
            let offset = shstrtab.len() as u32;
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            offset
        };
        let text_name = section_name(".text");
        let data_name = section_name(".data");
        let symtab_name = section_name(".symtab");
        let strtab_name = section_name(".strtab");
        let shstrtab_name = section_name(".shstrtab");

        let (ehdr_size, shdr_size, sym_size) = if self.is_64 {
            (64, 64, 24)
        } else {
            (52, 40, 16)
        };

        let mut out = vec![0u8; ehdr_size];
        align(&mut out, 16);
        let text_off = out.len() as u64;
        out.resize(out.len() + TEXT_SIZE as usize, 0xcc);
        align(&mut out, 16);
        let data_off = out.len() as u64;
        out.resize(out.len() + DATA_SIZE as usize, 0);
        align(&mut out, 8);
        let symtab_off = out.len() as u64;
        out.extend_from_slice(&symtab);
        let strtab_off = out.len() as u64;
        out.extend_from_slice(&strtab);
        let shstrtab_off = out.len() as u64;
        out.extend_from_slice(&shstrtab);
        align(&mut out, 8);
        let shoff = out.len() as u64;

        let headers = [
            SectionHeader::default(),
            SectionHeader {
                name: text_name,
                kind: SHT_PROGBITS,
                flags: SHF_ALLOC | SHF_EXECINSTR,
                addr: TEXT_ADDR,
                offset: text_off,
                size: TEXT_SIZE,
                align: 16,
                ..Default::default()
            },
            SectionHeader {
                name: data_name,
                kind: SHT_PROGBITS,
                flags: SHF_ALLOC | SHF_WRITE,
                addr: DATA_ADDR,
                offset: data_off,
                size: DATA_SIZE,
                align: 16,
                ..Default::default()
            },
            SectionHeader {
                name: symtab_name,
                kind: SHT_SYMTAB,
                offset: symtab_off,
                size: symtab.len() as u64,
                link: SHN_STRTAB,
                // every emitted symbol after the null entry is global
                info: 1,
                align: 8,
                entsize: sym_size,
                ..Default::default()
            },
            SectionHeader {
                name: strtab_name,
                kind: SHT_STRTAB,
                offset: strtab_off,
                size: strtab.len() as u64,
                align: 1,
                ..Default::default()
            },
            SectionHeader {
                name: shstrtab_name,
                kind: SHT_STRTAB,
                offset: shstrtab_off,
                size: shstrtab.len() as u64,
                align: 1,
                ..Default::default()
            },
        ];
        for header in &headers {
            self.put_shdr(&mut out, header);
        }

        let shoff = self.shoff_override.unwrap_or(shoff);
        self.put_ehdr(&mut out, shoff, headers.len() as u16, ehdr_size, shdr_size);
        out
    }

    fn put_ehdr(&self, out: &mut [u8], shoff: u64, shnum: u16, ehdr_size: usize, shdr_size: u16) {
        let mut h = Vec::with_capacity(ehdr_size);
        h.extend_from_slice(b"\x7fELF");
        h.push(if self.is_64 { 2 } else { 1 });
        // little endian, version 1, System V ABI
        h.extend_from_slice(&[1, 1, 0]);
        h.resize(16, 0);
        h.extend_from_slice(&self.e_type.to_le_bytes());
        // x86-64 or ARM
        let machine: u16 = if self.is_64 { 62 } else { 40 };
        h.extend_from_slice(&machine.to_le_bytes());
        h.extend_from_slice(&1u32.to_le_bytes());
        self.put_word(&mut h, TEXT_ADDR);
        self.put_word(&mut h, 0);
        self.put_word(&mut h, shoff);
        h.extend_from_slice(&0u32.to_le_bytes());
        h.extend_from_slice(&(ehdr_size as u16).to_le_bytes());
        let phentsize: u16 = if self.is_64 { 56 } else { 32 };
        h.extend_from_slice(&phentsize.to_le_bytes());
        h.extend_from_slice(&0u16.to_le_bytes());
        h.extend_from_slice(&shdr_size.to_le_bytes());
        h.extend_from_slice(&shnum.to_le_bytes());
        h.extend_from_slice(&SHN_SHSTRTAB.to_le_bytes());
        debug_assert_eq!(h.len(), ehdr_size);
        out[..ehdr_size].copy_from_slice(&h);
    }

    fn put_shdr(&self, out: &mut Vec<u8>, s: &SectionHeader) {
        out.extend_from_slice(&s.name.to_le_bytes());
        out.extend_from_slice(&s.kind.to_le_bytes());
        self.put_word(out, s.flags);
        self.put_word(out, s.addr);
        self.put_word(out, s.offset);
        self.put_word(out, s.size);
        out.extend_from_slice(&s.link.to_le_bytes());
        out.extend_from_slice(&s.info.to_le_bytes());
        self.put_word(out, s.align);
        self.put_word(out, s.entsize);
    }

    fn put_sym(&self, out: &mut Vec<u8>, name: u32, value: u64, size: u64, info: u8, shndx: u16) {
        out.extend_from_slice(&name.to_le_bytes());
        if self.is_64 {
            out.push(info);
            out.push(0);
            out.extend_from_slice(&shndx.to_le_bytes());
            out.extend_from_slice(&value.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        } else {
            out.extend_from_slice(&(value as u32).to_le_bytes());
            out.extend_from_slice(&(size as u32).to_le_bytes());
            out.push(info);
            out.push(0);
            out.extend_from_slice(&shndx.to_le_bytes());
        }
    }

    /// Address/offset-sized field: 8 bytes for ELF64, 4 for ELF32.
    fn put_word(&self, out: &mut Vec<u8>, value: u64) {
        if self.is_64 {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
    }
}

#[derive(Debug, Default)]
struct SectionHeader {
    name: u32,
    kind: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    align: u64,
    entsize: u64,
}

fn align(out: &mut Vec<u8>, to: usize) {
    let padded = out.len().next_multiple_of(to);
    out.resize(padded, 0);
}
