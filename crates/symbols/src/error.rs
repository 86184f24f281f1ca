use std::{io, path::PathBuf};

/// Represents all possible errors that can occur in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The executable could not be read or its ELF structures are corrupt.
    #[error("malformed binary {}: {source}", path.display())]
    MalformedBinary {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// One or more required names are absent from the symbol table. Every
    /// missing name is listed, in the order it was required.
    #[error("unresolved symbols: {}", .0.join(", "))]
    UnresolvedSymbols(Vec<String>),

    /// The variable-list file could not be read.
    #[error("failed to read variable list {}: {source}", path.display())]
    VarListRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why an image was rejected by [`SymbolTable::parse`](crate::SymbolTable::parse).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Object(#[from] object::Error),

    #[error("not an ELF image ({0:?})")]
    NotElf(object::BinaryFormat),

    #[error("unsupported ELF type ({0:?})")]
    UnsupportedKind(object::ObjectKind),
}
