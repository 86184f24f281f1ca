use crate::{Error, Symbol, SymbolTable};
use tracing::debug;

/// The symbols of a required-name sequence, in required order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    symbols: Vec<Symbol>,
}

impl Resolution {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|sym| sym.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|sym| sym.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<'a> IntoIterator for &'a Resolution {
    type Item = &'a Symbol;
    type IntoIter = std::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.iter()
    }
}

/// Look up every required name in `table`.
///
/// Either all names resolve, or the call fails with
/// [`Error::UnresolvedSymbols`] naming every one that did not. Repeated names
/// are resolved once.
pub fn resolve<S: AsRef<str>>(table: &SymbolTable, required: &[S]) -> Result<Resolution, Error> {
    let mut symbols: Vec<Symbol> = Vec::with_capacity(required.len());
    let mut missing: Vec<String> = Vec::new();

    for name in required.iter().map(AsRef::as_ref) {
        if symbols.iter().any(|sym| sym.name == name) || missing.iter().any(|m| m == name) {
            continue;
        }
        match table.get(name) {
            Some(sym) => symbols.push(sym.clone()),
            None => missing.push(name.to_owned()),
        }
    }

    if !missing.is_empty() {
        return Err(Error::UnresolvedSymbols(missing));
    }

    for sym in &symbols {
        debug!(name = %sym.name, offset = format_args!("{:#x}", sym.static_offset), "resolved");
    }
    Ok(Resolution { symbols })
}
