use crate::{Error, TriggerExpression};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Where the names of the variables to watch come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolSource {
    /// A file with one variable name per line.
    VarList(PathBuf),
    /// A trigger expression whose identifiers are the variables.
    Trigger(TriggerExpression),
}

impl SymbolSource {
    /// Treat `arg` as a variable-list path when such a file exists, and as a
    /// trigger expression otherwise.
    pub fn detect(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.is_file() {
            Self::VarList(path.to_owned())
        } else {
            Self::Trigger(TriggerExpression::new(arg))
        }
    }

    /// The ordered, de-duplicated names this source requires.
    pub fn required_symbols(&self) -> Result<Vec<String>, Error> {
        match self {
            Self::VarList(path) => {
                let text = fs::read_to_string(path).map_err(|source| Error::VarListRead {
                    path: path.clone(),
                    source,
                })?;
                Ok(parse_var_list(&text))
            }
            Self::Trigger(trigger) => Ok(trigger.required_symbols().to_vec()),
        }
    }
}

/// Names from a variable list: one per line, surrounding whitespace trimmed,
/// blank lines and `#` comments skipped, repeats dropped.
pub fn parse_var_list(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || names.iter().any(|n| n == line) {
            continue;
        }
        names.push(line.to_owned());
    }
    names
}
