use regex::Regex;
use std::sync::LazyLock;

/// Words of the trigger language that never name a variable: the boolean
/// literals and the temporal operators `U`, `V` and `X`.
pub const RESERVED_KEYWORDS: &[&str] = &["true", "false", "U", "V", "X"];

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").expect("identifier pattern is valid")
});

/// A trigger condition together with the variable names it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerExpression {
    text: String,
    required: Vec<String>,
}

impl TriggerExpression {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let required = extract_required_symbols(&text);
        Self { text, required }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn required_symbols(&self) -> &[String] {
        &self.required
    }
}

/// Identifiers referenced by `expr`, in order of first occurrence, without
/// duplicates and without reserved keywords.
///
/// ```
/// # use symbols::extract_required_symbols;
/// assert_eq!(extract_required_symbols("a U b && a"), ["a", "b"]);
/// assert_eq!(extract_required_symbols("X (x -> y V z)"), ["x", "y", "z"]);
/// assert!(extract_required_symbols("true || 42").is_empty());
/// ```
pub fn extract_required_symbols(expr: &str) -> Vec<String> {
    let mut required: Vec<String> = Vec::new();
    for token in IDENTIFIER.find_iter(expr).map(|m| m.as_str()) {
        if RESERVED_KEYWORDS.contains(&token) || required.iter().any(|r| r == token) {
            continue;
        }
        required.push(token.to_owned());
    }
    required
}
