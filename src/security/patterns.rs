//! Compiled deny-list patterns.

use crate::error::{ItsError, Result};
use regex::Regex;

/// Patterns rejected anywhere in text, placeholder config and variable values.
const TEXT_PATTERNS: &[&str] = &[
    r"(?i)<\s*/?\s*script\b",
    r"(?i)javascript\s*:",
    r"(?i)vbscript\s*:",
    r"(?i)data\s*:\s*text/html",
    r"(?i)<[^>]*\bon[a-z]+\s*=",
    r"(?i)\beval\s*\(",
    r"\bFunction\s*\(",
    r"(?i)\bset(?:Timeout|Interval|Immediate)\s*\(",
    r"\bdocument\s*\.\s*(?:cookie|write|location|domain|body|createElement|getElementById|querySelector)",
    r"\bwindow\s*\.\s*(?:location|open|eval|document|localStorage|sessionStorage|fetch)",
    r"\bglobalThis\b",
    r"\\x[0-9a-fA-F]{2}",
    r"\\u[0-9a-fA-F]{4}",
    r"%[0-9a-fA-F]{2}",
    r"(?i)&#x?[0-9a-f]{2,6};",
];

/// Additional patterns rejected in conditions.
const EXPRESSION_PATTERNS: &[&str] = &[
    r"__\w+__",
    r"(?i)\bexec\s*\(",
    r"(?i)\bimport\b",
    r"(?i)\b(?:globals|locals|vars|dir)\s*\(",
    r"(?i)\b(?:getattr|setattr|delattr|hasattr)\s*\(",
    r"(?i)\b(?:compile|open|require)\s*\(",
    r"(?i)\b(?:constructor|prototype)\b",
];

/// Keys that are never allowed at any level of the variable tree.
///
/// Compared case-insensitively. Any key starting with `__` is also unsafe.
const UNSAFE_VARIABLE_NAMES: &[&str] = &[
    "__proto__",
    "constructor",
    "prototype",
    "eval",
    "exec",
    "function",
    "import",
    "globals",
    "locals",
    "getattr",
    "setattr",
    "delattr",
    "hasattr",
    "compile",
    "builtins",
    "globalthis",
    "window",
    "document",
    "require",
    "settimeout",
    "setinterval",
    "setimmediate",
    "tostring",
    "valueof",
    "hasownproperty",
    "isprototypeof",
    "propertyisenumerable",
    "__definegetter__",
    "__definesetter__",
];

/// Whether a variable key is in the unsafe-name set.
pub fn is_unsafe_variable_name(key: &str) -> bool {
    if key.starts_with("__") {
        return true;
    }
    let lowered = key.to_lowercase();
    UNSAFE_VARIABLE_NAMES.contains(&lowered.as_str())
}

/// Compiled regex patterns for efficient matching.
///
/// Create once per validator and reuse across checks.
pub struct DenyList {
    /// The compiled patterns paired with their original string representations.
    patterns: Vec<(Regex, String)>,
}

impl std::fmt::Debug for DenyList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenyList")
            .field(
                "patterns",
                &self.patterns.iter().map(|(_, s)| s).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DenyList {
    /// Compile a deny-list from pattern strings.
    ///
    /// # Returns
    ///
    /// * `Ok(DenyList)` - Successfully compiled patterns
    /// * `Err(ItsError::UserError)` - If any pattern fails to compile
    pub fn compile<'a, I>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut compiled = Vec::new();
        for pattern_str in patterns {
            let regex = Regex::new(pattern_str).map_err(|e| {
                ItsError::UserError(format!(
                    "invalid deny-list pattern '{}': {}",
                    pattern_str, e
                ))
            })?;
            compiled.push((regex, pattern_str.to_string()));
        }
        Ok(Self { patterns: compiled })
    }

    /// The deny-list applied to free text.
    pub fn for_text() -> Result<Self> {
        Self::compile(TEXT_PATTERNS.iter().copied())
    }

    /// The deny-list applied to conditions: text patterns plus
    /// interpreter-introspection tokens.
    pub fn for_expressions() -> Result<Self> {
        Self::compile(
            TEXT_PATTERNS
                .iter()
                .chain(EXPRESSION_PATTERNS.iter())
                .copied(),
        )
    }

    /// Check `content` against every pattern.
    ///
    /// # Returns
    ///
    /// `Some(pattern)` for the first pattern that matches, `None` otherwise
    pub fn find_match(&self, content: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(content))
            .map(|(_, pattern)| pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
