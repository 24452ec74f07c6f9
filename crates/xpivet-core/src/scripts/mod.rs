//! Static JavaScript risk analysis.
//!
//! Scripts are parsed by an external oracle into a Parser API syntax
//! tree, then walked structurally against a catalog of risk patterns.
//! The oracle is a capability, not trusted code: anything unexpected it
//! does, including hanging, becomes a per-file diagnostic.

pub mod analyzer;
pub mod markup;
pub mod oracle;

use thiserror::Error;

use crate::diagnostics::Rule;
use crate::diagnostics::Severity;

// Re-export public types and functions
pub use analyzer::analyze;
pub use oracle::SpiderMonkeyOracle;

/// The oracle could not produce a syntax tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// The source has a syntax error.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// The oracle exceeded its wall-clock budget.
    #[error("parser timed out")]
    Timeout,
    /// The oracle process failed to run or produced unusable output.
    #[error("parser unavailable: {0}")]
    Launch(String),
}

/// A script could not be parsed; its checks were skipped.
pub const UNPARSEABLE_SCRIPT: Rule = Rule {
    id: "scripts.unparseable",
    severity: Severity::Warning,
    message: "JavaScript could not be parsed.",
    description: "The file was skipped because the parsing oracle did not \
                  return a syntax tree for it.",
};

/// One JavaScript source ready for analysis.
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    /// Archive path of the file the source came from.
    pub path: String,
    /// The source text.
    pub source: String,
    /// Number of lines preceding the source inside its file.
    ///
    /// Zero for standalone scripts. Inline markup scripts carry the
    /// offset of their body so reported locations point into the
    /// markup file.
    pub line_offset: u32,
}

impl ScriptUnit {
    /// A standalone script file.
    #[must_use]
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            line_offset: 0,
        }
    }
}

/// Capability interface to the external parsing oracle.
///
/// Implementations must be callable from worker threads. The production
/// implementation is [`SpiderMonkeyOracle`]; tests substitute canned
/// trees.
pub trait ScriptParser: Sync {
    /// Parses JavaScript source into a Parser API syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFailure`] when no tree could be produced. The
    /// caller converts this into a diagnostic; it never aborts the run.
    fn parse(&self, source: &str) -> Result<serde_json::Value, ParseFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_display() {
        assert_eq!(
            ParseFailure::Syntax("unexpected token".to_string()).to_string(),
            "syntax error: unexpected token"
        );
        assert_eq!(ParseFailure::Timeout.to_string(), "parser timed out");
        assert!(
            ParseFailure::Launch("no such file".to_string())
                .to_string()
                .contains("no such file")
        );
    }

    #[test]
    fn test_script_unit_defaults() {
        let unit = ScriptUnit::new("main.js", "var x;");
        assert_eq!(unit.path, "main.js");
        assert_eq!(unit.line_offset, 0);
    }
}
