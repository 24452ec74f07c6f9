//! Diagnostic model and deterministic aggregation.
//!
//! Every validator reports through a [`DiagnosticSink`]. Emissions carry a
//! stable sort key (owning entry, rule identifier, per-reporter sequence)
//! so the finished [`ValidationResult`] is byte-identical across runs no
//! matter how workers were scheduled.

use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Serialize;
use thiserror::Error;

/// How serious a finding is.
///
/// Ordering places `Notice` lowest and `Error` highest, so `max` over a
/// set of findings yields the one that decides the run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding, never fails a run.
    Notice,
    /// Suspicious but tolerated finding.
    Warning,
    /// Finding that fails the run.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Error returned when parsing a [`Severity`] from text fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity level: {0}")]
pub struct ParseSeverityError(String);

impl std::str::FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "notice" => Ok(Self::Notice),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

/// Static description of a single validation rule.
///
/// Rules are declared as constants next to the component that owns them.
/// The `message` is the stable one-line headline every hit shares; the
/// `description` is the default long-form explanation, replaced by a
/// per-hit detail when the reporter supplies one.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Stable identifier in `component.rule_name` form.
    pub id: &'static str,
    /// Severity applied unless overridden by configuration.
    pub severity: Severity,
    /// One-line headline shared by every hit of this rule.
    pub message: &'static str,
    /// Default long-form explanation.
    pub description: &'static str,
}

/// A single finding produced by a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Identifier of the rule that fired.
    pub id: String,
    /// One-line headline.
    pub message: String,
    /// Long-form explanation or per-hit detail.
    pub description: String,
    /// Effective severity after configuration overrides.
    pub severity: Severity,
    /// Package entry the finding refers to, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// One-based source line, for script findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Zero-based source column, for script findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// The ordered outcome of a validation run.
///
/// Only the message sequence is stored. Counts are recomputed on demand
/// so they can never disagree with the sequence they summarize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Findings in deterministic report order.
    pub messages: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Number of error findings.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning findings.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Number of notice findings.
    #[must_use]
    pub fn notices(&self) -> usize {
        self.count(Severity::Notice)
    }

    /// Returns `true` when the run produced no errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use xpivet_core::ValidationResult;
    ///
    /// let result = ValidationResult::default();
    /// assert!(result.succeeded());
    /// assert_eq!(result.errors(), 0);
    /// ```
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.errors() == 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }
}

#[derive(Debug)]
struct Keyed {
    ordinal: u64,
    seq: u32,
    diagnostic: Diagnostic,
}

impl Keyed {
    fn sort_key(&self) -> (u64, &str, u32) {
        (self.ordinal, self.diagnostic.id.as_str(), self.seq)
    }
}

/// Thread-safe collector for diagnostics.
///
/// Reporters obtained from the sink may be driven from worker threads.
/// [`DiagnosticSink::finish`] sorts all recorded findings by their stable
/// key and returns the final [`ValidationResult`].
#[derive(Debug)]
pub struct DiagnosticSink {
    entries: Mutex<Vec<Keyed>>,
    overrides: Vec<(String, Severity)>,
}

impl DiagnosticSink {
    /// Creates a sink applying the given per-rule severity overrides.
    ///
    /// When the same rule id appears more than once, the last entry wins.
    #[must_use]
    pub fn new(overrides: &[(String, Severity)]) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            overrides: overrides.to_vec(),
        }
    }

    /// Reporter for findings about the package as a whole.
    ///
    /// Package-level findings sort before any entry finding.
    #[must_use]
    pub fn package_reporter(&self) -> EntryReporter<'_> {
        EntryReporter {
            sink: self,
            ordinal: 0,
            file: None,
            seq: 0,
        }
    }

    /// Reporter for findings about one package entry.
    ///
    /// `ordinal` is the entry's position within the container; entries
    /// sort in container order after package-level findings.
    #[must_use]
    pub fn entry_reporter(&self, ordinal: u64, file: impl Into<String>) -> EntryReporter<'_> {
        EntryReporter {
            sink: self,
            ordinal: ordinal.saturating_add(1),
            file: Some(file.into()),
            seq: 0,
        }
    }

    /// Number of error findings recorded so far.
    ///
    /// Severity overrides are already applied at record time, so the
    /// count reflects what [`DiagnosticSink::finish`] will report.
    #[must_use]
    pub fn error_count(&self) -> usize {
        let guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .iter()
            .filter(|k| k.diagnostic.severity == Severity::Error)
            .count()
    }

    /// Sorts everything recorded so far and produces the final result.
    #[must_use]
    pub fn finish(self) -> ValidationResult {
        let mut entries = self
            .entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        ValidationResult {
            messages: entries.into_iter().map(|k| k.diagnostic).collect(),
        }
    }

    fn effective_severity(&self, rule: &Rule) -> Severity {
        self.overrides
            .iter()
            .rev()
            .find(|(id, _)| id == rule.id)
            .map_or(rule.severity, |(_, severity)| *severity)
    }

    fn record(&self, keyed: Keyed) {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push(keyed);
    }
}

/// Emission handle bound to one package entry (or the package itself).
///
/// The reporter numbers its own emissions, so findings from a single
/// entry keep their source order in the final report.
#[derive(Debug)]
pub struct EntryReporter<'a> {
    sink: &'a DiagnosticSink,
    ordinal: u64,
    file: Option<String>,
    seq: u32,
}

impl EntryReporter<'_> {
    /// Records a hit of `rule` with its default description.
    pub fn emit(&mut self, rule: &Rule) {
        self.report(rule, None, None);
    }

    /// Records a hit of `rule` with a per-hit detail text.
    pub fn emit_detail(&mut self, rule: &Rule, detail: impl Into<String>) {
        self.report(rule, Some(detail.into()), None);
    }

    /// Records a hit of `rule` at a source location.
    pub fn emit_at(&mut self, rule: &Rule, line: u32, column: u32) {
        self.report(rule, None, Some((line, column)));
    }

    /// Records a hit of `rule` with full control over detail and location.
    pub fn report(&mut self, rule: &Rule, detail: Option<String>, location: Option<(u32, u32)>) {
        let diagnostic = Diagnostic {
            id: rule.id.to_string(),
            message: rule.message.to_string(),
            description: detail.unwrap_or_else(|| rule.description.to_string()),
            severity: self.sink.effective_severity(rule),
            file: self.file.clone(),
            line: location.map(|(line, _)| line),
            column: location.map(|(_, column)| column),
        };
        self.sink.record(Keyed {
            ordinal: self.ordinal,
            seq: self.seq,
            diagnostic,
        });
        self.seq = self.seq.saturating_add(1);
    }
}
