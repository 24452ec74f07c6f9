//! Validator configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::diagnostics::Severity;

/// How validation tiers are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Stop after the first tier that produced an error.
    #[default]
    Tiered,
    /// Run every tier regardless of accumulated errors.
    Determined,
}

/// Configuration for a validation run.
///
/// # Performance Note
///
/// This struct contains heap-allocated collections. For repeated runs,
/// pass by reference (`&ValidatorConfig`) rather than cloning.
///
/// # Examples
///
/// ```
/// use xpivet_core::ValidatorConfig;
///
/// // Use the defaults
/// let config = ValidatorConfig::default();
///
/// // Customize for specific needs
/// let custom = ValidatorConfig {
///     reference_locale: "de".to_string(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Path of the JavaScript shell used as the parsing oracle.
    ///
    /// A bare program name is resolved through `PATH`.
    pub js_shell: PathBuf,

    /// Wall-clock budget for a single oracle invocation.
    pub oracle_timeout: Duration,

    /// Path of the approved-applications document, when one is supplied.
    ///
    /// Without it, target-application versions are still checked for
    /// well-formedness but not for membership in a supported list.
    pub approved_apps: Option<PathBuf>,

    /// Tier scheduling behavior.
    pub mode: ExecutionMode,

    /// Locale treated as the translation reference.
    pub reference_locale: String,

    /// Largest entry, in bytes, read out of the container.
    ///
    /// Larger entries are skipped with an unreadable-entry notice.
    pub max_entry_size: u64,

    /// Per-rule severity overrides, applied at emission time.
    pub severity_overrides: Vec<(String, Severity)>,
}

impl Default for ValidatorConfig {
    /// Creates a `ValidatorConfig` with the stock settings.
    ///
    /// Default values:
    /// - `js_shell`: `js`
    /// - `oracle_timeout`: 5 seconds
    /// - `approved_apps`: none
    /// - `mode`: `Tiered`
    /// - `reference_locale`: `en-US`
    /// - `max_entry_size`: 50 MB
    /// - `severity_overrides`: empty
    fn default() -> Self {
        Self {
            js_shell: PathBuf::from("js"),
            oracle_timeout: Duration::from_secs(5),
            approved_apps: None,
            mode: ExecutionMode::Tiered,
            reference_locale: "en-US".to_string(),
            max_entry_size: 50 * 1024 * 1024, // 50 MB
            severity_overrides: Vec::new(),
        }
    }
}

impl ValidatorConfig {
    /// Creates a configuration that always runs every tier.
    ///
    /// Useful for audits where the complete defect list matters more
    /// than fail-fast turnaround.
    #[must_use]
    pub fn determined() -> Self {
        Self {
            mode: ExecutionMode::Determined,
            ..Default::default()
        }
    }

    /// Returns `true` when every tier runs regardless of errors.
    #[must_use]
    pub fn is_determined(&self) -> bool {
        self.mode == ExecutionMode::Determined
    }
}
