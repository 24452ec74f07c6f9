//! Error types for package validation operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ValidationError`.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Failures opening or reading an add-on container.
///
/// These never abort a validation run. The runner converts them into a
/// single error diagnostic so the caller still receives a report.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The file could not be opened at all.
    #[error("cannot open package: {0}")]
    CannotOpen(String),

    /// The central directory or an entry header is damaged.
    #[error("corrupt package: {0}")]
    Corrupt(String),

    /// The archive contains no entries.
    #[error("package contains no entries")]
    Empty,
}

impl ArchiveError {
    /// Returns `true` when the container itself could not be read.
    ///
    /// Structural failures (`CannotOpen`, `Corrupt`) mean no entry data
    /// is available; `Empty` means the container was readable but bare.
    ///
    /// # Examples
    ///
    /// ```
    /// use xpivet_core::ArchiveError;
    ///
    /// let err = ArchiveError::Corrupt("bad central directory".to_string());
    /// assert!(err.is_structural());
    ///
    /// assert!(!ArchiveError::Empty.is_structural());
    /// ```
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::CannotOpen(_) | Self::Corrupt(_))
    }
}

/// Errors that abort a validation run before it produces a report.
///
/// Almost every defect in the package under test surfaces as a
/// [`Diagnostic`](crate::Diagnostic) instead. Only failures of the
/// invocation itself, such as an unreadable approved-applications
/// document, are reported through this type.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The approved-applications document is present but unusable.
    #[error("cannot load approved applications from {path}: {reason}")]
    ApprovedApps {
        /// Path of the document that failed to load.
        path: PathBuf,
        /// Parser or shape problem encountered.
        reason: String,
    },
}
