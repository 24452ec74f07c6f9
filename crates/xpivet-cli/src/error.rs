//! Error conversion utilities for CLI.
//!
//! Converts xpivet-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::Result;
use anyhow::anyhow;
use std::path::Path;
use xpivet_core::ArchiveError;
use xpivet_core::ValidationError;

/// Converts `ValidationError` to user-friendly anyhow error with context
pub fn convert_validation_error(err: ValidationError, package: &Path) -> anyhow::Error {
    match err {
        ValidationError::ApprovedApps { path, reason } => {
            anyhow!(
                "Cannot load approved applications from '{}': {}\n\
                 HINT: Pass --approved-apps a JSON object mapping application \
                 GUIDs to lists of version strings.",
                path.display(),
                reason
            )
        }
        ValidationError::Io(io_err) => {
            anyhow!(
                "I/O error while validating '{}': {}",
                package.display(),
                io_err
            )
        }
    }
}

/// Converts `ArchiveError` to user-friendly anyhow error with context
pub fn convert_archive_error(err: ArchiveError, package: &Path) -> anyhow::Error {
    match err {
        ArchiveError::CannotOpen(reason) => {
            anyhow!(
                "Cannot open package '{}': {}\n\
                 HINT: The file may be missing or not a zip container.",
                package.display(),
                reason
            )
        }
        ArchiveError::Corrupt(reason) => {
            anyhow!(
                "Corrupt package '{}': {}\n\
                 HINT: The archive may be truncated or malformed.",
                package.display(),
                reason
            )
        }
        ArchiveError::Empty => {
            anyhow!("Package '{}' contains no entries", package.display())
        }
    }
}

/// Adds context to an error raised while validating a package
pub fn add_package_context<T>(
    result: Result<T, ValidationError>,
    package: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_validation_error(e, package))
}

/// Adds context to an error raised while reading a container
pub fn add_archive_context<T>(
    result: Result<T, ArchiveError>,
    package: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, package))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_approved_apps_error() {
        let err = ValidationError::ApprovedApps {
            path: PathBuf::from("apps.json"),
            reason: "expected object".to_string(),
        };
        let converted = convert_validation_error(err, Path::new("addon.xpi"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("apps.json"));
        assert!(msg.contains("expected object"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ValidationError::Io(io_err);
        let converted = convert_validation_error(err, Path::new("addon.xpi"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("addon.xpi"));
    }

    #[test]
    fn test_convert_cannot_open_error() {
        let err = ArchiveError::CannotOpen("no such file".to_string());
        let converted = convert_archive_error(err, Path::new("missing.xpi"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("missing.xpi"));
        assert!(msg.contains("no such file"));
        assert!(msg.contains("HINT"));
    }

    #[test]
    fn test_convert_empty_error() {
        let converted = convert_archive_error(ArchiveError::Empty, Path::new("bare.xpi"));
        let msg = format!("{converted:?}");
        assert!(msg.contains("bare.xpi"));
        assert!(msg.contains("no entries"));
    }
}
