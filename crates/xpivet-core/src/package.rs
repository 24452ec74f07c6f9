//! Package intake.
//!
//! Opens the container under test and reads its entries eagerly, so the
//! validators can run over plain byte slices without touching the zip
//! reader again. Per-entry read failures never fail the open; they are
//! recorded and surface as notices.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::ValidatorConfig;
use crate::diagnostics::Rule;
use crate::diagnostics::Severity;
use crate::error::ArchiveError;

/// The container could not be opened or is structurally damaged.
pub const CANNOT_OPEN: Rule = Rule {
    id: "package.cannot_open",
    severity: Severity::Error,
    message: "The XPI could not be opened.",
    description: "The package is not a readable zip container, so nothing \
                  inside it can be validated.",
};

/// The container opened but holds nothing.
pub const EMPTY_PACKAGE: Rule = Rule {
    id: "package.empty",
    severity: Severity::Error,
    message: "The package is empty.",
    description: "The container has no entries to validate.",
};

/// One entry could not be read; the rest of the run continues.
pub const UNREADABLE_ENTRY: Rule = Rule {
    id: "package.unreadable_entry",
    severity: Severity::Notice,
    message: "File could not be read from the package.",
    description: "The entry was skipped and its content checks did not run.",
};

/// What kind of input was handed to the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// A full add-on package (`.xpi`, `.zip`, or unrecognized).
    Xpi,
    /// A bare chrome JAR submitted on its own (`.jar`).
    Jar,
    /// A standalone OpenSearch descriptor (`.xml`).
    SearchProvider,
}

impl PackageKind {
    /// Detects the input kind from the file name.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("xml") => Self::SearchProvider,
            Some("jar") => Self::Jar,
            _ => Self::Xpi,
        }
    }

    /// Returns `true` for inputs that are zip containers.
    #[must_use]
    pub const fn is_archive(self) -> bool {
        !matches!(self, Self::SearchProvider)
    }
}

/// One readable file inside the container.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Position within the container.
    pub ordinal: u64,
    /// Entry path as stored in the archive.
    pub path: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Entry contents.
    pub bytes: Vec<u8>,
}

/// An entry that could not be read out of the container.
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    /// Position within the container.
    pub ordinal: u64,
    /// Entry path as stored in the archive.
    pub path: String,
    /// Why the entry was skipped.
    pub reason: String,
}

/// The opened container. Read-only after load.
#[derive(Debug)]
pub struct Package {
    /// Detected input kind.
    pub kind: PackageKind,
    /// Readable entries in container order. Directories are omitted.
    pub entries: Vec<Entry>,
    /// Entries that could not be read.
    pub skipped: Vec<SkippedEntry>,
}

impl Package {
    /// Opens a zip container and reads every file entry.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::CannotOpen`] when the file is missing or
    /// unreadable, [`ArchiveError::Corrupt`] when the zip structure is
    /// damaged, and [`ArchiveError::Empty`] for a container without
    /// entries. Individual entry failures do not error; they land in
    /// [`Package::skipped`].
    pub fn open(path: &Path, config: &ValidatorConfig) -> Result<Self, ArchiveError> {
        let kind = PackageKind::from_path(path);
        let file = File::open(path).map_err(|e| ArchiveError::CannotOpen(e.to_string()))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ArchiveError::Corrupt(format!("failed to open ZIP archive: {e}")))?;
        if archive.is_empty() {
            return Err(ArchiveError::Empty);
        }

        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for i in 0..archive.len() {
            let ordinal = i as u64;
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    skipped.push(SkippedEntry {
                        ordinal,
                        path: format!("entry #{i}"),
                        reason: format!("failed to read ZIP entry: {e}"),
                    });
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }

            let path = entry.name().to_string();
            let size = entry.size();
            if size > config.max_entry_size {
                skipped.push(SkippedEntry {
                    ordinal,
                    path,
                    reason: format!(
                        "entry is {size} bytes, larger than the {} byte limit",
                        config.max_entry_size
                    ),
                });
                continue;
            }

            let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
            match entry.read_to_end(&mut bytes) {
                Ok(_) => entries.push(Entry {
                    ordinal,
                    path,
                    size,
                    bytes,
                }),
                Err(e) => skipped.push(SkippedEntry {
                    ordinal,
                    path,
                    reason: format!("failed to decompress entry: {e}"),
                }),
            }
        }

        Ok(Self {
            kind,
            entries,
            skipped,
        })
    }

    /// Looks up a readable entry by its exact archive path.
    #[must_use]
    pub fn entry(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Returns `true` when a readable entry with this path exists.
    #[must_use]
    pub fn has_entry(&self, path: &str) -> bool {
        self.entry(path).is_some()
    }
}
