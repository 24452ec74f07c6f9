//! Approved-applications registry.
//!
//! An external JSON document maps target-application GUIDs to the list
//! of version strings the review platform supports. The version rule
//! consults it read-only; without a document, membership checks are
//! disabled and only format checks remain.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::error::ValidationError;

/// Supported version lists keyed by application GUID.
#[derive(Debug, Clone, Default)]
pub struct ApprovedApps {
    apps: HashMap<String, Vec<String>>,
}

impl ApprovedApps {
    /// Loads a registry from a JSON document.
    ///
    /// The document must be an object mapping GUID strings to arrays of
    /// version strings.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Io`] when the file cannot be read and
    /// [`ValidationError::ApprovedApps`] when it does not have the
    /// expected shape.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let apps: HashMap<String, Vec<String>> =
            serde_json::from_str(&text).map_err(|e| ValidationError::ApprovedApps {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self { apps })
    }

    /// Returns `true` when the registry knows the application GUID.
    #[must_use]
    pub fn is_known(&self, guid: &str) -> bool {
        self.apps.contains_key(guid)
    }

    /// Returns `true` when `version` is on the supported list for `guid`.
    ///
    /// Membership is an exact string match against the published list,
    /// not a range comparison.
    #[must_use]
    pub fn supports(&self, guid: &str, version: &str) -> bool {
        self.apps
            .get(guid)
            .is_some_and(|versions| versions.iter().any(|v| v == version))
    }

    /// Returns `true` when no applications are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
