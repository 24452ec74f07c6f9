//! install.rdf parsing and rule checking.

pub mod apps;
pub mod document;
pub mod rules;
pub mod version;

// Re-export public types and functions
pub use apps::ApprovedApps;
pub use document::ManifestDocument;
pub use document::ManifestElement;
pub use document::ManifestParseError;
pub use rules::check;
pub use version::ParseVersionError;
pub use version::Version;
