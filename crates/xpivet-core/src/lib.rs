//! Add-on package validation library.
//!
//! `xpivet-core` inspects browser extension packages (XPI archives,
//! bare chrome JARs, and standalone search provider descriptors) and
//! reports manifest defects, risky JavaScript, policy violations, and
//! localization gaps as structured diagnostics. It only classifies and
//! reports; the inspected package is never modified.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//!
//! use xpivet_core::ValidatorConfig;
//! use xpivet_core::validate;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ValidatorConfig::determined();
//! let result = validate(Path::new("addon.xpi"), &config)?;
//! for finding in &result.messages {
//!     println!("{}: {}", finding.severity, finding.message);
//! }
//! if !result.succeeded() {
//!     println!("{} errors", result.errors());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod locales;
pub mod manifest;
pub mod package;
pub mod policy;
pub mod scripts;
pub mod search;

// Re-export main API types
pub use api::validate;
pub use api::validate_with_parser;
pub use config::ExecutionMode;
pub use config::ValidatorConfig;
pub use error::ArchiveError;
pub use error::Result;
pub use error::ValidationError;

// Re-export the diagnostic model for easier access
pub use diagnostics::Diagnostic;
pub use diagnostics::DiagnosticSink;
pub use diagnostics::Severity;
pub use diagnostics::ValidationResult;
