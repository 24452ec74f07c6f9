//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use std::time::Duration;
use xpivet_core::Diagnostic;
use xpivet_core::ValidationResult;
use xpivet_core::package::Package;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }

    fn listing(package: &Package) -> Result<()> {
        #[derive(Serialize)]
        struct EntryOutput<'a> {
            ordinal: u64,
            path: &'a str,
            size: u64,
        }

        #[derive(Serialize)]
        struct SkippedOutput<'a> {
            path: &'a str,
            reason: &'a str,
        }

        #[derive(Serialize)]
        struct ListingOutput<'a> {
            entries: Vec<EntryOutput<'a>>,
            total_entries: usize,
            total_size: u64,
            skipped: Vec<SkippedOutput<'a>>,
        }

        let data = ListingOutput {
            entries: package
                .entries
                .iter()
                .map(|e| EntryOutput {
                    ordinal: e.ordinal,
                    path: &e.path,
                    size: e.size,
                })
                .collect(),
            total_entries: package.entries.len(),
            total_size: package.entries.iter().map(|e| e.size).sum(),
            skipped: package
                .skipped
                .iter()
                .map(|s| SkippedOutput {
                    path: &s.path,
                    reason: &s.reason,
                })
                .collect(),
        };

        let output = JsonOutput::success("list", data);
        Self::output(&output)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_validation_result(
        &self,
        package: &Path,
        result: &ValidationResult,
        elapsed: Duration,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct ValidationOutput<'a> {
            package: String,
            success: bool,
            errors: usize,
            warnings: usize,
            notices: usize,
            duration_ms: u128,
            messages: &'a [Diagnostic],
        }

        let data = ValidationOutput {
            package: package.display().to_string(),
            success: result.succeeded(),
            errors: result.errors(),
            warnings: result.warnings(),
            notices: result.notices(),
            duration_ms: elapsed.as_millis(),
            messages: &result.messages,
        };

        let output = JsonOutput::success("validate", data);
        Self::output(&output)
    }

    fn format_listing_short(&self, package: &Package) -> Result<()> {
        Self::listing(package)
    }

    fn format_listing_long(&self, package: &Package, _human_readable: bool) -> Result<()> {
        Self::listing(package)
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error("unknown", format!("{error:?}"));
        let _ = Self::output(&output);
    }

    fn format_success(&self, message: &str) {
        #[derive(Serialize)]
        struct SuccessData {
            message: String,
        }

        let output = JsonOutput::success(
            "unknown",
            SuccessData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_output_structure() {
        #[derive(Serialize)]
        struct TestData {
            value: String,
        }

        let output = JsonOutput::success(
            "validate",
            TestData {
                value: "test".to_string(),
            },
        );

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"operation\":\"validate\""));
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"value\":\"test\""));
    }
}
