//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use std::path::Path;
use std::time::Duration;
use xpivet_core::Diagnostic;
use xpivet_core::Severity;
use xpivet_core::ValidationResult;
use xpivet_core::package::Package;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn severity_label(&self, severity: Severity) -> String {
        if self.use_colors {
            match severity {
                Severity::Error => style("ERROR").red().bold().to_string(),
                Severity::Warning => style("WARNING").yellow().to_string(),
                Severity::Notice => style("NOTICE").cyan().to_string(),
            }
        } else {
            format!("[{severity}]")
        }
    }

    fn write_finding(&self, finding: &Diagnostic) {
        let severity_str = self.severity_label(finding.severity);

        if let Some(ref file) = finding.file {
            let location = match (finding.line, finding.column) {
                (Some(line), Some(column)) => format!("{file}:{line}:{column}"),
                (Some(line), None) => format!("{file}:{line}"),
                _ => file.clone(),
            };
            let _ = self.term.write_line(&format!(
                "  {} {}: {}",
                severity_str, location, finding.message
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("  {} {}", severity_str, finding.message));
        }

        if self.verbose && !finding.description.is_empty() {
            let _ = self.term.write_line(&format!("      {}", finding.description));
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_validation_result(
        &self,
        package: &Path,
        result: &ValidationResult,
        elapsed: Duration,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if result.succeeded() {
            if self.use_colors {
                let _ = self.term.write_line(&format!(
                    "{} Validation passed: {}",
                    style("✓").green().bold(),
                    package.display()
                ));
            } else {
                let _ = self
                    .term
                    .write_line(&format!("Validation passed: {}", package.display()));
            }
        } else if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} Validation failed: {}",
                style("✗").red().bold(),
                package.display()
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("Validation failed: {}", package.display()));
        }

        let _ = self
            .term
            .write_line(&format!("  Errors: {}", result.errors()));
        let _ = self
            .term
            .write_line(&format!("  Warnings: {}", result.warnings()));
        let _ = self
            .term
            .write_line(&format!("  Notices: {}", result.notices()));

        if self.verbose {
            let _ = self.term.write_line(&format!("  Duration: {elapsed:?}"));
        }

        if !result.messages.is_empty() {
            let _ = self.term.write_line("");
            let _ = self.term.write_line("Findings:");
            for finding in &result.messages {
                self.write_finding(finding);
            }
        }

        Ok(())
    }

    fn format_listing_short(&self, package: &Package) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for entry in &package.entries {
            let _ = self.term.write_line(&entry.path);
        }

        Ok(())
    }

    fn format_listing_long(&self, package: &Package, human_readable: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for entry in &package.entries {
            let size_str = if human_readable {
                Self::format_size(entry.size)
            } else {
                entry.size.to_string()
            };

            let _ = self
                .term
                .write_line(&format!("{:>6} {:>10}  {}", entry.ordinal, size_str, entry.path));
        }

        let total_size: u64 = package.entries.iter().map(|e| e.size).sum();

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "Total: {} entries, {}",
            Self::format_number(package.entries.len()),
            Self::format_size(total_size)
        ));

        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = self.term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_success(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}
