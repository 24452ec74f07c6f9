//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;
use xpivet_core::Severity;

#[derive(Parser)]
#[command(name = "xpivet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate an add-on package
    Validate(ValidateArgs),
    /// List package contents without validation
    List(ListArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the package (.xpi, .jar, or a standalone OpenSearch .xml)
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,

    /// Run every tier even after a tier has produced errors
    #[arg(long)]
    pub determined: bool,

    /// JavaScript shell used as the parsing oracle (default: XPIVET_JS_SHELL or "js")
    #[arg(long, value_name = "PATH")]
    pub js_shell: Option<PathBuf>,

    /// Seconds allowed per script parse
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub parse_timeout: u64,

    /// JSON document of approved application versions
    #[arg(long, value_name = "FILE")]
    pub approved_apps: Option<PathBuf>,

    /// Locale the translations are compared against
    #[arg(long, value_name = "CODE", default_value = "en-US")]
    pub reference_locale: String,

    /// Maximum uncompressed entry size in bytes
    #[arg(long, value_parser = parse_byte_size, value_name = "BYTES")]
    pub max_entry_size: Option<u64>,

    /// Override a rule severity (RULE=error|warning|notice, can be repeated)
    #[arg(long = "severity", value_name = "RULE=LEVEL", value_parser = parse_severity_override)]
    pub severity: Vec<(String, Severity)>,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Path to the package file
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,

    /// Show detailed entry information
    #[arg(short, long)]
    pub long: bool,

    /// Show sizes in human-readable format
    #[arg(short = 'H', long)]
    pub human_readable: bool,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

/// Parse byte size with optional suffix (K, M, G, T)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}

/// Parse a RULE=LEVEL severity override
fn parse_severity_override(s: &str) -> Result<(String, Severity), String> {
    let Some((rule, level)) = s.split_once('=') else {
        return Err(format!("expected RULE=LEVEL, got '{s}'"));
    };
    let rule = rule.trim();
    if rule.is_empty() {
        return Err("empty rule identifier".to_string());
    }
    let severity = level
        .trim()
        .parse::<Severity>()
        .map_err(|e| e.to_string())?;
    Ok((rule.to_string(), severity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("100").unwrap(), 100);
        assert_eq!(parse_byte_size("1K").unwrap(), 1024);
        assert_eq!(parse_byte_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_byte_size("3G").unwrap(), 3 * 1024 * 1024 * 1024);
        assert_eq!(parse_byte_size("1T").unwrap(), 1024_u64.pow(4));
        assert!(parse_byte_size("invalid").is_err());
        assert!(parse_byte_size("").is_err());
    }

    #[test]
    fn test_parse_byte_size_overflow() {
        // Test overflow scenarios
        assert!(parse_byte_size("18446744073709551615K").is_err()); // u64::MAX / 1024 + 1
        assert!(parse_byte_size("18014398509481984M").is_err()); // u64::MAX / (1024^2) + 1
        assert!(parse_byte_size("17592186044416G").is_err()); // u64::MAX / (1024^3) + 1
    }

    #[test]
    fn test_parse_severity_override() {
        assert_eq!(
            parse_severity_override("policy.flagged_extension=error").unwrap(),
            ("policy.flagged_extension".to_string(), Severity::Error)
        );
        assert_eq!(
            parse_severity_override("scripts.dangerous_global = notice").unwrap(),
            ("scripts.dangerous_global".to_string(), Severity::Notice)
        );
        assert!(parse_severity_override("no-equals-sign").is_err());
        assert!(parse_severity_override("=error").is_err());
        assert!(parse_severity_override("rule=fatal").is_err());
    }
}
