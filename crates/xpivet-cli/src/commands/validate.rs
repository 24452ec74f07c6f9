//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::error::add_package_context;
use crate::output::OutputFormatter;
use crate::progress::ValidationSpinner;
use anyhow::Result;
use anyhow::bail;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;
use xpivet_core::ExecutionMode;
use xpivet_core::ValidatorConfig;
use xpivet_core::validate;

pub fn execute(args: &ValidateArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let js_shell = match &args.js_shell {
        Some(path) => path.clone(),
        None => env::var_os("XPIVET_JS_SHELL").map_or_else(|| PathBuf::from("js"), PathBuf::from),
    };

    let config = ValidatorConfig {
        js_shell,
        oracle_timeout: Duration::from_secs(args.parse_timeout),
        approved_apps: args.approved_apps.clone(),
        mode: if args.determined {
            ExecutionMode::Determined
        } else {
            ExecutionMode::Tiered
        },
        reference_locale: args.reference_locale.clone(),
        max_entry_size: args.max_entry_size.unwrap_or(50 * 1024 * 1024),
        severity_overrides: args.severity.clone(),
    };

    // Spinner only when stdout is a terminal
    let started = Instant::now();
    let spinner = ValidationSpinner::should_show().then(|| ValidationSpinner::start(&args.package));
    let outcome = validate(&args.package, &config);
    drop(spinner);

    let result = add_package_context(outcome, &args.package)?;
    formatter.format_validation_result(&args.package, &result, started.elapsed())?;

    if !result.succeeded() {
        bail!("Validation failed")
    }

    Ok(())
}
