//! List command implementation

use crate::cli::ListArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use xpivet_core::ValidatorConfig;
use xpivet_core::package::Package;

pub fn execute(args: &ListArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    // Open with the stock entry size limits
    let config = ValidatorConfig::default();

    let package = add_archive_context(Package::open(&args.package, &config), &args.package)?;

    for skipped in &package.skipped {
        formatter.format_warning(&format!("unreadable entry skipped: {}", skipped.path));
    }

    if args.long {
        formatter.format_listing_long(&package, args.human_readable)?;
    } else {
        formatter.format_listing_short(&package)?;
    }

    Ok(())
}
