//! Progress reporting for CLI operations.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use std::path::Path;
use std::time::Duration;

/// Spinner shown while a package is validated.
///
/// Validation time is dominated by the external parsing oracle, so the
/// spinner names the package rather than counting entries. Automatically
/// cleans up on drop.
pub struct ValidationSpinner {
    bar: ProgressBar,
}

impl ValidationSpinner {
    /// Starts a spinner naming the package under validation.
    #[must_use]
    pub fn start(package: &Path) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("Validating {}", package.display()));
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }
}

impl Drop for ValidationSpinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
