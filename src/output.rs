//! Styled diagnostics on stderr.
//!
//! Stdout is reserved for report lines, prompts and hook output, which
//! scripts parse. Everything meant only for a human goes through here.

use colored::*;

/// Prints user-facing diagnostics with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use keepdir::output::OutputFormatter;
    /// OutputFormatter::error("Failed to create /srv/repo/empty/.keep");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }
}
