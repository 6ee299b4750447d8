use colored::*;
use std::fmt::Display;

/// User-facing output with colors and symbols.
/// A namespace of static helpers; diagnostics go through the `log` facade instead.
/// Color scheme: blue (60, 110, 180) for info, teal (41, 65, 114) for names and versions.
pub struct Logger;

impl Logger {
    /// Prints an info message with a blue bullet point.
    pub fn info<T: Display>(msg: T) {
        println!("{} {}", "•".truecolor(60, 110, 180).bold(), msg);
    }

    /// Prints a success message with a green checkmark.
    pub fn success<T: Display>(msg: T) {
        println!("{} {}", "✔".green().bold(), msg);
    }

    /// Prints an error message with a red X.
    /// Failures after the usage check end up here rather than in the exit code.
    pub fn error<T: Display>(msg: T) {
        println!("{} {}", "✖".red().bold(), msg);
    }

    /// Prints a warning with a yellow warning symbol.
    pub fn warn<T: Display>(msg: T) {
        println!("{} {}", "⚠".yellow().bold(), msg);
    }

    /// Prints a section header, underlined, with a blank line above it.
    pub fn header<T: Display>(msg: T) {
        println!(
            "\n{}",
            msg.to_string().truecolor(41, 65, 114).bold().underline()
        );
    }

    /// Prints a key followed by a dimmed description, e.g. `[N] next page`.
    pub fn command<T: Display>(key: &str, msg: T) {
        println!(
            "  {} {}",
            key.truecolor(41, 65, 114).bold(),
            msg.to_string().dimmed()
        );
    }

    pub fn highlight<T: Display>(msg: T) -> String {
        msg.to_string().truecolor(60, 110, 180).bold().to_string()
    }

    /// Inline color for build names and NVRs.
    pub fn brand_text<T: Display>(msg: T) -> String {
        msg.to_string().truecolor(41, 65, 114).bold().to_string()
    }

    pub fn dim<T: Display>(msg: T) -> String {
        msg.to_string().dimmed().to_string()
    }
}
