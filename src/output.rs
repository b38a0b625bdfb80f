//! # Terminal Output
//!
//! Styling for command listings (recipes, bootstraps, dists, build status),
//! controlled by `--color=always|never|auto`. In auto mode colors are off
//! when `NO_COLOR` is set, `CLICOLOR=0`, `TERM=dumb`, or stdout is not a
//! TTY, unless `CLICOLOR_FORCE` asks for them.

use std::env;
use std::fmt::Display;

use console::Style;

/// Output configuration shared by the commands.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Build from the `--color` flag value, detecting in auto mode.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    fn paint(&self, style: Style, text: impl Display) -> String {
        style.force_styling(self.use_color).apply_to(text).to_string()
    }

    /// Recipe, bootstrap and dist names.
    pub fn name(&self, text: impl Display) -> String {
        self.paint(Style::new().green().bold(), text)
    }

    /// Section headings.
    pub fn heading(&self, text: impl Display) -> String {
        self.paint(Style::new().blue().bold(), text)
    }

    /// Secondary details such as versions and paths.
    pub fn detail(&self, text: impl Display) -> String {
        self.paint(Style::new().dim(), text)
    }

    /// Dependency and conflict annotations.
    pub fn relation(&self, text: impl Display) -> String {
        self.paint(Style::new().yellow(), text)
    }

    pub fn error(&self, text: impl Display) -> String {
        self.paint(Style::new().red().bold(), text)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
