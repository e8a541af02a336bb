//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::domain::CheckState;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) -> String {
    msg.to_string().cyan().bold().to_string()
}

/// Label of a config location, dimmed when the file does not exist
pub fn location(label: &str, path: &(impl std::fmt::Display + ?Sized), exists: bool) -> String {
    let status = if exists {
        "exists".green()
    } else {
        "not found".dimmed()
    };
    format!("{}: {} ({})", label.green(), path, status)
}

/// One state change line: id and new state colored by value
pub fn event(id: &(impl std::fmt::Display + ?Sized), state: CheckState) -> String {
    let state = match state {
        CheckState::Checked => state.as_str().green(),
        CheckState::Unchecked => state.as_str().red(),
        CheckState::Indeterminate => state.as_str().yellow(),
    };
    format!("{} {} -> {}", "changed".cyan(), id, state)
}
