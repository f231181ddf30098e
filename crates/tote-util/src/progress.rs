use std::io::Write;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

fn styled_status(style: Style, label: &str, message: &str) {
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        style.apply_to(label),
    );
}

/// Print a right-aligned status line: `    Resolved 4 packages`.
///
/// The label is bold green and padded to 12 columns.
pub fn status(label: &str, message: &str) {
    styled_status(Style::new().green().bold(), label, message);
}

/// Like [`status`] with a bold yellow label, for non-fatal problems.
pub fn status_warn(label: &str, message: &str) {
    styled_status(Style::new().yellow().bold(), label, message);
}

/// Animated spinner for indeterminate work such as resolution.
///
/// Finish it with [`ProgressBar::finish_and_clear`].
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
