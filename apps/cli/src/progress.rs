use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Start a spinner when progress output is enabled, otherwise return `None`
/// so callers can thread it through unconditionally.
pub fn spinner(enabled: bool, label: impl Into<String>) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(label.into());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

pub fn finish_spinner(spinner: Option<ProgressBar>, message: Option<String>) {
    let Some(bar) = spinner else {
        return;
    };
    match message {
        Some(message) => bar.finish_with_message(message),
        None => bar.finish_and_clear(),
    }
}
