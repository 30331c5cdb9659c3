//! Progress reporting for dataset loading
//!
//! Loading a full census extract takes a few seconds, so the loader shows a
//! spinner using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Template used by the loading spinner
pub const SPINNER_TEMPLATE: &str = "{spinner:.green} {elapsed_precise} {msg}";

/// Spinner shown while a source is read; the row count is unknown until it finishes
#[must_use]
pub fn create_spinner(message: Option<&str>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        spinner.set_style(style);
    }
    if let Some(message) = message {
        spinner.set_message(message.to_string());
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Finish a spinner, leaving a completion message or clearing it
pub fn finish_spinner(spinner: &ProgressBar, message: Option<&str>) {
    match message {
        Some(message) => spinner.finish_with_message(message.to_string()),
        None => spinner.finish_and_clear(),
    }
}
