//! Log lines, console reports and the loading spinner

pub mod console;
pub mod log;
pub mod progress;

pub use log::{log_cycle_summary, log_rows_read, log_source_read, log_source_skipped};
pub use progress::{create_spinner, finish_spinner};
