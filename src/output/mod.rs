//! Output: the CSV report and everything printed to the terminal

pub mod console;
pub mod duration;
pub mod report;

pub use console::{confirm_overwrite, pluralize, Console};
pub use duration::format_duration;
pub use report::{sort_by_latency, ReportWriter, REPORT_HEADER};
