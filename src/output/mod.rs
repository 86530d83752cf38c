//! Output rendering
//!
//! Console summaries and JSON run reports.

pub mod report;
pub mod summary;

pub use report::RunLog;
pub use summary::{not_found_line, summary_lines};
