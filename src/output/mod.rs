mod report;
mod summary;

pub use report::write_run_report;
pub use summary::{build_snapshot, render_terminal};
