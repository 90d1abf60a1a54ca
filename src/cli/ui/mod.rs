pub mod output;

pub use output::{Output, format_duration, render_progress_bar};
