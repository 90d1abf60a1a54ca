use console::style;

use crate::constants::display::PROGRESS_BAR_WIDTH;
use crate::runner::{Segment, SegmentKind, StepStatus};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn progress(&self, percent: u8) {
        println!(
            "{} {}%",
            render_progress_bar(percent, PROGRESS_BAR_WIDTH),
            percent
        );
    }

    /// One line of the step list
    pub fn step_row(&self, position: usize, title: &str, status: StepStatus, locked: bool) {
        let marker = match status {
            StepStatus::Completed => style("✓").green(),
            StepStatus::Current => style("▶").cyan().bold(),
            StepStatus::Upcoming => style("·").dim(),
        };
        let lock = if locked { " 🔒" } else { "" };
        let title = match status {
            StepStatus::Current => style(title.to_string()).bold(),
            StepStatus::Completed => style(title.to_string()).dim(),
            StepStatus::Upcoming => style(title.to_string()),
        };
        println!("  {} {:>2}. {}{}", marker, position, title, lock);
    }

    /// Prompt text with filled values in green and open placeholders in yellow
    pub fn prompt(&self, segments: &[Segment]) {
        let mut line = String::new();
        for seg in segments {
            let piece = match seg.kind {
                SegmentKind::Text => seg.text.clone(),
                SegmentKind::Filled => style(&seg.text).green().to_string(),
                SegmentKind::Unfilled => style(&seg.text).yellow().bold().to_string(),
            };
            line.push_str(&piece);
        }
        for text_line in line.lines() {
            println!("  │ {}", text_line);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-width bar for a 0-100 percentage
pub fn render_progress_bar(percent: u8, width: usize) -> String {
    let progress = (f32::from(percent.min(100))) / 100.0;
    let filled = (progress * width as f32).round() as usize;
    let empty = width.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format duration as human-readable string
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86_400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(render_progress_bar(0, 4), "[░░░░]");
        assert_eq!(render_progress_bar(50, 4), "[██░░]");
        assert_eq!(render_progress_bar(100, 4), "[████]");
        assert_eq!(render_progress_bar(250, 4), "[████]");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7260), "2h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }
}
