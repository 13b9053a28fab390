//! Row and column helpers shared by the list views.

use crate::app::{truncate, Conclusion, RunStatus};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::ops::Range;
use unicode_width::UnicodeWidthStr;

pub const SELECTED_BG: Color = Color::Indexed(63);
pub const CURSOR: &str = "▶ ";

pub fn status_icon(status: RunStatus, conclusion: Option<Conclusion>) -> (&'static str, Color) {
    if status == RunStatus::InProgress {
        return ("●", Color::Yellow);
    }
    match conclusion {
        Some(Conclusion::Success) => ("✓", Color::Green),
        Some(Conclusion::Failure | Conclusion::TimedOut | Conclusion::StartupFailure) => {
            ("✗", Color::Red)
        }
        _ if status == RunStatus::Queued => ("○", Color::Blue),
        Some(Conclusion::Cancelled) => ("⊘", Color::Gray),
        Some(Conclusion::Skipped) => ("–", Color::Gray),
        _ => ("○", Color::DarkGray),
    }
}

pub fn status_label(status: RunStatus, conclusion: Option<Conclusion>) -> &'static str {
    if status == RunStatus::InProgress {
        return "in progress";
    }
    match conclusion {
        Some(c) => match c {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Cancelled => "cancelled",
            Conclusion::Skipped => "skipped",
            Conclusion::TimedOut => "timed out",
            Conclusion::ActionRequired => "action required",
            Conclusion::StartupFailure => "startup failure",
            Conclusion::Stale => "stale",
            Conclusion::Neutral => "neutral",
            Conclusion::Unknown => "unknown",
        },
        None => match status {
            RunStatus::Completed => "completed",
            RunStatus::InProgress => "in progress",
            RunStatus::Queued => "queued",
            RunStatus::Requested => "requested",
            RunStatus::Waiting => "waiting",
            RunStatus::Pending => "pending",
            RunStatus::Unknown => "unknown",
        },
    }
}

/// Truncate to `width` columns, then right-pad with spaces to exactly `width`.
pub fn pad(s: &str, width: usize) -> String {
    let mut out = truncate(s, width);
    let w = UnicodeWidthStr::width(out.as_str());
    if w < width {
        out.push_str(&" ".repeat(width - w));
    }
    out
}

/// Width left for the flexible column once the fixed ones are placed.
pub fn flex_width(total: u16, fixed: usize) -> usize {
    usize::from(total).saturating_sub(fixed).max(8)
}

/// Rows `[start, end)` to draw so that `cursor` stays on screen.
pub fn window(len: usize, cursor: usize, height: usize) -> Range<usize> {
    if height == 0 || len == 0 {
        return 0..0;
    }
    let start = cursor.saturating_sub(height - 1).min(len.saturating_sub(height));
    start..(start + height).min(len)
}

pub fn row_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .bg(SELECTED_BG)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

pub fn cursor_span(selected: bool) -> Span<'static> {
    Span::raw(if selected { CURSOR } else { "  " })
}

pub fn column_header(text: String) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    ))
}

pub fn breadcrumb(text: String) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn icons() {
        assert_eq!(status_icon(RunStatus::InProgress, None).0, "●");
        assert_eq!(
            status_icon(RunStatus::Completed, Some(Conclusion::Success)).0,
            "✓"
        );
        assert_eq!(
            status_icon(RunStatus::Completed, Some(Conclusion::Failure)).0,
            "✗"
        );
        assert_eq!(status_icon(RunStatus::Queued, None), ("○", Color::Blue));
        assert_eq!(
            status_icon(RunStatus::Completed, Some(Conclusion::Cancelled)).0,
            "⊘"
        );
        assert_eq!(
            status_icon(RunStatus::Completed, Some(Conclusion::Skipped)).0,
            "–"
        );
        assert_eq!(status_icon(RunStatus::Waiting, None), ("○", Color::DarkGray));
    }

    #[test]
    fn labels() {
        assert_eq!(status_label(RunStatus::InProgress, None), "in progress");
        assert_eq!(
            status_label(RunStatus::Completed, Some(Conclusion::TimedOut)),
            "timed out"
        );
        assert_eq!(status_label(RunStatus::Queued, None), "queued");
    }

    #[test]
    fn pad_truncates_and_fills() {
        assert_eq!(pad("main", 6), "main  ");
        assert_eq!(pad("feature/very-long", 8), "feature\u{2026}");
        assert_eq!(pad("x", 0), "");
    }

    #[test]
    fn window_follows_cursor() {
        assert_eq!(window(10, 0, 4), 0..4);
        assert_eq!(window(10, 3, 4), 0..4);
        assert_eq!(window(10, 6, 4), 3..7);
        assert_eq!(window(10, 9, 4), 6..10);
        assert_eq!(window(2, 1, 4), 0..2);
        assert_eq!(window(0, 0, 4), 0..0);
    }
}
