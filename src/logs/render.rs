//! Marker-aware styling for log lines. Each line is mapped on its own; no
//! state carries across lines.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const GROUP: &str = "##[group]";
const ENDGROUP: &str = "##[endgroup]";
const ERROR: &str = "##[error]";
const WARNING: &str = "##[warning]";
const COMMAND: &str = "##[command]";

const SEPARATOR_WIDTH: usize = 60;

/// Classification of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    GroupStart,
    GroupEnd,
    Error,
    Warning,
    Command,
    Plain,
}

pub fn classify(line: &str) -> LineKind {
    if line.starts_with(GROUP) {
        LineKind::GroupStart
    } else if line.starts_with(ENDGROUP) {
        LineKind::GroupEnd
    } else if line.starts_with(ERROR) {
        LineKind::Error
    } else if line.starts_with(WARNING) {
        LineKind::Warning
    } else if line.starts_with(COMMAND) {
        LineKind::Command
    } else {
        LineKind::Plain
    }
}

pub fn render_line(line: &str) -> Line<'static> {
    match classify(line) {
        LineKind::GroupStart => Line::from(Span::styled(
            format!("▶ {}", &line[GROUP.len()..]),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        LineKind::GroupEnd => Line::from(Span::styled(
            "─".repeat(SEPARATOR_WIDTH),
            Style::default().fg(Color::DarkGray),
        )),
        LineKind::Error => Line::from(Span::styled(
            format!("✗ {}", &line[ERROR.len()..]),
            Style::default().fg(Color::Red),
        )),
        LineKind::Warning => Line::from(Span::styled(
            format!("⚠ {}", &line[WARNING.len()..]),
            Style::default().fg(Color::Yellow),
        )),
        LineKind::Command => Line::from(Span::styled(
            format!("$ {}", &line[COMMAND.len()..]),
            Style::default().fg(Color::Magenta),
        )),
        LineKind::Plain => Line::from(line.to_string()),
    }
}

pub fn render(content: &str) -> Vec<Line<'static>> {
    content.split('\n').map(render_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn group_header() {
        let line = render_line("##[group]Run tests");
        assert_eq!(text(&line), "▶ Run tests");
        assert_eq!(line.spans[0].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn endgroup_is_separator() {
        let line = render_line("##[endgroup]");
        assert_eq!(text(&line), "─".repeat(SEPARATOR_WIDTH));
    }

    #[test]
    fn error_warning_command() {
        assert_eq!(text(&render_line("##[error]boom")), "✗ boom");
        assert_eq!(render_line("##[error]boom").spans[0].style.fg, Some(Color::Red));
        assert_eq!(text(&render_line("##[warning]careful")), "⚠ careful");
        assert_eq!(text(&render_line("##[command]cargo build")), "$ cargo build");
    }

    #[test]
    fn plain_line_unchanged() {
        let line = render_line("just output ##[error] not at start");
        assert_eq!(text(&line), "just output ##[error] not at start");
        assert_eq!(line.spans[0].style, Style::default());
    }

    #[test]
    fn marker_only_lines() {
        assert_eq!(text(&render_line("##[error]")), "✗ ");
        assert_eq!(classify("##[group]"), LineKind::GroupStart);
    }

    #[test]
    fn render_is_line_by_line() {
        let lines = render("##[group]Build\nline1\n##[endgroup]\n##[error]boom");
        let kinds: Vec<LineKind> = ["##[group]Build", "line1", "##[endgroup]", "##[error]boom"]
            .iter()
            .map(|l| classify(l))
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            kinds,
            vec![LineKind::GroupStart, LineKind::Plain, LineKind::GroupEnd, LineKind::Error]
        );
        assert!(text(&lines[3]).contains("boom"));
    }
}
