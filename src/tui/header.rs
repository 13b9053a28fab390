use crate::app::AppState;
use crate::tui::spinner;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

const APP_NAME: &str = " tgh ";

/// Repository shown on the right; the host is only named off github.com.
fn repo_tag(state: &AppState) -> String {
    let cfg = &state.config;
    match cfg.host.as_str() {
        "github.com" => format!(" {} ", cfg.full_name()),
        host => format!(" {} ({host}) ", cfg.full_name()),
    }
}

/// App bar: name and view label on the left, repository on the right.
pub fn render(f: &mut Frame, area: Rect, state: &AppState, label: &str) {
    let bold = Modifier::BOLD;
    let mut left = vec![Span::styled(
        APP_NAME,
        Style::default().fg(Color::Cyan).add_modifier(bold),
    )];
    if !state.config.version_string.is_empty() {
        left.push(Span::styled(
            format!("v{} ", state.config.version_string),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let label = if state.loading {
        format!(" {} {label}", spinner::frame(state.spinner_frame))
    } else {
        format!(" {label}")
    };
    left.push(Span::styled(label, Style::default().fg(Color::White)));

    let repo = repo_tag(state);
    let used: usize = left.iter().map(|s| s.content.width()).sum::<usize>() + repo.width();
    left.push(Span::raw(" ".repeat(usize::from(area.width).saturating_sub(used))));
    left.push(Span::styled(
        repo,
        Style::default().fg(Color::White).add_modifier(bold),
    ));

    let bar = Paragraph::new(Line::from(left)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(bar, area);
}
