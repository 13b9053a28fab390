use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::AppState;

/// `(key, description)` pair shown in the footer.
pub type Hint = (&'static str, &'static str);

const HINT_GAP: &str = "  ";

fn status_color(msg: &str) -> Color {
    match msg {
        m if m.starts_with('✓') => Color::Green,
        m if m.starts_with("error") || m.contains("crashed") => Color::Red,
        _ => Color::Yellow,
    }
}

/// As many hints as fit in `width` columns, in order.
fn hint_spans(hints: &[Hint], width: usize) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(" ")];
    let mut remaining = width.saturating_sub(1);
    for (i, &(key, desc)) in hints.iter().enumerate() {
        let gap = if i == 0 { "" } else { HINT_GAP };
        let desc = format!(" {desc}");
        let cost = gap.width() + key.width() + desc.width();
        if cost > remaining {
            break;
        }
        remaining -= cost;
        if !gap.is_empty() {
            spans.push(Span::raw(gap));
        }
        spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(desc, Style::default().fg(Color::DarkGray)));
    }
    spans
}

/// Key hints, replaced by the transient status message while one is live.
pub fn render(f: &mut Frame, area: Rect, state: &AppState, hints: &[Hint]) {
    let line = match state.status_message() {
        Some(msg) => Line::from(Span::styled(
            format!(" {msg}"),
            Style::default().fg(status_color(msg)),
        )),
        None => Line::from(hint_spans(hints, usize::from(area.width))),
    };
    let bar = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(bar, area);
}
