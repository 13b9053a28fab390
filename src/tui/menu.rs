use crate::app::{AppState, MENU_ITEMS};
use crate::tui::footer::Hint;
use crate::tui::rows::{self, pad};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const NAME_W: usize = 22;

pub const HINTS: &[Hint] = &[("↑/↓", "navigate"), ("enter", "open"), ("q", "quit")];

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = vec![Line::from("")];
    lines.extend(MENU_ITEMS.iter().enumerate().map(|(i, (name, desc))| {
        let selected = i == state.menu.index;
        let name_style = Style::default()
            .fg(Color::White)
            .add_modifier(if selected {
                Modifier::BOLD
            } else {
                Modifier::empty()
            });
        Line::from(vec![
            Span::raw(if selected { " ▶ " } else { "   " }),
            Span::styled(pad(name, NAME_W), name_style),
            Span::raw("  "),
            Span::styled(*desc, Style::default().fg(Color::Gray)),
        ])
        .style(if selected {
            Style::default().bg(rows::SELECTED_BG)
        } else {
            Style::default()
        })
    }));
    f.render_widget(Paragraph::new(lines), area);
}
