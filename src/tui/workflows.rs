use crate::app::{AppState, FALLBACK_REF};
use crate::tui::footer::Hint;
use crate::tui::rows::{self, pad};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const FILE_W: usize = 30;
const FIXED_W: usize = 4 + 1;

pub const HINTS: &[Hint] = &[("enter", "dispatch"), ("esc/b", "back"), ("q", "quit")];

pub fn label(state: &AppState) -> String {
    match (state.loading, state.workflows.is_empty()) {
        (true, true) => "Loading workflows…".to_string(),
        (true, false) => "Fetching inputs…".to_string(),
        _ => format!("Dispatch [{}]", state.workflows.len()),
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(area);

    let target = state.default_branch.as_deref().unwrap_or(FALLBACK_REF);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                " Actions › Runs › Dispatch  (triggers on ",
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(target.to_string(), Style::default().fg(Color::Cyan)),
            Span::styled(")", Style::default().fg(Color::DarkGray)),
        ])),
        chunks[0],
    );

    let name_w = rows::flex_width(area.width, FIXED_W + FILE_W);
    f.render_widget(
        Paragraph::new(rows::column_header(format!(
            "    {} {}",
            pad("FILE", FILE_W),
            pad("NAME", name_w)
        ))),
        chunks[1],
    );

    let range = rows::window(
        state.workflows.len(),
        state.workflows_cursor.index,
        usize::from(chunks[2].height),
    );
    let lines: Vec<Line> = state.workflows[range.clone()]
        .iter()
        .zip(range)
        .map(|(wf, i)| {
            let selected = i == state.workflows_cursor.index;
            let file = wf.path.rsplit('/').next().unwrap_or(&wf.path);
            Line::from(vec![
                rows::cursor_span(selected),
                Span::raw("  "),
                Span::raw(format!("{} {}", pad(file, FILE_W), pad(&wf.name, name_w))),
            ])
            .style(rows::row_style(selected))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[2]);
}
