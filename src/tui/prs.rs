use crate::app::{relative_time, AppState};
use crate::tui::footer::Hint;
use crate::tui::rows::{self, pad};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const NUM_W: usize = 6;
const BRANCH_W: usize = 18;
const AUTHOR_W: usize = 14;
const AGE_W: usize = 8;
const FIXED_W: usize = 4 + 4;

pub const HINTS: &[Hint] = &[
    ("enter", "open runs"),
    ("o", "browser"),
    ("r/tab", "refresh"),
    ("esc/b", "back"),
    ("q", "quit"),
];

pub fn label(state: &AppState) -> String {
    if state.loading && state.prs.is_empty() {
        "Loading pull requests…".to_string()
    } else {
        format!("Pull Requests [{}]", state.prs.len())
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(area);

    f.render_widget(
        Paragraph::new(rows::breadcrumb(" Pull Requests".to_string())),
        chunks[0],
    );

    let title_w = rows::flex_width(area.width, FIXED_W + NUM_W + BRANCH_W + AUTHOR_W + AGE_W);
    f.render_widget(
        Paragraph::new(rows::column_header(format!(
            "    {} {} {} {} {}",
            pad("#", NUM_W),
            pad("TITLE", title_w),
            pad("BRANCH", BRANCH_W),
            pad("AUTHOR", AUTHOR_W),
            pad("AGE", AGE_W)
        ))),
        chunks[1],
    );

    if state.prs.is_empty() && !state.loading {
        f.render_widget(
            Paragraph::new(Span::styled(
                "  No open pull requests",
                Style::default().fg(Color::DarkGray),
            )),
            chunks[2],
        );
        return;
    }

    let range = rows::window(
        state.prs.len(),
        state.prs_cursor.index,
        usize::from(chunks[2].height),
    );
    let lines: Vec<Line> = state.prs[range.clone()]
        .iter()
        .zip(range)
        .map(|(pr, i)| {
            let selected = i == state.prs_cursor.index;
            let title_style = if pr.draft && !selected {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::from(vec![
                rows::cursor_span(selected),
                Span::raw("  "),
                Span::raw(pad(&format!("#{}", pr.number), NUM_W)),
                Span::raw(" "),
                Span::styled(pad(&pr.title, title_w), title_style),
                Span::raw(format!(
                    " {} {} {}",
                    pad(&pr.head.ref_name, BRANCH_W),
                    pad(&pr.user.login, AUTHOR_W),
                    pad(&relative_time(pr.updated_at), AGE_W)
                )),
            ])
            .style(rows::row_style(selected))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[2]);
}
