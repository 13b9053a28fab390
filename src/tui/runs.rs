use crate::app::{relative_time, truncate, AppState};
use crate::tui::footer::Hint;
use crate::tui::rows::{self, pad};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const BRANCH_W: usize = 22;
const EVENT_W: usize = 11;
const AGE_W: usize = 8;
// cursor + icon + gaps
const FIXED_W: usize = 2 + 2 + 4;

pub const HINTS: &[Hint] = &[
    ("enter", "open"),
    ("r", "rerun-failed"),
    ("R", "rerun-all"),
    ("d", "dispatch"),
    ("/", "filter"),
    ("o", "browser"),
    ("tab", "refresh"),
    ("esc/b", "back"),
    ("q", "quit"),
];

pub const FILTER_HINTS: &[Hint] = &[
    ("enter", "apply"),
    ("esc", "clear"),
    ("↑/↓", "move"),
];

pub fn label(state: &AppState) -> String {
    if state.loading && state.runs.is_empty() {
        "Loading runs…".to_string()
    } else if state.runs_filter.is_empty() {
        format!("Runs [{}]", state.runs.len())
    } else {
        format!("Runs [{}/{}]", state.visible_runs().len(), state.runs.len())
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(area);

    f.render_widget(Paragraph::new(top_line(state, area.width)), chunks[0]);

    let name_w = rows::flex_width(area.width, FIXED_W + BRANCH_W + EVENT_W + AGE_W);
    f.render_widget(
        Paragraph::new(rows::column_header(format!(
            "     {} {} {} {}",
            pad("NAME", name_w),
            pad("BRANCH", BRANCH_W),
            pad("EVENT", EVENT_W),
            pad("AGE", AGE_W)
        ))),
        chunks[1],
    );

    let visible = state.visible_runs();
    let range = rows::window(
        visible.len(),
        state.runs_cursor.index,
        usize::from(chunks[2].height),
    );
    let lines: Vec<Line> = visible[range.clone()]
        .iter()
        .zip(range)
        .map(|(run, i)| {
            let selected = i == state.runs_cursor.index;
            let (icon, color) = rows::status_icon(run.status, run.conclusion);
            let title = if run.name.is_empty() {
                &run.display_title
            } else {
                &run.name
            };
            Line::from(vec![
                rows::cursor_span(selected),
                Span::raw(" "),
                Span::styled(icon, Style::default().fg(color)),
                Span::raw(" "),
                Span::raw(format!(
                    "{} {} {} {}",
                    pad(title, name_w),
                    pad(&run.head_branch, BRANCH_W),
                    pad(&run.event, EVENT_W),
                    pad(&relative_time(run.created_at), AGE_W)
                )),
            ])
            .style(rows::row_style(selected))
        })
        .collect();

    if lines.is_empty() && !state.loading {
        let msg = if state.runs_filter.is_empty() {
            "  No workflow runs"
        } else {
            "  No runs match the filter"
        };
        f.render_widget(
            Paragraph::new(Span::styled(msg, Style::default().fg(Color::DarkGray))),
            chunks[2],
        );
    } else {
        f.render_widget(Paragraph::new(lines), chunks[2]);
    }
}

/// Breadcrumb, or the filter input while `/` is active.
fn top_line(state: &AppState, width: u16) -> Line<'static> {
    if state.runs_filter_mode {
        return Line::from(vec![
            Span::raw("  / "),
            Span::raw(state.runs_filter.clone()),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ]);
    }
    let mut text = match &state.selected_pr {
        Some(pr) => format!(
            " Pull Requests › {} › Runs",
            truncate(
                &format!("#{} {}", pr.number, pr.title),
                usize::from(width).saturating_sub(30)
            )
        ),
        None => " Actions › Runs".to_string(),
    };
    if !state.runs_filter.is_empty() {
        text.push_str(&format!("  [filter: {}]", state.runs_filter));
    }
    rows::breadcrumb(text)
}
