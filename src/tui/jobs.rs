use crate::app::{compute_duration, truncate, AppState};
use crate::tui::footer::Hint;
use crate::tui::rows::{self, pad};
use crate::tui::spinner;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

const STATUS_W: usize = 14;
const DURATION_W: usize = 10;
const FIXED_W: usize = 2 + 2 + 3;

pub const HINTS: &[Hint] = &[
    ("enter", "logs"),
    ("o", "open"),
    ("r", "rerun-failed"),
    ("R", "rerun-all"),
    ("tab", "refresh"),
    ("esc/b", "back"),
    ("q", "quit"),
];

pub fn label(state: &AppState) -> String {
    if state.loading && state.jobs.is_empty() {
        "Loading jobs…".to_string()
    } else {
        format!("Jobs [{}]", state.jobs.len())
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(area);

    let run_name = state
        .selected_run
        .as_ref()
        .map(|r| r.name.as_str())
        .unwrap_or_default();
    let prefix = match &state.selected_pr {
        Some(pr) => format!(" Pull Requests › #{} › Runs › ", pr.number),
        None => " Actions › Runs › ".to_string(),
    };
    f.render_widget(
        Paragraph::new(rows::breadcrumb(format!(
            "{prefix}{}",
            truncate(run_name, usize::from(area.width).saturating_sub(30))
        ))),
        chunks[0],
    );

    let name_w = rows::flex_width(area.width, FIXED_W + STATUS_W + DURATION_W);
    f.render_widget(
        Paragraph::new(rows::column_header(format!(
            "     {} {} {}",
            pad("NAME", name_w),
            pad("STATUS", STATUS_W),
            pad("DURATION", DURATION_W)
        ))),
        chunks[1],
    );

    if state.jobs.is_empty() && state.tracker.awaiting_rerun() {
        f.render_widget(
            Paragraph::new(Span::styled(
                format!(
                    "  {} Waiting for re-triggered jobs…",
                    spinner::frame(state.spinner_frame)
                ),
                Style::default().fg(Color::Yellow),
            )),
            chunks[2],
        );
        return;
    }

    let range = rows::window(
        state.jobs.len(),
        state.jobs_cursor.index,
        usize::from(chunks[2].height),
    );
    let lines: Vec<Line> = state.jobs[range.clone()]
        .iter()
        .zip(range)
        .map(|(job, i)| {
            let selected = i == state.jobs_cursor.index;
            let (icon, color) = rows::status_icon(job.status, job.conclusion);
            Line::from(vec![
                rows::cursor_span(selected),
                Span::raw(" "),
                Span::styled(icon, Style::default().fg(color)),
                Span::raw(" "),
                Span::raw(format!(
                    "{} {} {}",
                    pad(&job.name, name_w),
                    pad(rows::status_label(job.status, job.conclusion), STATUS_W),
                    pad(
                        &compute_duration(job.started_at, job.completed_at),
                        DURATION_W
                    )
                )),
            ])
            .style(rows::row_style(selected))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[2]);
}
