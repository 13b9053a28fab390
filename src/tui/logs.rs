use crate::app::{compute_duration, truncate, AppState, Job, RunStatus, Step};
use crate::logs::filter;
use crate::tui::footer::Hint;
use crate::tui::rows;
use crate::tui::spinner;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub const RUNNING_HINTS: &[Hint] = &[
    ("o", "open"),
    ("r", "refresh"),
    ("esc/b", "back"),
    ("q", "quit"),
];

pub const COMPLETED_HINTS: &[Hint] = &[
    ("↑/↓", "scroll"),
    ("g", "top"),
    ("G", "bottom"),
    ("a", "auto-scroll"),
    ("/", "filter"),
    ("c", "copy"),
    ("o", "open"),
    ("r", "refresh"),
    ("esc/b", "back"),
    ("q", "quit"),
];

pub const FILTER_HINTS: &[Hint] = &[
    ("esc", "clear filter"),
    ("enter", "close bar"),
    ("↑/↓", "scroll"),
];

pub fn hints(state: &AppState) -> &'static [Hint] {
    if state.log.filter_mode {
        FILTER_HINTS
    } else if state.selected_job_running() {
        RUNNING_HINTS
    } else {
        COMPLETED_HINTS
    }
}

/// "Logs › build", followed by step progress or a strip of step results.
pub fn label(state: &AppState) -> String {
    let Some(job) = &state.selected_job else {
        return "Logs".to_string();
    };
    let mut label = format!("Logs › {}", job.name);
    if job.steps.is_empty() {
        return label;
    }
    if job.status.is_running() {
        label.push_str(&format!(
            "  {}/{} steps",
            job.completed_steps(),
            job.steps.len()
        ));
    } else {
        label.push_str("  ");
        label.extend(job.steps.iter().map(|s| rows::status_icon(s.status, s.conclusion).0));
    }
    label
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let filter_bar = state.log.filter_mode;
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(u16::from(filter_bar)),
    ])
    .split(area);

    let Some(job) = &state.selected_job else {
        return;
    };

    f.render_widget(Paragraph::new(status_line(state, job)), chunks[0]);

    let run_name = state
        .selected_run
        .as_ref()
        .map(|r| r.name.as_str())
        .unwrap_or_default();
    let crumb = match &state.selected_pr {
        Some(pr) => format!(" PR #{} › Run: {run_name}", pr.number),
        None => format!(" Run: {run_name}"),
    };
    f.render_widget(
        Paragraph::new(rows::breadcrumb(truncate(&crumb, usize::from(area.width)))),
        chunks[1],
    );

    if job.status.is_running() {
        render_running(f, chunks[2], state, job);
    } else {
        render_completed(f, chunks[2], state);
    }

    if filter_bar {
        let count = filter::count_matches(state.log.raw(), &state.log.filter);
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  / ", Style::default().fg(Color::Cyan)),
                Span::raw(state.log.filter.clone()),
                Span::styled("█", Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("  ({count} lines)"),
                    Style::default().fg(Color::DarkGray),
                ),
            ])),
            chunks[3],
        );
    }
}

fn status_line(state: &AppState, job: &Job) -> Line<'static> {
    let (icon, color) = rows::status_icon(job.status, job.conclusion);
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(icon, Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(
            rows::status_label(job.status, job.conclusion),
            Style::default().fg(color),
        ),
    ];
    if job.status.is_running() {
        if let Some(step) = job.current_step() {
            spans.push(Span::styled(
                format!(
                    "  ▶ {} ({})",
                    step.name,
                    compute_duration(step.started_at, step.completed_at)
                ),
                Style::default().fg(Color::Yellow),
            ));
        }
    } else {
        if state.log.auto_scroll {
            spans.push(Span::styled(
                "  [auto-scroll]",
                Style::default().fg(Color::DarkGray),
            ));
        }
        if !state.log.filter.is_empty() {
            spans.push(Span::styled(
                format!("  [filter: {}]", state.log.filter),
                Style::default().fg(Color::Cyan),
            ));
        }
    }
    Line::from(spans)
}

/// Steps on top, live log tail below.
fn render_running(f: &mut Frame, area: Rect, state: &AppState, job: &Job) {
    let steps_h = (job.steps.len().max(1) + 1).min(usize::from(area.height) / 2).max(1);
    let chunks = Layout::vertical([
        Constraint::Length(u16::try_from(steps_h).unwrap_or(u16::MAX)),
        Constraint::Min(0),
    ])
    .split(area);

    let step_lines: Vec<Line> = if job.steps.is_empty() {
        vec![Line::from(Span::styled(
            "  Waiting for steps…",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        let current = job
            .steps
            .iter()
            .position(|s| s.status == RunStatus::InProgress)
            .unwrap_or(0);
        rows::window(job.steps.len(), current, usize::from(chunks[0].height))
            .map(|i| step_line(&job.steps[i], state.spinner_frame))
            .collect()
    };
    f.render_widget(Paragraph::new(step_lines), chunks[0]);

    let body = chunks[1];
    if body.height == 0 {
        return;
    }
    let rendered = state.log.rendered();
    if rendered.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(
                "  Waiting for logs…",
                Style::default().fg(Color::DarkGray),
            )),
            body,
        );
        return;
    }
    let tail = rendered.len().saturating_sub(usize::from(body.height));
    f.render_widget(Paragraph::new(rendered[tail..].to_vec()), body);
}

fn step_line(step: &Step, spinner_frame: usize) -> Line<'static> {
    let duration = compute_duration(step.started_at, step.completed_at);
    if step.status == RunStatus::InProgress {
        return Line::from(vec![
            Span::styled(
                format!("  {} ", spinner::frame(spinner_frame)),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                step.name.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {duration}"), Style::default().fg(Color::Yellow)),
        ]);
    }
    let (icon, color) = rows::status_icon(step.status, step.conclusion);
    let name_style = match step.conclusion {
        Some(c) if rows::status_icon(RunStatus::Completed, Some(c)).1 == Color::Red => {
            Style::default().fg(Color::Red)
        }
        _ if step.status != RunStatus::Completed => Style::default().fg(Color::DarkGray),
        _ => Style::default(),
    };
    Line::from(vec![
        Span::styled(format!("  {icon} "), Style::default().fg(color)),
        Span::styled(step.name.clone(), name_style),
        Span::styled(format!("  {duration}"), Style::default().fg(Color::DarkGray)),
    ])
}

fn render_completed(f: &mut Frame, area: Rect, state: &AppState) {
    let placeholder = if !state.log.loaded {
        Some("  Loading logs…")
    } else if state.log.raw().is_empty() {
        Some("  Waiting for logs…")
    } else {
        None
    };
    match placeholder {
        Some(text) => f.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))),
            area,
        ),
        None => f.render_widget(Paragraph::new(state.log.visible().to_vec()), area),
    }
}
