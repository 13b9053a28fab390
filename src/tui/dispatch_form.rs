use crate::app::{truncate, AppState};
use crate::dispatch::{DispatchForm, FieldKind, Focus, FormField, RefSection};
use crate::tui::footer::Hint;
use crate::tui::rows;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// Rows of the branch/tag list shown under the ref field.
const REF_LIST_ROWS: usize = 6;

pub const FIELD_HINTS: &[Hint] = &[
    ("tab", "next"),
    ("←/→", "section"),
    ("↑/↓", "navigate"),
    ("enter", "select"),
    ("esc", "back"),
];

pub const BUTTON_HINTS: &[Hint] = &[
    ("←/→", "switch"),
    ("enter", "confirm"),
    ("tab", "fields"),
    ("esc", "back"),
];

pub fn label(state: &AppState) -> String {
    match &state.form {
        Some(form) => format!("Dispatch › {}", form.workflow.name),
        None => "Dispatch".to_string(),
    }
}

pub fn hints(state: &AppState) -> &'static [Hint] {
    match state.form.as_ref().map(|f| f.focus) {
        Some(Focus::Cancel | Focus::Build) => BUTTON_HINTS,
        _ => FIELD_HINTS,
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(area);

    let Some(form) = &state.form else {
        return;
    };

    let file = form
        .workflow
        .path
        .rsplit('/')
        .next()
        .unwrap_or(&form.workflow.path);
    f.render_widget(
        Paragraph::new(rows::breadcrumb(format!(
            " Actions › Runs › Dispatch › {}",
            truncate(file, usize::from(area.width).saturating_sub(30))
        ))),
        chunks[0],
    );

    let (lines, focus_row) = form_lines(form);
    // Keep the focused field (or the buttons) on screen.
    let height = usize::from(chunks[1].height);
    let skip = focus_row.saturating_sub(height.saturating_sub(REF_LIST_ROWS + 4));
    let skip = skip.min(lines.len().saturating_sub(height));
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    f.render_widget(Paragraph::new(visible), chunks[1]);
}

/// All body lines plus the row at which the focused element starts.
fn form_lines(form: &DispatchForm) -> (Vec<Line<'static>>, usize) {
    let mut lines = vec![Line::from("")];
    let mut focus_row = 0;

    for (i, field) in form.fields.iter().enumerate() {
        let focused = form.focus == Focus::Field(i);
        if focused {
            focus_row = lines.len();
        }
        lines.push(label_line(field, focused));
        match field.kind {
            FieldKind::Ref => ref_lines(form, field, focused, &mut lines),
            FieldKind::String | FieldKind::Environment => {
                lines.push(text_line(field, focused));
            }
            FieldKind::Choice => lines.push(choice_line(field, focused)),
            FieldKind::Boolean => lines.push(bool_line(field, focused)),
        }
        lines.push(Line::from(""));
    }

    if matches!(form.focus, Focus::Cancel | Focus::Build) {
        focus_row = lines.len();
    }
    lines.push(button_line(form.focus));
    (lines, focus_row)
}

fn label_line(field: &FormField, focused: bool) -> Line<'static> {
    let style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut spans = vec![
        Span::raw(if focused { " ▶ " } else { "   " }),
        Span::styled(field.label.clone(), style),
    ];
    if field.required {
        spans.push(Span::styled(" [required]", Style::default().fg(Color::Red)));
    }
    if !field.description.is_empty() {
        spans.push(Span::styled(
            format!("  {}", field.description),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn text_line(field: &FormField, focused: bool) -> Line<'static> {
    let mut spans = vec![Span::styled("     > ", Style::default().fg(Color::DarkGray))];
    if field.value.is_empty() && !field.placeholder.is_empty() {
        spans.push(Span::styled(
            field.placeholder.clone(),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::raw(field.value.clone()));
    }
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

fn ref_lines(form: &DispatchForm, field: &FormField, focused: bool, out: &mut Vec<Line<'static>>) {
    let branches = form.filtered_branches();
    let tags = form.filtered_tags();

    let tab = |text: String, active: bool| {
        if active {
            Span::styled(
                text,
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(text, Style::default().fg(Color::DarkGray))
        }
    };
    out.push(Line::from(vec![
        Span::raw("     "),
        tab("[Input]".to_string(), form.section == RefSection::Input),
        Span::raw("  "),
        tab(
            format!("Branches ({})", branches.len()),
            form.section == RefSection::Branches,
        ),
        Span::raw("  "),
        tab(
            format!("Tags ({})", tags.len()),
            form.section == RefSection::Tags,
        ),
    ]));
    out.push(text_line(field, focused && form.section == RefSection::Input));

    let (list, idx) = match form.section {
        RefSection::Input => return,
        RefSection::Branches => (branches, form.branch_idx),
        RefSection::Tags => (tags, form.tag_idx),
    };
    if list.is_empty() {
        out.push(Line::from(Span::styled(
            "       (no matches)",
            Style::default().fg(Color::DarkGray),
        )));
        return;
    }
    let idx = idx.min(list.len() - 1);
    for i in rows::window(list.len(), idx, REF_LIST_ROWS) {
        let selected = i == idx;
        let line = if selected {
            Line::from(Span::styled(
                format!("       ▶ {}", list[i]),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(format!("         {}", list[i]))
        };
        out.push(line);
    }
    if list.len() > REF_LIST_ROWS {
        out.push(Line::from(Span::styled(
            format!("         {} / {}", idx + 1, list.len()),
            Style::default().fg(Color::DarkGray),
        )));
    }
}

fn choice_line(field: &FormField, focused: bool) -> Line<'static> {
    let mut spans = vec![Span::raw("     ")];
    if focused {
        spans.push(Span::styled("↑/↓  ", Style::default().fg(Color::DarkGray)));
    }
    for (i, opt) in field.options.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
        }
        if i == field.option_idx {
            spans.push(Span::styled(
                format!("▶{opt}"),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(opt.clone()));
        }
    }
    Line::from(spans)
}

fn bool_line(field: &FormField, focused: bool) -> Line<'static> {
    let on = field.value == "true";
    let mut spans = vec![
        Span::raw("     "),
        Span::styled(
            if on { "[x] true" } else { "[ ] false" },
            Style::default().fg(if on { Color::Green } else { Color::White }),
        ),
    ];
    if focused {
        spans.push(Span::styled(
            "   space / ↑↓  toggle",
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn button_line(focus: Focus) -> Line<'static> {
    let button = |text: &'static str, active: bool, color: Color| {
        if active {
            Span::styled(
                text,
                Style::default()
                    .fg(Color::Black)
                    .bg(color)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(text, Style::default().fg(color))
        }
    };
    Line::from(vec![
        Span::raw("   "),
        button("  Cancel  ", focus == Focus::Cancel, Color::Gray),
        Span::raw("   "),
        button("  Build  ", focus == Focus::Build, Color::Green),
    ])
}
