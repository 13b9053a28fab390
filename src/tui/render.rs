use crate::app::{AppState, View, NARROW_WIDTH_THRESHOLD};
use crate::tui::footer::{self, Hint};
use crate::tui::{dispatch_form, header, jobs, logs, menu, prs, runs, workflows};
use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

/// Compact hints for terminals narrower than [`NARROW_WIDTH_THRESHOLD`].
const NARROW_HINTS: &[Hint] = &[("enter", "open"), ("esc", "back"), ("q", "quit")];

/// Every view shares the same frame: header bar, body, footer.
pub fn render(f: &mut Frame, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(1),
        Constraint::Length(2),
    ])
    .split(f.area());

    let (label, hints) = match state.view {
        View::Menu => (String::new(), menu::HINTS),
        View::Runs => (
            runs::label(state),
            if state.runs_filter_mode {
                runs::FILTER_HINTS
            } else {
                runs::HINTS
            },
        ),
        View::Jobs => (jobs::label(state), jobs::HINTS),
        View::Logs => (logs::label(state), logs::hints(state)),
        View::PullRequests => (prs::label(state), prs::HINTS),
        View::Workflows => (workflows::label(state), workflows::HINTS),
        View::DispatchForm => (dispatch_form::label(state), dispatch_form::hints(state)),
    };

    header::render(f, chunks[0], state, &label);

    match state.view {
        View::Menu => menu::render(f, chunks[1], state),
        View::Runs => runs::render(f, chunks[1], state),
        View::Jobs => jobs::render(f, chunks[1], state),
        View::Logs => logs::render(f, chunks[1], state),
        View::PullRequests => prs::render(f, chunks[1], state),
        View::Workflows => workflows::render(f, chunks[1], state),
        View::DispatchForm => dispatch_form::render(f, chunks[1], state),
    }

    let hints = if f.area().width < NARROW_WIDTH_THRESHOLD && state.view != View::DispatchForm {
        NARROW_HINTS
    } else {
        hints
    };
    footer::render(f, chunks[2], state, hints);
}
