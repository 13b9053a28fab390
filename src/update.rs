//! The view state machine.
//!
//! [`update`] is the only place the snapshot changes. It takes one event,
//! mutates the state in place, and returns the follow-up commands the runtime
//! should execute. Nothing here performs I/O.

use crate::app::{
    AppState, Job, View, JOBS_POLL_INTERVAL, LOG_POLL_INTERVAL, MENU_ITEMS,
};
use crate::command::{Command, RerunMode};
use crate::diff::JobsVerdict;
use crate::dispatch::{DispatchForm, FormAction, FormOutcome};
use crate::events::AppEvent;
use crate::input::{self, Action, InputContext};
use crate::logs::fetcher::LiveCursor;
use crate::logs::view::viewport_height;
use crate::poll::{PollKind, Timer};

/// Owned-snapshot form of [`update`]: hand in the current state, get back the
/// next one plus the commands to run.
pub fn handle(mut state: AppState, event: AppEvent) -> (AppState, Vec<Command>) {
    let cmds = update(&mut state, event);
    (state, cmds)
}

pub fn update(state: &mut AppState, event: AppEvent) -> Vec<Command> {
    match event {
        AppEvent::Key(key) => {
            let ctx = InputContext {
                view: state.view,
                filter_mode: filter_mode(state),
            };
            let action = input::map_key(key, &ctx);
            apply_action(state, action)
        }
        AppEvent::Resize(w, h) => {
            state.width = w;
            state.height = h;
            sync_viewport(state);
            Vec::new()
        }
        AppEvent::Tick => {
            state.prune_status();
            state.advance_spinner();
            Vec::new()
        }
        AppEvent::Timer(timer) => on_timer(state, timer),
        AppEvent::RunsLoaded(result) => {
            state.loading = false;
            match result {
                Ok(runs) => {
                    state.runs = runs;
                    let len = state.visible_runs().len();
                    state.runs_cursor.clamp(len);
                }
                Err(e) => state.set_status(format!("error: {e}")),
            }
            Vec::new()
        }
        AppEvent::JobsLoaded { run_id, result } => match result {
            Ok(jobs) => on_jobs(state, run_id, jobs),
            Err(e) => {
                state.loading = false;
                state.set_status(format!("error: {e}"));
                Vec::new()
            }
        },
        AppEvent::FullLogLoaded {
            job_id,
            session,
            result,
        } => {
            if !is_current_log(state, job_id, session) {
                tracing::debug!(job_id, session, "dropping stale full log");
                return Vec::new();
            }
            match result {
                Ok(text) => state.log.reconcile(&text),
                Err(e) => state.set_status(format!("error: {e}")),
            }
            Vec::new()
        }
        AppEvent::LiveLogLoaded {
            job_id,
            session,
            base,
            raw_len,
            result,
        } => {
            // Refetch leaves the cursor untouched, so overlapping polls are
            // told apart by the buffer length they were computed against.
            if !is_current_log(state, job_id, session)
                || state.live != base
                || state.log.raw().len() != raw_len
            {
                tracing::debug!(job_id, session, "dropping stale live log poll");
                return Vec::new();
            }
            match result {
                Ok(poll) => {
                    state.live = poll.cursor;
                    state.log.append(&poll.text);
                }
                Err(e) => {
                    tracing::warn!(job_id, "live log poll failed: {e}");
                    state.set_status(format!("error: {e}"));
                }
            }
            Vec::new()
        }
        AppEvent::PullRequestsLoaded(result) => {
            state.loading = false;
            match result {
                Ok(prs) => {
                    state.prs = prs;
                    state.prs_cursor.clamp(state.prs.len());
                }
                Err(e) => state.set_status(format!("error: {e}")),
            }
            Vec::new()
        }
        AppEvent::WorkflowsLoaded(result) => {
            state.loading = false;
            match result {
                Ok(workflows) => {
                    state.workflows = workflows;
                    state.workflows_cursor.clamp(state.workflows.len());
                }
                Err(e) => state.set_status(format!("error: {e}")),
            }
            Vec::new()
        }
        AppEvent::DefaultBranchLoaded(result) => {
            match result {
                Ok(branch) if !branch.is_empty() => state.default_branch = Some(branch),
                Ok(_) => {}
                Err(e) => tracing::warn!("default branch lookup failed: {e}"),
            }
            Vec::new()
        }
        AppEvent::WorkflowInputsLoaded { workflow, result } => {
            state.loading = false;
            if state.view != View::Workflows {
                return Vec::new();
            }
            match result {
                Ok(inputs) => {
                    let default_ref = state
                        .default_branch
                        .clone()
                        .unwrap_or_else(|| crate::app::FALLBACK_REF.to_string());
                    state.form = Some(DispatchForm::new(workflow, &inputs, &default_ref));
                    state.view = View::DispatchForm;
                    vec![Command::FetchRefs]
                }
                Err(e) => {
                    state.set_status(format!("error: {e}"));
                    Vec::new()
                }
            }
        }
        AppEvent::RefsLoaded(result) => {
            match result {
                Ok(refs) => {
                    if let Some(form) = state.form.as_mut() {
                        form.set_refs(refs);
                    }
                }
                Err(e) => tracing::warn!("ref listing failed: {e}"),
            }
            Vec::new()
        }
        AppEvent::Dispatched { git_ref, result } => {
            state.loading = false;
            match result {
                Ok(()) => {
                    state.form = None;
                    state.selected_workflow = None;
                    state.view = View::Runs;
                    state.set_status(format!("✓ Workflow dispatched on {git_ref}"));
                    vec![fetch_runs(state)]
                }
                Err(e) => {
                    state.set_status(format!("error: {e}"));
                    Vec::new()
                }
            }
        }
        AppEvent::RerunDone {
            run_id,
            mode,
            result,
        } => {
            state.loading = false;
            match result {
                Ok(()) => on_rerun(state, run_id, mode),
                Err(e) => {
                    state.set_status(format!("error: {e}"));
                    Vec::new()
                }
            }
        }
        AppEvent::ActionDone(result) => {
            match result {
                Ok(msg) => state.set_status(msg),
                Err(e) => state.set_status(e),
            }
            Vec::new()
        }
        AppEvent::Error(msg) => {
            state.loading = false;
            state.set_status(msg);
            Vec::new()
        }
    }
}

fn filter_mode(state: &AppState) -> bool {
    match state.view {
        View::Runs => state.runs_filter_mode,
        View::Logs => state.log.filter_mode,
        _ => false,
    }
}

fn is_current_log(state: &AppState, job_id: u64, session: u64) -> bool {
    state.view == View::Logs
        && state.log.session == session
        && state.selected_job.as_ref().is_some_and(|j| j.id == job_id)
}

fn sync_viewport(state: &mut AppState) {
    let rows = viewport_height(state.height, state.log.filter_mode);
    state.log.set_viewport(rows);
}

/// List page size for PageUp/PageDown outside the log view.
fn list_page(state: &AppState) -> usize {
    usize::from(state.height).saturating_sub(4).max(1)
}

fn fetch_runs(state: &AppState) -> Command {
    match &state.selected_pr {
        Some(pr) => Command::FetchRunsForRef {
            head_sha: pr.head.sha.clone(),
        },
        None => Command::FetchRuns,
    }
}

// ── Key actions ──

fn apply_action(state: &mut AppState, action: Action) -> Vec<Command> {
    match action {
        Action::None => Vec::new(),
        Action::Quit => {
            state.should_quit = true;
            Vec::new()
        }
        Action::Form(fa) => form_action(state, fa),
        Action::FilterChar(_)
        | Action::FilterBackspace
        | Action::FilterClear
        | Action::FilterCancel
        | Action::FilterCommit => {
            filter_action(state, action);
            Vec::new()
        }
        Action::MoveUp => {
            move_cursor(state, 1, true);
            Vec::new()
        }
        Action::MoveDown => {
            move_cursor(state, 1, false);
            Vec::new()
        }
        Action::PageUp => {
            let n = page_size(state);
            move_cursor(state, n, true);
            Vec::new()
        }
        Action::PageDown => {
            let n = page_size(state);
            move_cursor(state, n, false);
            Vec::new()
        }
        Action::Top => {
            if state.view == View::Logs {
                state.log.scroll_to_top();
            }
            Vec::new()
        }
        Action::Bottom => {
            if state.view == View::Logs {
                state.log.scroll_to_bottom();
            }
            Vec::new()
        }
        Action::ToggleAutoScroll => {
            if state.view == View::Logs {
                state.log.toggle_auto_scroll();
            }
            Vec::new()
        }
        Action::StartFilter => {
            match state.view {
                View::Logs if !state.selected_job_running() => {
                    state.log.filter_mode = true;
                    sync_viewport(state);
                }
                View::Runs => state.runs_filter_mode = true,
                _ => {}
            }
            Vec::new()
        }
        Action::Select => select(state),
        Action::Back => back(state),
        Action::Refresh => refresh(state),
        Action::RerunFailed => rerun(state, RerunMode::FailedOnly),
        Action::RerunAll => rerun(state, RerunMode::All),
        Action::ReloadLog => {
            if state.view != View::Logs {
                return Vec::new();
            }
            state.clear_status();
            reset_log(state);
            start_log_fetch(state)
        }
        Action::OpenDispatch => {
            if state.view != View::Runs {
                return Vec::new();
            }
            state.view = View::Workflows;
            state.loading = true;
            state.clear_status();
            let mut cmds = vec![Command::FetchWorkflows];
            if state.default_branch.is_none() {
                cmds.push(Command::FetchDefaultBranch);
            }
            cmds
        }
        Action::OpenBrowser => open_browser(state),
        Action::CopyLog => {
            if state.view == View::Logs {
                vec![Command::CopyToClipboard(state.log.raw().to_string())]
            } else {
                Vec::new()
            }
        }
    }
}

fn page_size(state: &AppState) -> usize {
    if state.view == View::Logs {
        (state.log.viewport() / 2).max(1)
    } else {
        list_page(state)
    }
}

fn move_cursor(state: &mut AppState, n: usize, up: bool) {
    let step = |cursor: &mut crate::app::Cursor, len: usize| {
        for _ in 0..n {
            if up {
                cursor.up();
            } else {
                cursor.down(len);
            }
        }
    };
    match state.view {
        View::Menu => step(&mut state.menu, MENU_ITEMS.len()),
        View::Runs => {
            let len = state.visible_runs().len();
            step(&mut state.runs_cursor, len);
        }
        View::Jobs => step(&mut state.jobs_cursor, state.jobs.len()),
        View::PullRequests => step(&mut state.prs_cursor, state.prs.len()),
        View::Workflows => step(&mut state.workflows_cursor, state.workflows.len()),
        View::Logs => {
            if up {
                state.log.scroll_up(n);
            } else {
                state.log.scroll_down(n);
            }
        }
        View::DispatchForm => {}
    }
}

fn filter_action(state: &mut AppState, action: Action) {
    match state.view {
        View::Runs => {
            match action {
                Action::FilterChar(c) => state.runs_filter.push(c),
                Action::FilterBackspace => {
                    state.runs_filter.pop();
                }
                Action::FilterClear => state.runs_filter.clear(),
                Action::FilterCancel => {
                    state.runs_filter.clear();
                    state.runs_filter_mode = false;
                }
                Action::FilterCommit => state.runs_filter_mode = false,
                _ => {}
            }
            let len = state.visible_runs().len();
            state.runs_cursor.clamp(len);
        }
        View::Logs => match action {
            Action::FilterChar(c) => state.log.push_filter_char(c),
            Action::FilterBackspace => state.log.pop_filter_char(),
            Action::FilterClear => state.log.set_filter(String::new()),
            Action::FilterCancel => {
                state.log.set_filter(String::new());
                state.log.filter_mode = false;
                sync_viewport(state);
            }
            Action::FilterCommit => {
                state.log.filter_mode = false;
                sync_viewport(state);
            }
            _ => {}
        },
        _ => {}
    }
}

fn form_action(state: &mut AppState, action: FormAction) -> Vec<Command> {
    let Some(form) = state.form.as_mut() else {
        return Vec::new();
    };
    match form.handle(action) {
        FormOutcome::None => Vec::new(),
        FormOutcome::Cancel => {
            state.form = None;
            state.view = View::Workflows;
            Vec::new()
        }
        FormOutcome::Submit { git_ref, inputs } => {
            let workflow_id = form.workflow.id;
            state.loading = true;
            state.set_status("Dispatching workflow…");
            vec![Command::Dispatch {
                workflow_id,
                git_ref,
                inputs,
            }]
        }
    }
}

fn select(state: &mut AppState) -> Vec<Command> {
    match state.view {
        View::Menu => match state.menu.index {
            0 => {
                state.view = View::Runs;
                state.loading = true;
                state.clear_status();
                state.selected_pr = None;
                let interval = state.config.runs_interval;
                vec![Command::FetchRuns, state.polls.start(PollKind::Runs, interval)]
            }
            1 => {
                state.view = View::PullRequests;
                state.loading = true;
                state.clear_status();
                vec![Command::FetchPullRequests]
            }
            _ => Vec::new(),
        },
        View::Runs => {
            let Some(run) = state.current_run().cloned() else {
                return Vec::new();
            };
            let run_id = run.id;
            state.jobs = state.tracker.cached(run_id).map(<[Job]>::to_vec).unwrap_or_default();
            state.jobs_cursor = crate::app::Cursor::default();
            state.selected_run = Some(run);
            state.view = View::Jobs;
            state.loading = true;
            state.clear_status();
            vec![
                Command::FetchJobs { run_id },
                state.polls.start(PollKind::Jobs, JOBS_POLL_INTERVAL),
            ]
        }
        View::Jobs => {
            let Some(job) = state.current_job().cloned() else {
                return Vec::new();
            };
            enter_logs(state, job)
        }
        View::PullRequests => {
            let Some(pr) = state.current_pr().cloned() else {
                return Vec::new();
            };
            let head_sha = pr.head.sha.clone();
            state.selected_pr = Some(pr);
            state.runs.clear();
            state.runs_cursor = crate::app::Cursor::default();
            state.view = View::Runs;
            state.loading = true;
            state.clear_status();
            let interval = state.config.runs_interval;
            vec![
                Command::FetchRunsForRef { head_sha },
                state.polls.start(PollKind::Runs, interval),
            ]
        }
        View::Workflows => {
            let Some(workflow) = state.current_workflow().cloned() else {
                return Vec::new();
            };
            state.selected_workflow = Some(workflow.clone());
            state.loading = true;
            state.clear_status();
            vec![Command::FetchWorkflowInputs { workflow }]
        }
        View::Logs | View::DispatchForm => Vec::new(),
    }
}

fn back(state: &mut AppState) -> Vec<Command> {
    match state.view {
        View::Jobs => {
            state.polls.stop(PollKind::Jobs);
            state.tracker.clear_rerun();
            state.view = View::Runs;
            state.clear_status();
            vec![fetch_runs(state)]
        }
        View::Logs => {
            state.polls.stop(PollKind::Log);
            state.log.filter_mode = false;
            state.view = View::Jobs;
            state.clear_status();
            vec![state.polls.start(PollKind::Jobs, JOBS_POLL_INTERVAL)]
        }
        View::Runs => {
            if !state.runs_filter.is_empty() {
                state.runs_filter.clear();
                state.runs_cursor.clamp(state.runs.len());
                return Vec::new();
            }
            state.polls.stop(PollKind::Runs);
            state.clear_status();
            state.view = if state.selected_pr.take().is_some() {
                View::PullRequests
            } else {
                View::Menu
            };
            Vec::new()
        }
        View::PullRequests => {
            state.view = View::Menu;
            state.clear_status();
            Vec::new()
        }
        View::Workflows => {
            state.view = View::Runs;
            state.clear_status();
            Vec::new()
        }
        View::Menu | View::DispatchForm => Vec::new(),
    }
}

fn refresh(state: &mut AppState) -> Vec<Command> {
    let cmd = match state.view {
        View::Runs => fetch_runs(state),
        View::PullRequests => Command::FetchPullRequests,
        View::Workflows => Command::FetchWorkflows,
        View::Jobs => match &state.selected_run {
            Some(run) => Command::FetchJobs { run_id: run.id },
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    state.loading = true;
    state.clear_status();
    vec![cmd]
}

fn rerun(state: &mut AppState, mode: RerunMode) -> Vec<Command> {
    let run_id = match state.view {
        View::Runs => state.current_run().map(|r| r.id),
        View::Jobs => state.selected_run.as_ref().map(|r| r.id),
        _ => None,
    };
    let Some(run_id) = run_id else {
        return Vec::new();
    };
    state.loading = true;
    state.set_status(mode.progress_message());
    vec![Command::Rerun { run_id, mode }]
}

fn open_browser(state: &mut AppState) -> Vec<Command> {
    let (url, what) = match state.view {
        View::Runs => (state.current_run().map(|r| r.html_url.clone()), "run"),
        View::PullRequests => (state.current_pr().map(|p| p.html_url.clone()), "PR"),
        View::Jobs => (state.current_job().map(|j| j.html_url.clone()), "job"),
        View::Logs => (state.selected_job.as_ref().map(|j| j.html_url.clone()), "job"),
        _ => return Vec::new(),
    };
    match url {
        Some(url) if !url.is_empty() => vec![Command::OpenUrl { url, what }],
        Some(_) if what == "job" => {
            state.set_status("Job URL not available");
            Vec::new()
        }
        _ => Vec::new(),
    }
}

// ── Logs ──

fn reset_log(state: &mut AppState) {
    state.log.reset();
    state.live = LiveCursor::default();
    sync_viewport(state);
}

fn enter_logs(state: &mut AppState, job: Job) -> Vec<Command> {
    state.polls.stop(PollKind::Jobs);
    state.selected_job = Some(job);
    state.view = View::Logs;
    state.clear_status();
    reset_log(state);
    start_log_fetch(state)
}

/// Running jobs get step-status polling (the first live log fetch happens on
/// the first tick); finished jobs get a single archive fetch.
fn start_log_fetch(state: &mut AppState) -> Vec<Command> {
    let Some(job) = state.selected_job.as_ref() else {
        return Vec::new();
    };
    let job_id = job.id;
    if job.status.is_running() {
        let mut cmds = Vec::new();
        if let Some(run) = &state.selected_run {
            cmds.push(Command::FetchJobs { run_id: run.id });
        }
        cmds.push(state.polls.start(PollKind::Log, LOG_POLL_INTERVAL));
        cmds
    } else {
        state.polls.stop(PollKind::Log);
        state.log.final_fetch_issued = true;
        vec![Command::FetchFullLog {
            job_id,
            session: state.log.session,
        }]
    }
}

fn final_fetch(state: &mut AppState, job_id: u64) -> Vec<Command> {
    state.polls.stop(PollKind::Log);
    if state.log.final_fetch_issued {
        return Vec::new();
    }
    state.log.final_fetch_issued = true;
    state.log.filter_mode = false;
    vec![Command::FetchFullLog {
        job_id,
        session: state.log.session,
    }]
}

// ── Timers ──

fn on_timer(state: &mut AppState, timer: Timer) -> Vec<Command> {
    if !state.polls.on_fire(timer) {
        return Vec::new();
    }
    match timer.kind {
        PollKind::Runs => {
            let interval = state.config.runs_interval;
            let mut cmds = Vec::new();
            if state.view == View::Runs {
                cmds.push(fetch_runs(state));
            }
            cmds.push(state.polls.next(PollKind::Runs, interval));
            cmds
        }
        PollKind::Jobs => {
            let Some(run_id) = state.selected_run.as_ref().map(|r| r.id) else {
                state.polls.stop(PollKind::Jobs);
                return Vec::new();
            };
            vec![
                Command::FetchJobs { run_id },
                state.polls.next(PollKind::Jobs, JOBS_POLL_INTERVAL),
            ]
        }
        PollKind::Log => {
            if state.view != View::Logs {
                state.polls.stop(PollKind::Log);
                return Vec::new();
            }
            let Some(job) = state.selected_job.as_ref() else {
                state.polls.stop(PollKind::Log);
                return Vec::new();
            };
            if !job.status.is_running() {
                let job_id = job.id;
                return final_fetch(state, job_id);
            }
            let mut cmds = Vec::new();
            if let Some(run) = &state.selected_run {
                cmds.push(Command::FetchJobs { run_id: run.id });
            }
            cmds.push(Command::FetchLiveLog {
                job_id: job.id,
                session: state.log.session,
                steps: job.steps.clone(),
                cursor: state.live.clone(),
                raw_len: state.log.raw().len(),
            });
            cmds.push(state.polls.next(PollKind::Log, LOG_POLL_INTERVAL));
            cmds
        }
    }
}

// ── Fetch results ──

fn on_jobs(state: &mut AppState, run_id: u64, jobs: Vec<Job>) -> Vec<Command> {
    let is_selected = state.selected_run.as_ref().is_some_and(|r| r.id == run_id);
    if is_selected {
        state.loading = false;
    }

    let jump_to = match state.tracker.observe(run_id, &jobs) {
        JobsVerdict::Stale => return Vec::new(),
        JobsVerdict::Apply { jump_to } => jump_to,
    };
    if !is_selected {
        return Vec::new();
    }

    let mut cmds = Vec::new();
    if state.view == View::Logs {
        if let Some(current) = state.selected_job.as_ref() {
            if let Some(fresh) = jobs.iter().find(|j| j.id == current.id) {
                let was_running = current.status.is_running();
                let now_done = !fresh.status.is_running();
                let job_id = fresh.id;
                state.selected_job = Some(fresh.clone());
                if was_running && now_done {
                    tracing::info!(job_id, "job finished, fetching full log");
                    cmds = final_fetch(state, job_id);
                }
            }
        }
    }

    state.jobs = jobs;
    state.jobs_cursor.clamp(state.jobs.len());
    if state.view == View::Jobs {
        if let Some(pos) = jump_to.and_then(|id| state.jobs.iter().position(|j| j.id == id)) {
            state.jobs_cursor.index = pos;
            state.set_status("✓ Jumped to re-triggered job");
        }
    }
    cmds
}

fn on_rerun(state: &mut AppState, run_id: u64, mode: RerunMode) -> Vec<Command> {
    state.set_status(mode.done_message());
    let is_selected = state.selected_run.as_ref().is_some_and(|r| r.id == run_id);
    if !is_selected || state.view == View::Runs {
        return vec![fetch_runs(state)];
    }
    state.tracker.mark_rerun(run_id, &state.jobs);
    if state.view == View::Jobs {
        state.jobs.clear();
        state.jobs_cursor = crate::app::Cursor::default();
    }
    state
        .polls
        .ensure(PollKind::Jobs, JOBS_POLL_INTERVAL)
        .into_iter()
        .collect()
}
