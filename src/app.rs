//! Application data model, snapshot state, and shared formatting helpers.

use crate::diff::JobTracker;
use crate::dispatch::DispatchForm;
use crate::logs::fetcher::LiveCursor;
use crate::logs::view::LogView;
use crate::poll::PollScheduler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::time::{Duration, Instant};

// ── Formatting helpers ──

/// `45s`, `2m 5s`, `1h 3m`. Negative input clamps to zero.
pub fn format_duration(secs: i64) -> String {
    match secs.max(0) {
        s @ 0..=59 => format!("{s}s"),
        s @ 60..=3599 => format!("{}m {}s", s / 60, s % 60),
        s => format!("{}h {}m", s / 3600, s % 3600 / 60),
    }
}

/// Elapsed time of a job or step; still-running ones count up to now.
/// Empty when it has not started.
pub fn compute_duration(
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
) -> String {
    let Some(start) = started_at else {
        return String::new();
    };
    let end = completed_at.unwrap_or_else(Utc::now);
    format_duration(end.signed_duration_since(start).num_seconds())
}

/// "just now", "5m ago", "3h ago", "2d ago".
pub fn relative_time(t: DateTime<Utc>) -> String {
    let secs = Utc::now().signed_duration_since(t).num_seconds().max(0);
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Cut `s` to at most `max_width` display columns, ending in `…` when cut.
pub fn truncate(s: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w >= max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('\u{2026}');
    out
}

/// GitHub sends `null` for several string fields (e.g. a run's `name` for
/// deleted workflows). Treat those as empty rather than failing the whole page.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Job status advances roughly every 2s on GitHub's side.
pub const JOBS_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default runs-list refresh; overridable with `--interval`.
pub const RUNS_POLL_INTERVAL_SECS: u64 = 10;
/// Step status and live log refresh while a running job is open.
pub const LOG_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Long enough to read; short enough to not permanently obscure the footer.
pub const STATUS_TTL_SECS: u64 = 10;
/// Must match the length of `BRAILLE_FRAMES` in `tui::spinner`.
pub const SPINNER_FRAME_COUNT: usize = 10;
/// Below 60 cols, key hints don't fit and the footer switches to a compact set.
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
/// Runs requested per poll unless `--limit` says otherwise.
pub const DEFAULT_RUN_LIMIT: usize = 30;
/// Fallback dispatch ref when the repository's default branch is unknown.
pub const FALLBACK_REF: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    InProgress,
    Queued,
    Requested,
    Waiting,
    Pending,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Anything that has not finished yet. Drives the "step progress" display
    /// and decides between live polling and a single archive fetch.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            RunStatus::InProgress
                | RunStatus::Queued
                | RunStatus::Waiting
                | RunStatus::Pending
                | RunStatus::Requested
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    StartupFailure,
    Stale,
    Neutral,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_title: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub head_branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub head_sha: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(default)]
    pub run_number: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
}

/// A job belongs to exactly one run, but the run id is supplied by the caller
/// (the jobs endpoint is already scoped to a run) and not stored here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Replaced wholesale on every refresh.
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<Step>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
}

impl Job {
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == RunStatus::Completed)
            .count()
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| s.status == RunStatus::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    /// 1-based; ordering key for incremental per-step log fetch.
    pub number: u64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
    #[serde(default)]
    pub draft: bool,
    pub user: PrUser,
    pub head: PrHead,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrUser {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrHead {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    String,
    Boolean,
    Choice,
    Environment,
}

/// One `on.workflow_dispatch.inputs` entry, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowInput {
    pub name: String,
    pub description: String,
    pub kind: InputKind,
    pub default: String,
    pub required: bool,
    pub options: Vec<String>,
}

/// Branch and tag names offered by the dispatch form's ref picker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefOptions {
    pub branches: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Menu,
    Runs,
    Jobs,
    Logs,
    PullRequests,
    Workflows,
    DispatchForm,
}

pub const MENU_ITEMS: &[(&str, &str)] = &[
    ("Actions", "Workflow runs, logs and dispatch"),
    ("Pull Requests", "Open pull requests and their checks"),
];

/// Cursor over a list whose length can change under it between polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub index: usize,
}

impl Cursor {
    pub fn up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn down(&mut self, len: usize) {
        if len > 0 && self.index < len - 1 {
            self.index += 1;
        }
    }

    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.index = 0;
        } else if self.index >= len {
            self.index = len - 1;
        }
    }
}

/// Immutable configuration set at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub runs_interval: Duration,
    pub limit: usize,
    pub version_string: String,
}

impl AppConfig {
    pub fn new(host: String, owner: String, repo: String) -> Self {
        Self {
            host,
            owner,
            repo,
            runs_interval: Duration::from_secs(RUNS_POLL_INTERVAL_SECS),
            limit: DEFAULT_RUN_LIMIT,
            version_string: String::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// The single application snapshot. Only `update::update` mutates it.
pub struct AppState {
    pub config: AppConfig,
    pub view: View,
    pub width: u16,
    pub height: u16,

    // Menu
    pub menu: Cursor,

    // Runs
    pub runs: Vec<WorkflowRun>,
    pub runs_cursor: Cursor,
    pub runs_filter: String,
    pub runs_filter_mode: bool,
    /// Parent context when runs are scoped to a pull request's head commit.
    pub selected_pr: Option<PullRequest>,

    // Jobs
    pub selected_run: Option<WorkflowRun>,
    pub jobs: Vec<Job>,
    pub jobs_cursor: Cursor,
    pub tracker: JobTracker,

    // Logs
    pub selected_job: Option<Job>,
    pub log: LogView,
    pub live: LiveCursor,

    // Pull requests
    pub prs: Vec<PullRequest>,
    pub prs_cursor: Cursor,

    // Workflow dispatch
    pub workflows: Vec<Workflow>,
    pub workflows_cursor: Cursor,
    pub default_branch: Option<String>,
    pub selected_workflow: Option<Workflow>,
    pub form: Option<DispatchForm>,

    // Polling
    pub polls: PollScheduler,

    // Transient UI
    pub status: Option<(String, Instant)>,
    pub loading: bool,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            view: View::Menu,
            width: 80,
            height: 24,
            menu: Cursor::default(),
            runs: Vec::new(),
            runs_cursor: Cursor::default(),
            runs_filter: String::new(),
            runs_filter_mode: false,
            selected_pr: None,
            selected_run: None,
            jobs: Vec::new(),
            jobs_cursor: Cursor::default(),
            tracker: JobTracker::default(),
            selected_job: None,
            log: LogView::default(),
            live: LiveCursor::default(),
            prs: Vec::new(),
            prs_cursor: Cursor::default(),
            workflows: Vec::new(),
            workflows_cursor: Cursor::default(),
            default_branch: None,
            selected_workflow: None,
            form: None,
            polls: PollScheduler::default(),
            status: None,
            loading: false,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    /// Runs matching the `/` filter (name or branch substring, case-insensitive).
    pub fn visible_runs(&self) -> Vec<&WorkflowRun> {
        if self.runs_filter.is_empty() {
            return self.runs.iter().collect();
        }
        let needle = self.runs_filter.to_lowercase();
        self.runs
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.head_branch.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn current_run(&self) -> Option<&WorkflowRun> {
        self.visible_runs().get(self.runs_cursor.index).copied()
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.jobs.get(self.jobs_cursor.index)
    }

    pub fn current_pr(&self) -> Option<&PullRequest> {
        self.prs.get(self.prs_cursor.index)
    }

    pub fn current_workflow(&self) -> Option<&Workflow> {
        self.workflows.get(self.workflows_cursor.index)
    }

    pub fn selected_job_running(&self) -> bool {
        self.selected_job
            .as_ref()
            .is_some_and(|j| j.status.is_running())
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some((msg.into(), Instant::now()));
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn prune_status(&mut self) {
        if let Some((_, t)) = &self.status {
            if t.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status = None;
            }
        }
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.as_ref().map(|(m, _)| m.as_str())
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }
}
