//! Follow-up work requested by `update::update`. Commands never touch the
//! snapshot; the runtime executes them and feeds results back as events.

use crate::app::{Step, Workflow};
use crate::logs::fetcher::LiveCursor;
use crate::poll::Timer;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerunMode {
    FailedOnly,
    All,
}

impl RerunMode {
    pub fn endpoint(self) -> &'static str {
        match self {
            RerunMode::FailedOnly => "rerun-failed-jobs",
            RerunMode::All => "rerun",
        }
    }

    pub fn progress_message(self) -> &'static str {
        match self {
            RerunMode::FailedOnly => "Triggering rerun of failed jobs…",
            RerunMode::All => "Triggering rerun of all jobs…",
        }
    }

    pub fn done_message(self) -> &'static str {
        match self {
            RerunMode::FailedOnly => "Re-run triggered for failed jobs!",
            RerunMode::All => "Re-run triggered for all jobs!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchRuns,
    FetchRunsForRef {
        head_sha: String,
    },
    FetchJobs {
        run_id: u64,
    },
    FetchFullLog {
        job_id: u64,
        session: u64,
    },
    FetchLiveLog {
        job_id: u64,
        session: u64,
        steps: Vec<Step>,
        cursor: LiveCursor,
        raw_len: usize,
    },
    FetchPullRequests,
    FetchWorkflows,
    FetchDefaultBranch,
    FetchWorkflowInputs {
        workflow: Workflow,
    },
    FetchRefs,
    Dispatch {
        workflow_id: u64,
        git_ref: String,
        inputs: Vec<(String, String)>,
    },
    Rerun {
        run_id: u64,
        mode: RerunMode,
    },
    OpenUrl {
        url: String,
        what: &'static str,
    },
    CopyToClipboard(String),
    Schedule {
        timer: Timer,
        after: Duration,
    },
}

impl Command {
    /// Short label for task monitoring and debug logs.
    pub fn label(&self) -> &'static str {
        match self {
            Command::FetchRuns | Command::FetchRunsForRef { .. } => "fetch_runs",
            Command::FetchJobs { .. } => "fetch_jobs",
            Command::FetchFullLog { .. } => "fetch_full_log",
            Command::FetchLiveLog { .. } => "fetch_live_log",
            Command::FetchPullRequests => "fetch_prs",
            Command::FetchWorkflows => "fetch_workflows",
            Command::FetchDefaultBranch => "fetch_default_branch",
            Command::FetchWorkflowInputs { .. } => "fetch_workflow_inputs",
            Command::FetchRefs => "fetch_refs",
            Command::Dispatch { .. } => "dispatch",
            Command::Rerun { .. } => "rerun",
            Command::OpenUrl { .. } => "open_url",
            Command::CopyToClipboard(_) => "clipboard",
            Command::Schedule { .. } => "timer",
        }
    }
}
