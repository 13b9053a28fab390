#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use color_eyre::eyre::{eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tgh::app::{
    AppConfig, AppState, Conclusion, InputKind, Job, PrHead, PrUser, PullRequest, RefOptions,
    RunStatus, Step, Workflow, WorkflowInput, WorkflowRun,
};
use tgh::command::{Command, RerunMode};
use tgh::events::AppEvent;
use tgh::logs::fetcher::{PipelineCoords, TimelineEntry};
use tgh::poll::{PollKind, Timer};
use tgh::runtime::Runtime;
use tgh::traits::CiClient;
use tgh::update::update;
use tokio::sync::mpsc;

pub const PIPELINE_URL: &str =
    "https://pipelines.actions.githubusercontent.com/_services/pipelines/abc/_apis/pipelines/1/runs/77/signedlogcontent/3?sig=x";

// ========== Builders ==========

pub fn run_with_id(id: u64) -> WorkflowRun {
    WorkflowRun {
        id,
        name: "CI".to_string(),
        display_title: format!("CI Build #{id}"),
        status: RunStatus::Completed,
        conclusion: Some(Conclusion::Success),
        head_branch: "main".to_string(),
        head_sha: format!("sha{id}"),
        event: "push".to_string(),
        run_number: id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        html_url: format!("https://github.com/octo/hello/actions/runs/{id}"),
    }
}

pub fn run_failed(id: u64) -> WorkflowRun {
    let mut run = run_with_id(id);
    run.conclusion = Some(Conclusion::Failure);
    run
}

pub fn step(number: u64, name: &str, status: RunStatus) -> Step {
    Step {
        name: name.to_string(),
        status,
        conclusion: (status == RunStatus::Completed).then_some(Conclusion::Success),
        number,
        started_at: Some(Utc::now()),
        completed_at: None,
    }
}

pub fn job(id: u64, status: RunStatus, steps: Vec<Step>) -> Job {
    Job {
        id,
        name: format!("job-{id}"),
        status,
        conclusion: (status == RunStatus::Completed).then_some(Conclusion::Success),
        started_at: Some(Utc::now()),
        completed_at: None,
        steps,
        html_url: format!("https://github.com/octo/hello/actions/runs/1/job/{id}"),
    }
}

pub fn job_failed(id: u64) -> Job {
    let mut j = job(id, RunStatus::Completed, Vec::new());
    j.conclusion = Some(Conclusion::Failure);
    j
}

pub fn pull_request(number: u64, sha: &str) -> PullRequest {
    PullRequest {
        number,
        title: format!("Change #{number}"),
        html_url: format!("https://github.com/octo/hello/pull/{number}"),
        draft: false,
        user: PrUser {
            login: "octocat".to_string(),
        },
        head: PrHead {
            ref_name: format!("feature-{number}"),
            sha: sha.to_string(),
        },
        updated_at: Utc::now(),
    }
}

pub fn workflow(id: u64, name: &str, file: &str) -> Workflow {
    Workflow {
        id,
        name: name.to_string(),
        path: format!(".github/workflows/{file}"),
        state: "active".to_string(),
    }
}

pub fn input(name: &str, kind: InputKind, default: &str) -> WorkflowInput {
    WorkflowInput {
        name: name.to_string(),
        kind,
        default: default.to_string(),
        ..WorkflowInput::default()
    }
}

pub fn make_state() -> AppState {
    AppState::new(AppConfig::new(
        "github.com".to_string(),
        "octo".to_string(),
        "hello".to_string(),
    ))
}

pub fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    })
}

// ========== Scriptable client ==========

/// In-memory CI host. Job lists are served from a queue whose last entry
/// repeats, so tests can script how a run evolves across polls.
#[derive(Default)]
pub struct FakeClient {
    pub runs: Mutex<Vec<WorkflowRun>>,
    pub runs_error: Mutex<Option<String>>,
    pub jobs: Mutex<VecDeque<Vec<Job>>>,
    pub full_log: Mutex<String>,
    pub location: Mutex<String>,
    pub timeline: Mutex<Vec<TimelineEntry>>,
    pub step_logs: Mutex<HashMap<String, String>>,
    pub prs: Mutex<Vec<PullRequest>>,
    pub workflows: Mutex<Vec<Workflow>>,
    pub inputs: Mutex<Vec<WorkflowInput>>,
    pub refs: Mutex<RefOptions>,
    pub calls: Mutex<Vec<String>>,
    pub dispatches: Mutex<Vec<(u64, String, Vec<(String, String)>)>>,
    pub reruns: Mutex<Vec<(u64, RerunMode)>>,
}

impl FakeClient {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn push_jobs(&self, jobs: Vec<Job>) {
        self.jobs.lock().unwrap().push_back(jobs);
    }

    /// Replace every queued job list with `jobs`.
    pub fn set_jobs(&self, jobs: Vec<Job>) {
        let mut queue = self.jobs.lock().unwrap();
        queue.clear();
        queue.push_back(jobs);
    }

    pub fn add_step_log(&self, step_name: &str, body: &str) {
        let url = format!("https://pipelines.example/logs/{step_name}");
        self.timeline.lock().unwrap().push(TimelineEntry {
            step_name: step_name.to_string(),
            log_url: url.clone(),
        });
        self.step_logs.lock().unwrap().insert(url, body.to_string());
    }
}

#[async_trait]
impl CiClient for FakeClient {
    async fn list_runs(&self, _limit: usize) -> Result<Vec<WorkflowRun>> {
        self.record("list_runs");
        if let Some(msg) = self.runs_error.lock().unwrap().clone() {
            return Err(eyre!(msg));
        }
        Ok(self.runs.lock().unwrap().clone())
    }

    async fn list_runs_for_ref(&self, head_sha: &str, _limit: usize) -> Result<Vec<WorkflowRun>> {
        self.record(format!("list_runs_for_ref {head_sha}"));
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.head_sha == head_sha)
            .cloned()
            .collect())
    }

    async fn list_jobs(&self, run_id: u64) -> Result<Vec<Job>> {
        self.record(format!("list_jobs {run_id}"));
        let mut queue = self.jobs.lock().unwrap();
        let jobs = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(jobs.unwrap_or_default())
    }

    async fn get_full_log(&self, job_id: u64) -> Result<String> {
        self.record(format!("get_full_log {job_id}"));
        Ok(self.full_log.lock().unwrap().clone())
    }

    async fn get_live_log_blob_location(&self, job_id: u64) -> Result<String> {
        self.record(format!("blob_location {job_id}"));
        Ok(self.location.lock().unwrap().clone())
    }

    async fn fetch_log_byte_range(&self, _url: &str, offset: u64) -> Result<(Vec<u8>, u64)> {
        self.record("byte_range");
        Ok((Vec::new(), offset))
    }

    async fn get_build_timeline(&self, _coords: &PipelineCoords) -> Result<Vec<TimelineEntry>> {
        self.record("timeline");
        Ok(self.timeline.lock().unwrap().clone())
    }

    async fn fetch_step_log(&self, log_url: &str) -> Result<String> {
        self.record(format!("step_log {log_url}"));
        self.step_logs
            .lock()
            .unwrap()
            .get(log_url)
            .cloned()
            .ok_or_else(|| eyre!("no step log at {log_url}"))
    }

    async fn trigger_rerun(&self, run_id: u64, mode: RerunMode) -> Result<()> {
        self.record(format!("rerun {run_id}"));
        self.reruns.lock().unwrap().push((run_id, mode));
        Ok(())
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>> {
        self.record("list_prs");
        Ok(self.prs.lock().unwrap().clone())
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        self.record("list_workflows");
        Ok(self.workflows.lock().unwrap().clone())
    }

    async fn get_default_branch(&self) -> Result<String> {
        self.record("default_branch");
        Ok("main".to_string())
    }

    async fn get_workflow_inputs(&self, workflow: &Workflow) -> Result<Vec<WorkflowInput>> {
        self.record(format!("workflow_inputs {}", workflow.id));
        Ok(self.inputs.lock().unwrap().clone())
    }

    async fn list_refs(&self) -> Result<RefOptions> {
        self.record("list_refs");
        Ok(self.refs.lock().unwrap().clone())
    }

    async fn dispatch_workflow(
        &self,
        workflow_id: u64,
        git_ref: &str,
        inputs: &[(String, String)],
    ) -> Result<()> {
        self.record(format!("dispatch {workflow_id}"));
        self.dispatches
            .lock()
            .unwrap()
            .push((workflow_id, git_ref.to_string(), inputs.to_vec()));
        Ok(())
    }

    fn open_in_browser(&self, url: &str) -> Result<()> {
        self.record(format!("open {url}"));
        Ok(())
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        self.record(format!("clipboard {}", text.len()));
        Ok(())
    }
}

// ========== Harness ==========

/// Drives `update` and the real [`Runtime`] against a [`FakeClient`].
/// Scheduled timers are captured instead of slept on; tests fire them.
pub struct Harness {
    pub state: AppState,
    pub client: Arc<FakeClient>,
    runtime: Runtime,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    timers: Vec<Timer>,
}

impl Harness {
    pub fn new(client: FakeClient) -> Self {
        let client = Arc::new(client);
        let (tx, rx) = mpsc::unbounded_channel();
        let dyn_client: Arc<dyn CiClient> = client.clone();
        let mut state = make_state();
        update(&mut state, AppEvent::Resize(120, 40));
        Self {
            state,
            client,
            runtime: Runtime::new(dyn_client, tx, 30),
            rx,
            timers: Vec::new(),
        }
    }

    /// Feed one event, then run every resulting command to completion.
    pub async fn send(&mut self, event: AppEvent) {
        let cmds = update(&mut self.state, event);
        self.pump(cmds).await;
    }

    pub async fn press(&mut self, code: KeyCode) {
        self.send(key(code)).await;
    }

    pub async fn fire(&mut self, kind: PollKind) {
        let timer = self
            .timers
            .iter()
            .rev()
            .find(|t| t.kind == kind)
            .copied()
            .unwrap_or_else(|| panic!("no {kind:?} timer scheduled"));
        self.send(AppEvent::Timer(timer)).await;
    }

    async fn pump(&mut self, cmds: Vec<Command>) {
        let mut queue: VecDeque<Command> = cmds.into();
        let mut pending = 0usize;
        loop {
            while let Some(cmd) = queue.pop_front() {
                match cmd {
                    Command::Schedule { timer, .. } => self.timers.push(timer),
                    Command::OpenUrl { url, .. } => {
                        self.client.open_in_browser(&url).unwrap();
                    }
                    other => {
                        self.runtime.execute(other);
                        pending += 1;
                    }
                }
            }
            if pending == 0 {
                break;
            }
            let event = tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("command produced no event")
                .expect("event channel closed");
            pending -= 1;
            queue.extend(update(&mut self.state, event));
        }
    }
}
