use crate::app::{Job, PullRequest, RefOptions, Workflow, WorkflowInput, WorkflowRun};
use crate::command::RerunMode;
use crate::logs::fetcher::{PipelineCoords, TimelineEntry};
use async_trait::async_trait;
use color_eyre::eyre::Result;

/// Everything the dashboard needs from the CI host. Implemented by
/// `gh::executor::GhClient`; tests substitute in-memory fakes.
#[async_trait]
pub trait CiClient: Send + Sync {
    async fn list_runs(&self, limit: usize) -> Result<Vec<WorkflowRun>>;
    async fn list_runs_for_ref(&self, head_sha: &str, limit: usize) -> Result<Vec<WorkflowRun>>;
    async fn list_jobs(&self, run_id: u64) -> Result<Vec<Job>>;
    /// Empty text with `Ok` means the log is not available yet.
    async fn get_full_log(&self, job_id: u64) -> Result<String>;
    /// Empty URL means unsupported or not ready.
    async fn get_live_log_blob_location(&self, job_id: u64) -> Result<String>;
    /// Returns `(bytes, new_offset)`. No new bytes leaves the offset unchanged.
    /// Bytes are undecoded: a range may end inside a multi-byte character.
    async fn fetch_log_byte_range(&self, url: &str, offset: u64) -> Result<(Vec<u8>, u64)>;
    async fn get_build_timeline(&self, coords: &PipelineCoords) -> Result<Vec<TimelineEntry>>;
    async fn fetch_step_log(&self, log_url: &str) -> Result<String>;
    async fn trigger_rerun(&self, run_id: u64, mode: RerunMode) -> Result<()>;
    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>>;
    async fn list_workflows(&self) -> Result<Vec<Workflow>>;
    async fn get_default_branch(&self) -> Result<String>;
    async fn get_workflow_inputs(&self, workflow: &Workflow) -> Result<Vec<WorkflowInput>>;
    async fn list_refs(&self) -> Result<RefOptions>;
    async fn dispatch_workflow(
        &self,
        workflow_id: u64,
        git_ref: &str,
        inputs: &[(String, String)],
    ) -> Result<()>;
    fn open_in_browser(&self, url: &str) -> Result<()>;
    async fn copy_to_clipboard(&self, text: &str) -> Result<()>;
}
