//! Executes [`Command`]s as tokio tasks. Every task reports back through the
//! event channel; none of them touch the snapshot.

use crate::command::Command;
use crate::events::AppEvent;
use crate::logs::fetcher;
use crate::traits::CiClient;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Spawn `fut`, converting a panic into an [`AppEvent::Error`] instead of
/// silently losing the task.
pub fn spawn_monitored(
    tx: UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

fn send(tx: &UnboundedSender<AppEvent>, label: &str, event: AppEvent) {
    if tx.send(event).is_err() {
        tracing::warn!("{label}: channel closed");
    }
}

pub struct Runtime {
    client: Arc<dyn CiClient>,
    tx: UnboundedSender<AppEvent>,
    limit: usize,
}

impl Runtime {
    pub fn new(client: Arc<dyn CiClient>, tx: UnboundedSender<AppEvent>, limit: usize) -> Self {
        Self { client, tx, limit }
    }

    pub fn execute_all(&self, cmds: Vec<Command>) {
        for cmd in cmds {
            self.execute(cmd);
        }
    }

    pub fn execute(&self, cmd: Command) {
        let label = cmd.label();
        tracing::debug!("executing {label}");
        let client = self.client.clone();
        let tx = self.tx.clone();
        let limit = self.limit;

        match cmd {
            Command::Schedule { timer, after } => {
                spawn_monitored(self.tx.clone(), label, async move {
                    tokio::time::sleep(after).await;
                    send(&tx, label, AppEvent::Timer(timer));
                });
            }
            Command::OpenUrl { url, what } => {
                // Launching the browser is synchronous and fast; no task needed.
                let event = match self.client.open_in_browser(&url) {
                    Ok(()) => AppEvent::ActionDone(Ok(format!("✓ Opened {what} in browser"))),
                    Err(e) => AppEvent::ActionDone(Err(format!("error opening browser: {e}"))),
                };
                send(&self.tx, label, event);
            }
            other => spawn_monitored(self.tx.clone(), label, async move {
                let event = run_fetch(&*client, other, limit).await;
                if let Some(event) = event {
                    send(&tx, label, event);
                }
            }),
        }
    }
}

async fn run_fetch(client: &dyn CiClient, cmd: Command, limit: usize) -> Option<AppEvent> {
    let event = match cmd {
        Command::FetchRuns => AppEvent::RunsLoaded(client.list_runs(limit).await.map_err(display)),
        Command::FetchRunsForRef { head_sha } => AppEvent::RunsLoaded(
            client
                .list_runs_for_ref(&head_sha, limit)
                .await
                .map_err(display),
        ),
        Command::FetchJobs { run_id } => AppEvent::JobsLoaded {
            run_id,
            result: client.list_jobs(run_id).await.map_err(display),
        },
        Command::FetchFullLog { job_id, session } => AppEvent::FullLogLoaded {
            job_id,
            session,
            result: client.get_full_log(job_id).await.map_err(display),
        },
        Command::FetchLiveLog {
            job_id,
            session,
            steps,
            cursor,
            raw_len,
        } => {
            let result = fetcher::poll_live(client, job_id, &steps, raw_len, &cursor)
                .await
                .map_err(display);
            AppEvent::LiveLogLoaded {
                job_id,
                session,
                base: cursor,
                raw_len,
                result,
            }
        }
        Command::FetchPullRequests => {
            AppEvent::PullRequestsLoaded(client.list_pull_requests().await.map_err(display))
        }
        Command::FetchWorkflows => {
            AppEvent::WorkflowsLoaded(client.list_workflows().await.map_err(display))
        }
        Command::FetchDefaultBranch => {
            AppEvent::DefaultBranchLoaded(client.get_default_branch().await.map_err(display))
        }
        Command::FetchWorkflowInputs { workflow } => {
            let result = client.get_workflow_inputs(&workflow).await.map_err(display);
            AppEvent::WorkflowInputsLoaded { workflow, result }
        }
        Command::FetchRefs => AppEvent::RefsLoaded(client.list_refs().await.map_err(display)),
        Command::Dispatch {
            workflow_id,
            git_ref,
            inputs,
        } => {
            let result = client
                .dispatch_workflow(workflow_id, &git_ref, &inputs)
                .await
                .map_err(display);
            AppEvent::Dispatched { git_ref, result }
        }
        Command::Rerun { run_id, mode } => AppEvent::RerunDone {
            run_id,
            mode,
            result: client.trigger_rerun(run_id, mode).await.map_err(display),
        },
        Command::CopyToClipboard(text) => AppEvent::ActionDone(
            client
                .copy_to_clipboard(&text)
                .await
                .map(|()| "✓ Logs copied to clipboard".to_string())
                .map_err(|e| format!("error copying logs: {e}")),
        ),
        Command::OpenUrl { .. } | Command::Schedule { .. } => return None,
    };
    Some(event)
}

fn display(e: color_eyre::eyre::Report) -> String {
    format!("{e}")
}
