use crate::app::{InputKind, Job, PullRequest, Workflow, WorkflowInput, WorkflowRun};
use crate::logs::fetcher::TimelineEntry;
use color_eyre::eyre::{eyre, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct RunsResponse {
    workflow_runs: Vec<WorkflowRun>,
}

pub fn parse_runs(json: &str) -> Result<Vec<WorkflowRun>> {
    let resp: RunsResponse = serde_json::from_str(json)?;
    Ok(resp.workflow_runs)
}

#[derive(Deserialize)]
struct JobsResponse {
    jobs: Vec<Job>,
}

pub fn parse_jobs(json: &str) -> Result<Vec<Job>> {
    let resp: JobsResponse = serde_json::from_str(json)?;
    Ok(resp.jobs)
}

pub fn parse_pull_requests(json: &str) -> Result<Vec<PullRequest>> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Deserialize)]
struct WorkflowsResponse {
    workflows: Vec<Workflow>,
}

pub fn parse_workflows(json: &str) -> Result<Vec<Workflow>> {
    let resp: WorkflowsResponse = serde_json::from_str(json)?;
    Ok(resp.workflows)
}

#[derive(Deserialize)]
struct RepoResponse {
    #[serde(default)]
    default_branch: Option<String>,
}

pub fn parse_default_branch(json: &str) -> Result<String> {
    let resp: RepoResponse = serde_json::from_str(json)?;
    resp.default_branch
        .filter(|b| !b.is_empty())
        .ok_or_else(|| eyre!("repository has no default branch"))
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

/// Branch and tag listings share the `[{ "name": ... }]` shape.
pub fn parse_ref_names(json: &str) -> Result<Vec<String>> {
    let refs: Vec<NamedRef> = serde_json::from_str(json)?;
    Ok(refs.into_iter().map(|r| r.name).collect())
}

/// Step-to-log mapping from a pipeline build timeline.
///
/// The schema varies between service versions, so it is read field by field:
/// records come from `records` or `value`, the log URL from `log.url` and then
/// `logUrl`. Only `Task` records, or records without a type, name a step.
pub fn parse_timeline(json: &str) -> Result<Vec<TimelineEntry>> {
    let root: Value = serde_json::from_str(json)?;
    let records = root
        .get("records")
        .and_then(Value::as_array)
        .or_else(|| root.get("value").and_then(Value::as_array))
        .ok_or_else(|| eyre!("build timeline has no records"))?;

    Ok(records
        .iter()
        .filter(|rec| {
            rec.get("type")
                .and_then(Value::as_str)
                .is_none_or(|t| t == "Task")
        })
        .filter_map(|rec| {
            let step_name = rec.get("name")?.as_str()?;
            let log_url = rec
                .get("log")
                .and_then(|l| l.get("url"))
                .and_then(Value::as_str)
                .or_else(|| rec.get("logUrl").and_then(Value::as_str))
                .filter(|u| !u.is_empty())?;
            Some(TimelineEntry {
                step_name: step_name.to_string(),
                log_url: log_url.to_string(),
            })
        })
        .collect())
}

/// `on.workflow_dispatch.inputs` of a workflow file, in declaration order.
/// A workflow without a dispatch trigger, or one that takes no inputs, yields
/// an empty list.
pub fn parse_workflow_inputs(yaml: &str) -> Result<Vec<WorkflowInput>> {
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    // YAML 1.1 readers turn a bare `on` key into `true`; accept both.
    let on = doc
        .get("on")
        .or_else(|| doc.get(serde_yaml::Value::Bool(true)));
    let Some(inputs) = on
        .and_then(|on| on.get("workflow_dispatch"))
        .and_then(|wd| wd.get("inputs"))
        .and_then(serde_yaml::Value::as_mapping)
    else {
        return Ok(Vec::new());
    };

    Ok(inputs
        .iter()
        .filter_map(|(name, decl)| {
            let name = name.as_str()?.to_string();
            let kind = match decl.get("type").and_then(serde_yaml::Value::as_str) {
                Some("boolean") => InputKind::Boolean,
                Some("choice") => InputKind::Choice,
                Some("environment") => InputKind::Environment,
                _ => InputKind::String,
            };
            let options = decl
                .get("options")
                .and_then(serde_yaml::Value::as_sequence)
                .map(|opts| opts.iter().filter_map(yaml_scalar).collect())
                .unwrap_or_default();
            Some(WorkflowInput {
                name,
                description: decl
                    .get("description")
                    .and_then(yaml_scalar)
                    .unwrap_or_default(),
                kind,
                default: decl.get("default").and_then(yaml_scalar).unwrap_or_default(),
                required: decl
                    .get("required")
                    .is_some_and(|r| r.as_bool() == Some(true) || r.as_str() == Some("true")),
                options,
            })
        })
        .collect())
}

fn yaml_scalar(v: &serde_yaml::Value) -> Option<String> {
    match v {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Host and repository identity resolved from the remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoords {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl RepoCoords {
    /// REST root: the public API for github.com, `/api/v3` on Enterprise hosts.
    pub fn api_base(&self) -> String {
        if self.host == "github.com" {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", self.host)
        }
    }
}

/// Accepts `https://host/owner/repo[.git]` and `git@host:owner/repo[.git]`.
pub fn parse_repo_url(raw: &str) -> Result<RepoCoords> {
    let raw = raw.trim();
    let normalized = match raw.strip_prefix("git@") {
        Some(rest) => format!("ssh://{}", rest.replacen(':', "/", 1)),
        None => raw.to_string(),
    };
    let parsed =
        url::Url::parse(&normalized).map_err(|e| eyre!("invalid repository URL {raw}: {e}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| eyre!("repository URL has no host: {raw}"))?;
    let mut segments = parsed
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some(owner), Some(repo)) => Ok(RepoCoords {
            host: host.to_string(),
            owner: owner.to_string(),
            repo: repo.trim_end_matches(".git").to_string(),
        }),
        _ => Err(eyre!("could not find owner/repo in {raw}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Conclusion, RunStatus};
    use pretty_assertions::assert_eq;

    const RUNS_JSON: &str = r#"{
        "total_count": 1,
        "workflow_runs": [{
            "id": 123,
            "name": "CI",
            "display_title": "Fix flaky test",
            "status": "completed",
            "conclusion": "success",
            "head_branch": "main",
            "head_sha": "abc123",
            "event": "push",
            "run_number": 42,
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-15T10:05:00Z",
            "html_url": "https://github.com/o/r/actions/runs/123"
        }]
    }"#;

    #[test]
    fn parse_single_completed_run() {
        let runs = parse_runs(RUNS_JSON).unwrap();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.id, 123);
        assert_eq!(run.display_title, "Fix flaky test");
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.conclusion, Some(Conclusion::Success));
        assert_eq!(run.head_sha, "abc123");
        assert_eq!(run.run_number, 42);
    }

    #[test]
    fn parse_run_with_null_name_and_conclusion() {
        let json = r#"{"workflow_runs": [{
            "id": 1, "name": null, "status": "in_progress", "conclusion": null,
            "head_branch": null, "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }]}"#;
        let runs = parse_runs(json).unwrap();
        assert_eq!(runs[0].name, "");
        assert_eq!(runs[0].head_branch, "");
        assert_eq!(runs[0].status, RunStatus::InProgress);
        assert_eq!(runs[0].conclusion, None);
    }

    #[test]
    fn parse_runs_unknown_status() {
        let json = r#"{"workflow_runs": [{
            "id": 1, "status": "something_new", "conclusion": "mystery",
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
        }]}"#;
        let runs = parse_runs(json).unwrap();
        assert_eq!(runs[0].status, RunStatus::Unknown);
        assert_eq!(runs[0].conclusion, Some(Conclusion::Unknown));
    }

    #[test]
    fn parse_runs_invalid_wrapper_error() {
        assert!(parse_runs("[]").is_err());
        assert!(parse_runs("not json").is_err());
    }

    #[test]
    fn parse_jobs_with_steps() {
        let json = r#"{"total_count": 1, "jobs": [{
            "id": 7, "name": "build", "status": "in_progress", "conclusion": null,
            "started_at": "2024-01-15T10:00:00Z", "completed_at": null,
            "html_url": "https://github.com/o/r/actions/runs/1/job/7",
            "steps": [
                {"name": "Set up job", "status": "completed", "conclusion": "success", "number": 1,
                 "started_at": "2024-01-15T10:00:00Z", "completed_at": "2024-01-15T10:00:02Z"},
                {"name": "Run tests", "status": "in_progress", "conclusion": null, "number": 2,
                 "started_at": "2024-01-15T10:00:02Z", "completed_at": null}
            ]
        }]}"#;
        let jobs = parse_jobs(json).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].steps.len(), 2);
        assert_eq!(jobs[0].completed_steps(), 1);
        assert_eq!(jobs[0].current_step().map(|s| s.number), Some(2));
        assert!(jobs[0].completed_at.is_none());
    }

    #[test]
    fn parse_jobs_null_steps() {
        let json = r#"{"jobs": [{
            "id": 7, "name": "queued", "status": "queued", "conclusion": null,
            "started_at": null, "completed_at": null, "steps": null
        }]}"#;
        let jobs = parse_jobs(json).unwrap();
        assert!(jobs[0].steps.is_empty());
        assert_eq!(jobs[0].html_url, "");
    }

    #[test]
    fn parse_pull_request_list() {
        let json = r#"[{
            "number": 12, "title": "Add dispatch form", "draft": true,
            "html_url": "https://github.com/o/r/pull/12",
            "user": {"login": "octocat"},
            "head": {"ref": "feature/dispatch", "sha": "deadbeef"},
            "updated_at": "2024-01-15T10:00:00Z"
        }]"#;
        let prs = parse_pull_requests(json).unwrap();
        assert_eq!(prs[0].number, 12);
        assert!(prs[0].draft);
        assert_eq!(prs[0].user.login, "octocat");
        assert_eq!(prs[0].head.ref_name, "feature/dispatch");
        assert_eq!(prs[0].head.sha, "deadbeef");
    }

    #[test]
    fn parse_workflow_list() {
        let json = r#"{"total_count": 2, "workflows": [
            {"id": 1, "name": "CI", "path": ".github/workflows/ci.yml", "state": "active"},
            {"id": 2, "name": "Release", "path": ".github/workflows/release.yml", "state": null}
        ]}"#;
        let wfs = parse_workflows(json).unwrap();
        assert_eq!(wfs.len(), 2);
        assert_eq!(wfs[1].path, ".github/workflows/release.yml");
        assert_eq!(wfs[1].state, "");
    }

    #[test]
    fn default_branch_present_and_missing() {
        assert_eq!(
            parse_default_branch(r#"{"default_branch": "trunk"}"#).unwrap(),
            "trunk"
        );
        assert!(parse_default_branch(r#"{"name": "r"}"#).is_err());
    }

    #[test]
    fn ref_names() {
        let names = parse_ref_names(r#"[{"name": "main"}, {"name": "dev", "protected": false}]"#)
            .unwrap();
        assert_eq!(names, vec!["main", "dev"]);
    }

    // --- Timeline ---

    #[test]
    fn timeline_records_with_nested_log_url() {
        let json = r#"{"records": [
            {"type": "Job", "name": "build", "log": {"url": "https://x/logs/1"}},
            {"type": "Task", "name": "Run tests", "log": {"url": "https://x/logs/4"}},
            {"type": "Task", "name": "Pending step", "log": null}
        ]}"#;
        let entries = parse_timeline(json).unwrap();
        assert_eq!(
            entries,
            vec![TimelineEntry {
                step_name: "Run tests".to_string(),
                log_url: "https://x/logs/4".to_string(),
            }]
        );
    }

    #[test]
    fn timeline_value_array_and_flat_log_url() {
        let json = r#"{"count": 1, "value": [
            {"name": "Checkout", "logUrl": "https://x/logs/2"}
        ]}"#;
        let entries = parse_timeline(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].step_name, "Checkout");
        assert_eq!(entries[0].log_url, "https://x/logs/2");
    }

    #[test]
    fn timeline_nested_url_wins_over_flat() {
        let json = r#"{"records": [
            {"type": "Task", "name": "s", "log": {"url": "nested"}, "logUrl": "flat"}
        ]}"#;
        assert_eq!(parse_timeline(json).unwrap()[0].log_url, "nested");
    }

    #[test]
    fn timeline_without_records_is_error() {
        assert!(parse_timeline(r#"{"id": 1}"#).is_err());
    }

    // --- Workflow inputs ---

    #[test]
    fn workflow_inputs_in_declaration_order() {
        let yaml = r#"
name: Deploy
on:
  workflow_dispatch:
    inputs:
      environment:
        description: Target environment
        type: choice
        required: true
        options: [staging, production]
        default: staging
      dry_run:
        type: boolean
        default: false
      note:
        description: Free text
  push:
    branches: [main]
"#;
        let inputs = parse_workflow_inputs(yaml).unwrap();
        let names: Vec<&str> = inputs.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["environment", "dry_run", "note"]);
        assert_eq!(inputs[0].kind, InputKind::Choice);
        assert!(inputs[0].required);
        assert_eq!(inputs[0].options, vec!["staging", "production"]);
        assert_eq!(inputs[0].default, "staging");
        assert_eq!(inputs[1].kind, InputKind::Boolean);
        assert_eq!(inputs[1].default, "false");
        assert_eq!(inputs[2].kind, InputKind::String);
        assert!(!inputs[2].required);
    }

    #[test]
    fn workflow_without_dispatch_inputs() {
        assert!(parse_workflow_inputs("on: [push, workflow_dispatch]\n")
            .unwrap()
            .is_empty());
        assert!(parse_workflow_inputs("on:\n  workflow_dispatch:\n")
            .unwrap()
            .is_empty());
        assert!(parse_workflow_inputs("name: x\n").unwrap().is_empty());
    }

    #[test]
    fn workflow_inputs_invalid_yaml_error() {
        assert!(parse_workflow_inputs("on: [unclosed").is_err());
    }

    // --- Repository URL ---

    #[test]
    fn repo_url_https() {
        let coords = parse_repo_url("https://github.com/octo/hello.git\n").unwrap();
        assert_eq!(
            coords,
            RepoCoords {
                host: "github.com".to_string(),
                owner: "octo".to_string(),
                repo: "hello".to_string(),
            }
        );
        assert_eq!(coords.api_base(), "https://api.github.com");
    }

    #[test]
    fn repo_url_ssh_enterprise() {
        let coords = parse_repo_url("git@ghe.corp.example:team/service.git").unwrap();
        assert_eq!(coords.host, "ghe.corp.example");
        assert_eq!(coords.owner, "team");
        assert_eq!(coords.repo, "service");
        assert_eq!(coords.api_base(), "https://ghe.corp.example/api/v3");
    }

    #[test]
    fn repo_url_missing_repo_error() {
        assert!(parse_repo_url("https://github.com/octo").is_err());
        assert!(parse_repo_url("").is_err());
    }
}
