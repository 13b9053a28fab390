use crate::app::{Job, PullRequest, RefOptions, Workflow, WorkflowInput, WorkflowRun};
use crate::command::RerunMode;
use crate::error::FetchError;
use crate::gh::parser::{self, RepoCoords};
use crate::logs::fetcher::{PipelineCoords, TimelineEntry};
use crate::logs::strip::{self, ContentKind};
use crate::traits::CiClient;
use async_trait::async_trait;
use color_eyre::eyre::{eyre, Result};
use reqwest::{header, RequestBuilder, Response, StatusCode};
use std::io::Read;
use std::time::{Duration, Instant};
use tokio::process::Command;

const GH_TIMEOUT: Duration = Duration::from_secs(30);
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(10);
const API_VERSION: &str = "2022-11-28";
const PR_PAGE_SIZE: usize = 50;
const PAGE_SIZE: usize = 100;

/// REST client for one repository. The `gh` CLI is used only at startup, to
/// resolve the repository and borrow its token.
pub struct GhClient {
    coords: RepoCoords,
    api_base: String,
    token: String,
    http: reqwest::Client,
    /// Stops at the first redirect so the blob location can be read.
    no_redirect: reqwest::Client,
}

impl GhClient {
    pub fn new(coords: RepoCoords, token: String) -> Result<Self> {
        let api_base = coords.api_base();
        Self::with_api_base(coords, token, api_base)
    }

    pub fn with_api_base(coords: RepoCoords, token: String, api_base: String) -> Result<Self> {
        let user_agent = concat!("tgh/", env!("CARGO_PKG_VERSION"));
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        let no_redirect = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(HTTP_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            coords,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            http,
            no_redirect,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{path}",
            self.api_base, self.coords.owner, self.coords.repo
        )
    }

    fn api(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Pipeline-service endpoints take the same token as basic auth with an
    /// empty user name.
    fn pipeline(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            builder
        } else {
            builder.basic_auth("", Some(&self.token))
        }
    }

    async fn get_text(&self, path: &str, context: &'static str) -> Result<String> {
        let url = self.repo_url(path);
        let resp = send(self.api(self.http.get(&url)), &url).await?;
        ensure_success(resp, context).await?.text().await.map_err(Into::into)
    }

    async fn post_json(&self, path: &str, body: serde_json::Value, context: &'static str) -> Result<()> {
        let url = self.repo_url(path);
        let resp = send(self.api(self.http.post(&url)).json(&body), &url).await?;
        ensure_success(resp, context).await?;
        Ok(())
    }
}

async fn send(builder: RequestBuilder, url: &str) -> Result<Response> {
    let start = Instant::now();
    let resp = builder.send().await?;
    tracing::debug!(
        url = %truncate_url(url),
        status = resp.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis(),
        "http request completed"
    );
    Ok(resp)
}

/// Signed blob URLs carry credentials in the query; keep them out of the log.
fn truncate_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

async fn ensure_success(resp: Response, context: &'static str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        Err(FetchError::UnexpectedStatus {
            context,
            status: status.as_u16(),
        }
        .into())
    } else {
        Err(eyre!("{context}: status {}: {message}", status.as_u16()))
    }
}

#[async_trait]
impl CiClient for GhClient {
    async fn list_runs(&self, limit: usize) -> Result<Vec<WorkflowRun>> {
        let body = self
            .get_text(&format!("actions/runs?per_page={limit}"), "list runs")
            .await?;
        parser::parse_runs(&body)
    }

    async fn list_runs_for_ref(&self, head_sha: &str, limit: usize) -> Result<Vec<WorkflowRun>> {
        let body = self
            .get_text(
                &format!("actions/runs?per_page={limit}&head_sha={head_sha}"),
                "list runs",
            )
            .await?;
        parser::parse_runs(&body)
    }

    async fn list_jobs(&self, run_id: u64) -> Result<Vec<Job>> {
        let body = self
            .get_text(
                &format!("actions/runs/{run_id}/jobs?per_page={PAGE_SIZE}"),
                "list jobs",
            )
            .await?;
        parser::parse_jobs(&body)
    }

    async fn get_full_log(&self, job_id: u64) -> Result<String> {
        let url = self.repo_url(&format!("actions/jobs/{job_id}/logs"));
        let resp = send(self.api(self.http.get(&url)), &url).await?;
        // Not archived yet.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(String::new());
        }
        let bytes = ensure_success(resp, "job log").await?.bytes().await?;
        check_log_size(bytes.len())?;
        match strip::sniff(&bytes) {
            ContentKind::Archive => decode_archive(&bytes),
            ContentKind::PlainText => Ok(strip::strip_timestamps(&String::from_utf8_lossy(&bytes))),
        }
    }

    async fn get_live_log_blob_location(&self, job_id: u64) -> Result<String> {
        let url = self.repo_url(&format!("actions/jobs/{job_id}/logs"));
        let resp = send(self.api(self.no_redirect.get(&url)), &url).await?;
        if resp.status() != StatusCode::FOUND {
            return Ok(String::new());
        }
        Ok(resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string())
    }

    async fn fetch_log_byte_range(&self, url: &str, offset: u64) -> Result<(Vec<u8>, u64)> {
        let mut req = self.http.get(url);
        if offset > 0 {
            req = req.header(header::RANGE, format!("bytes={offset}-"));
        }
        let resp = send(req, url).await?;
        match resp.status() {
            StatusCode::RANGE_NOT_SATISFIABLE => return Ok((Vec::new(), offset)),
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {}
            other => {
                return Err(FetchError::UnexpectedStatus {
                    context: "blob fetch",
                    status: other.as_u16(),
                }
                .into())
            }
        }
        let bytes = resp.bytes().await?;
        if strip::sniff(&bytes) == ContentKind::Archive {
            return Err(FetchError::ArchiveRange.into());
        }
        let next = offset + bytes.len() as u64;
        Ok((bytes.to_vec(), next))
    }

    async fn get_build_timeline(&self, coords: &PipelineCoords) -> Result<Vec<TimelineEntry>> {
        let url = coords.timeline_url();
        let req = self
            .pipeline(self.http.get(&url))
            .header(header::ACCEPT, "application/json");
        let resp = send(req, &url).await?;
        let body = ensure_success(resp, "build timeline").await?.text().await?;
        parser::parse_timeline(&body)
    }

    async fn fetch_step_log(&self, log_url: &str) -> Result<String> {
        let req = self
            .pipeline(self.http.get(log_url))
            .header(header::ACCEPT, "text/plain");
        let resp = send(req, log_url).await?;
        if resp.status() != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus {
                context: "step log",
                status: resp.status().as_u16(),
            }
            .into());
        }
        let body = resp.text().await?;
        Ok(strip::strip_timestamps(&body))
    }

    async fn trigger_rerun(&self, run_id: u64, mode: RerunMode) -> Result<()> {
        self.post_json(
            &format!("actions/runs/{run_id}/{}", mode.endpoint()),
            serde_json::json!({}),
            "rerun",
        )
        .await
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let body = self
            .get_text(&format!("pulls?state=open&per_page={PR_PAGE_SIZE}"), "list pull requests")
            .await?;
        parser::parse_pull_requests(&body)
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        let body = self
            .get_text(&format!("actions/workflows?per_page={PAGE_SIZE}"), "list workflows")
            .await?;
        parser::parse_workflows(&body)
    }

    async fn get_default_branch(&self) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}",
            self.api_base, self.coords.owner, self.coords.repo
        );
        let resp = send(self.api(self.http.get(&url)), &url).await?;
        let body = ensure_success(resp, "repository").await?.text().await?;
        parser::parse_default_branch(&body)
    }

    async fn get_workflow_inputs(&self, workflow: &Workflow) -> Result<Vec<WorkflowInput>> {
        let url = self.repo_url(&format!("contents/{}", workflow.path));
        let req = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github.raw")
            .header("X-GitHub-Api-Version", API_VERSION);
        let resp = send(req, &url).await?;
        let yaml = ensure_success(resp, "workflow file").await?.text().await?;
        parser::parse_workflow_inputs(&yaml)
    }

    async fn list_refs(&self) -> Result<RefOptions> {
        let branches = format!("branches?per_page={PAGE_SIZE}");
        let tags = format!("tags?per_page={PAGE_SIZE}");
        let (branches, tags) = tokio::try_join!(
            self.get_text(&branches, "list branches"),
            self.get_text(&tags, "list tags"),
        )?;
        Ok(RefOptions {
            branches: parser::parse_ref_names(&branches)?,
            tags: parser::parse_ref_names(&tags)?,
        })
    }

    async fn dispatch_workflow(
        &self,
        workflow_id: u64,
        git_ref: &str,
        inputs: &[(String, String)],
    ) -> Result<()> {
        let inputs: serde_json::Map<String, serde_json::Value> = inputs
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        self.post_json(
            &format!("actions/workflows/{workflow_id}/dispatches"),
            serde_json::json!({ "ref": git_ref, "inputs": inputs }),
            "dispatch",
        )
        .await
    }

    fn open_in_browser(&self, url: &str) -> Result<()> {
        open_in_browser_impl(url)
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        copy_to_clipboard_impl(text).await
    }
}

/// Completed jobs are served as a zip with one text file per step. Entries
/// are concatenated in archive order; unreadable entries are skipped.
fn decode_archive(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let mut out = String::new();
    for i in 0..archive.len() {
        let mut file = match archive.by_index(i) {
            Ok(f) if f.is_dir() => continue,
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(entry = i, "skipping unreadable log entry: {e}");
                continue;
            }
        };
        let mut raw = Vec::new();
        if let Err(e) = file.read_to_end(&mut raw) {
            tracing::warn!(entry = %file.name(), "skipping unreadable log entry: {e}");
            continue;
        }
        out.push_str(&strip::strip_timestamps(&String::from_utf8_lossy(&raw)));
    }
    check_log_size(out.len())?;
    Ok(out)
}

// ── Startup ──

pub async fn check_available() -> Result<()> {
    run_gh(&["auth", "status"]).await.map(|_| ())
}

/// Resolve host, owner and repository from the current directory's remote.
pub async fn detect_repo() -> Result<RepoCoords> {
    let output = run_gh(&["repo", "view", "--json", "url", "-q", ".url"]).await?;
    let url = output.trim();
    if url.is_empty() {
        return Err(eyre!(
            "Could not detect GitHub repository. Run tgh inside a directory with a GitHub remote."
        ));
    }
    parser::parse_repo_url(url)
}

pub async fn auth_token(host: &str) -> Result<String> {
    let output = run_gh(&["auth", "token", "--hostname", host]).await?;
    let token = output.trim().to_string();
    if token.is_empty() {
        return Err(eyre!("No gh token for {host}. Run `gh auth login --hostname {host}`."));
    }
    Ok(token)
}

async fn run_gh(args: &[&str]) -> Result<String> {
    let start = Instant::now();
    let output = tokio::time::timeout(GH_TIMEOUT, Command::new("gh").args(args).output())
        .await
        .map_err(|_| eyre!("gh command timed out after {}s", GH_TIMEOUT.as_secs()))?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!("gh CLI not found. Install it from https://cli.github.com/")
            } else {
                eyre!("Failed to run gh: {}", e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(eyre!("{}", classify_gh_error(&stderr)));
    }

    // `auth token` prints a secret; never log arguments past the subcommand.
    tracing::debug!(
        cmd = ?&args[..args.len().min(2)],
        elapsed_ms = start.elapsed().as_millis(),
        "gh command completed"
    );
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

const LOG_SIZE_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

fn check_log_size(len: usize) -> Result<()> {
    if len > LOG_SIZE_LIMIT {
        return Err(FetchError::TooLarge {
            size_mb: len as f64 / (1024.0 * 1024.0),
            max_mb: LOG_SIZE_LIMIT / (1024 * 1024),
        }
        .into());
    }
    Ok(())
}

/// Opens a URL in the user's default browser.
///
/// Uses compile-time detection for Windows/macOS, then runtime detection for WSL2
/// (which compiles as `target_os = "linux"` but needs `wslview` instead of `xdg-open`).
fn open_in_browser_impl(url: &str) -> Result<()> {
    use std::process::{Command, Stdio};

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(eyre!("Refusing to open non-HTTP URL: {url}"));
    }

    if cfg!(target_os = "windows") {
        // Empty "" title keeps the URL from being taken as the window title
        return Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| eyre!("Failed to open browser: {e}"));
    }

    let wsl = std::env::var_os("WSL_DISTRO_NAME").is_some();
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if wsl {
        "wslview"
    } else {
        "xdg-open"
    };

    match Command::new(opener)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(eyre!("Failed to open browser with {opener}: {e}")),
    }

    if wsl {
        return Command::new("cmd.exe")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| eyre!("Failed to open browser via cmd.exe: {e}"));
    }

    Err(eyre!(
        "No browser opener found. On WSL install wslu; on Linux install xdg-utils."
    ))
}

async fn copy_to_clipboard_impl(text: &str) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let candidates: &[(&str, &[&str])] = if cfg!(target_os = "macos") {
        &[("pbcopy", &[])]
    } else if cfg!(target_os = "windows") {
        &[("clip.exe", &[])]
    } else {
        // WSL first, then Wayland, then X11
        &[
            ("clip.exe", &[]),
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
        ]
    };

    for (cmd, args) in candidates {
        let child = Command::new(cmd)
            .args(*args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();

        if let Ok(mut child) = child {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(text.as_bytes())
                    .await
                    .map_err(|e| eyre!("Failed to write to clipboard: {e}"))?;
                drop(stdin);
            }
            let status = tokio::time::timeout(CLIPBOARD_TIMEOUT, child.wait())
                .await
                .map_err(|_| {
                    eyre!(
                        "clipboard command timed out after {}s",
                        CLIPBOARD_TIMEOUT.as_secs()
                    )
                })??;
            if status.success() {
                return Ok(());
            }
        }
    }

    Err(eyre!(
        "No clipboard tool found. Install xclip, wl-copy, or use WSL with clip.exe"
    ))
}

pub fn classify_gh_error(stderr: &str) -> String {
    if stderr.contains("not logged") || stderr.contains("auth login") {
        "Not authenticated with gh. Run `gh auth login` first.".to_string()
    } else if stderr.contains("not a git repository") || stderr.contains("could not determine") {
        "Not in a GitHub repository. Pass REPO_PATH or cd into a repo.".to_string()
    } else {
        let trimmed = stderr.trim();
        if trimmed.is_empty() {
            "gh command failed".to_string()
        } else {
            format!("gh command failed: {trimmed}")
        }
    }
}
