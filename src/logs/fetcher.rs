//! Incremental log retrieval for running jobs.
//!
//! Three strategies are tried in a fixed order of preference. Each attempt
//! yields a tri-state [`LiveOutcome`]: `Data` is merged, `NotReady` retries the
//! same strategy on the next poll, and `Unsupported` moves permanently to the
//! next strategy for the current job. Progress lives in a [`LiveCursor`] that
//! the caller keeps in its snapshot and hands back on every poll.
//!
//! Completed jobs skip all of this: one `get_full_log` call fetches the archive.

use crate::app::{Conclusion, RunStatus, Step};
use crate::error::FetchError;
use crate::logs::strip;
use crate::traits::CiClient;
use color_eyre::eyre::Result;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Per-step logs resolved through the pipeline service's build timeline.
    StepTimeline,
    /// `Range: bytes=N-` reads against the live append blob.
    ByteRange,
    /// Re-download the whole log and keep whatever extends the buffer.
    Refetch,
}

pub const STRATEGIES: [Strategy; 3] = [Strategy::StepTimeline, Strategy::ByteRange, Strategy::Refetch];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveOutcome {
    Data(String),
    NotReady,
    Unsupported,
}

/// Coordinates of a job inside the pipeline service that backs GHES logs,
/// recovered from a signed log URL of the form
/// `https://host/_services/pipelines/{token}/_apis/pipelines/{id}/runs/{run}/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCoords {
    /// Scheme, host and path up to (not including) `/_apis`.
    pub service_base: String,
    pub pipeline_id: u64,
    pub run_id: u64,
}

impl PipelineCoords {
    pub fn from_log_url(raw: &str) -> Option<Self> {
        let parsed = url::Url::parse(raw).ok()?;
        let path = parsed.path();
        if !path.contains("/_services/pipelines/") {
            return None;
        }
        let parts: Vec<&str> = path.split('/').collect();
        let apis = parts.iter().position(|p| *p == "_apis")?;
        if apis + 5 > parts.len() {
            return None;
        }
        let pipeline_id = parts[apis + 2].parse().ok()?;
        let run_id = parts[apis + 4].parse().ok()?;
        let host = parsed.host_str()?;
        let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
        Some(Self {
            service_base: format!(
                "{}://{host}{port}{}",
                parsed.scheme(),
                parts[..apis].join("/")
            ),
            pipeline_id,
            run_id,
        })
    }

    pub fn timeline_url(&self) -> String {
        format!(
            "{}/_apis/build/builds/{}/timeline?api-version=5.0",
            self.service_base, self.run_id
        )
    }
}

/// One step-to-log mapping from the build timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub step_name: String,
    pub log_url: String,
}

/// Per-job progress through the strategies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveCursor {
    /// Index into [`STRATEGIES`].
    pub strategy: usize,
    /// Highest step number already merged. Never decreases.
    pub high_water: u64,
    /// Bytes consumed from the live blob.
    pub offset: u64,
    /// Leading bytes of a character cut off by the last range read; they
    /// are prepended to the next one.
    pub partial: Vec<u8>,
    pub pipeline: Option<PipelineCoords>,
}

impl LiveCursor {
    pub fn strategy(&self) -> Strategy {
        STRATEGIES[self.strategy.min(STRATEGIES.len() - 1)]
    }
}

/// Result of one poll: the advanced cursor and text ready to append verbatim
/// (any separator already included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePoll {
    pub cursor: LiveCursor,
    pub text: String,
}

/// Run one poll against the current strategy, falling through to the next on
/// `Unsupported`. `raw_len` is the size of the caller's buffer, used both to
/// decide separators and to diff a full re-fetch.
pub async fn poll_live(
    client: &dyn CiClient,
    job_id: u64,
    steps: &[Step],
    raw_len: usize,
    cursor: &LiveCursor,
) -> Result<LivePoll> {
    let mut next = cursor.clone();
    loop {
        let outcome = match next.strategy() {
            Strategy::StepTimeline => step_timeline(client, job_id, steps, raw_len, &mut next).await?,
            Strategy::ByteRange => byte_range(client, job_id, &mut next).await?,
            Strategy::Refetch => refetch(client, job_id, raw_len).await?,
        };
        match outcome {
            LiveOutcome::Data(text) => return Ok(LivePoll { cursor: next, text }),
            LiveOutcome::NotReady => {
                return Ok(LivePoll {
                    cursor: next,
                    text: String::new(),
                })
            }
            LiveOutcome::Unsupported if next.strategy + 1 < STRATEGIES.len() => {
                tracing::debug!(
                    job_id,
                    from = ?next.strategy(),
                    "live log strategy unsupported, falling back"
                );
                next.strategy += 1;
            }
            LiveOutcome::Unsupported => {
                return Ok(LivePoll {
                    cursor: next,
                    text: String::new(),
                })
            }
        }
    }
}

async fn step_timeline(
    client: &dyn CiClient,
    job_id: u64,
    steps: &[Step],
    raw_len: usize,
    cursor: &mut LiveCursor,
) -> Result<LiveOutcome> {
    let coords = if let Some(coords) = &cursor.pipeline {
        coords.clone()
    } else {
        let location = client.get_live_log_blob_location(job_id).await?;
        if location.is_empty() {
            return Ok(LiveOutcome::NotReady);
        }
        let Some(coords) = PipelineCoords::from_log_url(&location) else {
            return Ok(LiveOutcome::Unsupported);
        };
        cursor.pipeline = Some(coords.clone());
        coords
    };

    let timeline = client.get_build_timeline(&coords).await?;
    let urls: HashMap<&str, &str> = timeline
        .iter()
        .map(|e| (e.step_name.as_str(), e.log_url.as_str()))
        .collect();

    let mut pending: Vec<&Step> = steps
        .iter()
        .filter(|s| s.status == RunStatus::Completed && s.number > cursor.high_water)
        .collect();
    pending.sort_by_key(|s| s.number);

    // The mark only moves across an unbroken prefix of steps, so a step
    // whose log is not reachable yet is retried next poll and later steps
    // wait behind it instead of being merged out of order.
    let mut chunks = Vec::new();
    let mut high_water = cursor.high_water;
    for step in pending {
        if step.conclusion == Some(Conclusion::Skipped) {
            high_water = step.number;
            continue;
        }
        let Some(url) = urls.get(step.name.as_str()) else {
            tracing::debug!(job_id, step = step.number, name = %step.name, "no timeline record for step");
            break;
        };
        match client.fetch_step_log(url).await {
            Ok(content) => {
                chunks.push(content.trim_end_matches('\n').to_string());
                high_water = step.number;
            }
            Err(e) => {
                tracing::warn!(job_id, step = step.number, "step log fetch failed: {e}");
                break;
            }
        }
    }

    if high_water == cursor.high_water {
        return Ok(LiveOutcome::NotReady);
    }
    cursor.high_water = high_water;
    let mut text = chunks.join("\n");
    if raw_len > 0 && !text.is_empty() {
        text.insert(0, '\n');
    }
    Ok(LiveOutcome::Data(text))
}

async fn byte_range(client: &dyn CiClient, job_id: u64, cursor: &mut LiveCursor) -> Result<LiveOutcome> {
    let location = client.get_live_log_blob_location(job_id).await?;
    if location.is_empty() {
        return Ok(LiveOutcome::NotReady);
    }
    match client.fetch_log_byte_range(&location, cursor.offset).await {
        Ok((_, new_offset)) if new_offset == cursor.offset => Ok(LiveOutcome::NotReady),
        Ok((bytes, new_offset)) => {
            cursor.offset = new_offset;
            let mut buf = std::mem::take(&mut cursor.partial);
            buf.extend_from_slice(&bytes);
            let cut = buf.len() - incomplete_tail(&buf);
            cursor.partial = buf.split_off(cut);
            Ok(LiveOutcome::Data(strip::strip_timestamps(&String::from_utf8_lossy(&buf))))
        }
        Err(e) if matches!(e.downcast_ref::<FetchError>(), Some(FetchError::ArchiveRange)) => {
            tracing::warn!(job_id, "live blob is an archive: {e}");
            Ok(LiveOutcome::Unsupported)
        }
        Err(e) => Err(e),
    }
}

/// Length of a UTF-8 sequence left unfinished at the end of `bytes`.
fn incomplete_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let needed = match b {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if needed > back { back } else { 0 };
    }
    0
}

async fn refetch(client: &dyn CiClient, job_id: u64, raw_len: usize) -> Result<LiveOutcome> {
    let full = client.get_full_log(job_id).await?;
    if full.len() <= raw_len {
        return Ok(LiveOutcome::NotReady);
    }
    Ok(full
        .get(raw_len..)
        .map_or(LiveOutcome::NotReady, |tail| LiveOutcome::Data(tail.to_string())))
}
