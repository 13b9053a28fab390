use crate::app::Job;
use std::collections::{HashMap, HashSet};

/// Remembers the last job list seen per run so a rerun can be followed: after
/// a rerun the first list containing a job id we have not seen before is the
/// one carrying the re-triggered attempt.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    last_jobs_for_run: HashMap<u64, Vec<Job>>,
    /// Run that was re-triggered and its job ids at that moment. While set,
    /// lists for that run that bring no new id are stale and are dropped.
    poll_start_ids: Option<(u64, HashSet<u64>)>,
}

/// What `update` should do with a freshly fetched job list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobsVerdict {
    /// Still showing the pre-rerun attempt. Ignore the fetch entirely.
    Stale,
    /// Replace the displayed list. `jump_to` names the first new job id when
    /// the list differs from the previous snapshot of the same run.
    Apply { jump_to: Option<u64> },
}

/// Ids present in `new` but not in `old`, in `new` order.
pub fn new_jobs(old: &[Job], new: &[Job]) -> Vec<u64> {
    let seen: HashSet<u64> = old.iter().map(|j| j.id).collect();
    new.iter()
        .map(|j| j.id)
        .filter(|id| !seen.contains(id))
        .collect()
}

impl JobTracker {
    /// Snapshot the ids currently displayed, right after a rerun of `run_id`
    /// succeeds.
    pub fn mark_rerun(&mut self, run_id: u64, current: &[Job]) {
        self.poll_start_ids = Some((run_id, current.iter().map(|j| j.id).collect()));
    }

    pub fn clear_rerun(&mut self) {
        self.poll_start_ids = None;
    }

    pub fn awaiting_rerun(&self) -> bool {
        self.poll_start_ids.is_some()
    }

    /// Merge a job list for `run_id` into the cache and decide how to treat it.
    pub fn observe(&mut self, run_id: u64, jobs: &[Job]) -> JobsVerdict {
        let rerun_jump = match &self.poll_start_ids {
            Some((rerun_id, start)) if *rerun_id == run_id => {
                let Some(first) = jobs.iter().find(|j| !start.contains(&j.id)) else {
                    return JobsVerdict::Stale;
                };
                let id = first.id;
                self.poll_start_ids = None;
                Some(id)
            }
            _ => None,
        };

        let jump_to = rerun_jump.or_else(|| {
            self.last_jobs_for_run
                .get(&run_id)
                .and_then(|old| new_jobs(old, jobs).first().copied())
        });
        self.last_jobs_for_run.insert(run_id, jobs.to_vec());
        JobsVerdict::Apply { jump_to }
    }

    pub fn cached(&self, run_id: u64) -> Option<&[Job]> {
        self.last_jobs_for_run.get(&run_id).map(Vec::as_slice)
    }
}
