//! Terminal input thread and application event channel.
//!
//! [`EventHandler`] spawns an OS thread (not a tokio task) because
//! `crossterm::event::poll()` blocks and would starve the async runtime. Drop
//! signals shutdown without joining to avoid deadlocking if `poll` blocks
//! during panic unwinding.

use crate::app::{Job, PullRequest, RefOptions, Workflow, WorkflowInput, WorkflowRun};
use crate::command::RerunMode;
use crate::logs::fetcher::{LiveCursor, LivePoll};
use crate::poll::Timer;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// Fetch results carry the error as a display string; the view only ever
/// shows it as a status message.
pub type FetchResult<T> = Result<T, String>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    Timer(Timer),
    RunsLoaded(FetchResult<Vec<WorkflowRun>>),
    JobsLoaded {
        run_id: u64,
        result: FetchResult<Vec<Job>>,
    },
    FullLogLoaded {
        job_id: u64,
        session: u64,
        result: FetchResult<String>,
    },
    LiveLogLoaded {
        job_id: u64,
        session: u64,
        /// Cursor and buffer length the poll started from; a result is only
        /// merged while the view still holds both.
        base: LiveCursor,
        raw_len: usize,
        result: FetchResult<LivePoll>,
    },
    PullRequestsLoaded(FetchResult<Vec<PullRequest>>),
    WorkflowsLoaded(FetchResult<Vec<Workflow>>),
    DefaultBranchLoaded(FetchResult<String>),
    WorkflowInputsLoaded {
        workflow: Workflow,
        result: FetchResult<Vec<WorkflowInput>>,
    },
    RefsLoaded(FetchResult<RefOptions>),
    Dispatched {
        git_ref: String,
        result: FetchResult<()>,
    },
    RerunDone {
        run_id: u64,
        mode: RerunMode,
        result: FetchResult<()>,
    },
    /// Browser and clipboard outcomes: `Ok` carries the confirmation text.
    ActionDone(FetchResult<String>),
    /// Transient status message, e.g. a crashed background task.
    Error(String),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread = {
            let tx = tx.clone();
            let shutdown = Arc::clone(&shutdown);
            std::thread::spawn(move || input_loop(&tx, &shutdown, tick_rate))
        };
        Self {
            rx,
            tx,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let Some(handle) = self.thread.take() else {
            return;
        };
        if let Err(payload) = handle.join() {
            tracing::error!("input thread panicked: {}", panic_message(payload));
        }
    }
}

/// Polls the terminal until shutdown or until the receiver is gone. A quiet
/// poll interval becomes a `Tick`.
fn input_loop(tx: &mpsc::UnboundedSender<AppEvent>, shutdown: &AtomicBool, tick_rate: Duration) {
    while !shutdown.load(Ordering::Relaxed) {
        let next = match event::poll(tick_rate) {
            Ok(false) => Some(AppEvent::Tick),
            Ok(true) => match event::read() {
                Ok(ev) => translate(ev),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => None,
                Err(e) => {
                    let _ = tx.send(AppEvent::Error(format!("terminal read failed: {e}")));
                    return;
                }
            },
            Err(e) => {
                let _ = tx.send(AppEvent::Error(format!("terminal poll failed: {e}")));
                return;
            }
        };
        if let Some(ev) = next {
            if tx.send(ev).is_err() {
                return;
            }
        }
    }
}

fn translate(ev: CrosstermEvent) -> Option<AppEvent> {
    match ev {
        CrosstermEvent::Key(key) => Some(AppEvent::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "unknown panic".to_string(), |s| (*s).to_string()),
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        // Only signal; joining here could deadlock while `poll` blocks.
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
