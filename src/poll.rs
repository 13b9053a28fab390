//! Poll loop bookkeeping.
//!
//! Each loop (runs list, jobs list, live log) is a chain of one-shot timers:
//! a fired timer that is still wanted schedules its successor. Starting a loop
//! bumps its generation, so a timer left over from an earlier start is
//! recognised as stale when it fires and the chain it belonged to dies. At
//! most one live chain per kind exists at any time.

use crate::command::Command;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollKind {
    Runs,
    Jobs,
    Log,
}

/// Delivered back to `update` when a scheduled delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: PollKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Chain {
    active: bool,
    generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollScheduler {
    runs: Chain,
    jobs: Chain,
    log: Chain,
}

impl PollScheduler {
    fn chain(&self, kind: PollKind) -> &Chain {
        match kind {
            PollKind::Runs => &self.runs,
            PollKind::Jobs => &self.jobs,
            PollKind::Log => &self.log,
        }
    }

    fn chain_mut(&mut self, kind: PollKind) -> &mut Chain {
        match kind {
            PollKind::Runs => &mut self.runs,
            PollKind::Jobs => &mut self.jobs,
            PollKind::Log => &mut self.log,
        }
    }

    pub fn is_active(&self, kind: PollKind) -> bool {
        self.chain(kind).active
    }

    /// Begin a fresh chain, invalidating any timer already in flight.
    pub fn start(&mut self, kind: PollKind, after: Duration) -> Command {
        let chain = self.chain_mut(kind);
        chain.active = true;
        chain.generation = chain.generation.wrapping_add(1);
        Command::Schedule {
            timer: Timer {
                kind,
                generation: chain.generation,
            },
            after,
        }
    }

    /// Start only if no chain is running. Returns `None` when one already is.
    pub fn ensure(&mut self, kind: PollKind, after: Duration) -> Option<Command> {
        (!self.is_active(kind)).then(|| self.start(kind, after))
    }

    pub fn stop(&mut self, kind: PollKind) {
        self.chain_mut(kind).active = false;
    }

    /// Whether `timer` belongs to the current, still-wanted chain.
    pub fn on_fire(&self, timer: Timer) -> bool {
        let chain = self.chain(timer.kind);
        chain.active && chain.generation == timer.generation
    }

    /// Successor timer for a chain that just fired.
    pub fn next(&self, kind: PollKind, after: Duration) -> Command {
        Command::Schedule {
            timer: Timer {
                kind,
                generation: self.chain(kind).generation,
            },
            after,
        }
    }
}
