use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::agent::scheduler::{Debounce, RetrySchedule};
use crate::dom::document::{EventKind, NodeId};

pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(500);
pub const REBIND_DELAY: Duration = Duration::from_millis(1000);
pub const RETRY_INTERVAL: Duration = Duration::from_millis(1000);
/// Retries after the initial restore check at load.
pub const MAX_RESTORE_ATTEMPTS: u32 = 10;

/// Events a field listener registers for.
pub const TRACKED_EVENTS: [EventKind; 3] = [EventKind::Input, EventKind::Change, EventKind::Keyup];

/// Everything that can wake a page agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A tracked event fired on (or bubbled from) a bound field
    Field { node: NodeId, kind: EventKind },
    /// Structural change somewhere in the document
    DomMutated,
    /// User asked for a restore (the floating restore control)
    RestoreRequested,
    /// Document is being torn down
    Unload,
}

/// User-facing feedback that a host may render as a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notice {
    Restored(usize),
    NothingToRestore,
    RestoreFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Restored(n) => write!(f, "Restored {} fields", n),
            Notice::NothingToRestore => write!(f, "No saved data for this page"),
            Notice::RestoreFailed(e) => write!(f, "Restore failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(usize),
    /// Every field was blank; nothing was written
    Empty,
    Ineligible,
}

/// Timing knobs for a page agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub autosave_delay: Duration,
    pub rebind_delay: Duration,
    pub retry_interval: Duration,
    /// Restore retries after the check at load
    pub max_restore_attempts: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            autosave_delay: AUTOSAVE_DELAY,
            rebind_delay: REBIND_DELAY,
            retry_interval: RETRY_INTERVAL,
            max_restore_attempts: MAX_RESTORE_ATTEMPTS,
        }
    }
}

/// Mutable state of one page agent. Owned by that agent alone; nothing is
/// shared between documents.
#[derive(Debug)]
pub struct PageAgentState {
    pub eligible: bool,
    pub observer_armed: bool,
    pub autosave: Debounce,
    pub rebind: Debounce,
    pub retry: RetrySchedule,
    /// Fields that already carry our listeners
    pub bound: HashSet<NodeId>,
}

impl PageAgentState {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            eligible: false,
            observer_armed: false,
            autosave: Debounce::new(config.autosave_delay),
            rebind: Debounce::new(config.rebind_delay),
            retry: RetrySchedule::new(config.retry_interval, config.max_restore_attempts),
            bound: HashSet::new(),
        }
    }
}
