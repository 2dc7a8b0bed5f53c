//! # History
//!
//! Snapshot-based undo/redo for the active page.
//!
//! ## Design
//!
//! - Each entry is a full copy of the page content
//! - Pushing content equal to the current entry is a no-op
//! - Pushing after an undo discards the undone entries first
//! - The oldest entry is dropped once the limit is exceeded
//! - Undo/redo raise a `restoring` flag so the write-back is not re-recorded
//!
//! Typing is coalesced by [`Debounce`]: every keystroke re-arms a single
//! deadline and the snapshot is taken once input has been quiet long enough.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(50);
//! history.reset(surface.content().clone());
//!
//! history.push(edited.clone());
//! if let Some(previous) = history.undo() {
//!     surface.set_content(previous.clone());
//! }
//! ```

use clause_markup::Content;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default number of entries kept per page
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default quiet period before a typing snapshot is taken
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Linear undo/redo history of page snapshots
#[derive(Debug)]
pub struct History {
    /// Snapshots, oldest first
    entries: VecDeque<Content>,

    /// Index of the entry matching the live content
    current: usize,

    /// Maximum number of entries (at least 1)
    limit: usize,

    /// Set while undo/redo writes a snapshot back into the surface
    restoring: bool,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            current: 0,
            limit: limit.max(1),
            restoring: false,
        }
    }

    /// Drop everything and start over from a single snapshot
    pub fn reset(&mut self, snapshot: Content) {
        self.entries.clear();
        self.entries.push_back(snapshot);
        self.current = 0;
        self.restoring = false;
    }

    /// Record a snapshot. Returns `false` when it matches the current entry.
    pub fn push(&mut self, snapshot: Content) -> bool {
        if self.entries.get(self.current) == Some(&snapshot) {
            return false;
        }

        if !self.entries.is_empty() {
            let discarded = self.entries.len() - (self.current + 1);
            if discarded > 0 {
                self.entries.truncate(self.current + 1);
                debug!(discarded, "history branch truncated");
            }
        }

        self.entries.push_back(snapshot);
        if self.entries.len() > self.limit {
            self.entries.pop_front();
            debug!(limit = self.limit, "oldest history entry dropped");
        }
        self.current = self.entries.len() - 1;
        true
    }

    /// Step back; `None` at the oldest entry
    pub fn undo(&mut self) -> Option<&Content> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        self.restoring = true;
        self.entries.get(self.current)
    }

    /// Step forward; `None` at the newest entry
    pub fn redo(&mut self) -> Option<&Content> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        self.restoring = true;
        self.entries.get(self.current)
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Clear the restoring flag once the write-back has landed
    pub fn settle(&mut self) {
        self.restoring = false;
    }

    pub fn current(&self) -> Option<&Content> {
        self.entries.get(self.current)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.current
    }

    pub fn redo_levels(&self) -> usize {
        self.entries.len().saturating_sub(self.current + 1)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

/// Single re-arming deadline.
///
/// Time is passed in explicitly so hosts drive it from their own clock and
/// tests stay deterministic.
#[derive(Debug, Clone)]
pub struct Debounce {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Cancel any pending deadline and schedule a new one
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` exactly once per armed deadline that has passed
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
