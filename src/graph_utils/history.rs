use super::graph::{EdgeDefaults, MindGraph};

/// One undo step: the graph shape plus the map-wide edge defaults, so that
/// undoing a style change restores the default along with the rewritten edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub graph: MindGraph,
    pub edge_defaults: EdgeDefaults,
}

/// Linear undo/redo over full snapshots. Both stacks push and pop at the end,
/// so the nearest undo (or redo) entry is always last.
#[derive(Clone, Debug, Default)]
pub struct History {
    past: Vec<Snapshot>,
    future: Vec<Snapshot>,
    // None keeps every step
    limit: Option<usize>,
}

impl History {
    pub fn new() -> Self { Self::default() }

    pub fn with_limit(limit: Option<usize>) -> Self {
        History { limit, ..Self::default() }
    }

    pub fn limit(&self) -> Option<usize> { self.limit }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.enforce_limit();
    }

    /// Push the pre-mutation state and discard the redo branch.
    pub fn record(&mut self, current: Snapshot) {
        self.past.push(current);
        self.future.clear();
        self.enforce_limit();
    }

    /// Returns the state to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let prev = self.past.pop()?;
        self.future.push(current);
        Some(prev)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.future.pop()?;
        self.past.push(current);
        self.enforce_limit();
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool { !self.past.is_empty() }
    pub fn can_redo(&self) -> bool { !self.future.is_empty() }
    pub fn past_len(&self) -> usize { self.past.len() }
    pub fn future_len(&self) -> usize { self.future.len() }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit
            && self.past.len() > limit
        {
            let excess = self.past.len() - limit;
            self.past.drain(..excess);
        }
    }
}
