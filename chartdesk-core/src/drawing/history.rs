//! Linear snapshot history.
//!
//! Each entry is the full state captured before a mutation. Recording a new
//! snapshot discards the redo branch.

use std::mem;

#[derive(Debug, Clone)]
pub struct History<T> {
    undo: Vec<T>,
    redo: Vec<T>,
    limit: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: None,
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` undo steps; the oldest are dropped first.
    /// A limit of zero means unbounded.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Push the pre-mutation state and invalidate the redo branch.
    pub fn record(&mut self, snapshot: T) {
        self.undo.push(snapshot);
        self.redo.clear();
        if let Some(limit) = self.limit {
            if self.undo.len() > limit {
                let excess = self.undo.len() - limit;
                self.undo.drain(..excess);
            }
        }
    }

    /// Swap `current` with the newest undo snapshot. Returns false when there is none.
    pub fn undo(&mut self, current: &mut T) -> bool {
        match self.undo.pop() {
            Some(prev) => {
                self.redo.push(mem::replace(current, prev));
                true
            }
            None => false,
        }
    }

    /// Swap `current` with the newest redo snapshot. Returns false when there is none.
    pub fn redo(&mut self, current: &mut T) -> bool {
        match self.redo.pop() {
            Some(next) => {
                self.undo.push(mem::replace(current, next));
                true
            }
            None => false,
        }
    }

    /// Drop the newest undo snapshot without touching the redo branch.
    pub fn discard_newest(&mut self) -> Option<T> {
        self.undo.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
