//! # Undo/Redo History
//!
//! Linear history over whole-document snapshots.
//!
//! ## Design
//!
//! - The history keeps a checkpoint: the state as of the last commit
//! - `commit` pushes the checkpoint (the pre-action state) onto the undo
//!   stack, clears redo and re-checkpoints the current state
//! - Transient edits (live drags) change the document without committing,
//!   so a whole drag collapses into one undo step
//! - A commit with nothing changed since the checkpoint records nothing
//! - Undo pushes the current state onto redo and restores the popped snapshot;
//!   redo is symmetric
//! - Depth is bounded; the oldest entries are dropped first
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(doc.snapshot(), 50);
//!
//! doc.add_element(...)?;
//! history.commit(doc.snapshot());
//!
//! if let Some(previous) = history.undo(doc.snapshot()) {
//!     doc.restore(previous);
//! }
//! ```

use crate::model::{Element, Page};

/// Immutable copy of the editable document state
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub pages: Vec<Page>,
    pub elements: Vec<Element>,
}

/// Undo/redo stacks for one editor session
#[derive(Debug)]
pub struct History {
    /// Committed states before each action (most recent last)
    undo_stack: Vec<DocumentSnapshot>,

    /// Undone states (most recent last)
    redo_stack: Vec<DocumentSnapshot>,

    /// State as of the last commit, undo or redo
    checkpoint: DocumentSnapshot,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    pub fn new(initial: DocumentSnapshot, max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            checkpoint: initial,
            max_levels,
        }
    }

    /// Record the end of a discrete user action.
    ///
    /// Returns false when nothing changed since the last checkpoint.
    pub fn commit(&mut self, current: DocumentSnapshot) -> bool {
        if current == self.checkpoint {
            return false;
        }

        let previous = std::mem::replace(&mut self.checkpoint, current);
        self.undo_stack.push(previous);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
        true
    }

    /// Step back one action, returning the state to restore
    pub fn undo(&mut self, current: DocumentSnapshot) -> Option<DocumentSnapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.checkpoint = previous.clone();
        Some(previous)
    }

    /// Step forward one undone action, returning the state to restore
    pub fn redo(&mut self, current: DocumentSnapshot) -> Option<DocumentSnapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        self.checkpoint = next.clone();
        Some(next)
    }

    /// Replace the checkpoint without recording an undo step.
    ///
    /// Used for derived writes (breakpoint baking) that should survive
    /// undo rather than be reverted by it.
    pub fn amend_checkpoint(&mut self, current: DocumentSnapshot) {
        self.checkpoint = current;
    }

    /// Whether `current` matches the last committed state
    pub fn is_checkpoint(&self, current: &DocumentSnapshot) -> bool {
        &self.checkpoint == current
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all history and start over from `current`
    pub fn reset(&mut self, current: DocumentSnapshot) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.checkpoint = current;
    }
}
