// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo/redo history of whole-store snapshots.

/// Bounded undo/redo stacks over snapshots of type `T`.
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Undo stack (past states)
    undo_stack: Vec<T>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<T>,
    max_size: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(50)
    }
}

impl<T> History<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Save current state before making a change
    pub fn push(&mut self, snapshot: T) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        // A new edit invalidates anything that was undone
        self.redo_stack.clear();
    }

    /// Restore the previous state, handing back `current` for redo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_cycle() {
        let mut h = History::new(10);
        h.push(1);
        h.push(2);
        assert_eq!(h.undo(3), Some(2));
        assert_eq!(h.undo(2), Some(1));
        assert_eq!(h.undo(1), None);
        assert_eq!(h.redo(1), Some(2));
        assert!(h.can_redo());
    }

    #[test]
    fn test_push_clears_redo_and_bounds_size() {
        let mut h = History::new(2);
        h.push(1);
        h.push(2);
        h.push(3);
        assert_eq!(h.undo(4), Some(3));
        assert_eq!(h.undo(3), Some(2));
        assert!(!h.can_undo());

        h.push(9);
        assert!(!h.can_redo());
    }
}
