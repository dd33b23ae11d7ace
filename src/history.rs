//! Action history - append-only log of committed strokes with undo

use crate::stroke::Stroke;

/// Ordered list of committed strokes.
///
/// Undo drops the newest stroke for good; there is no redo.
#[derive(Debug, Clone, Default)]
pub struct ActionHistory {
    actions: Vec<Stroke>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, action: Stroke) {
        self.actions.push(action);
    }

    /// Remove the most recent stroke. Does nothing on an empty history.
    pub fn undo_last(&mut self) -> Option<Stroke> {
        self.actions.pop()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn actions(&self) -> &[Stroke] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
