use super::tree::{DataSection, ModalSection, StateTree, UiSection};
use serde::Serialize;
use std::collections::VecDeque;

/// Snapshots kept on the undo stack unless configured otherwise.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// The undoable part of the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub data: DataSection,
    pub ui: UiSection,
    pub modals: ModalSection,
}

impl HistoryEntry {
    pub fn capture(tree: &StateTree) -> Self {
        Self {
            data: tree.data.clone(),
            ui: tree.ui.clone(),
            modals: tree.modals.clone(),
        }
    }

    pub fn restore(self, tree: &mut StateTree) {
        tree.data = self.data;
        tree.ui = self.ui;
        tree.modals = self.modals;
    }
}

/// Bounded undo/redo stacks of whole-tree snapshots.
///
/// `past` holds older states with the newest at the back; `future` holds
/// undone states with the next redo at the front.
#[derive(Debug)]
pub(super) struct History {
    pub enabled: bool,
    pub max: usize,
    past: VecDeque<HistoryEntry>,
    future: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new(max: usize) -> Self {
        Self {
            enabled: false,
            max: max.max(1),
            past: VecDeque::new(),
            future: VecDeque::new(),
        }
    }

    /// Record the state about to be replaced. Clears the redo stack.
    pub fn record(&mut self, current: HistoryEntry) {
        self.past.push_back(current);
        while self.past.len() > self.max {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Swap `current` for the newest past entry.
    pub fn undo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let previous = self.past.pop_back()?;
        self.future.push_front(current);
        Some(previous)
    }

    /// Swap `current` for the next future entry.
    pub fn redo(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let next = self.future.pop_front()?;
        self.past.push_back(current);
        while self.past.len() > self.max {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn info(&self) -> HistoryInfo {
        HistoryInfo {
            enabled: self.enabled,
            can_undo: self.enabled && !self.past.is_empty(),
            can_redo: self.enabled && !self.future.is_empty(),
            past_length: self.past.len(),
            future_length: self.future.len(),
            max_history: self.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryInfo {
    pub enabled: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub past_length: usize,
    pub future_length: usize,
    pub max_history: usize,
}
