//! Bounded history of the commands a session issued most recently.

use std::collections::VecDeque;

/// How many commands a session remembers.
pub const HISTORY_CAPACITY: usize = 3;

/// FIFO of the last [`HISTORY_CAPACITY`] command lines; the oldest entry is
/// evicted first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandHistory {
    entries: VecDeque<String>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Appends `command`, evicting the oldest entry when full.
    pub fn record(&mut self, command: impl Into<String>) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(command.into());
    }

    /// Entries in chronological order, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
