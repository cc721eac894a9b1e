use crate::models::HistoryEntry;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: Option<usize>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            limit: limit.max(1),
        }
    }

    /// Record a new location. Returns false when coalesced with the current
    /// entry.
    pub fn push_state(&mut self, entry: HistoryEntry) -> bool {
        if self.current() == Some(&entry) {
            return false;
        }
        let next = self.index.map_or(0, |index| index + 1);
        self.entries.truncate(next);
        self.entries.push(entry);
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.index = Some(self.entries.len() - 1);
        true
    }

    /// Overwrite the current entry without moving the pointer.
    pub fn replace_state(&mut self, entry: HistoryEntry) {
        match self.index {
            Some(index) => self.entries[index] = entry,
            None => log::debug!("replace_state on empty history ignored"),
        }
    }

    pub fn back(&mut self) -> Option<HistoryEntry> {
        let index = self.index.filter(|&index| index > 0)? - 1;
        self.index = Some(index);
        Some(self.entries[index].clone())
    }

    pub fn forward(&mut self) -> Option<HistoryEntry> {
        let index = self.index.filter(|&index| index + 1 < self.entries.len())? + 1;
        self.index = Some(index);
        Some(self.entries[index].clone())
    }

    pub fn can_go_back(&self) -> bool {
        self.index.is_some_and(|index| index > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.index
            .is_some_and(|index| index + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.index.and_then(|index| self.entries.get(index))
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}
