//! 件数上限付きの変換履歴

use crate::models::HistoryEntry;

pub const DEFAULT_HISTORY_CAPACITY: usize = 2;

/// 新しい順に並んだ履歴（上限を超えた古いものは捨てる）
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// 読み込んだエントリから復元（新しい順を前提に上限で切り詰める）
    pub fn from_entries(mut entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 次のエントリID（ミリ秒時刻。同一ミリ秒でも重複させない）
    pub fn next_id(&self, now_millis: i64) -> i64 {
        match self.entries.first() {
            Some(latest) if latest.id >= now_millis => latest.id + 1,
            _ => now_millis,
        }
    }

    /// 先頭に追加して上限で切り詰める
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
    }

    pub fn find(&self, id: i64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
