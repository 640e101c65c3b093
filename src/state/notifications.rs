use crate::constants::*;
use cadenza_notifications_util::{HistoryEntry, Notification};
use std::collections::{HashMap, VecDeque};

/// Identity-indexed store of active notifications plus resolved history
///
/// `order` lists active ids newest arrival first and always holds exactly the
/// keys of `active`. History is newest-resolved first.
#[derive(Debug, Default)]
pub struct NotificationStore {
    active: HashMap<u32, Notification>,
    order: VecDeque<u32>,
    history: VecDeque<HistoryEntry>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            active: HashMap::with_capacity(INITIAL_ACTIVE_CAPACITY),
            order: VecDeque::with_capacity(INITIAL_ACTIVE_CAPACITY),
            history: VecDeque::new(),
        }
    }

    /// Insert as the newest arrival.
    ///
    /// An entry already active under the same id is dropped from its old
    /// position and returned.
    pub fn insert_front(&mut self, notification: Notification) -> Option<Notification> {
        let id = notification.id;
        let previous = self.remove(id);
        self.active.insert(id, notification);
        self.order.push_front(id);
        previous
    }

    /// Overwrite an active entry in place, keeping its position.
    ///
    /// Returns the notification back if the id is not active.
    pub fn replace(&mut self, notification: Notification) -> Result<Notification, Notification> {
        match self.active.get_mut(&notification.id) {
            Some(slot) => Ok(std::mem::replace(slot, notification)),
            None => Err(notification),
        }
    }

    pub fn remove(&mut self, id: u32) -> Option<Notification> {
        let notification = self.active.remove(&id)?;
        if let Some(pos) = self.order.iter().position(|&i| i == id) {
            self.order.remove(pos);
        }
        Some(notification)
    }

    /// Remove every active entry, newest first.
    pub fn drain_active(&mut self) -> Vec<Notification> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.active.remove(&id))
            .collect()
    }

    pub fn get(&self, id: u32) -> Option<&Notification> {
        self.active.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.active.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// The most recent arrival still active.
    pub fn newest(&self) -> Option<&Notification> {
        self.order.front().and_then(|id| self.active.get(id))
    }

    /// Active entries, newest arrival first.
    pub fn ordered(&self) -> Vec<Notification> {
        self.order
            .iter()
            .filter_map(|id| self.active.get(id))
            .cloned()
            .collect()
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn history_vec(&self) -> Vec<HistoryEntry> {
        self.history.iter().cloned().collect()
    }

    /// Put a resolved entry at the front of history, then trim to the budgets
    pub fn push_history(&mut self, entry: HistoryEntry, max_entries: usize, max_memory: usize) {
        self.history.push_front(entry);
        self.history.truncate(max_entries);
        self.apply_memory_budget(max_memory);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Keeps newest history entries that fit within the budget
    fn apply_memory_budget(&mut self, max_memory: usize) {
        let mut total_size: usize = 0;
        let mut keep_count: usize = 0;

        for entry in &self.history {
            let size = entry.notification.estimated_size();
            if total_size + size > max_memory {
                break;
            }
            total_size += size;
            keep_count += 1;
        }

        self.history.truncate(keep_count);
    }

    pub fn history_memory_usage(&self) -> usize {
        self.history
            .iter()
            .map(|e| e.notification.estimated_size())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn notification(id: u32, summary: &str) -> Notification {
        Notification {
            id,
            app_name: "app".to_string(),
            app_icon: String::new(),
            summary: summary.to_string(),
            body: String::new(),
            actions: vec![],
            hints: vec![],
            expire_timeout: -1,
            time: SystemTime::now(),
        }
    }

    fn ids(store: &NotificationStore) -> Vec<u32> {
        store.ordered().iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_insert_front_is_newest_first() {
        let mut store = NotificationStore::new();
        store.insert_front(notification(1, "a"));
        store.insert_front(notification(2, "b"));
        store.insert_front(notification(3, "c"));

        assert_eq!(ids(&store), vec![3, 2, 1]);
        assert_eq!(store.newest().map(|n| n.id), Some(3));
    }

    #[test]
    fn test_insert_front_same_id_keeps_single_entry() {
        let mut store = NotificationStore::new();
        store.insert_front(notification(1, "a"));
        store.insert_front(notification(2, "b"));
        let previous = store.insert_front(notification(1, "a2"));

        assert_eq!(previous.map(|n| n.summary), Some("a".to_string()));
        assert_eq!(ids(&store), vec![1, 2]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_replace_preserves_position() {
        let mut store = NotificationStore::new();
        store.insert_front(notification(1, "A"));
        store.insert_front(notification(2, "B"));

        let old = store.replace(notification(1, "A'")).unwrap();
        assert_eq!(old.summary, "A");
        assert_eq!(ids(&store), vec![2, 1]);
        assert_eq!(store.get(1).unwrap().summary, "A'");
    }

    #[test]
    fn test_replace_unknown_id_hands_back_entry() {
        let mut store = NotificationStore::new();
        let rejected = store.replace(notification(9, "x")).unwrap_err();
        assert_eq!(rejected.id, 9);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut store = NotificationStore::new();
        assert!(store.remove(4).is_none());
    }

    #[test]
    fn test_drain_active() {
        let mut store = NotificationStore::new();
        store.insert_front(notification(1, "a"));
        store.insert_front(notification(2, "b"));

        let drained: Vec<u32> = store.drain_active().iter().map(|n| n.id).collect();
        assert_eq!(drained, vec![2, 1]);
        assert!(store.is_empty());
        assert!(store.newest().is_none());
    }

    #[test]
    fn test_history_newest_first_and_capped() {
        let mut store = NotificationStore::new();
        for id in 1..=5 {
            store.push_history(HistoryEntry::new(notification(id, "h")), 3, usize::MAX);
        }

        let ids: Vec<u32> = store.history().iter().map(HistoryEntry::id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[test]
    fn test_history_memory_budget_keeps_newest() {
        let mut store = NotificationStore::new();
        let mut big = notification(1, "old");
        big.body = "x".repeat(4096);
        store.push_history(HistoryEntry::new(big), 100, usize::MAX);

        let small = notification(2, "new");
        let budget = small.estimated_size() + 10;
        store.push_history(HistoryEntry::new(small), 100, budget);

        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].id(), 2);
        assert!(store.history_memory_usage() <= budget);
    }

    #[test]
    fn test_clear_history() {
        let mut store = NotificationStore::new();
        store.push_history(HistoryEntry::new(notification(1, "h")), 10, usize::MAX);
        store.clear_history();
        assert!(store.history().is_empty());
    }
}
