use crate::state::{
    center::{MonitorId, NotificationCenterState},
    lifecycle::NotificationLifecycleManager,
};
use cadenza_notifications_util::{Derived, HistoryEntry, Notification, Observable};

/// Notification center panel: the active list above the resolved history.
#[derive(Debug, Clone)]
pub struct CenterView {
    entries: Observable<Vec<Notification>>,
    history: Observable<Vec<HistoryEntry>>,
    center: NotificationCenterState,
    empty: Derived<bool>,
}

impl CenterView {
    pub fn new(manager: &NotificationLifecycleManager, center: &NotificationCenterState) -> Self {
        let empty = Derived::combine2(manager.active(), manager.history(), |active, history| {
            active.is_empty() && history.is_empty()
        });

        Self {
            entries: manager.active().clone(),
            history: manager.history().clone(),
            center: center.clone(),
            empty,
        }
    }

    pub fn entries(&self) -> &Observable<Vec<Notification>> {
        &self.entries
    }

    pub fn history(&self) -> &Observable<Vec<HistoryEntry>> {
        &self.history
    }

    /// True when there is nothing to list at all.
    pub fn empty(&self) -> &Derived<bool> {
        &self.empty
    }

    /// Whether the panel instance on `monitor` should be shown.
    pub fn visible_on(&self, monitor: MonitorId) -> Derived<bool> {
        self.center
            .route()
            .map(move |route| route.visible && route.monitor.as_ref() == Some(&monitor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::fake::FakeDaemon;
    use cadenza_notifications_config::NotificationsConfig;
    use std::rc::Rc;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_entries_and_history_follow_manager() {
        let daemon = Rc::new(FakeDaemon::default());
        let (tx, _rx) = unbounded_channel();
        let mut manager = NotificationLifecycleManager::new(
            Box::new(Rc::clone(&daemon)),
            NotificationsConfig::default(),
            tx,
        );
        let center = NotificationCenterState::new();
        let view = CenterView::new(&manager, &center);
        assert!(view.empty().get());

        daemon.put(1, "a");
        daemon.put(2, "b");
        manager.on_notified(1, false);
        manager.on_notified(2, false);
        manager.on_resolved(1);

        let entries: Vec<u32> = view.entries().get().iter().map(|n| n.id).collect();
        let history: Vec<u32> = view.history().get().iter().map(HistoryEntry::id).collect();
        assert_eq!(entries, vec![2]);
        assert_eq!(history, vec![1]);
        assert!(!view.empty().get());
    }

    #[tokio::test]
    async fn test_visible_on_follows_relocation() {
        let (tx, _rx) = unbounded_channel();
        let manager = NotificationLifecycleManager::new(
            Box::new(FakeDaemon::default()),
            NotificationsConfig::default(),
            tx,
        );
        let center = NotificationCenterState::new();
        let view = CenterView::new(&manager, &center);
        let on_m1 = view.visible_on("M1".into());
        let on_m2 = view.visible_on("M2".into());

        center.toggle("M1".into());
        assert!(on_m1.get());
        assert!(!on_m2.get());

        center.toggle("M2".into());
        assert!(!on_m1.get());
        assert!(on_m2.get());

        center.toggle("M2".into());
        assert!(!on_m1.get());
        assert!(!on_m2.get());
    }
}
