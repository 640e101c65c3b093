use crate::{
    daemon::NotificationDaemon,
    handlers::messages::Message,
    state::{expiry::PopupExpiry, notifications::NotificationStore},
};
use cadenza_notifications_config::NotificationsConfig;
use cadenza_notifications_util::{ActionId, HistoryEntry, Notification, Observable};
use tokio::sync::mpsc::UnboundedSender;

/// Sole owner of the notification store.
///
/// Daemon events (`notified`, `resolved`) and user requests (dismiss, actions)
/// come in through `&mut self`, and each change is republished on the
/// observables views subscribe to. Ids that are no longer active are ignored.
pub struct NotificationLifecycleManager {
    store: NotificationStore,
    daemon: Box<dyn NotificationDaemon>,
    config: NotificationsConfig,
    expiry: PopupExpiry,
    active: Observable<Vec<Notification>>,
    history: Observable<Vec<HistoryEntry>>,
    popup_ids: Observable<Vec<u32>>,
}

impl NotificationLifecycleManager {
    pub fn new(
        daemon: Box<dyn NotificationDaemon>,
        config: NotificationsConfig,
        tx: UnboundedSender<Message>,
    ) -> Self {
        Self {
            store: NotificationStore::new(),
            daemon,
            config,
            expiry: PopupExpiry::new(tx),
            active: Observable::new(Vec::new()),
            history: Observable::new(Vec::new()),
            popup_ids: Observable::new(Vec::new()),
        }
    }

    /// Active entries, newest arrival first.
    pub fn active(&self) -> &Observable<Vec<Notification>> {
        &self.active
    }

    /// Resolved entries, newest resolution first.
    pub fn history(&self) -> &Observable<Vec<HistoryEntry>> {
        &self.history
    }

    /// Ids of active entries whose popup has not expired yet.
    pub fn popup_ids(&self) -> &Observable<Vec<u32>> {
        &self.popup_ids
    }

    pub fn config(&self) -> &NotificationsConfig {
        &self.config
    }

    pub fn latest_id(&self) -> Option<u32> {
        self.store.newest().map(|n| n.id)
    }

    pub fn on_notified(&mut self, id: u32, replaced: bool) {
        let Some(notification) = self.daemon.get_notification(id) else {
            tracing::debug!("daemon has no notification {id}, ignoring");
            return;
        };
        let critical = notification.urgency().is_critical();

        if replaced && self.store.contains(id) {
            tracing::trace!("replacing notification {id} in place");
            if let Err(notification) = self.store.replace(notification) {
                self.store.insert_front(notification);
            }
        } else {
            self.store.insert_front(notification);
            tracing::trace!("notification {id} arrived, {} active", self.store.len());
        }

        self.show_popup(id, critical);
        self.publish_active();
    }

    /// The sender or the system closed `id`. Non-transient entries move to history.
    pub fn on_resolved(&mut self, id: u32) {
        let Some(notification) = self.store.remove(id) else {
            tracing::debug!("resolve for inactive notification {id}, ignoring");
            return;
        };
        self.hide_popup(id);

        if notification.transient() {
            tracing::trace!("dropping transient notification {id}");
        } else {
            self.store.push_history(
                HistoryEntry::new(notification),
                self.config.max_history,
                self.config.max_history_memory,
            );
            tracing::trace!(
                "history holds {} entries, ~{} bytes",
                self.store.history().len(),
                self.store.history_memory_usage()
            );
            self.publish_history();
        }
        self.publish_active();
    }

    /// User closed `id`. Never written to history.
    pub fn dismiss(&mut self, id: u32) {
        if self.store.remove(id).is_none() {
            tracing::debug!("dismiss for inactive notification {id}, ignoring");
            return;
        }
        self.daemon.dismiss(id);
        self.hide_popup(id);
        self.publish_active();
    }

    pub fn dismiss_all(&mut self) {
        if self.store.is_empty() {
            return;
        }
        let drained = self.store.drain_active();
        tracing::debug!("dismissing {} notifications", drained.len());

        for notification in &drained {
            self.daemon.dismiss(notification.id);
        }
        self.expiry.cancel_all();
        self.popup_ids.set(Vec::new());
        self.publish_active();
    }

    /// Invoke the `"default"` action, or the first one offered.
    pub fn invoke_default_action(&mut self, id: u32) {
        let Some(notification) = self.store.get(id) else {
            tracing::debug!("default action for inactive notification {id}, ignoring");
            return;
        };
        let Some(action) = notification.default_action().cloned() else {
            tracing::debug!("notification {id} has no actions");
            return;
        };
        self.invoke(id, &action);
    }

    pub fn invoke_action(&mut self, id: u32, action: &ActionId) {
        let Some(notification) = self.store.get(id) else {
            tracing::debug!("action {action} for inactive notification {id}, ignoring");
            return;
        };
        if !notification.has_action(action) {
            tracing::debug!("notification {id} has no action {action}");
            return;
        }
        self.invoke(id, action);
    }

    /// The entry stays active until the daemon resolves it, but observers
    /// of the active list still see one emission.
    fn invoke(&mut self, id: u32, action: &ActionId) {
        tracing::debug!("invoking {action} on notification {id}");
        self.daemon.invoke(id, action);
        self.hide_popup(id);
        self.publish_active();
    }

    pub fn on_popup_expired(&mut self, id: u32, generation: u64) {
        if self.expiry.fire(id, generation) {
            tracing::trace!("popup for {id} expired");
            self.remove_popup_id(id);
        }
    }

    pub fn clear_history(&mut self) {
        self.store.clear_history();
        self.publish_history();
    }

    fn show_popup(&mut self, id: u32, critical: bool) {
        if self.config.do_not_disturb {
            return;
        }

        if !self.popup_ids.with(|ids| ids.contains(&id)) {
            self.popup_ids.update(|ids| ids.push(id));
        }

        if critical && !self.config.expire_critical {
            self.expiry.cancel(id);
        } else {
            self.expiry.schedule(id, self.config.popup_timeout());
        }
    }

    fn hide_popup(&mut self, id: u32) {
        self.expiry.cancel(id);
        self.remove_popup_id(id);
    }

    fn remove_popup_id(&mut self, id: u32) {
        if self.popup_ids.with(|ids| ids.contains(&id)) {
            self.popup_ids.update(|ids| ids.retain(|&i| i != id));
        }
    }

    fn publish_active(&self) {
        self.active.set(self.store.ordered());
    }

    fn publish_history(&self) {
        self.history.set(self.store.history_vec());
    }
}
