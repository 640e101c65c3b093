use crate::state::{center::NotificationCenterState, lifecycle::NotificationLifecycleManager};
use cadenza_notifications_util::{Derived, Notification};

/// The stack of fresh notifications shown in the screen corner.
///
/// Shows active entries whose popup timer has not run out, newest first.
/// With `suppress_while_center_open` the stack is empty whenever the center
/// is visible.
#[derive(Debug, Clone)]
pub struct PopupView {
    popups: Derived<Vec<Notification>>,
    visible: Derived<bool>,
}

impl PopupView {
    pub fn new(manager: &NotificationLifecycleManager, center: &NotificationCenterState) -> Self {
        let suppress = manager.config().suppress_popups_while_center_open;
        let popups = Derived::combine3(
            manager.active(),
            manager.popup_ids(),
            center.route(),
            move |active, ids, route| {
                if suppress && route.visible {
                    return Vec::new();
                }
                active
                    .iter()
                    .filter(|n| ids.contains(&n.id))
                    .cloned()
                    .collect()
            },
        );
        let visible = popups.map(|popups| !popups.is_empty());

        Self { popups, visible }
    }

    pub fn popups(&self) -> &Derived<Vec<Notification>> {
        &self.popups
    }

    pub fn visible(&self) -> &Derived<bool> {
        &self.visible
    }
}
