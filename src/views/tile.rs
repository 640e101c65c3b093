use crate::{
    constants::{TILE_ICON_IDLE, TILE_ICON_PENDING},
    state::{
        center::{MonitorId, NotificationCenterState},
        lifecycle::NotificationLifecycleManager,
    },
};
use cadenza_notifications_util::{Derived, Observable, Prop};

/// Bar tile: bell icon with a pending-count badge. Clicking it toggles the
/// center onto the tile's monitor.
#[derive(Debug, Clone)]
pub struct NotificationTile {
    monitor: MonitorId,
    center: NotificationCenterState,
    count: Derived<usize>,
    icon: Derived<&'static str>,
    badge: Derived<String>,
    tooltip: Observable<String>,
}

impl NotificationTile {
    pub fn new(
        monitor: MonitorId,
        manager: &NotificationLifecycleManager,
        center: &NotificationCenterState,
        tooltip: impl Into<Prop<String>>,
    ) -> Self {
        let count = manager.active().map(Vec::len);
        let icon = count.map(|&count| {
            if count > 0 {
                TILE_ICON_PENDING
            } else {
                TILE_ICON_IDLE
            }
        });
        let badge = count.map(|&count| {
            if count > 0 {
                count.to_string()
            } else {
                String::new()
            }
        });

        Self {
            monitor,
            center: center.clone(),
            count,
            icon,
            badge,
            tooltip: tooltip.into().into_observable(),
        }
    }

    pub fn count(&self) -> &Derived<usize> {
        &self.count
    }

    pub fn icon(&self) -> &Derived<&'static str> {
        &self.icon
    }

    /// Count text, empty when nothing is pending.
    pub fn badge(&self) -> &Derived<String> {
        &self.badge
    }

    pub fn tooltip(&self) -> &Observable<String> {
        &self.tooltip
    }

    pub fn monitor(&self) -> &MonitorId {
        &self.monitor
    }

    pub fn click(&self) {
        tracing::debug!("notification tile clicked on {}", self.monitor);
        self.center.toggle(self.monitor.clone());
    }
}
