use cadenza_notifications_util::{Derived, Observable};
use std::fmt;

/// Output connector name, e.g. `eDP-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorId(pub String);

impl From<&str> for MonitorId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the notification center is shown, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CenterRoute {
    pub visible: bool,
    pub monitor: Option<MonitorId>,
}

/// Shared visibility and placement of the singleton notification center.
///
/// Both fields live in one observable so a toggle is a single emission.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenterState {
    route: Observable<CenterRoute>,
}

impl NotificationCenterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide when already shown on `monitor`, otherwise show there.
    pub fn toggle(&self, monitor: MonitorId) {
        let route = self.route.get();
        if route.visible && route.monitor.as_ref() == Some(&monitor) {
            tracing::debug!("hiding notification center on {monitor}");
            self.hide();
        } else {
            self.show(monitor);
        }
    }

    pub fn show(&self, monitor: MonitorId) {
        tracing::debug!("showing notification center on {monitor}");
        self.route.set(CenterRoute {
            visible: true,
            monitor: Some(monitor),
        });
    }

    /// Hide, remembering the last monitor for the next placement.
    pub fn hide(&self) {
        self.route.update(|route| route.visible = false);
    }

    pub fn is_visible(&self) -> bool {
        self.route.with(|route| route.visible)
    }

    pub fn active_monitor(&self) -> Option<MonitorId> {
        self.route.with(|route| route.monitor.clone())
    }

    pub fn route(&self) -> &Observable<CenterRoute> {
        &self.route
    }

    pub fn visible(&self) -> Derived<bool> {
        self.route.map(|route| route.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn test_starts_hidden() {
        let center = NotificationCenterState::new();
        assert!(!center.is_visible());
        assert_eq!(center.active_monitor(), None);
    }

    #[test]
    fn test_toggle_same_monitor_flips() {
        let center = NotificationCenterState::new();
        center.toggle("eDP-1".into());
        assert!(center.is_visible());
        assert_eq!(center.active_monitor(), Some("eDP-1".into()));

        center.toggle("eDP-1".into());
        assert!(!center.is_visible());
    }

    #[test]
    fn test_toggle_other_monitor_relocates() {
        let center = NotificationCenterState::new();
        center.toggle("M1".into());
        center.toggle("M2".into());

        assert!(center.is_visible());
        assert_eq!(center.active_monitor(), Some("M2".into()));
    }

    #[test]
    fn test_toggle_after_hide_reopens_on_caller() {
        let center = NotificationCenterState::new();
        center.toggle("M1".into());
        center.hide();
        center.toggle("M1".into());

        assert!(center.is_visible());
        assert_eq!(center.active_monitor(), Some("M1".into()));
    }

    #[test]
    fn test_relocation_is_single_emission() {
        let center = NotificationCenterState::new();
        center.toggle("M1".into());

        let emissions = Rc::new(Cell::new(0));
        let e = Rc::clone(&emissions);
        let _sub = center.route().subscribe(move |route| {
            assert!(route.visible);
            assert_eq!(route.monitor, Some(MonitorId::from("M2")));
            e.set(e.get() + 1);
        });

        center.toggle("M2".into());
        assert_eq!(emissions.get(), 1);
    }

    #[test]
    fn test_visible_derived_tracks_route() {
        let center = NotificationCenterState::new();
        let visible = center.visible();

        center.show("M1".into());
        assert!(visible.get());
        center.hide();
        assert!(!visible.get());
    }
}
