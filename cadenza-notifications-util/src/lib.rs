pub mod action_parser;
pub mod reactive;
pub mod urgency;

pub use action_parser::{button_actions, default_action, parse_actions};
pub use reactive::{Derived, Observable, Prop, Subscription};
pub use urgency::NotificationUrgency;

use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, str::FromStr, time::SystemTime};

#[cfg(feature = "zbus_notifications")]
use std::collections::HashMap;

/// One inbound notification, keyed by its daemon-assigned id.
///
/// Entries are immutable once built; a replace swaps the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notification {
    pub id: u32,
    pub app_name: String,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<(ActionId, String)>,
    pub hints: Vec<Hint>,
    pub expire_timeout: i32,
    pub time: SystemTime,
}

impl Notification {
    /// Build an entry from the raw `Notify` call arguments.
    #[allow(clippy::too_many_arguments)]
    #[cfg(feature = "zbus_notifications")]
    pub fn new(
        app_name: &str,
        id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> Self {
        let hints = hints
            .into_iter()
            .filter_map(|(k, v)| match k {
                "action-icons" => bool::try_from(v).map(Hint::ActionIcons).ok(),
                "category" => String::try_from(v).map(Hint::Category).ok(),
                "desktop-entry" => String::try_from(v).map(Hint::DesktopEntry).ok(),
                "resident" => bool::try_from(v).map(Hint::Resident).ok(),
                "transient" => bool::try_from(v).map(Hint::Transient).ok(),
                "sender-pid" => u32::try_from(v).map(Hint::SenderPid).ok(),
                "urgency" => u8::try_from(v).map(Hint::Urgency).ok(),
                "image-path" | "image_path" => String::try_from(v)
                    .ok()
                    .map(|s| Hint::ImagePath(normalize_image_path(s))),
                _ => {
                    tracing::warn!("Unknown hint: {}", k);
                    None
                }
            })
            .collect();

        Notification {
            id,
            app_name: app_name.to_string(),
            app_icon: app_icon.to_string(),
            summary: summary.to_string(),
            body: body.to_string(),
            actions: parse_actions(&actions),
            hints,
            expire_timeout,
            time: SystemTime::now(),
        }
    }

    /// Sender hint: do not keep this notification in history once closed.
    pub fn transient(&self) -> bool {
        self.hints.iter().any(|h| *h == Hint::Transient(true))
    }

    /// Sender hint: keep the notification open after an action is invoked.
    pub fn resident(&self) -> bool {
        self.hints.iter().any(|h| *h == Hint::Resident(true))
    }

    /// Check if action buttons should display icons instead of text labels
    pub fn action_icons(&self) -> bool {
        self.hints.iter().any(|h| *h == Hint::ActionIcons(true))
    }

    pub fn category(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::Category(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn desktop_entry(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::DesktopEntry(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn urgency(&self) -> NotificationUrgency {
        self.hints
            .iter()
            .find_map(|h| match h {
                Hint::Urgency(u) => Some(NotificationUrgency::from(*u)),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Opaque icon reference: the image hint if any, otherwise the app icon.
    pub fn icon_ref(&self) -> &str {
        self.hints
            .iter()
            .find_map(|h| match h {
                Hint::ImagePath(p) => Some(p.as_str()),
                _ => None,
            })
            .unwrap_or(&self.app_icon)
    }

    pub fn default_action(&self) -> Option<&ActionId> {
        default_action(&self.actions)
    }

    pub fn has_action(&self, action: &ActionId) -> bool {
        self.actions.iter().any(|(id, _)| id == action)
    }

    pub fn duration_since(&self) -> Option<std::time::Duration> {
        SystemTime::now().duration_since(self.time).ok()
    }

    /// Estimate memory usage of this notification in bytes
    ///
    /// Used for memory budget tracking of the history list.
    pub fn estimated_size(&self) -> usize {
        let mut size = 0;

        size += self.app_name.len();
        size += self.app_icon.len();
        size += self.summary.len();
        size += self.body.len();

        for (action_id, label) in &self.actions {
            size += action_id.to_string().len();
            size += label.len();
        }

        for hint in &self.hints {
            size += hint.estimated_size();
        }

        // Struct overhead
        size += 200;

        size
    }
}

#[cfg(feature = "zbus_notifications")]
fn normalize_image_path(s: String) -> String {
    // file:// URLs collapse to a plain path, anything else is an icon name or path already
    url::Url::parse(&s)
        .ok()
        .filter(|u| u.scheme() == "file")
        .and_then(|u| u.to_file_path().ok())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or(s)
}

/// A notification that was closed by its sender and kept for the center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub notification: Notification,
    pub resolved_at: SystemTime,
}

impl HistoryEntry {
    pub fn new(notification: Notification) -> Self {
        Self {
            notification,
            resolved_at: SystemTime::now(),
        }
    }

    pub fn id(&self) -> u32 {
        self.notification.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionId {
    Default,
    Custom(String),
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::Default => write!(f, "default"),
            ActionId::Custom(value) => write!(f, "{}", value),
        }
    }
}

impl FromStr for ActionId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "default" => ActionId::Default,
            s => ActionId::Custom(s.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hint {
    ActionIcons(bool),
    Category(String),
    DesktopEntry(String),
    ImagePath(String),
    Resident(bool),
    SenderPid(u32),
    Transient(bool),
    Urgency(u8),
}

impl Hint {
    /// Estimate memory usage of this hint in bytes
    pub fn estimated_size(&self) -> usize {
        match self {
            Hint::Category(s) | Hint::DesktopEntry(s) | Hint::ImagePath(s) => s.len() + 8,
            Hint::ActionIcons(_)
            | Hint::Resident(_)
            | Hint::SenderPid(_)
            | Hint::Transient(_)
            | Hint::Urgency(_) => 8,
        }
    }
}

/// Reasons carried by the freedesktop `NotificationClosed` signal.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    Expired = 1,
    Dismissed = 2,
    CloseNotification = 3,
    Undefined = 4,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(hints: Vec<Hint>) -> Notification {
        Notification {
            id: 7,
            app_name: "TestApp".to_string(),
            app_icon: "dialog-information".to_string(),
            summary: "Test".to_string(),
            body: "Simple notification".to_string(),
            actions: vec![],
            hints,
            expire_timeout: 5000,
            time: SystemTime::now(),
        }
    }

    #[test]
    fn test_basic_notification_defaults() {
        let n = notification(vec![]);
        assert_eq!(n.urgency(), NotificationUrgency::Normal);
        assert!(!n.transient());
        assert!(!n.resident());
        assert!(n.category().is_none());
        assert_eq!(n.icon_ref(), "dialog-information");
        assert!(n.default_action().is_none());
    }

    #[test]
    fn test_hint_accessors() {
        let n = notification(vec![
            Hint::Transient(true),
            Hint::Urgency(2),
            Hint::Category("email.arrived".into()),
            Hint::ImagePath("/tmp/avatar.png".into()),
        ]);
        assert!(n.transient());
        assert_eq!(n.urgency(), NotificationUrgency::Critical);
        assert_eq!(n.category(), Some("email.arrived"));
        assert_eq!(n.icon_ref(), "/tmp/avatar.png");
    }

    #[test]
    fn test_transient_false_hint_is_not_transient() {
        assert!(!notification(vec![Hint::Transient(false)]).transient());
    }

    #[test]
    fn test_action_id_display_and_parse() {
        assert_eq!(ActionId::Default.to_string(), "default");
        assert_eq!("default".parse::<ActionId>(), Ok(ActionId::Default));
        assert_eq!(
            "reply".parse::<ActionId>(),
            Ok(ActionId::Custom("reply".to_string()))
        );
    }

    #[test]
    fn test_estimated_size_grows_with_body() {
        let small = notification(vec![]);
        let mut large = small.clone();
        large.body = "x".repeat(1024);
        assert_eq!(large.estimated_size() - small.estimated_size(), 1024 - small.body.len());
    }

    #[test]
    fn test_history_entry_keeps_id() {
        let entry = HistoryEntry::new(notification(vec![]));
        assert_eq!(entry.id(), 7);
        assert!(entry.resolved_at >= entry.notification.time);
    }

    #[test]
    fn test_close_reason_values() {
        assert_eq!(CloseReason::Expired as u32, 1);
        assert_eq!(CloseReason::Dismissed as u32, 2);
        assert_eq!(CloseReason::CloseNotification as u32, 3);
        assert_eq!(CloseReason::Undefined as u32, 4);
    }
}
