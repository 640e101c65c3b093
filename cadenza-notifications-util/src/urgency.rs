use serde::{Deserialize, Serialize};

/// Notification urgency level as defined by the freedesktop.org specification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum NotificationUrgency {
    /// Low urgency notification
    Low = 0,
    /// Normal urgency notification (default)
    #[default]
    Normal = 1,
    /// Critical urgency notification
    Critical = 2,
}

impl NotificationUrgency {
    pub fn is_critical(self) -> bool {
        self == Self::Critical
    }
}

impl From<u8> for NotificationUrgency {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Low,
            2 => Self::Critical,
            _ => Self::Normal,
        }
    }
}
