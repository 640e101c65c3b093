use cadenza_notifications_util::{ActionId, Notification};

/// The notification daemon as seen by the lifecycle manager.
///
/// Lookups are synchronous. `dismiss` and `invoke` are fire-and-forget; any
/// `resolved` they cause arrives later as an ordinary event.
pub trait NotificationDaemon {
    fn get_notification(&self, id: u32) -> Option<Notification>;

    fn dismiss(&self, id: u32);

    fn invoke(&self, id: u32, action: &ActionId);
}

/// Stand-in used when the bus name could not be acquired. Every lookup misses,
/// so the store stays empty for the life of the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct Disconnected;

impl NotificationDaemon for Disconnected {
    fn get_notification(&self, _id: u32) -> Option<Notification> {
        None
    }

    fn dismiss(&self, id: u32) {
        tracing::debug!("daemon unavailable, ignoring dismiss of {id}");
    }

    fn invoke(&self, id: u32, action: &ActionId) {
        tracing::debug!("daemon unavailable, ignoring action {action} on {id}");
    }
}
