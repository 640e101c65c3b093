use crate::subscriptions::notifications;
use tokio::sync::oneshot;

/// Everything the main loop reacts to
#[derive(Debug)]
pub enum Message {
    /// Notification event from the bus
    Daemon(notifications::Event),
    /// Popup timer posted by the expiry scheduler
    PopupExpired { id: u32, generation: u64 },
    /// Request received on the control socket, with its reply slot
    Control {
        request: String,
        reply: oneshot::Sender<String>,
    },
}
