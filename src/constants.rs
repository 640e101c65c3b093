// Constants module for cadenza-notifications
// Centralizes magic numbers for better maintainability

// ============================================================================
// Notification Queue Constants
// ============================================================================

/// Initial capacity for the active notification list
pub(crate) const INITIAL_ACTIVE_CAPACITY: usize = 50;

// ============================================================================
// D-Bus Constants
// ============================================================================

pub(crate) const DBUS_NAME: &str = "org.freedesktop.Notifications";

pub(crate) const DBUS_PATH: &str = "/org/freedesktop/Notifications";

/// Attempts at acquiring the bus name before giving up
pub(crate) const DBUS_CONNECT_ATTEMPTS: usize = 5;

/// Delay between bus name attempts (milliseconds)
pub(crate) const DBUS_RETRY_DELAY_MS: u64 = 100;

// ============================================================================
// Control Channel Constants
// ============================================================================

pub(crate) const CONTROL_SOCKET_NAME: &str = "cadenza-shell.sock";

/// Invoke the default action of the newest notification
pub(crate) const REQUEST_NOTI_ACT: &str = "noti-act";

/// Followed by the monitor name
pub(crate) const REQUEST_TOGGLE_CENTER: &str = "toggle-center";

pub(crate) const REQUEST_DISMISS_ALL: &str = "dismiss-all";

pub(crate) const REQUEST_CLEAR_HISTORY: &str = "clear-history";

/// Followed by the notification id and action key
pub(crate) const REQUEST_INVOKE: &str = "invoke";

/// Replies with a one-line summary of the live state
pub(crate) const REQUEST_STATUS: &str = "status";

pub(crate) const CONTROL_ACK: &str = "ok";

/// Longest request line accepted on the control socket
pub(crate) const CONTROL_MAX_REQUEST_LEN: usize = 256;

// ============================================================================
// Tile Icon Constants
// ============================================================================

pub(crate) const TILE_ICON_IDLE: &str = "󰂚";

pub(crate) const TILE_ICON_PENDING: &str = "󰂛";

// ============================================================================
// Server Information
// ============================================================================

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) const SERVER_NAME: &str = "cadenza-shell";

pub(crate) const SERVER_VENDOR: &str = "cadenza";

/// Version of the desktop notifications protocol implemented
pub(crate) const PROTOCOL_VERSION: &str = "1.2";
