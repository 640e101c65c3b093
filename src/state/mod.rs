pub mod center;
pub mod expiry;
pub mod lifecycle;
pub mod notifications;
