pub mod control;
pub mod notifications;
