//! Single-threaded observable values.
//!
//! Everything here is `!Send`: values live on the UI thread and results from
//! background work must be marshalled onto that thread before calling `set`.

mod derived;
mod observable;
mod prop;
mod subscription;

pub use derived::{Derived, Source};
pub use observable::Observable;
pub use prop::Prop;
pub use subscription::Subscription;
