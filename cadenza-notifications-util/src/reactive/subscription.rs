use std::{cell::Cell, fmt, rc::Rc};

/// Disposal handle returned by `subscribe`.
///
/// Dropping the handle unsubscribes. Only a weak reference to the source is
/// held, so a handle never keeps its observable alive.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    alive: Rc<Cell<bool>>,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(alive: Rc<Cell<bool>>, detach: impl FnOnce() + 'static) -> Self {
        Self {
            alive,
            detach: Some(Box::new(detach)),
        }
    }

    /// Explicit form of drop.
    pub fn dispose(self) {}

    pub fn is_active(&self) -> bool {
        self.alive.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.alive.set(false);
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.alive.get())
            .finish()
    }
}
