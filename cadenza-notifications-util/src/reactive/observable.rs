use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use super::{Derived, Subscription};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    key: u64,
    alive: Rc<Cell<bool>>,
    callback: Callback<T>,
}

pub(crate) struct Inner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Slot<T>>>,
    next_key: Cell<u64>,
}

/// A mutable value cell that broadcasts every `set` to its subscribers.
///
/// Cloning the handle shares the cell. Emission is synchronous and depth-first:
/// `set` returns only after every subscriber live at the time of the call ran.
/// No borrow is held while subscribers run, so a subscriber may read or write
/// any observable, this one included.
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: Default + Clone + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrowing read, avoids cloning large values.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify. Every call emits, equal values included.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.emit();
    }

    /// Mutate a copy of the value, store it and notify.
    ///
    /// No borrow is held while `f` runs, so `f` may read this observable.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(value);
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);

        let alive = Rc::new(Cell::new(true));
        self.inner.subscribers.borrow_mut().push(Slot {
            key,
            alive: Rc::clone(&alive),
            callback: Rc::new(callback),
        });

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(alive, move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|slot| slot.key != key);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Single-source derived value.
    pub fn map<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Derived<U> {
        Derived::from_source(self, f)
    }

    pub(crate) fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn emit(&self) {
        // Snapshot: subscribers added during this emission wait for the next one.
        let snapshot: Vec<(Rc<Cell<bool>>, Callback<T>)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|slot| (Rc::clone(&slot.alive), Rc::clone(&slot.callback)))
            .collect();
        if snapshot.is_empty() {
            return;
        }

        let value = self.get();
        for (alive, callback) in snapshot {
            // disposed by an earlier subscriber of this same emission
            if alive.get() {
                callback(&value);
            }
        }
    }
}

pub(crate) struct WeakObservable<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakObservable<T> {
    pub(crate) fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_current_value() {
        let obs = Observable::new(1);
        assert_eq!(obs.get(), 1);
        obs.set(2);
        assert_eq!(obs.get(), 2);
    }

    #[test]
    fn test_set_emits_in_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let _a = obs.subscribe(move |v| l.borrow_mut().push(("a", *v)));
        let l = Rc::clone(&log);
        let _b = obs.subscribe(move |v| l.borrow_mut().push(("b", *v)));

        obs.set(5);
        assert_eq!(*log.borrow(), vec![("a", 5), ("b", 5)]);
    }

    #[test]
    fn test_equal_value_still_emits() {
        let obs = Observable::new(3);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let _sub = obs.subscribe(move |_| c.set(c.get() + 1));

        obs.set(3);
        obs.set(3);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_dropped_subscription_stops_callbacks() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = obs.subscribe(move |_| c.set(c.get() + 1));

        obs.set(1);
        drop(sub);
        obs.set(2);

        assert_eq!(count.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_added_during_emission_waits_for_next() {
        let obs = Observable::new(0);
        let late_calls = Rc::new(Cell::new(0));
        let held = Rc::new(RefCell::new(Vec::new()));

        let (o, h, lc) = (obs.clone(), Rc::clone(&held), Rc::clone(&late_calls));
        let _outer = obs.subscribe(move |_| {
            let lc = Rc::clone(&lc);
            h.borrow_mut().push(o.subscribe(move |_| lc.set(lc.get() + 1)));
        });

        obs.set(1);
        assert_eq!(late_calls.get(), 0);
        obs.set(2);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn test_subscriber_disposed_mid_emission_is_skipped() {
        let obs = Observable::new(0);
        let victim_calls = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let s = Rc::clone(&slot);
        let _killer = obs.subscribe(move |_| {
            s.borrow_mut().take();
        });
        let vc = Rc::clone(&victim_calls);
        *slot.borrow_mut() = Some(obs.subscribe(move |_| vc.set(vc.get() + 1)));

        obs.set(1);
        assert_eq!(victim_calls.get(), 0);
    }

    #[test]
    fn test_subscriber_may_write_other_observable() {
        let a = Observable::new(1);
        let b = Observable::new(0);
        let b2 = b.clone();
        let _sub = a.subscribe(move |v| b2.set(v * 10));

        a.set(4);
        assert_eq!(b.get(), 40);
    }

    #[test]
    fn test_subscriber_may_read_emitting_observable() {
        let obs = Observable::new(String::from("a"));
        let seen = Rc::new(RefCell::new(String::new()));
        let (o, s) = (obs.clone(), Rc::clone(&seen));
        let _sub = obs.subscribe(move |_| *s.borrow_mut() = o.get());

        obs.set("b".to_string());
        assert_eq!(*seen.borrow(), "b");
    }

    #[test]
    fn test_update_mutates_and_emits() {
        let obs = Observable::new(vec![1, 2]);
        let len = Rc::new(Cell::new(0));
        let l = Rc::clone(&len);
        let _sub = obs.subscribe(move |v: &Vec<i32>| l.set(v.len()));

        obs.update(|v| v.push(3));
        assert_eq!(len.get(), 3);
        assert_eq!(obs.get(), vec![1, 2, 3]);
    }

    #[test]
    fn test_subscription_outliving_observable_is_harmless() {
        let obs = Observable::new(0);
        let sub = obs.subscribe(|_| {});
        drop(obs);
        sub.dispose();
    }

    #[test]
    fn test_update_closure_may_read_same_observable() {
        let obs = Observable::new(vec![1, 2]);
        let reader = obs.clone();

        obs.update(|v| {
            let before = reader.get();
            v.push(before.len() as i32 + 1);
            assert_eq!(reader.with(Vec::len), 2);
        });

        assert_eq!(obs.get(), vec![1, 2, 3]);
    }
}
