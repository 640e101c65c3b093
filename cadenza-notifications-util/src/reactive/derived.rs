use std::{any::Any, fmt, rc::Rc};

use super::{Observable, Subscription};
use sealed::{Sealed, Token};

mod sealed {
    use super::{Derived, Observable};

    /// Constructible only from `derived`, so `observable` has no callers
    /// outside it, generic `Source` bounds included.
    pub struct Token(pub(super) ());

    pub trait Sealed<T> {
        fn observable(&self, token: Token) -> &Observable<T>;
    }

    impl<T> Sealed<T> for Observable<T> {
        fn observable(&self, _: Token) -> &Observable<T> {
            self
        }
    }

    impl<T> Sealed<T> for Derived<T> {
        fn observable(&self, _: Token) -> &Observable<T> {
            &self.output
        }
    }
}

/// Anything a `Derived` can observe: a plain `Observable` or another `Derived`.
///
/// Implemented only inside this crate. A `Derived` never hands out its
/// writable output:
///
/// ```compile_fail
/// use cadenza_notifications_util::Observable;
///
/// let tens = Observable::new(2).map(|v| v * 10);
/// tens.observable().set(999);
/// ```
pub trait Source<T>: Sealed<T> {}

impl<T> Source<T> for Observable<T> {}

impl<T> Source<T> for Derived<T> {}

fn observable<T>(source: &impl Source<T>) -> &Observable<T> {
    source.observable(Token(()))
}

/// Read-only value computed from one or more sources.
///
/// Recomputes synchronously on every source emission and always re-emits.
/// Sources are held weakly: dropping a source stops recomputation and leaves
/// the last value readable. Dropping every clone of a `Derived` detaches it
/// from its sources.
pub struct Derived<T> {
    output: Observable<T>,
    subscriptions: Rc<Vec<Subscription>>,
    upstream: Option<Rc<dyn Any>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            output: self.output.clone(),
            subscriptions: Rc::clone(&self.subscriptions),
            upstream: self.upstream.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("output", &self.output)
            .field("sources", &self.subscriptions.len())
            .finish()
    }
}

impl<T: Clone + 'static> Derived<T> {
    /// N-ary derived value over sources of one type.
    pub fn new<S: Clone + 'static>(
        sources: &[Observable<S>],
        combine: impl Fn(&[S]) -> T + 'static,
    ) -> Self {
        let initial = combine(&sources.iter().map(Observable::get).collect::<Vec<_>>());
        let weak: Vec<_> = sources.iter().map(Observable::downgrade).collect();

        Self::wire(
            initial,
            move || {
                let values = weak
                    .iter()
                    .map(|w| w.upgrade().map(|o| o.get()))
                    .collect::<Option<Vec<_>>>()?;
                Some(combine(&values))
            },
            |refresh| {
                sources
                    .iter()
                    .map(|source| {
                        let refresh = Rc::clone(&refresh);
                        source.subscribe(move |_| refresh())
                    })
                    .collect()
            },
        )
    }

    pub fn from_source<S: Clone + 'static>(
        source: &impl Source<S>,
        f: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let source = observable(source);
        let initial = source.with(&f);
        let weak = source.downgrade();

        Self::wire(
            initial,
            move || weak.upgrade().map(|s| s.with(&f)),
            |refresh| vec![source.subscribe(move |_| refresh())],
        )
    }

    pub fn combine2<A, B>(
        a: &impl Source<A>,
        b: &impl Source<B>,
        f: impl Fn(&A, &B) -> T + 'static,
    ) -> Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
    {
        let (a, b) = (observable(a), observable(b));
        let initial = a.with(|a| b.with(|b| f(a, b)));
        let (wa, wb) = (a.downgrade(), b.downgrade());

        Self::wire(
            initial,
            move || {
                let (a, b) = (wa.upgrade()?, wb.upgrade()?);
                Some(a.with(|a| b.with(|b| f(a, b))))
            },
            |refresh| {
                let r = Rc::clone(&refresh);
                vec![
                    a.subscribe(move |_| r()),
                    b.subscribe(move |_| refresh()),
                ]
            },
        )
    }

    pub fn combine3<A, B, C>(
        a: &impl Source<A>,
        b: &impl Source<B>,
        c: &impl Source<C>,
        f: impl Fn(&A, &B, &C) -> T + 'static,
    ) -> Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
    {
        let (a, b, c) = (observable(a), observable(b), observable(c));
        let initial = a.with(|a| b.with(|b| c.with(|c| f(a, b, c))));
        let (wa, wb, wc) = (a.downgrade(), b.downgrade(), c.downgrade());

        Self::wire(
            initial,
            move || {
                let (a, b, c) = (wa.upgrade()?, wb.upgrade()?, wc.upgrade()?);
                Some(a.with(|a| b.with(|b| c.with(|c| f(a, b, c)))))
            },
            |refresh| {
                let (r1, r2) = (Rc::clone(&refresh), Rc::clone(&refresh));
                vec![
                    a.subscribe(move |_| r1()),
                    b.subscribe(move |_| r2()),
                    c.subscribe(move |_| refresh()),
                ]
            },
        )
    }

    fn wire(
        initial: T,
        recompute: impl Fn() -> Option<T> + 'static,
        attach: impl FnOnce(Rc<dyn Fn()>) -> Vec<Subscription>,
    ) -> Self {
        let output = Observable::new(initial);
        let weak_output = output.downgrade();
        let refresh: Rc<dyn Fn()> = Rc::new(move || {
            let Some(output) = weak_output.upgrade() else {
                return;
            };
            match recompute() {
                Some(value) => output.set(value),
                None => tracing::trace!("derived source dropped, keeping last value"),
            }
        });

        Self {
            output,
            subscriptions: Rc::new(attach(refresh)),
            upstream: None,
        }
    }

    pub fn get(&self) -> T {
        self.output.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.output.with(f)
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.output.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.output.subscriber_count()
    }

    /// Chain a transform. The result keeps this `Derived` alive, so
    /// intermediate links of a chain need not be stored.
    pub fn map<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Derived<U> {
        let mut mapped = Derived::from_source(self, f);
        let upstream: Rc<dyn Any> = Rc::new(self.clone());
        mapped.upstream = Some(upstream);
        mapped
    }
}
