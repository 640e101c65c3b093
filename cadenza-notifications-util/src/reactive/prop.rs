use super::Observable;

/// A widget property that is either fixed or bound to an observable.
///
/// Resolve it once with [`Prop::into_observable`] so downstream code only
/// ever deals with an `Observable`.
#[derive(Debug, Clone)]
pub enum Prop<T> {
    Literal(T),
    Reactive(Observable<T>),
}

impl<T: Clone + 'static> Prop<T> {
    /// A literal becomes a constant observable that nobody else can set.
    pub fn into_observable(self) -> Observable<T> {
        match self {
            Prop::Literal(value) => Observable::new(value),
            Prop::Reactive(observable) => observable,
        }
    }

    pub fn get(&self) -> T {
        match self {
            Prop::Literal(value) => value.clone(),
            Prop::Reactive(observable) => observable.get(),
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self, Prop::Reactive(_))
    }
}

impl<T> From<Observable<T>> for Prop<T> {
    fn from(observable: Observable<T>) -> Self {
        Prop::Reactive(observable)
    }
}

impl From<String> for Prop<String> {
    fn from(value: String) -> Self {
        Prop::Literal(value)
    }
}

impl From<&str> for Prop<String> {
    fn from(value: &str) -> Self {
        Prop::Literal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_resolves_to_constant() {
        let prop: Prop<String> = "Notifications".into();
        assert!(!prop.is_reactive());
        assert_eq!(prop.into_observable().get(), "Notifications");
    }

    #[test]
    fn test_reactive_resolves_to_same_cell() {
        let source = Observable::new(String::from("a"));
        let prop: Prop<String> = source.clone().into();
        assert!(prop.is_reactive());

        let resolved = prop.into_observable();
        source.set("b".into());
        assert_eq!(resolved.get(), "b");
    }
}
