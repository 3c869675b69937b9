use crate::trait_map::TraitMap;
use std::any::Any;

/// A data container owned by a `Context`, created on first access.
pub trait DataPlugin: Any + Sized {
    /// A constant reference to a constructor
    #[allow(non_upper_case_globals)]
    const new: &'static dyn Fn() -> Self;
}

/// Replicate-local state: people, random number streams, and the recorder all live here as
/// data plugins. Nothing in a `Context` is shared with any other replicate.
pub struct Context {
    data_plugins: TraitMap,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Context {
            data_plugins: TraitMap::new(),
        }
    }

    /// Returns a mutable reference for the data container for `T`, creating it if it doesn't
    /// exist yet.
    pub fn get_data_container_mut<T: DataPlugin>(&mut self) -> &mut T {
        self.data_plugins.get_or_insert_with(|| <T as DataPlugin>::new())
    }

    /// Returns a reference to the data container for `T` if it exists.
    /// If you need a mutable reference or lazy instantiation, use
    /// `Context::get_data_container_mut()`.
    pub fn get_data_container<T: DataPlugin>(&self) -> Option<&T> {
        self.data_plugins.get::<T>()
    }

    /// Temporarily detaches the data container for `T` so that `f` can mutate it while also
    /// using the rest of the context (for example to draw random numbers). The container is
    /// reattached afterwards.
    pub fn with_data_container<T: DataPlugin, R>(
        &mut self,
        f: impl FnOnce(&mut T, &mut Context) -> R,
    ) -> R {
        let mut container = match self.data_plugins.remove::<T>() {
            Some(boxed) => *boxed,
            None => <T as DataPlugin>::new(),
        };
        let result = f(&mut container, self);
        self.data_plugins.insert(container);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Tally(Vec<u8>);
    impl DataPlugin for Tally {
        const new: &'static dyn Fn() -> Self = &Tally::default;
    }

    struct Label(&'static str);
    impl DataPlugin for Label {
        const new: &'static dyn Fn() -> Self = &|| Label("unset");
    }

    #[test]
    fn test_context_creation() {
        let mut context = Context::new();
        assert!(context.get_data_container::<Tally>().is_none());
        {
            let tally: &mut Tally = context.get_data_container_mut();
            tally.0.push(1);
            tally.0.push(2);
        }
        assert_eq!(context.get_data_container::<Tally>().unwrap().0, vec![1, 2]);
        assert_eq!(context.get_data_container_mut::<Label>().0, "unset");
    }

    #[test]
    fn with_data_container_reattaches() {
        let mut context = Context::new();
        context.get_data_container_mut::<Label>().0 = "outer";

        let seen = context.with_data_container::<Tally, _>(|tally, context| {
            tally.0.push(9);
            // The detached container is invisible while borrowed.
            assert!(context.get_data_container::<Tally>().is_none());
            context.get_data_container_mut::<Label>().0
        });

        assert_eq!(seen, "outer");
        assert_eq!(context.get_data_container::<Tally>().unwrap().0, vec![9]);
    }
}
