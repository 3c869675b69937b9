use std::{
    any::type_name,
    fmt::Debug,
    hash::Hash,
};

/// A closed, enumerable per-person attribute such as a disease state or a category.
///
/// Every value has a dense index in `0..VALUES.len()` so that counts and lookup tables can be
/// stored in fixed-size arrays rather than hash maps.
pub trait Property: Copy + Debug + Eq + Hash + 'static {
    /// Every value, in index order.
    const VALUES: &'static [Self];

    #[must_use]
    #[inline]
    fn name() -> &'static str {
        type_name::<Self>()
    }

    /// Position of `self` in `VALUES`.
    fn index(self) -> usize;

    /// A short snake_case label used in reports and configuration files.
    fn label(self) -> &'static str;

    #[must_use]
    fn from_label(label: &str) -> Option<Self> {
        Self::VALUES.iter().copied().find(|value| value.label() == label)
    }
}
