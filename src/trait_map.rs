/*!

A heterogeneous map keyed by type: at most one value of each type `T: Any`. `Context` keeps its
data plugins in one and `RngPlugin` keeps its named generators in another.

*/

use crate::{
  type_of,
  TypeId
};
use rustc_hash::FxHashMap;
use std::any::Any;

#[derive(Default)]
pub struct TraitMap {
  map: FxHashMap<TypeId, Box<dyn Any>>,
}

impl TraitMap {
  pub fn new() -> Self {
    TraitMap {
      map: FxHashMap::default(),
    }
  }

  /// Inserts `value`, returning the previous value of the same type if there was one.
  pub fn insert<T: Any>(&mut self, value: T) -> Option<Box<T>> {
    self.map
        .insert(type_of::<T>(), Box::new(value))
        // Only a `Box<T>` is ever stored under `type_of::<T>()`.
        .and_then(|boxed| boxed.downcast().ok())
  }

  pub fn get<T: Any>(&self) -> Option<&T> {
    self.map
        .get(&type_of::<T>())
        .and_then(|boxed| boxed.downcast_ref())
  }

  /// Returns the value of type `T`, inserting `init()` first if there is none.
  pub fn get_or_insert_with<T: Any>(&mut self, init: impl FnOnce() -> T) -> &mut T {
    self.map
        .entry(type_of::<T>())
        .or_insert_with(|| Box::new(init()))
        .downcast_mut()
        // Will never panic as the entry has the matching type
        .expect("TraitMap entry has mismatched type")
  }

  pub fn remove<T: Any>(&mut self) -> Option<Box<T>> {
    self.map
        .remove(&type_of::<T>())
        .and_then(|boxed| boxed.downcast().ok())
  }

  pub fn clear(&mut self) {
    self.map.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, PartialEq)]
  struct Seed(u64);

  #[test]
  fn insert_get_remove() {
    let mut map = TraitMap::new();
    assert!(map.insert(Seed(1)).is_none());
    assert_eq!(map.insert(Seed(2)).map(|b| b.0), Some(1));
    assert_eq!(map.get::<Seed>(), Some(&Seed(2)));
    assert!(map.get::<u8>().is_none());

    map.get_or_insert_with(|| Seed(0)).0 = 7;
    assert_eq!(map.remove::<Seed>().map(|b| b.0), Some(7));
    assert!(map.get::<Seed>().is_none());
  }

  #[test]
  fn get_or_insert_with_is_lazy() {
    let mut map = TraitMap::new();
    map.get_or_insert_with(|| Seed(3)).0 += 1;
    let value = map.get_or_insert_with(|| Seed(100));
    assert_eq!(value, &Seed(4));

    map.clear();
    assert!(map.get::<Seed>().is_none());
  }
}
