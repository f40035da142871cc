//! Reference-counted cells for structural sharing.
//!
//! A [`Shared`] lets any number of parents (and any number of map versions)
//! point at the same subtree. Reads go through `Deref` and never copy.
//! Writes go through [`Shared::set`] or [`Shared::make_mut`], which only
//! touch the existing
//! allocation when the reference count proves that nobody else can observe
//! the change; otherwise a fresh cell is allocated and the old one is left
//! untouched for its other owners.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

pub struct Shared<T> {
    inner: Arc<T>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Returns true if no other owner holds this cell.
    pub fn is_unique(&mut self) -> bool {
        Arc::get_mut(&mut self.inner).is_some()
    }

    /// Returns true if both cells point at the same allocation.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }

    /// Replaces the value held by this cell.
    ///
    /// Other owners keep seeing the old value.
    pub fn set(&mut self, value: T) {
        match Arc::get_mut(&mut self.inner) {
            Some(slot) => *slot = value,
            None => self.inner = Arc::new(value),
        }
    }
}

impl<T: Clone> Shared<T> {
    /// Mutable access, copying the value first if it is shared.
    pub fn make_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.inner)
    }

    /// Moves the value out, cloning it if another owner still holds it.
    pub fn into_inner(self) -> T {
        Arc::unwrap_or_clone(self.inner)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Shared::ptr_eq(self, other) || self.inner == other.inner
    }
}

impl<T: Eq> Eq for Shared<T> {}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_on_unique_cell_reuses_allocation() {
        let mut cell = Shared::new(1u32);
        let before = &*cell as *const u32;
        assert!(cell.is_unique());
        cell.set(2);
        assert_eq!(*cell, 2);
        assert_eq!(&*cell as *const u32, before);
    }

    #[test]
    fn set_on_shared_cell_leaves_other_owner_alone() {
        let mut cell = Shared::new(String::from("old"));
        let other = cell.clone();
        assert!(!cell.is_unique());
        cell.set(String::from("new"));
        assert_eq!(*cell, "new");
        assert_eq!(*other, "old");
        assert!(!Shared::ptr_eq(&cell, &other));
    }

    #[test]
    fn make_mut_copies_only_when_shared() {
        let mut cell = Shared::new(vec![1, 2, 3]);
        let snapshot = cell.clone();
        cell.make_mut().push(4);
        assert_eq!(*snapshot, vec![1, 2, 3]);
        assert_eq!(*cell, vec![1, 2, 3, 4]);

        assert!(cell.is_unique());
        let before = &*cell as *const Vec<i32>;
        cell.make_mut().push(5);
        assert_eq!(&*cell as *const Vec<i32>, before);
        assert_eq!(*cell, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn into_inner_clones_shared_value() {
        let cell = Shared::new(7u8);
        let other = cell.clone();
        assert_eq!(cell.into_inner(), 7);
        assert_eq!(*other, 7);
    }
}
