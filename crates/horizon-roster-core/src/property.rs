//! Reactive property values.
//!
//! A [`Property`] wraps a value and reports whether a write actually changed
//! it. Pairing a property with a [`Signal`](crate::Signal) gives the
//! compare-and-swap-with-notify discipline the roster relies on: only emit
//! when `set` returns `true`.
//!
//! # Example
//!
//! ```
//! use horizon_roster_core::{Property, Signal};
//!
//! struct Counter {
//!     value: Property<i32>,
//!     value_changed: Signal<i32>,
//! }
//!
//! impl Counter {
//!     fn set_value(&self, new_value: i32) {
//!         if self.value.set(new_value) {
//!             self.value_changed.emit(new_value);
//!         }
//!     }
//! }
//!
//! let counter = Counter { value: Property::new(0), value_changed: Signal::new() };
//! counter.set_value(0); // no emission, value unchanged
//! counter.set_value(5);
//! assert_eq!(counter.value.get(), 5);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value with change detection.
///
/// `Property<T>` uses interior mutability with `RwLock` and is `Send + Sync`
/// whenever `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without change detection.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    ///
    /// If the new value equals the current one, nothing is written and
    /// `false` is returned. The caller should emit its change signal only
    /// when this returns `true`.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let prop = Property::new(42);
        assert!(!prop.set(42));
        assert!(prop.set(100));
        assert_eq!(prop.get(), 100);
    }

    #[test]
    fn test_replace_returns_old_value() {
        let prop = Property::new("Ivy".to_string());
        assert_eq!(prop.replace("Ivy".to_string()), None);
        assert_eq!(prop.replace("Ada".to_string()), Some("Ivy".to_string()));
        assert_eq!(prop.with(|name| name.len()), 3);
    }

    #[test]
    fn test_set_silent_and_clone() {
        let prop = Property::<u32>::default();
        prop.set_silent(7);
        let copy = prop.clone();
        prop.set_silent(8);
        assert_eq!(copy.get(), 7);
        assert_eq!(format!("{prop:?}"), "Property { value: 8 }");
    }
}
