//! Runtime type definitions for shared ownership and interior mutability.
//!
//! This module provides conditional type aliases based on the `thread-safe` feature flag:
//!
//! - When `thread-safe` is enabled: Uses thread-safe types (`Arc` and `RwLock`)
//! - When `thread-safe` is disabled: Uses single-threaded types (`Rc` and `RefCell`)
//!
//! # Type Aliases
//!
//! - [`Shared<T>`]: Smart pointer for shared ownership
//! - [`Store<T>`]: Container providing interior mutability
//! - [`Value`]: A type-erased value held by the container
//!
//! The [`read`] and [`write`] helpers hide the `RefCell`/`RwLock` split from
//! the rest of the crate.
//!
//! # Examples
//!
//! ```
//! use locator::runtime::{read, write, Shared, Store};
//!
//! let shared = Shared::new(Store::new(42));
//! *write(&shared) += 1;
//! assert_eq!(*read(&shared), 43);
//! ```

use std::any::Any;

#[cfg(feature = "thread-safe")]
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(not(feature = "thread-safe"))]
use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// Type alias for shared ownership of data.
///
/// When the `thread-safe` feature is enabled, this is [`Arc<T>`] (thread-safe reference counting).
/// When disabled, this is [`Rc<T>`] (single-threaded reference counting).
#[cfg(feature = "thread-safe")]
pub type Shared<T> = Arc<T>;
#[cfg(not(feature = "thread-safe"))]
pub type Shared<T> = Rc<T>;

/// Type alias for interior mutability with runtime borrow checking.
///
/// When the `thread-safe` feature is enabled, this is [`RwLock<T>`] (thread-safe read-write lock).
/// When disabled, this is [`RefCell<T>`] (single-threaded interior mutability).
#[cfg(feature = "thread-safe")]
pub type Store<T> = RwLock<T>;
#[cfg(not(feature = "thread-safe"))]
pub type Store<T> = RefCell<T>;

/// A type-erased value stored in or produced by the container.
///
/// Resolving the same raw value or cached singleton twice yields two clones
/// of the same `Value`, so `Shared::ptr_eq` holds between them.
#[cfg(feature = "thread-safe")]
pub type Value = Shared<dyn Any + Send + Sync>;
#[cfg(not(feature = "thread-safe"))]
pub type Value = Shared<dyn Any>;

/// Bound placed on values and closures handed to the container.
///
/// Every `'static` type qualifies in single-threaded mode; with `thread-safe`
/// the type must also be `Send + Sync`.
#[cfg(feature = "thread-safe")]
pub trait Sendable: Send + Sync + 'static {}
#[cfg(feature = "thread-safe")]
impl<T: Send + Sync + 'static> Sendable for T {}

#[cfg(not(feature = "thread-safe"))]
pub trait Sendable: 'static {}
#[cfg(not(feature = "thread-safe"))]
impl<T: 'static> Sendable for T {}

/// Shared read access to a [`Store`].
#[cfg(feature = "thread-safe")]
pub fn read<T>(store: &Store<T>) -> RwLockReadGuard<'_, T> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive write access to a [`Store`].
#[cfg(feature = "thread-safe")]
pub fn write<T>(store: &Store<T>) -> RwLockWriteGuard<'_, T> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

/// Shared read access to a [`Store`].
#[cfg(not(feature = "thread-safe"))]
pub fn read<T>(store: &Store<T>) -> Ref<'_, T> {
    store.borrow()
}

/// Exclusive write access to a [`Store`].
#[cfg(not(feature = "thread-safe"))]
pub fn write<T>(store: &Store<T>) -> RefMut<'_, T> {
    store.borrow_mut()
}

/// Wrap a concrete value into a type-erased [`Value`].
pub fn erase<T: Sendable>(value: T) -> Value {
    Shared::new(value)
}
