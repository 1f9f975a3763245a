//! The service locator container.
//!
//! Public API:
//! - register / register_value / register_many / with_entries: define identifiers
//! - mark_as_factory / mark_as_protected: classify a producer before registering it
//! - resolve / resolve_value: synchronous resolution
//! - resolve_with / resolve_value_with: callback resolution for deferred producers
//! - has / ids / remove: inspect and edit the set of identifiers
//!
//! A registered [`Producer`] becomes a singleton (value cached after the first
//! success), a factory (invoked on every resolution) or a protected value
//! (stored and returned as-is), depending on how it was marked. Deferred
//! singletons coalesce concurrent callback resolutions into one producer call.

use std::any::type_name;
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::completion::Callback;
use crate::definition::Definition;
use crate::error::Error;
use crate::producer::{Producer, ProducerId};
use crate::runtime::{erase, read, write, Sendable, Shared, Store, Value};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Something that can be registered under an identifier.
pub enum Entry {
    /// A ready value, returned as-is by every resolution.
    Value(Value),
    /// A producer, classified at registration by the pending sets.
    Producer(Producer),
}

impl Entry {
    /// Wrap a ready value.
    pub fn value<T: Sendable>(value: T) -> Self {
        Entry::Value(erase(value))
    }
}

impl From<Producer> for Entry {
    fn from(producer: Producer) -> Self {
        Entry::Producer(producer)
    }
}

/// The DI container.
///
/// # Examples
///
/// ```
/// use locator::runtime::Shared;
/// use locator::{Container, Producer};
///
/// let container = Container::new();
/// container
///     .register_value("color", String::from("#ff0000"))?
///     .register("token", container.mark_as_factory(Producer::new(|_c| Ok(vec![0u8; 4])))?)?;
///
/// assert_eq!(*container.resolve::<String>("color")?, "#ff0000");
/// let a = container.resolve::<Vec<u8>>("token")?;
/// let b = container.resolve::<Vec<u8>>("token")?;
/// assert!(!Shared::ptr_eq(&a, &b));
/// # Ok::<(), locator::Error>(())
/// ```
pub struct Container {
    definitions: Store<IndexMap<String, Shared<Definition>>>,
    pending_factory: Store<HashSet<ProducerId>>,
    pending_protected: Store<HashSet<ProducerId>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "debug")]
impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &*read(&self.definitions))
            .field("pending_factory", &read(&self.pending_factory).len())
            .field("pending_protected", &read(&self.pending_protected).len())
            .finish()
    }
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            definitions: Store::new(IndexMap::new()),
            pending_factory: Store::new(HashSet::new()),
            pending_protected: Store::new(HashSet::new()),
        }
    }

    /// Create a container and register `entries` in iteration order.
    pub fn with_entries<I, K>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, Entry)>,
        K: AsRef<str>,
    {
        let container = Self::new();
        container.register_many(entries)?;
        Ok(container)
    }

    /// Register `entry` under `id`.
    ///
    /// A value is stored raw. A producer pending protected is stored raw as
    /// well and resolves to the [`Producer`] handle itself; a producer pending
    /// factory becomes a factory; any other producer becomes a singleton. The
    /// pending mark is consumed.
    ///
    /// Fails with `DuplicateIdentifier` if `id` is taken and `InvalidState`
    /// if the producer is pending both ways. Nothing is changed on failure.
    pub fn register(&self, id: &str, entry: impl Into<Entry>) -> Result<&Self, Error> {
        let (definition, key) = match entry.into() {
            Entry::Value(value) => (Definition::value(value), None),
            Entry::Producer(producer) => {
                let key = producer.id();
                (self.classify(id, producer)?, Some(key))
            }
        };

        {
            // Released before a rejected `definition` is dropped.
            let mut definitions = write(&self.definitions);
            if definitions.contains_key(id) {
                return Err(Error::duplicate_identifier(id));
            }

            #[cfg(feature = "tracing")]
            info!("Registering {} as {}", id, definition.kind());

            definitions.insert(id.to_string(), Shared::new(definition));
        }

        // Pending marks are single-use.
        if let Some(key) = key {
            write(&self.pending_factory).remove(&key);
            write(&self.pending_protected).remove(&key);
        }
        Ok(self)
    }

    /// Register a ready value under `id`.
    pub fn register_value<T: Sendable>(&self, id: &str, value: T) -> Result<&Self, Error> {
        self.register(id, Entry::value(value))
    }

    /// Register every entry in iteration order.
    ///
    /// Not transactional: entries before a failing one stay registered.
    pub fn register_many<I, K>(&self, entries: I) -> Result<&Self, Error>
    where
        I: IntoIterator<Item = (K, Entry)>,
        K: AsRef<str>,
    {
        for (id, entry) in entries {
            self.register(id.as_ref(), entry)?;
        }
        Ok(self)
    }

    fn classify(&self, id: &str, producer: Producer) -> Result<Definition, Error> {
        let key = producer.id();
        let is_factory = read(&self.pending_factory).contains(&key);
        let is_protected = read(&self.pending_protected).contains(&key);

        match (is_factory, is_protected) {
            (true, true) => Err(Error::ambiguous_classification(id)),
            (true, false) => Ok(Definition::factory(producer)),
            (false, true) => Ok(Definition::protected(producer)),
            (false, false) => Ok(Definition::singleton(producer)),
        }
    }

    /// Check that `id` is registered.
    pub fn has(&self, id: &str) -> bool {
        read(&self.definitions).contains_key(id)
    }

    /// All registered identifiers, in registration order.
    pub fn ids(&self) -> Vec<String> {
        read(&self.definitions).keys().cloned().collect()
    }

    /// Remove `id`. It may be registered again afterwards.
    ///
    /// A deferred resolution already in flight for `id` still completes and
    /// notifies its waiters.
    pub fn remove(&self, id: &str) -> Result<&Self, Error> {
        // The removed definition outlives the guard.
        let removed = write(&self.definitions).shift_remove(id);
        let Some(removed) = removed else {
            return Err(Error::not_found(id));
        };

        #[cfg(feature = "tracing")]
        info!("Removed {} ({})", id, removed.kind());

        drop(removed);
        Ok(self)
    }

    /// Mark `producer` to be registered as a factory.
    ///
    /// Returns the same handle, so marking and registering chain inline.
    /// Fails with `InvalidState` if the producer is pending protected.
    pub fn mark_as_factory(&self, producer: Producer) -> Result<Producer, Error> {
        if read(&self.pending_protected).contains(&producer.id()) {
            return Err(Error::factory_of_protected());
        }
        write(&self.pending_factory).insert(producer.id());

        #[cfg(feature = "tracing")]
        debug!("Producer {:?} pending as factory", producer.id());

        Ok(producer)
    }

    /// Mark `producer` to be stored raw, never invoked, on registration.
    ///
    /// Fails with `InvalidState` if the producer is pending factory.
    pub fn mark_as_protected(&self, producer: Producer) -> Result<Producer, Error> {
        if read(&self.pending_factory).contains(&producer.id()) {
            return Err(Error::protect_of_factory());
        }
        write(&self.pending_protected).insert(producer.id());

        #[cfg(feature = "tracing")]
        debug!("Producer {:?} pending as protected", producer.id());

        Ok(producer)
    }

    fn definition(&self, id: &str) -> Result<Shared<Definition>, Error> {
        read(&self.definitions)
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id))
    }

    /// Resolve `id` synchronously as a type-erased value.
    ///
    /// Fails with `InvalidState` if `id` was registered with a deferred producer.
    pub fn resolve_value(&self, id: &str) -> Result<Value, Error> {
        let definition = self.definition(id)?;

        #[cfg(feature = "tracing")]
        debug!("Resolving {} ({})", id, definition.kind());

        definition.provide(self, id)
    }

    /// Resolve `id` synchronously as a `T`.
    pub fn resolve<T: Sendable>(&self, id: &str) -> Result<Shared<T>, Error> {
        downcast(id, self.resolve_value(id)?)
    }

    /// Resolve `id` through a completion callback.
    ///
    /// Values are delivered before this call returns. Deferred producers may
    /// deliver later; while a deferred singleton is in flight, further
    /// requests join it instead of calling the producer again, and all of them
    /// receive the same outcome in request order. A failed outcome is not
    /// cached.
    ///
    /// Contract violations (`NotFound`, or `InvalidState` for a synchronous
    /// producer) are returned here and the callback is dropped uncalled.
    pub fn resolve_value_with<F>(&self, id: &str, callback: F) -> Result<(), Error>
    where
        F: FnOnce(Result<Value, Error>) + Sendable,
    {
        let definition = self.definition(id)?;

        #[cfg(feature = "tracing")]
        debug!("Resolving {} ({}) with callback", id, definition.kind());

        let callback: Callback = Box::new(callback);
        definition.provide_with(self, id, callback)
    }

    /// Resolve `id` through a completion callback receiving a `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use locator::runtime::{read, write, Shared, Store};
    /// use locator::{Completion, Container, Producer};
    ///
    /// let parked: Shared<Store<Option<Completion<String>>>> = Shared::new(Store::new(None));
    /// let park = parked.clone();
    ///
    /// let container = Container::new();
    /// container.register("db", Producer::deferred(move |_c, done| {
    ///     *write(&park) = Some(done);
    ///     Ok(())
    /// }))?;
    ///
    /// let seen = Shared::new(Store::new(Vec::new()));
    /// for _ in 0..3 {
    ///     let seen = seen.clone();
    ///     container.resolve_with::<String, _>("db", move |db| write(&seen).push(db.unwrap()))?;
    /// }
    ///
    /// let done = write(&parked).take().unwrap();
    /// done.ok(String::from("connected"));
    /// let seen = read(&seen);
    /// assert_eq!(seen.len(), 3);
    /// assert!(Shared::ptr_eq(&seen[0], &seen[2]));
    /// # Ok::<(), locator::Error>(())
    /// ```
    pub fn resolve_with<T, F>(&self, id: &str, callback: F) -> Result<(), Error>
    where
        T: Sendable,
        F: FnOnce(Result<Shared<T>, Error>) + Sendable,
    {
        let owned = id.to_string();
        self.resolve_value_with(id, move |outcome: Result<Value, Error>| {
            callback(outcome.and_then(|value| downcast(&owned, value)))
        })
    }
}

fn downcast<T: Sendable>(id: &str, value: Value) -> Result<Shared<T>, Error> {
    value
        .downcast::<T>()
        .map_err(|_| Error::type_mismatch(id, type_name::<T>()))
}
