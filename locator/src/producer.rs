//! Producer definitions for the container.
//!
//! This module defines the [`Producer`] handle, which wraps a building
//! function together with its resolution convention.
//!
//! # Overview
//!
//! A producer computes the value of a Singleton or Factory identifier. Its
//! convention is chosen explicitly when the handle is built:
//!
//! - [`Producer::new`]: the function returns its value (or error) directly.
//! - [`Producer::deferred`]: the function receives a [`Completion`] and reports
//!   its value later; such identifiers are resolved with
//!   [`Container::resolve_with`](crate::Container::resolve_with).
//!
//! Every handle carries a process-unique [`ProducerId`]. The container keys its
//! pending factory and protected sets on this id, so clones of a handle share
//! their classification.
//!
//! # Feature Flags
//!
//! - **With `thread-safe`**: producer functions and their values must be `Send + Sync`
//! - **Without `thread-safe`**: single-threaded producers are allowed
//!
//! # Examples
//!
//! ```
//! use locator::{Convention, Producer};
//!
//! let config = Producer::new(|_c| Ok(String::from("config.json")));
//! assert_eq!(config.convention(), Convention::Sync);
//!
//! let database = Producer::deferred(|_c, done| {
//!     done.ok(vec![1u8, 2, 3]);
//!     Ok(())
//! });
//! assert_eq!(database.convention(), Convention::Deferred);
//! assert_ne!(config.id(), database.id());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::completion::{self, Callback, Completion, CompletionSlot};
use crate::container::Container;
use crate::error::Error;
use crate::runtime::{erase, Sendable, Shared, Value};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

#[cfg(feature = "thread-safe")]
type SyncBody = Box<dyn Fn(&Container) -> Result<Value, Error> + Send + Sync + 'static>;
#[cfg(not(feature = "thread-safe"))]
type SyncBody = Box<dyn Fn(&Container) -> Result<Value, Error> + 'static>;

#[cfg(feature = "thread-safe")]
type DeferredBody =
    Box<dyn Fn(&Container, CompletionSlot) -> Result<(), Error> + Send + Sync + 'static>;
#[cfg(not(feature = "thread-safe"))]
type DeferredBody = Box<dyn Fn(&Container, CompletionSlot) -> Result<(), Error> + 'static>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a [`Producer`] handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ProducerId(u64);

impl ProducerId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a producer hands its value back.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Convention {
    /// Returns the value from the call.
    Sync,
    /// Reports the value through a [`Completion`].
    Deferred,
}

enum Body {
    Sync(SyncBody),
    Deferred(DeferredBody),
}

struct ProducerInner {
    id: ProducerId,
    body: Body,
}

/// A building function registered under an identifier.
///
/// Cloning is cheap and keeps the same [`ProducerId`].
pub struct Producer {
    inner: Shared<ProducerInner>,
}

impl Clone for Producer {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(feature = "debug")]
impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("id", &self.inner.id)
            .field("convention", &self.convention())
            .finish()
    }
}

impl Producer {
    /// Creates a producer following the synchronous convention.
    ///
    /// The function receives the container, so it can resolve its own
    /// dependencies, and returns the value. An `Err` surfaces as a
    /// [`ErrorKind::ProducerFailure`](crate::ErrorKind::ProducerFailure).
    ///
    /// # Examples
    ///
    /// ```
    /// use locator::{Container, Producer};
    ///
    /// let container = Container::new();
    /// container.register_value("url", String::from("postgres://localhost"))?;
    /// container.register("dsn", Producer::new(|c| {
    ///     let url = c.resolve::<String>("url")?;
    ///     Ok(format!("{}/app", url))
    /// }))?;
    ///
    /// assert_eq!(*container.resolve::<String>("dsn")?, "postgres://localhost/app");
    /// # Ok::<(), locator::Error>(())
    /// ```
    pub fn new<T, F>(producer: F) -> Self
    where
        T: Sendable,
        F: Fn(&Container) -> Result<T, Error> + Sendable,
    {
        let id = ProducerId::next();

        #[cfg(feature = "tracing")]
        info!("Creating synchronous producer {:?}", id);

        Self {
            inner: Shared::new(ProducerInner {
                id,
                body: Body::Sync(Box::new(move |container: &Container| {
                    producer(container).map(erase)
                })),
            }),
        }
    }

    /// Creates a producer following the deferred (callback) convention.
    ///
    /// The function receives the container and a [`Completion`]. It may
    /// complete before returning or keep the handle and complete on a later
    /// turn of the event loop. Returning `Err` before completing fails the
    /// resolution with that error.
    pub fn deferred<T, F>(producer: F) -> Self
    where
        T: Sendable,
        F: Fn(&Container, Completion<T>) -> Result<(), Error> + Sendable,
    {
        let id = ProducerId::next();

        #[cfg(feature = "tracing")]
        info!("Creating deferred producer {:?}", id);

        Self {
            inner: Shared::new(ProducerInner {
                id,
                body: Body::Deferred(Box::new(move |container: &Container, slot: CompletionSlot| {
                    producer(container, Completion::new(slot))
                })),
            }),
        }
    }

    pub fn id(&self) -> ProducerId {
        self.inner.id
    }

    pub fn convention(&self) -> Convention {
        match self.inner.body {
            Body::Sync(_) => Convention::Sync,
            Body::Deferred(_) => Convention::Deferred,
        }
    }

    /// Invoke a synchronous producer for `id`.
    pub(crate) fn produce(&self, container: &Container, id: &str) -> Result<Value, Error> {
        match &self.inner.body {
            Body::Sync(body) => {
                #[cfg(feature = "tracing")]
                debug!("Executing producer {:?} for {}", self.inner.id, id);

                body(container).map_err(|err| Error::producer_failure(id, err))
            }
            Body::Deferred(_) => Err(Error::expected_callback(id)),
        }
    }

    /// Invoke a deferred producer for `id`, delivering its outcome to `target`.
    pub(crate) fn produce_with(
        &self,
        container: &Container,
        id: &str,
        target: Callback,
    ) -> Result<(), Error> {
        match &self.inner.body {
            Body::Deferred(body) => {
                #[cfg(feature = "tracing")]
                debug!("Executing deferred producer {:?} for {}", self.inner.id, id);

                completion::run(id, target, |slot| body(container, slot));
                Ok(())
            }
            Body::Sync(_) => Err(Error::unexpected_callback(id)),
        }
    }
}
