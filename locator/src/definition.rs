use std::mem;

use crate::completion::Callback;
use crate::container::Container;
use crate::error::Error;
use crate::producer::{Convention, Producer};
use crate::runtime::{erase, read, write, Shared, Store, Value};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Lifecycle of a singleton's value.
pub(crate) enum SingletonState {
    Empty,
    /// A deferred resolution is running; waiters are served in push order.
    InFlight(Vec<Callback>),
    Resolved(Value),
}

/// What an identifier was registered as. The shape never changes after registration.
pub(crate) enum Definition {
    Value { value: Value, protected: bool },
    Singleton { producer: Producer, state: Store<SingletonState> },
    Factory { producer: Producer },
}

impl Definition {
    pub(crate) fn value(value: Value) -> Self {
        Definition::Value {
            value,
            protected: false,
        }
    }

    pub(crate) fn protected(producer: Producer) -> Self {
        Definition::Value {
            value: erase(producer),
            protected: true,
        }
    }

    pub(crate) fn singleton(producer: Producer) -> Self {
        Definition::Singleton {
            producer,
            state: Store::new(SingletonState::Empty),
        }
    }

    pub(crate) fn factory(producer: Producer) -> Self {
        Definition::Factory { producer }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Definition::Value {
                protected: false, ..
            } => "value",
            Definition::Value {
                protected: true, ..
            } => "protected",
            Definition::Singleton { .. } => "singleton",
            Definition::Factory { .. } => "factory",
        }
    }

    /// Synchronous resolution.
    pub(crate) fn provide(&self, container: &Container, id: &str) -> Result<Value, Error> {
        match self {
            Definition::Value { value, .. } => Ok(value.clone()),
            Definition::Factory { producer } => producer.produce(container, id),
            Definition::Singleton { producer, state } => {
                if producer.convention() == Convention::Deferred {
                    return Err(Error::expected_callback(id));
                }

                if let SingletonState::Resolved(value) = &*read(state) {
                    return Ok(value.clone());
                }

                let value = producer.produce(container, id)?;

                let mut state = write(state);
                if let SingletonState::Resolved(existing) = &*state {
                    return Ok(existing.clone());
                }
                *state = SingletonState::Resolved(value.clone());

                #[cfg(feature = "tracing")]
                debug!("Cached singleton {}", id);

                Ok(value)
            }
        }
    }

    /// Callback resolution. Contract violations are returned; outcomes go to `callback`.
    pub(crate) fn provide_with(
        self: &Shared<Self>,
        container: &Container,
        id: &str,
        callback: Callback,
    ) -> Result<(), Error> {
        match &**self {
            Definition::Value { value, .. } => {
                callback(Ok(value.clone()));
                Ok(())
            }
            Definition::Factory { producer } => producer.produce_with(container, id, callback),
            Definition::Singleton { producer, state } => {
                if producer.convention() == Convention::Sync {
                    return Err(Error::unexpected_callback(id));
                }

                let mut guard = write(state);
                match &mut *guard {
                    SingletonState::Resolved(value) => {
                        let value = value.clone();
                        drop(guard);
                        callback(Ok(value));
                        return Ok(());
                    }
                    SingletonState::InFlight(waiters) => {
                        waiters.push(callback);

                        #[cfg(feature = "tracing")]
                        debug!("Coalesced request for {} ({} waiting)", id, waiters.len());

                        return Ok(());
                    }
                    SingletonState::Empty => {
                        *guard = SingletonState::InFlight(vec![callback]);
                    }
                }
                drop(guard);

                let definition = self.clone();
                producer.produce_with(
                    container,
                    id,
                    Box::new(move |outcome: Result<Value, Error>| definition.settle(outcome)),
                )
            }
        }
    }

    /// Close the in-flight window and fan the outcome out to every waiter.
    ///
    /// A success is cached before any waiter runs; an error leaves the
    /// singleton empty so the next resolution retries the producer.
    fn settle(&self, outcome: Result<Value, Error>) {
        let Definition::Singleton { state, .. } = self else {
            return;
        };

        let next = match &outcome {
            Ok(value) => SingletonState::Resolved(value.clone()),
            Err(_) => SingletonState::Empty,
        };
        let previous = mem::replace(&mut *write(state), next);
        let waiters = match previous {
            SingletonState::InFlight(waiters) => waiters,
            _ => Vec::new(),
        };

        #[cfg(feature = "tracing")]
        debug!("Fanning out outcome to {} waiter(s)", waiters.len());

        for waiter in waiters {
            waiter(outcome.clone());
        }
    }
}

#[cfg(feature = "debug")]
impl std::fmt::Debug for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("Definition");
        out.field("kind", &self.kind());
        if let Definition::Singleton { state, .. } = self {
            let state = match &*read(state) {
                SingletonState::Empty => "empty",
                SingletonState::InFlight(_) => "in-flight",
                SingletonState::Resolved(_) => "resolved",
            };
            out.field("state", &state);
        }
        out.finish()
    }
}
