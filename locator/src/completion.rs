//! Completion handles for deferred producers.
//!
//! A deferred producer receives a [`Completion`] instead of returning its
//! value. The handle is consumed by [`Completion::complete`], so the type
//! system rules out a second completion; the shared slot behind it makes the
//! outcome fire exactly once even when the producer also returns an error or
//! drops the handle.

use std::marker::PhantomData;

use crate::error::Error;
use crate::runtime::{erase, write, Sendable, Shared, Store, Value};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Receiver of a resolution outcome, the Rust form of an `(error, value)` callback.
#[cfg(feature = "thread-safe")]
pub(crate) type Callback = Box<dyn FnOnce(Result<Value, Error>) + Send + Sync + 'static>;
#[cfg(not(feature = "thread-safe"))]
pub(crate) type Callback = Box<dyn FnOnce(Result<Value, Error>) + 'static>;

struct Slot {
    target: Option<Callback>,
    in_call: bool,
    dropped: bool,
}

/// Untyped side of a completion, shared between the container and the handle.
pub(crate) struct CompletionSlot {
    id: String,
    slot: Shared<Store<Slot>>,
}

impl CompletionSlot {
    fn fire(&self, outcome: Result<Value, Error>) {
        let target = write(&self.slot).target.take();

        match target {
            Some(target) => target(outcome),
            None => {
                #[cfg(feature = "tracing")]
                warn!("Ignoring repeated completion for {}", self.id);
            }
        }
    }
}

/// Run a deferred producer body against `target`.
///
/// The body gets a fresh slot. Whatever fires first among the completion, an
/// `Err` return and a drop of the handle reaches `target`; a drop that happens
/// during the call is only reported once the call has returned `Ok`.
pub(crate) fn run<F>(id: &str, target: Callback, body: F)
where
    F: FnOnce(CompletionSlot) -> Result<(), Error>,
{
    let slot = Shared::new(Store::new(Slot {
        target: Some(target),
        in_call: true,
        dropped: false,
    }));

    let result = body(CompletionSlot {
        id: id.to_string(),
        slot: slot.clone(),
    });

    let settled = {
        let mut slot = write(&slot);
        slot.in_call = false;

        match result {
            Err(err) => slot
                .target
                .take()
                .map(|target| (target, Err(Error::producer_failure(id, err)))),
            Ok(()) if slot.dropped => slot
                .target
                .take()
                .map(|target| (target, Err(Error::completion_dropped(id)))),
            Ok(()) => None,
        }
    };

    if let Some((target, outcome)) = settled {
        #[cfg(feature = "tracing")]
        debug!("Deferred producer for {} settled during its call", id);

        target(outcome);
    }
}

/// Completion handle handed to a deferred producer.
///
/// Call [`ok`](Completion::ok), [`fail`](Completion::fail) or
/// [`complete`](Completion::complete) once the value is known, possibly on a
/// later turn of the event loop. Dropping the handle without completing it
/// fails the resolution with [`ErrorKind::ProducerFailure`](crate::ErrorKind::ProducerFailure).
///
/// # Examples
///
/// ```
/// use locator::{Container, Producer};
///
/// let container = Container::new();
/// container
///     .register("answer", Producer::deferred(|_c, done| {
///         done.ok(42u32);
///         Ok(())
///     }))
///     .unwrap();
///
/// container
///     .resolve_with::<u32, _>("answer", |result| assert_eq!(*result.unwrap(), 42))
///     .unwrap();
/// ```
pub struct Completion<T> {
    inner: CompletionSlot,
    _marker: PhantomData<fn(T)>,
}

impl<T> Completion<T> {
    pub(crate) fn new(inner: CompletionSlot) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Identifier being resolved.
    pub fn id(&self) -> &str {
        &self.inner.id
    }
}

impl<T: Sendable> Completion<T> {
    /// Deliver the outcome. An error reaches waiters as a producer failure.
    pub fn complete(self, outcome: Result<T, Error>) {
        let outcome = outcome
            .map(erase)
            .map_err(|err| Error::producer_failure(&self.inner.id, err));
        self.inner.fire(outcome);
    }

    pub fn ok(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn fail(self, error: Error) {
        self.complete(Err(error));
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        let target = {
            let mut slot = write(&self.inner.slot);
            if slot.in_call {
                slot.dropped = true;
                None
            } else {
                slot.target.take()
            }
        };

        if let Some(target) = target {
            target(Err(Error::completion_dropped(&self.inner.id)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::runtime::read;

    type Outcomes = Shared<Store<Vec<Result<Value, Error>>>>;

    fn recorder() -> (Outcomes, Callback) {
        let outcomes: Outcomes = Shared::new(Store::new(Vec::new()));
        let sink = outcomes.clone();
        (outcomes, Box::new(move |outcome: Result<Value, Error>| write(&sink).push(outcome)))
    }

    fn kinds(outcomes: &Outcomes) -> Vec<Option<ErrorKind>> {
        read(outcomes)
            .iter()
            .map(|o| o.as_ref().err().map(|e| e.kind))
            .collect()
    }

    #[test]
    fn completes_inside_the_call() {
        let (outcomes, target) = recorder();

        run("answer", target, |slot| {
            Completion::<u32>::new(slot).ok(42);
            Ok(())
        });

        let outcomes = read(&outcomes);
        assert_eq!(outcomes.len(), 1);
        let value = outcomes[0].as_ref().ok().unwrap().clone();
        assert_eq!(*value.downcast::<u32>().ok().unwrap(), 42);
    }

    #[test]
    fn completes_after_the_call() {
        let (outcomes, target) = recorder();
        let parked: Shared<Store<Option<Completion<u32>>>> = Shared::new(Store::new(None));
        let park = parked.clone();

        run("later", target, move |slot| {
            *write(&park) = Some(Completion::new(slot));
            Ok(())
        });
        assert!(read(&outcomes).is_empty());

        let done = write(&parked).take().unwrap();
        done.ok(7);
        assert!(kinds(&outcomes) == vec![None]);
    }

    #[test]
    fn error_return_is_delivered_once() {
        let (outcomes, target) = recorder();

        run("broken", target, |slot| {
            let _done = Completion::<u32>::new(slot);
            Err(Error::new(ErrorKind::InvalidArgument, "boom"))
        });

        assert!(kinds(&outcomes) == vec![Some(ErrorKind::ProducerFailure)]);
        assert!(read(&outcomes)[0].as_ref().err().unwrap().message.contains("boom"));
    }

    #[test]
    fn error_return_after_completion_is_ignored() {
        let (outcomes, target) = recorder();

        run("eager", target, |slot| {
            Completion::<u32>::new(slot).ok(1);
            Err(Error::new(ErrorKind::InvalidArgument, "late"))
        });

        assert!(kinds(&outcomes) == vec![None]);
    }

    #[test]
    fn dropped_during_call_fails_after_return() {
        let (outcomes, target) = recorder();

        run("forgetful", target, |slot| {
            drop(Completion::<u32>::new(slot));
            Ok(())
        });

        let outcomes = read(&outcomes);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].as_ref().err().unwrap().message.contains("dropped"));
    }

    #[test]
    fn dropped_after_call_fails_immediately() {
        let (outcomes, target) = recorder();
        let parked: Shared<Store<Option<Completion<u32>>>> = Shared::new(Store::new(None));
        let park = parked.clone();

        run("abandoned", target, move |slot| {
            *write(&park) = Some(Completion::new(slot));
            Ok(())
        });

        write(&parked).take();
        assert!(kinds(&outcomes) == vec![Some(ErrorKind::ProducerFailure)]);
    }
}
