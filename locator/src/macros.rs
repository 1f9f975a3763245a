//! Macros for declarative container setup.
//!
//! - [`bind!`] macro: Register one identifier on an existing container.
//! - [`container!`] macro: Build a container from a list of `bind!` forms.
//!
//! # Example
//! ```
//! use locator::container;
//!
//! let c = container! {
//!     "color" => value(String::from("#ff0000")),
//!     "greeting" => singleton(|c| Ok(format!("color is {}", c.resolve::<String>("color")?))),
//!     "token" => factory(|_c| Ok(vec![0u8; 16])),
//!     "db" => deferred(|_c, done| {
//!         done.ok(true);
//!         Ok(())
//!     }),
//! }?;
//!
//! assert_eq!(*c.resolve::<String>("greeting")?, "color is #ff0000");
//! assert_eq!(c.ids(), vec!["color", "greeting", "token", "db"]);
//! # Ok::<(), locator::Error>(())
//! ```

/// Register one identifier on a container, propagating errors with `?`.
///
/// - `id => value(expr)`: a raw value.
/// - `id => singleton(closure)`: a synchronous singleton producer.
/// - `id => deferred(closure)`: a deferred singleton producer.
/// - `id => factory(closure)`: a synchronous factory producer.
/// - `id => deferred_factory(closure)`: a deferred factory producer.
/// - `id => protected(closure)`: a producer stored raw.
#[macro_export]
macro_rules! bind {
    ($container:expr, $id:expr => value($value:expr)) => {{
        $container.register_value($id, $value)?;
    }};

    ($container:expr, $id:expr => singleton($producer:expr)) => {{
        $container.register($id, $crate::Producer::new($producer))?;
    }};

    ($container:expr, $id:expr => deferred($producer:expr)) => {{
        $container.register($id, $crate::Producer::deferred($producer))?;
    }};

    ($container:expr, $id:expr => factory($producer:expr)) => {{
        let producer = $container.mark_as_factory($crate::Producer::new($producer))?;
        $container.register($id, producer)?;
    }};

    ($container:expr, $id:expr => deferred_factory($producer:expr)) => {{
        let producer = $container.mark_as_factory($crate::Producer::deferred($producer))?;
        $container.register($id, producer)?;
    }};

    ($container:expr, $id:expr => protected($producer:expr)) => {{
        let producer = $container.mark_as_protected($crate::Producer::new($producer))?;
        $container.register($id, producer)?;
    }};
}

/// Build a container from `id => kind(arg)` pairs, registered in order.
///
/// Evaluates to `Result<Container, Error>`.
#[macro_export]
macro_rules! container {
    (
        $(
            $id:literal => $kind:ident ( $($arg:tt)* )
        ),* $(,)?
    ) => {{
        (|| -> ::core::result::Result<$crate::Container, $crate::Error> {
            let container = $crate::Container::new();

            $(
                $crate::bind!(container, $id => $kind($($arg)*));
            )*

            Ok(container)
        })()
    }};
}
