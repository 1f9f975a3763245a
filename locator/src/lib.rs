//! # locator - string-keyed service locator
//!
//! A small dependency-injection container mapping identifiers to raw values,
//! cached singletons, per-call factories, or values delivered later through a
//! completion callback.
//!
//! ## Basic Usage
//!
//! ```rust
//! use locator::{Container, Producer};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_value("database_url", String::from("postgres://localhost"))?
//!     .register("database", Producer::new(|c| {
//!         Ok(Database { url: (*c.resolve::<String>("database_url")?).clone() })
//!     }))?;
//!
//! let db = container.resolve::<Database>("database")?;
//! assert_eq!(db.url, "postgres://localhost");
//! # Ok::<(), locator::Error>(())
//! ```
//!
//! ## Resolution Strategies
//!
//! - **Value**: registered with `register_value`, returned as-is.
//! - **Singleton**: any unmarked [`Producer`]; built on first resolution and cached.
//! - **Factory**: a producer passed through `mark_as_factory`; built on every resolution.
//! - **Protected**: a producer passed through `mark_as_protected`; stored raw, never invoked.
//!
//! A producer built with [`Producer::deferred`] reports its value through a
//! [`Completion`] and is resolved with [`Container::resolve_with`]. Concurrent
//! callback resolutions of the same deferred singleton share one producer call.
//!
//! ## Feature Flags
//!
//! - `tracing` (default): log registrations, resolutions and errors.
//! - `debug` (default): `Debug` impls and kind-prefixed error messages.
//! - `thread-safe`: `Arc`/`RwLock` storage and `Send + Sync` bounds.

pub mod completion;
pub mod container;
mod definition;
pub mod error;
mod macros;
pub mod producer;
pub mod runtime;

pub use completion::Completion;
pub use container::{Container, Entry};
pub use error::{Error, ErrorKind};
pub use producer::{Convention, Producer, ProducerId};
pub use runtime::{Shared, Value};
