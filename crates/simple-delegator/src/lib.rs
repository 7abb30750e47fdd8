//! Simple Delegator - transparent member delegation
//!
//! A class opts in with [`DelegatorMixin::with_delegation`]. Its instances
//! then forward every method call or property access they cannot satisfy
//! themselves to the code that called into them, reaching private and
//! protected members of that caller. Forwarded accesses are reported through
//! a pluggable [`Logger`].
//!
//! # Example
//!
//! ```ignore
//! use delegator_runtime::{dispatch, ClassBuilder, Object, Value, Visibility};
//! use simple_delegator::DelegatorMixin;
//!
//! let view = ClassBuilder::new("View").with_delegation().build();
//! let controller = ClassBuilder::new("Controller")
//!     .method("title", Visibility::Private, |_| Ok(Value::from("Inbox")))
//!     .method("render", Visibility::Public, move |_| {
//!         let view = Object::instantiate(&view);
//!         // `title` is not declared on View, so it runs on the controller
//!         dispatch::call_method(&view, "title", vec![])
//!     })
//!     .build();
//!
//! let title = dispatch::call_method(&Object::instantiate(&controller), "render", vec![])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod caller;
pub mod delegatee;
pub mod delegator;
pub mod loggable;
pub mod logger;
pub mod options;

pub use caller::{
    resolve_from_stack, Caller, CallerResolver, ContextCaller, StackCallerResolver, WeakCaller,
    DEFAULT_LOOKBACK_DEPTH,
};
pub use delegatee::Delegatee;
pub use delegator::{Delegator, DelegatorMixin, StaticForwarder};
pub use loggable::LoggableDelegatee;
pub use logger::{LogContext, LogRecord, Logger, MemoryLogger, NullLogger, TracingLogger, LOG_TARGET};
pub use options::{DelegatorOptions, OptionsError};
