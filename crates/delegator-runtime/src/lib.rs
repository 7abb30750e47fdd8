//! Delegator Runtime - reflective object model
//!
//! A small dynamic object runtime providing what member delegation needs
//! from its host platform:
//! - Classes with public/protected/private fields and methods
//! - Scope-aware dispatch that hands unresolved accesses to per-object hooks
//! - A per-thread shadow call stack with bound receivers
//! - Reflection handles that ignore visibility
//!
//! # Example
//!
//! ```ignore
//! use delegator_runtime::{dispatch, ClassBuilder, Object, Value, Visibility};
//!
//! let class = ClassBuilder::new("Greeter")
//!     .field_with_default("name", Visibility::Private, "world")
//!     .method("greet", Visibility::Public, |inv| {
//!         let name = dispatch::get_property(inv.this()?, "name")?;
//!         Ok(Value::from(format!("hello {}", name.as_str().unwrap_or_default())))
//!     })
//!     .build();
//!
//! let greeter = Object::instantiate(&class);
//! let greeting = dispatch::call_method(&greeter, "greet", vec![])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod dispatch;
pub mod error;
pub mod hooks;
pub mod object;
pub mod reflect;
pub mod stack;
pub mod value;

pub use error::{ReflectError, ReflectResult};
pub use hooks::{HookFactory, InstanceHooks, StaticHook};
pub use object::{
    Class, ClassBuilder, ClassRef, FieldDecl, Invocation, MethodBody, MethodDecl, Object, ObjectRef,
    Visibility,
};
pub use reflect::{Modifiers, ReflectionClass, ReflectionMethod, ReflectionProperty};
pub use stack::{CallStack, Frame, FrameGuard};
pub use value::Value;
