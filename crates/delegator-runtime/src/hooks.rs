//! Unresolved-access hooks
//!
//! Hooks intercept operations on an object that the object's class cannot
//! satisfy on its own:
//! - `call(host, method, args)` - method is undeclared or not visible
//! - `get(host, property)` - property read
//! - `set(host, property, value)` - property write
//! - `isset(host, property)` - presence check
//! - `unset(host, property)` - property removal
//!
//! Class-level calls have their own [`StaticHook`], since there is no
//! instance to carry state.
//!
//! Every default method reports the member as missing, so a hook only needs
//! to implement the traps it cares about.

use std::any::Any;
use std::sync::Arc;

use crate::error::{ReflectError, ReflectResult};
use crate::object::{ClassRef, ObjectRef};
use crate::value::Value;

/// Factory producing one hooks instance per object
pub type HookFactory = Arc<dyn Fn() -> Arc<dyn InstanceHooks> + Send + Sync>;

/// Per-instance traps for unresolved member access
pub trait InstanceHooks: Any + Send + Sync {
    /// Unresolved instance method call
    fn call(&self, host: &ObjectRef, method: &str, _args: Vec<Value>) -> ReflectResult<Value> {
        Err(ReflectError::no_such_method(method, host.class().name()))
    }

    /// Unresolved property read
    fn get(&self, host: &ObjectRef, property: &str) -> ReflectResult<Value> {
        Err(ReflectError::no_such_property(property, host.class().name()))
    }

    /// Unresolved property write
    fn set(&self, host: &ObjectRef, property: &str, _value: Value) -> ReflectResult<()> {
        Err(ReflectError::no_such_property(property, host.class().name()))
    }

    /// Unresolved presence check
    fn isset(&self, _host: &ObjectRef, _property: &str) -> ReflectResult<bool> {
        Ok(false)
    }

    /// Unresolved property removal
    fn unset(&self, host: &ObjectRef, property: &str) -> ReflectResult<()> {
        Err(ReflectError::no_such_property(property, host.class().name()))
    }

    /// Downcast support, so owners can reach their hook state
    fn as_any(&self) -> &dyn Any;
}

/// Class-level trap for unresolved static calls
pub trait StaticHook: Send + Sync {
    /// Unresolved static method call on `class`
    fn call_static(&self, class: &ClassRef, method: &str, args: Vec<Value>) -> ReflectResult<Value>;
}
