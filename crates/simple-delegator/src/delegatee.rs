//! Delegatee capability set
//!
//! What a host needs from the object it forwards unresolved accesses to.

use std::fmt::Debug;

use delegator_runtime::{ReflectResult, Value};

/// Forwarding target for a host's unresolved accesses.
///
/// Implementations reach members at any visibility. Failures are reported
/// unchanged to whoever triggered the access.
pub trait Delegatee: Send + Sync + Debug {
    /// Call `method`; `NoSuchMethod` when the target does not declare it
    fn call(&self, method: &str, args: Vec<Value>) -> ReflectResult<Value>;

    /// Read `property`; `NoSuchProperty` when undeclared
    fn get(&self, property: &str) -> ReflectResult<Value>;

    /// Write `property`; `NoSuchProperty` when undeclared
    fn set(&self, property: &str, value: Value) -> ReflectResult<()>;

    /// Whether `property` is declared and holds a defined, non-null value
    fn property_is_set(&self, property: &str) -> bool;

    /// Clear `property`; `NoSuchProperty` when undeclared
    fn unset_property(&self, property: &str) -> ReflectResult<()>;
}
