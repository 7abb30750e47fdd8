//! Error types for the reflective runtime

use crate::object::Visibility;

/// Result type for runtime and reflection operations
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Runtime and reflection errors
///
/// Structural failures (`NoSuchMethod`, `NoSuchProperty`) are deterministic and
/// are never caught by the runtime: they travel back to whoever started the
/// access.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReflectError {
    /// Method is not declared on the class or any of its ancestors
    #[error("Method {method} does not exist on class {class}")]
    NoSuchMethod {
        /// Requested method name
        method: String,
        /// Name of the inspected class
        class: String,
    },

    /// Property is not declared on the class or any of its ancestors
    #[error("Property {property} does not exist on class {class}")]
    NoSuchProperty {
        /// Requested property name
        property: String,
        /// Name of the inspected class
        class: String,
    },

    /// Method exists but is not visible from the calling scope
    #[error("Call to {visibility} method {class}::{method}() from scope {scope}")]
    MethodNotAccessible {
        /// Method name
        method: String,
        /// Declaring class name
        class: String,
        /// Declared visibility
        visibility: Visibility,
        /// Name of the calling class, or `{main}` outside any frame
        scope: String,
    },

    /// Property exists but is not visible from the calling scope
    #[error("Cannot access {visibility} property {class}::${property} from scope {scope}")]
    PropertyNotAccessible {
        /// Property name
        property: String,
        /// Declaring class name
        class: String,
        /// Declared visibility
        visibility: Visibility,
        /// Name of the calling class, or `{main}` outside any frame
        scope: String,
    },

    /// Instance method body needed `this` but was invoked without a receiver
    #[error("Non-static method {class}::{method}() cannot be called without an object")]
    MissingReceiver {
        /// Declaring class name
        class: String,
        /// Method name
        method: String,
    },

    /// No caller could be determined for a delegating host
    #[error("No caller could be determined for delegating class {class}")]
    CallerUnresolved {
        /// Host class name
        class: String,
    },

    /// The caller a delegatee forwards to has been dropped
    #[error("Caller of class {class} no longer exists")]
    CallerDropped {
        /// Caller class name
        class: String,
    },

    /// Value had an unexpected type
    #[error("Type error: {0}")]
    TypeError(String),

    /// Error raised by a method body
    #[error("{0}")]
    Thrown(String),
}

impl ReflectError {
    /// Shorthand for [`ReflectError::NoSuchMethod`]
    pub fn no_such_method(method: impl Into<String>, class: impl Into<String>) -> Self {
        ReflectError::NoSuchMethod {
            method: method.into(),
            class: class.into(),
        }
    }

    /// Shorthand for [`ReflectError::NoSuchProperty`]
    pub fn no_such_property(property: impl Into<String>, class: impl Into<String>) -> Self {
        ReflectError::NoSuchProperty {
            property: property.into(),
            class: class.into(),
        }
    }

    /// True for the two "member does not exist" kinds
    pub fn is_missing_member(&self) -> bool {
        matches!(
            self,
            ReflectError::NoSuchMethod { .. } | ReflectError::NoSuchProperty { .. }
        )
    }
}

impl From<String> for ReflectError {
    fn from(s: String) -> Self {
        ReflectError::Thrown(s)
    }
}

impl From<&str> for ReflectError {
    fn from(s: &str) -> Self {
        ReflectError::Thrown(s.to_string())
    }
}
