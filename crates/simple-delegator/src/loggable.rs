//! Logging delegatee
//!
//! [`LoggableDelegatee`] reaches into its target through reflection, so
//! private and protected members are as reachable as public ones. Every
//! successful access leaves exactly one debug record; a failed one leaves
//! none. Presence checks are the exception: they always record, before the
//! check runs.

use std::fmt;
use std::sync::Arc;

use delegator_runtime::{
    ObjectRef, ReflectError, ReflectResult, ReflectionClass, ReflectionProperty, Value,
};

use crate::caller::{Caller, WeakCaller};
use crate::delegatee::Delegatee;
use crate::logger::{LogContext, Logger, NullLogger};

/// Delegatee that forwards to a [`Caller`] and logs each access.
///
/// The caller instance is not owned: a caller that keeps its host alive does
/// not form a cycle through the host's delegatee. Once the caller is dropped,
/// every access fails with `CallerDropped`.
pub struct LoggableDelegatee {
    target: WeakCaller,
    reflection: ReflectionClass,
    logger: Arc<dyn Logger>,
}

impl LoggableDelegatee {
    /// Forward to `target`, reporting through `logger`
    pub fn new(target: Caller, logger: Arc<dyn Logger>) -> Self {
        let reflection = ReflectionClass::new(target.class());
        Self {
            target: target.downgrade(),
            reflection,
            logger,
        }
    }

    /// Forward to `target` without logging
    pub fn with_null_logger(target: Caller) -> Self {
        Self::new(target, Arc::new(NullLogger))
    }

    /// Forwarding target, `None` once the caller instance is gone
    pub fn target(&self) -> Option<Caller> {
        self.target.upgrade()
    }

    fn class_name(&self) -> &str {
        self.reflection.name()
    }

    /// Instance to run against; `None` for class-level targets
    fn receiver(&self) -> ReflectResult<Option<ObjectRef>> {
        match &self.target {
            WeakCaller::Class(_) => Ok(None),
            WeakCaller::Object { object, .. } => object
                .upgrade()
                .map(Some)
                .ok_or_else(|| ReflectError::CallerDropped {
                    class: self.class_name().to_string(),
                }),
        }
    }

    /// Resolve a property together with the instance holding it.
    ///
    /// Class targets carry no instance storage, so every property is
    /// undeclared for them.
    fn property(&self, property: &str) -> ReflectResult<(ReflectionProperty, ObjectRef)> {
        let Some(obj) = self.receiver()? else {
            return Err(ReflectError::no_such_property(property, self.class_name()));
        };
        Ok((self.reflection.property(property)?, obj))
    }

    fn record(&self, operation: &str, message: String, member: &str, payload: Option<(&str, serde_json::Value)>) {
        let mut context = LogContext::new();
        context.insert("operation".into(), operation.into());
        context.insert("class".into(), self.class_name().into());
        context.insert("member".into(), member.into());
        if let Some((key, value)) = payload {
            context.insert(key.into(), value);
        }
        self.logger.debug(&message, &context);
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

impl Delegatee for LoggableDelegatee {
    fn call(&self, method: &str, args: Vec<Value>) -> ReflectResult<Value> {
        let receiver = self.receiver()?;
        let handle = self.reflection.method(method)?;
        let logged_args = to_json(&args);
        let result = handle.invoke(receiver.as_ref(), args)?;

        self.record(
            "call",
            format!("Delegated call to {}::{}()", self.class_name(), method),
            method,
            Some(("args", logged_args)),
        );
        Ok(result)
    }

    fn get(&self, property: &str) -> ReflectResult<Value> {
        let (handle, obj) = self.property(property)?;
        let value = handle.get_value(&obj)?;

        self.record(
            "get",
            format!("Delegated get of {}::${}", self.class_name(), property),
            property,
            Some(("value", to_json(&value))),
        );
        Ok(value)
    }

    fn set(&self, property: &str, value: Value) -> ReflectResult<()> {
        let (handle, obj) = self.property(property)?;
        let logged_value = to_json(&value);
        handle.set_value(&obj, value)?;

        self.record(
            "set",
            format!("Delegated set of {}::${}", self.class_name(), property),
            property,
            Some(("value", logged_value)),
        );
        Ok(())
    }

    fn property_is_set(&self, property: &str) -> bool {
        self.record(
            "isset",
            format!("Delegated isset of {}::${}", self.class_name(), property),
            property,
            None,
        );

        self.property(property)
            .and_then(|(handle, obj)| handle.is_initialized(&obj))
            .unwrap_or(false)
    }

    fn unset_property(&self, property: &str) -> ReflectResult<()> {
        let (handle, obj) = self.property(property)?;
        handle.unset(&obj)?;

        self.record(
            "unset",
            format!("Delegated unset of {}::${}", self.class_name(), property),
            property,
            None,
        );
        Ok(())
    }
}

impl fmt::Debug for LoggableDelegatee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggableDelegatee")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
