//! Delegation mixin
//!
//! A class built with [`DelegatorMixin::with_delegation`] forwards every
//! access it cannot satisfy itself to its *caller*:
//!
//! - unresolved instance calls and property accesses go through a lazily
//!   built [`Delegatee`], created once per host on first use
//! - unresolved class-level calls go straight to the caller's class via
//!   [`StaticForwarder`], without a delegatee and without logging
//!
//! Declared members that are visible from the calling scope always run on
//! the host itself.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use delegator_runtime::{
    ClassBuilder, ClassRef, InstanceHooks, ObjectRef, ReflectError, ReflectResult, ReflectionClass,
    StaticHook, Value,
};

use crate::caller::{resolve_from_stack, Caller, CallerResolver, StackCallerResolver};
use crate::delegatee::Delegatee;
use crate::loggable::LoggableDelegatee;
use crate::logger::{Logger, NullLogger};
use crate::options::DelegatorOptions;

/// Per-host delegation state, installed as the host's instance hooks
pub struct Delegator {
    options: DelegatorOptions,
    delegatee: OnceCell<Arc<dyn Delegatee>>,
    logger: RwLock<Arc<dyn Logger>>,
    resolver: RwLock<Arc<dyn CallerResolver>>,
}

impl Delegator {
    /// Fresh state resolving callers from the stack
    pub fn new(options: DelegatorOptions) -> Self {
        let options = options.sanitized();
        let resolver: Arc<dyn CallerResolver> = Arc::new(StackCallerResolver::new(options.lookback_depth));
        Self::with_resolver(options, resolver)
    }

    /// Fresh state resolving callers through `resolver`
    pub fn with_resolver(options: DelegatorOptions, resolver: Arc<dyn CallerResolver>) -> Self {
        Self {
            options: options.sanitized(),
            delegatee: OnceCell::new(),
            logger: RwLock::new(Arc::new(NullLogger)),
            resolver: RwLock::new(resolver),
        }
    }

    /// Delegation state of `host`, if its class delegates
    pub fn of(host: &ObjectRef) -> Option<&Delegator> {
        host.hooks()?.as_any().downcast_ref::<Delegator>()
    }

    /// Options this state was created with
    pub fn options(&self) -> &DelegatorOptions {
        &self.options
    }

    /// Resolve the caller of `host` with the configured resolver
    pub fn resolve_caller(&self, host: &ObjectRef) -> Option<Caller> {
        let resolver = self.resolver.read().clone();
        resolver.resolve(host.class())
    }

    /// Resolve the caller of code running on behalf of `host_class` by
    /// walking at most `depth` frames of the current thread's stack
    pub fn resolve_static_caller(host_class: &ClassRef, depth: usize) -> Option<Caller> {
        resolve_from_stack(host_class, depth)
    }

    /// Delegatee for `host`, built on first use.
    ///
    /// Construction resolves the caller and happens at most once per host,
    /// also under concurrent first access. When no caller can be determined
    /// nothing is cached and `CallerUnresolved` is returned.
    pub fn delegatee(&self, host: &ObjectRef) -> ReflectResult<Arc<dyn Delegatee>> {
        self.delegatee
            .get_or_try_init(|| {
                let caller = self.resolve_caller(host).ok_or_else(|| ReflectError::CallerUnresolved {
                    class: host.class().name().to_string(),
                })?;
                let logger = if self.options.log_operations {
                    self.logger.read().clone()
                } else {
                    Arc::new(NullLogger)
                };

                tracing::debug!(host = %host.class().name(), ?caller, "built delegatee");
                let delegatee: Arc<dyn Delegatee> = Arc::new(LoggableDelegatee::new(caller, logger));
                Ok(delegatee)
            })
            .cloned()
    }

    /// Use `delegatee` instead of resolving a caller.
    ///
    /// Only possible before a delegatee is established; otherwise the
    /// rejected delegatee is handed back.
    pub fn set_delegatee(&self, delegatee: Arc<dyn Delegatee>) -> Result<(), Arc<dyn Delegatee>> {
        self.delegatee.set(delegatee)
    }

    /// Whether a delegatee is established
    pub fn has_delegatee(&self) -> bool {
        self.delegatee.get().is_some()
    }

    /// Logger handed to the delegatee built on first use
    pub fn set_logger(&self, logger: Arc<dyn Logger>) {
        *self.logger.write() = logger;
    }

    /// Replace the caller resolution strategy for later lazy construction
    pub fn set_caller_resolver(&self, resolver: Arc<dyn CallerResolver>) {
        *self.resolver.write() = resolver;
    }
}

impl InstanceHooks for Delegator {
    fn call(&self, host: &ObjectRef, method: &str, args: Vec<Value>) -> ReflectResult<Value> {
        self.delegatee(host)?.call(method, args)
    }

    fn get(&self, host: &ObjectRef, property: &str) -> ReflectResult<Value> {
        self.delegatee(host)?.get(property)
    }

    fn set(&self, host: &ObjectRef, property: &str, value: Value) -> ReflectResult<()> {
        self.delegatee(host)?.set(property, value)
    }

    fn isset(&self, host: &ObjectRef, property: &str) -> ReflectResult<bool> {
        Ok(self.delegatee(host)?.property_is_set(property))
    }

    fn unset(&self, host: &ObjectRef, property: &str) -> ReflectResult<()> {
        self.delegatee(host)?.unset_property(property)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Delegator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegator")
            .field("options", &self.options)
            .field("delegatee", &self.delegatee.get())
            .finish_non_exhaustive()
    }
}

/// Class-level hook forwarding unresolved static calls to the caller's class
#[derive(Debug, Clone, Copy)]
pub struct StaticForwarder {
    depth: usize,
}

impl StaticForwarder {
    /// Inspect at most `depth` frames when looking for the caller
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }
}

impl StaticHook for StaticForwarder {
    fn call_static(&self, class: &ClassRef, method: &str, args: Vec<Value>) -> ReflectResult<Value> {
        let caller = resolve_from_stack(class, self.depth).ok_or_else(|| ReflectError::CallerUnresolved {
            class: class.name().to_string(),
        })?;

        tracing::trace!(host = %class.name(), target = %caller.class().name(), method, "forwarding static call");
        ReflectionClass::new(caller.class())
            .method(method)?
            .invoke(None, args)
    }
}

/// Installs delegation on a [`ClassBuilder`]
pub trait DelegatorMixin: Sized {
    /// Delegate with default options
    fn with_delegation(self) -> Self {
        self.with_delegation_options(DelegatorOptions::default())
    }

    /// Delegate with `options`, resolving callers from the stack
    fn with_delegation_options(self, options: DelegatorOptions) -> Self;

    /// Delegate with `options`, resolving callers through `resolver`
    fn with_delegation_resolver(self, options: DelegatorOptions, resolver: Arc<dyn CallerResolver>) -> Self;
}

impl DelegatorMixin for ClassBuilder {
    fn with_delegation_options(self, options: DelegatorOptions) -> Self {
        let options = options.sanitized();
        let resolver: Arc<dyn CallerResolver> = Arc::new(StackCallerResolver::new(options.lookback_depth));
        self.with_delegation_resolver(options, resolver)
    }

    fn with_delegation_resolver(self, options: DelegatorOptions, resolver: Arc<dyn CallerResolver>) -> Self {
        let options = options.sanitized();
        let mut builder = self;

        if builder.has_instance_hooks() {
            tracing::warn!(class = builder.name(), "instance hooks already declared, delegation stays inert");
        } else {
            builder = builder.instance_hooks(move || {
                let state: Arc<dyn InstanceHooks> = Arc::new(Delegator::with_resolver(options, resolver.clone()));
                state
            });
        }

        if builder.has_static_hook() {
            tracing::warn!(class = builder.name(), "static hook already declared, static forwarding stays inert");
        } else {
            builder = builder.static_hook(Arc::new(StaticForwarder::new(options.lookback_depth)));
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegator_runtime::dispatch::call_method;
    use delegator_runtime::{CallStack, Frame, Object, Visibility};

    fn host_class() -> ClassRef {
        ClassBuilder::new("Host")
            .method("existing", Visibility::Public, |_| Ok(Value::from("host")))
            .with_delegation()
            .build()
    }

    fn caller_class() -> ClassRef {
        ClassBuilder::new("Caller")
            .method("foo", Visibility::Private, |inv| {
                Ok(Value::Int(inv.arg(0).expect_int()? + inv.arg(1).expect_int()?))
            })
            .build()
    }

    #[test]
    fn test_of_reaches_state() {
        let host = Object::instantiate(&host_class());
        let state = Delegator::of(&host).unwrap();

        assert_eq!(state.options(), &DelegatorOptions::default());
        assert!(!state.has_delegatee());
        assert!(Delegator::of(&Object::instantiate(&caller_class())).is_none());
    }

    #[test]
    fn test_forwards_to_stack_caller() {
        let host = Object::instantiate(&host_class());
        let caller = Object::instantiate(&caller_class());

        let _frame = CallStack::enter(Frame::instance(&caller, "run"));
        let result = call_method(&host, "foo", vec![Value::Int(1), Value::Int(2)]).unwrap();

        assert_eq!(result, Value::Int(3));
        assert_eq!(call_method(&host, "existing", vec![]).unwrap(), Value::from("host"));
    }

    #[test]
    fn test_unresolved_caller_caches_nothing() {
        let host = Object::instantiate(&host_class());
        let state = Delegator::of(&host).unwrap();

        assert_eq!(
            state.delegatee(&host).unwrap_err(),
            ReflectError::CallerUnresolved {
                class: "Host".to_string()
            }
        );
        assert!(!state.has_delegatee());
    }

    #[test]
    fn test_set_delegatee_rejected_once_established() {
        let host = Object::instantiate(&host_class());
        let caller = Object::instantiate(&caller_class());
        let state = Delegator::of(&host).unwrap();
        state.set_caller_resolver(Arc::new(crate::caller::ContextCaller::new(Caller::Object(caller.clone()))));

        let first = state.delegatee(&host).unwrap();
        let replacement: Arc<dyn Delegatee> =
            Arc::new(LoggableDelegatee::with_null_logger(Caller::Object(caller)));

        let rejected = state.set_delegatee(replacement.clone()).unwrap_err();
        assert!(Arc::ptr_eq(&rejected, &replacement));
        assert!(Arc::ptr_eq(&state.delegatee(&host).unwrap(), &first));
    }

    #[test]
    fn test_own_hooks_win_over_mixin() {
        struct Own;

        impl InstanceHooks for Own {
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let before = ClassBuilder::new("Before")
            .instance_hooks(|| Arc::new(Own))
            .with_delegation()
            .build();
        let after = ClassBuilder::new("After")
            .with_delegation()
            .instance_hooks(|| Arc::new(Own))
            .build();

        assert!(Delegator::of(&Object::instantiate(&before)).is_none());
        assert!(Delegator::of(&Object::instantiate(&after)).is_none());
        assert!(before.static_hook().is_some());
    }
}
