//! Caller resolution
//!
//! A host forwards unresolved accesses to its *caller*: the object (or, from
//! class-level code, the class) that was running just before control entered
//! the host. Resolution is pluggable through [`CallerResolver`]:
//!
//! - [`ContextCaller`] hands back a caller injected up front
//! - [`StackCallerResolver`] walks the shadow call stack, skipping the host's
//!   own frames
//!
//! Any `Fn(&ClassRef) -> Option<Caller>` closure is a resolver as well.

use std::fmt;
use std::sync::{Arc, Weak};

use delegator_runtime::{CallStack, ClassRef, Object, ObjectRef};

/// How many frames the stack strategy inspects by default
pub const DEFAULT_LOOKBACK_DEPTH: usize = 5;

/// Resolved forwarding target
#[derive(Clone)]
pub enum Caller {
    /// Caller ran on an instance
    Object(ObjectRef),
    /// Caller ran in class-level code
    Class(ClassRef),
}

impl Caller {
    /// Class of the caller
    pub fn class(&self) -> &ClassRef {
        match self {
            Caller::Object(obj) => obj.class(),
            Caller::Class(class) => class,
        }
    }

    /// Caller instance, `None` for class-level callers
    pub fn object(&self) -> Option<&ObjectRef> {
        match self {
            Caller::Object(obj) => Some(obj),
            Caller::Class(_) => None,
        }
    }
}

impl Caller {
    /// Non-owning form, so a delegatee never keeps its caller alive
    pub fn downgrade(&self) -> WeakCaller {
        match self {
            Caller::Object(obj) => WeakCaller::Object {
                class: obj.class().clone(),
                object: Arc::downgrade(obj),
            },
            Caller::Class(class) => WeakCaller::Class(class.clone()),
        }
    }
}

/// [`Caller`] that does not own its instance
#[derive(Clone)]
pub enum WeakCaller {
    /// Caller instance, possibly dropped
    Object {
        /// Class of the instance
        class: ClassRef,
        /// The instance itself
        object: Weak<Object>,
    },
    /// Class-level caller
    Class(ClassRef),
}

impl WeakCaller {
    /// Class of the caller, available even after the instance is gone
    pub fn class(&self) -> &ClassRef {
        match self {
            WeakCaller::Object { class, .. } => class,
            WeakCaller::Class(class) => class,
        }
    }

    /// Owning form, `None` once the instance has been dropped
    pub fn upgrade(&self) -> Option<Caller> {
        match self {
            WeakCaller::Object { object, .. } => object.upgrade().map(Caller::Object),
            WeakCaller::Class(class) => Some(Caller::Class(class.clone())),
        }
    }
}

impl fmt::Debug for WeakCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(caller) => fmt::Debug::fmt(&caller, f),
            None => write!(f, "{}#dropped", self.class().name()),
        }
    }
}

impl PartialEq for Caller {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Caller::Object(a), Caller::Object(b)) => a.id() == b.id(),
            (Caller::Class(a), Caller::Class(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl fmt::Debug for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Object(obj) => write!(f, "{}#{}", obj.class().name(), obj.id()),
            Caller::Class(class) => write!(f, "{}::class", class.name()),
        }
    }
}

/// Strategy for finding the caller of a host of class `host_class`
pub trait CallerResolver: Send + Sync {
    /// Resolve the caller, `None` when none can be determined
    fn resolve(&self, host_class: &ClassRef) -> Option<Caller>;
}

impl<F> CallerResolver for F
where
    F: Fn(&ClassRef) -> Option<Caller> + Send + Sync,
{
    fn resolve(&self, host_class: &ClassRef) -> Option<Caller> {
        self(host_class)
    }
}

/// Resolver returning a caller fixed at construction.
///
/// The caller is held strongly for as long as the resolver is installed. A
/// caller that owns its host should be injected through a closure capturing a
/// `Weak` handle instead.
#[derive(Debug, Clone)]
pub struct ContextCaller(Caller);

impl ContextCaller {
    /// Always resolve to `caller`
    pub fn new(caller: Caller) -> Self {
        Self(caller)
    }
}

impl CallerResolver for ContextCaller {
    fn resolve(&self, _host_class: &ClassRef) -> Option<Caller> {
        Some(self.0.clone())
    }
}

/// Resolver walking the current thread's call stack
#[derive(Debug, Clone, Copy)]
pub struct StackCallerResolver {
    depth: usize,
}

impl StackCallerResolver {
    /// Inspect at most `depth` frames
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    /// Frames inspected per resolution
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for StackCallerResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK_DEPTH)
    }
}

impl CallerResolver for StackCallerResolver {
    fn resolve(&self, host_class: &ClassRef) -> Option<Caller> {
        resolve_from_stack(host_class, self.depth)
    }
}

/// Find the first of the newest `depth` frames that does not belong to
/// `host_class` (or one of its ancestors) and return its instance or class.
pub fn resolve_from_stack(host_class: &ClassRef, depth: usize) -> Option<Caller> {
    let caller = CallStack::backtrace(depth)
        .into_iter()
        .find(|frame| !host_class.is_subclass_of(frame.class.id()))
        .map(|frame| match frame.this {
            Some(obj) => Caller::Object(obj),
            None => Caller::Class(frame.class),
        });

    tracing::trace!(host = host_class.name(), depth, ?caller, "resolved caller from stack");
    caller
}
