//! Object model: classes, members and instances
//!
//! A [`Class`] owns its declared members; instance storage is a flat slot
//! vector laid out parent-first, so every field (own or inherited) maps to
//! exactly one slot index. An unset slot is `None`.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{ReflectError, ReflectResult};
use crate::hooks::{HookFactory, InstanceHooks, StaticHook};
use crate::value::Value;

/// Shared class handle
pub type ClassRef = Arc<Class>;

/// Shared object handle
pub type ObjectRef = Arc<Object>;

/// Method implementation
pub type MethodBody = Arc<dyn Fn(&Invocation) -> ReflectResult<Value> + Send + Sync>;

/// Global counter for generating unique class IDs
static NEXT_CLASS_ID: AtomicUsize = AtomicUsize::new(1);

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Visibility
// ============================================================================

/// Declared member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to the declaring class and classes related by inheritance
    Protected,
    /// Visible to the declaring class only
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

// ============================================================================
// Members
// ============================================================================

/// Declared field, as seen from the class that owns the slot layout
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared visibility
    pub visibility: Visibility,
    /// Initial value for new instances (`None` leaves the slot unset)
    pub default: Option<Value>,
    /// ID of the declaring class
    pub declaring_class: usize,
    /// Slot index within instances
    pub slot: usize,
}

/// Declared method
#[derive(Clone)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Declared visibility
    pub visibility: Visibility,
    /// Whether the method is class-level
    pub is_static: bool,
    /// Implementation
    pub body: MethodBody,
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// Arguments and context handed to a method body
pub struct Invocation {
    /// Class that declares the running method
    pub class: ClassRef,
    /// Bound instance, `None` for class-level invocations
    pub this: Option<ObjectRef>,
    /// Running method name
    pub method: String,
    /// Call arguments
    pub args: Vec<Value>,
}

impl Invocation {
    /// Bound instance, or `MissingReceiver` for class-level invocations
    pub fn this(&self) -> ReflectResult<&ObjectRef> {
        self.this.as_ref().ok_or_else(|| ReflectError::MissingReceiver {
            class: self.class.name().to_string(),
            method: self.method.clone(),
        })
    }

    /// Declaring class of the running method
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// All arguments
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Argument at `index`, null when missing
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Class
// ============================================================================

/// Runtime class
pub struct Class {
    id: usize,
    name: String,
    parent: Option<ClassRef>,
    /// Slot layout: inherited fields first, then own
    layout: Vec<FieldDecl>,
    /// Field name to slot index
    field_indices: FxHashMap<String, usize>,
    /// Own methods only; lookups walk the parent chain
    methods: FxHashMap<String, MethodDecl>,
    instance_hooks: Option<HookFactory>,
    static_hook: Option<Arc<dyn StaticHook>>,
}

impl Class {
    /// Unique class ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, if any
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    /// Number of instance slots (own and inherited fields)
    pub fn slot_count(&self) -> usize {
        self.layout.len()
    }

    /// Full field layout in slot order
    pub fn fields(&self) -> &[FieldDecl] {
        &self.layout
    }

    /// Field declaration by name (own or inherited)
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.field_indices.get(name).map(|&slot| &self.layout[slot])
    }

    /// Own method declarations
    pub fn own_methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.values()
    }

    /// Whether this class is `id` or descends from it
    pub fn is_subclass_of(&self, id: usize) -> bool {
        if self.id == id {
            return true;
        }
        let mut current = self.parent.as_ref();
        while let Some(class) = current {
            if class.id == id {
                return true;
            }
            current = class.parent.as_ref();
        }
        false
    }

    /// Find `id` in this class's ancestry (including itself)
    pub fn ancestor(this: &ClassRef, id: usize) -> Option<ClassRef> {
        let mut current = Some(this);
        while let Some(class) = current {
            if class.id == id {
                return Some(class.clone());
            }
            current = class.parent.as_ref();
        }
        None
    }

    /// Look up a method by name, walking the parent chain.
    ///
    /// Returns the declaring class together with the declaration.
    pub fn lookup_method(this: &ClassRef, name: &str) -> Option<(ClassRef, MethodDecl)> {
        let mut current = Some(this);
        while let Some(class) = current {
            if let Some(decl) = class.methods.get(name) {
                return Some((class.clone(), decl.clone()));
            }
            current = class.parent.as_ref();
        }
        None
    }

    /// Per-instance hook factory (own or inherited)
    pub fn instance_hooks(&self) -> Option<&HookFactory> {
        match &self.instance_hooks {
            Some(factory) => Some(factory),
            None => self.parent.as_ref().and_then(|p| p.instance_hooks()),
        }
    }

    /// Class-level hook for unresolved static calls (own or inherited)
    pub fn static_hook(&self) -> Option<&Arc<dyn StaticHook>> {
        match &self.static_hook {
            Some(hook) => Some(hook),
            None => self.parent.as_ref().and_then(|p| p.static_hook()),
        }
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("fields", &self.layout.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

// ============================================================================
// ClassBuilder
// ============================================================================

/// Builder for [`Class`]
pub struct ClassBuilder {
    id: usize,
    name: String,
    parent: Option<ClassRef>,
    fields: Vec<(String, Visibility, Option<Value>)>,
    methods: FxHashMap<String, MethodDecl>,
    instance_hooks: Option<HookFactory>,
    static_hook: Option<Arc<dyn StaticHook>>,
}

impl ClassBuilder {
    /// Start a new class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            methods: FxHashMap::default(),
            instance_hooks: None,
            static_hook: None,
        }
    }

    /// Inherit from `parent`
    pub fn extends(mut self, parent: &ClassRef) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declare a field with no initial value
    pub fn field(mut self, name: impl Into<String>, visibility: Visibility) -> Self {
        self.fields.push((name.into(), visibility, None));
        self
    }

    /// Declare a field with an initial value
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        visibility: Visibility,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push((name.into(), visibility, Some(default.into())));
        self
    }

    /// Declare an instance method
    pub fn method<F>(self, name: impl Into<String>, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&Invocation) -> ReflectResult<Value> + Send + Sync + 'static,
    {
        self.declare(name.into(), visibility, false, Arc::new(body))
    }

    /// Declare a class-level method
    pub fn static_method<F>(self, name: impl Into<String>, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&Invocation) -> ReflectResult<Value> + Send + Sync + 'static,
    {
        self.declare(name.into(), visibility, true, Arc::new(body))
    }

    fn declare(mut self, name: String, visibility: Visibility, is_static: bool, body: MethodBody) -> Self {
        self.methods.insert(
            name.clone(),
            MethodDecl {
                name,
                visibility,
                is_static,
                body,
            },
        );
        self
    }

    /// Declare the per-instance hooks for unresolved instance access.
    ///
    /// Replaces anything declared earlier on this builder.
    pub fn instance_hooks<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn InstanceHooks> + Send + Sync + 'static,
    {
        self.instance_hooks = Some(Arc::new(factory));
        self
    }

    /// Declare the hook for unresolved static calls.
    ///
    /// Replaces anything declared earlier on this builder.
    pub fn static_hook(mut self, hook: Arc<dyn StaticHook>) -> Self {
        self.static_hook = Some(hook);
        self
    }

    /// Whether instance hooks are already declared on this builder
    pub fn has_instance_hooks(&self) -> bool {
        self.instance_hooks.is_some()
    }

    /// Whether a static hook is already declared on this builder
    pub fn has_static_hook(&self) -> bool {
        self.static_hook.is_some()
    }

    /// Class name being built
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finish the class
    pub fn build(self) -> ClassRef {
        let mut layout = self
            .parent
            .as_ref()
            .map(|p| p.layout.clone())
            .unwrap_or_default();
        let mut field_indices = self
            .parent
            .as_ref()
            .map(|p| p.field_indices.clone())
            .unwrap_or_default();

        for (name, visibility, default) in self.fields {
            // Redeclaring an inherited field reuses its slot
            let slot = match field_indices.get(&name) {
                Some(&slot) => slot,
                None => {
                    let slot = layout.len();
                    field_indices.insert(name.clone(), slot);
                    layout.push(FieldDecl {
                        name: name.clone(),
                        visibility,
                        default: None,
                        declaring_class: self.id,
                        slot,
                    });
                    slot
                }
            };
            layout[slot] = FieldDecl {
                name,
                visibility,
                default,
                declaring_class: self.id,
                slot,
            };
        }

        Arc::new(Class {
            id: self.id,
            name: self.name,
            parent: self.parent,
            layout,
            field_indices,
            methods: self.methods,
            instance_hooks: self.instance_hooks,
            static_hook: self.static_hook,
        })
    }
}

// ============================================================================
// Object
// ============================================================================

/// Object instance
pub struct Object {
    id: u64,
    class: ClassRef,
    slots: RwLock<Vec<Option<Value>>>,
    hooks: Option<Arc<dyn InstanceHooks>>,
}

impl Object {
    /// Create an instance of `class`.
    ///
    /// Slots start from their declared defaults; hooks are created fresh from
    /// the class's factory so every instance owns its own hook state.
    pub fn instantiate(class: &ClassRef) -> ObjectRef {
        let slots = class.layout.iter().map(|f| f.default.clone()).collect();
        let hooks = class.instance_hooks().map(|factory| factory());
        Arc::new(Object {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class: class.clone(),
            slots: RwLock::new(slots),
            hooks,
        })
    }

    /// Unique object ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Class of this instance
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Hooks attached to this instance, if its class declares any
    pub fn hooks(&self) -> Option<&Arc<dyn InstanceHooks>> {
        self.hooks.as_ref()
    }

    /// Whether this object is an instance of `class` or one of its subclasses
    pub fn instance_of(&self, class: &ClassRef) -> bool {
        self.class.is_subclass_of(class.id())
    }

    /// Read a slot by index
    pub(crate) fn read_slot(&self, slot: usize) -> Option<Value> {
        self.slots.read().get(slot).cloned().flatten()
    }

    /// Write a slot by index; `None` clears it
    pub(crate) fn write_slot(&self, slot: usize, value: Option<Value>) {
        if let Some(entry) = self.slots.write().get_mut(slot) {
            *entry = value;
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("class", &self.class.name())
            .field("slots", &*self.slots.read())
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_parent_first() {
        let base = ClassBuilder::new("Base")
            .field("a", Visibility::Public)
            .field("b", Visibility::Private)
            .build();
        let child = ClassBuilder::new("Child")
            .extends(&base)
            .field("c", Visibility::Protected)
            .build();

        assert_eq!(child.slot_count(), 3);
        assert_eq!(child.field("a").unwrap().slot, 0);
        assert_eq!(child.field("b").unwrap().slot, 1);
        assert_eq!(child.field("c").unwrap().slot, 2);
        assert_eq!(child.field("b").unwrap().declaring_class, base.id());
    }

    #[test]
    fn test_redeclared_field_reuses_slot() {
        let base = ClassBuilder::new("Base")
            .field("name", Visibility::Private)
            .build();
        let child = ClassBuilder::new("Child")
            .extends(&base)
            .field_with_default("name", Visibility::Public, "child")
            .build();

        assert_eq!(child.slot_count(), 1);
        let decl = child.field("name").unwrap();
        assert_eq!(decl.visibility, Visibility::Public);
        assert_eq!(decl.declaring_class, child.id());
    }

    #[test]
    fn test_lookup_method_walks_parents() {
        let base = ClassBuilder::new("Base")
            .method("greet", Visibility::Protected, |_| Ok(Value::from("hi")))
            .build();
        let child = ClassBuilder::new("Child").extends(&base).build();

        let (declaring, decl) = Class::lookup_method(&child, "greet").unwrap();
        assert_eq!(declaring.id(), base.id());
        assert_eq!(decl.visibility, Visibility::Protected);
        assert!(Class::lookup_method(&child, "missing").is_none());
    }

    #[test]
    fn test_instantiate_uses_defaults() {
        let class = ClassBuilder::new("Counter")
            .field_with_default("count", Visibility::Private, 3)
            .field("label", Visibility::Public)
            .build();
        let obj = Object::instantiate(&class);

        assert_eq!(obj.read_slot(0), Some(Value::Int(3)));
        assert_eq!(obj.read_slot(1), None);
        assert!(obj.instance_of(&class));
    }

    #[test]
    fn test_subclass_relationship() {
        let base = ClassBuilder::new("Base").build();
        let child = ClassBuilder::new("Child").extends(&base).build();
        let other = ClassBuilder::new("Other").build();

        assert!(child.is_subclass_of(base.id()));
        assert!(!base.is_subclass_of(child.id()));
        assert!(!other.is_subclass_of(base.id()));
        assert_eq!(Class::ancestor(&child, base.id()).unwrap().name(), "Base");
    }
}
