//! Reflection API
//!
//! Introspective handles for classes, methods and properties. Unlike the
//! dispatch functions, reflection never consults visibility: a handle can
//! invoke a private method or write a protected field from anywhere. Hooks
//! are never consulted either; a member is there or it is not.

use std::fmt;

use crate::error::{ReflectError, ReflectResult};
use crate::object::{Class, ClassRef, FieldDecl, Invocation, MethodDecl, ObjectRef, Visibility};
use crate::stack::{CallStack, Frame};
use crate::value::Value;

/// Modifier flags for class members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    /// Declared visibility
    pub visibility: Visibility,
    /// Class-level member
    pub is_static: bool,
}

/// Introspective view of a class
#[derive(Clone)]
pub struct ReflectionClass {
    class: ClassRef,
}

impl ReflectionClass {
    /// Reflect on `class`
    pub fn new(class: &ClassRef) -> Self {
        Self {
            class: class.clone(),
        }
    }

    /// Reflect on the class of `obj`
    pub fn of_object(obj: &ObjectRef) -> Self {
        Self::new(obj.class())
    }

    /// Reflected class name
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Reflected class handle
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Whether the class declares or inherits `name`, at any visibility
    pub fn has_method(&self, name: &str) -> bool {
        Class::lookup_method(&self.class, name).is_some()
    }

    /// Method handle, or `NoSuchMethod`
    pub fn method(&self, name: &str) -> ReflectResult<ReflectionMethod> {
        Class::lookup_method(&self.class, name)
            .map(|(declaring, decl)| ReflectionMethod { declaring, decl })
            .ok_or_else(|| ReflectError::no_such_method(name, self.class.name()))
    }

    /// All methods visible through this class, most derived first
    pub fn methods(&self) -> Vec<ReflectionMethod> {
        let mut seen = Vec::new();
        let mut methods = Vec::new();
        let mut current = Some(&self.class);
        while let Some(class) = current {
            let mut own: Vec<&MethodDecl> = class.own_methods().collect();
            own.sort_by(|a, b| a.name.cmp(&b.name));
            for decl in own {
                if !seen.contains(&decl.name) {
                    seen.push(decl.name.clone());
                    methods.push(ReflectionMethod {
                        declaring: class.clone(),
                        decl: decl.clone(),
                    });
                }
            }
            current = class.parent();
        }
        methods
    }

    /// Whether the class declares or inherits field `name`, at any visibility
    pub fn has_property(&self, name: &str) -> bool {
        self.class.field(name).is_some()
    }

    /// Property handle, or `NoSuchProperty`
    pub fn property(&self, name: &str) -> ReflectResult<ReflectionProperty> {
        self.class
            .field(name)
            .map(|decl| ReflectionProperty {
                class: self.class.clone(),
                decl: decl.clone(),
            })
            .ok_or_else(|| ReflectError::no_such_property(name, self.class.name()))
    }

    /// All fields in slot order
    pub fn properties(&self) -> Vec<ReflectionProperty> {
        self.class
            .fields()
            .iter()
            .map(|decl| ReflectionProperty {
                class: self.class.clone(),
                decl: decl.clone(),
            })
            .collect()
    }
}

impl fmt::Debug for ReflectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionClass({})", self.class.name())
    }
}

/// Introspective handle on one method
#[derive(Clone)]
pub struct ReflectionMethod {
    declaring: ClassRef,
    decl: MethodDecl,
}

impl ReflectionMethod {
    /// Method name
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    /// Declaring class
    pub fn declaring_class(&self) -> &ClassRef {
        &self.declaring
    }

    /// Declared modifiers
    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            visibility: self.decl.visibility,
            is_static: self.decl.is_static,
        }
    }

    /// Invoke regardless of visibility.
    ///
    /// Runs inside a frame of the declaring class bound to `this`, exactly as
    /// an ordinary dispatch would, so the body sees its own private scope.
    pub fn invoke(&self, this: Option<&ObjectRef>, args: Vec<Value>) -> ReflectResult<Value> {
        invoke_decl(&self.declaring, &self.decl, this.cloned(), args)
    }
}

impl fmt::Debug for ReflectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionMethod({}::{})", self.declaring.name(), self.decl.name)
    }
}

/// Introspective handle on one field
#[derive(Clone)]
pub struct ReflectionProperty {
    class: ClassRef,
    decl: FieldDecl,
}

impl ReflectionProperty {
    /// Field name
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.decl.visibility
    }

    /// Current value; an unset slot reads as null
    pub fn get_value(&self, obj: &ObjectRef) -> ReflectResult<Value> {
        self.check_owner(obj)?;
        Ok(obj.read_slot(self.decl.slot).unwrap_or_default())
    }

    /// Overwrite the value
    pub fn set_value(&self, obj: &ObjectRef, value: Value) -> ReflectResult<()> {
        self.check_owner(obj)?;
        obj.write_slot(self.decl.slot, Some(value));
        Ok(())
    }

    /// Whether the slot currently holds a defined, non-null value
    pub fn is_initialized(&self, obj: &ObjectRef) -> ReflectResult<bool> {
        self.check_owner(obj)?;
        Ok(matches!(obj.read_slot(self.decl.slot), Some(v) if !v.is_null()))
    }

    /// Clear the slot back to unset
    pub fn unset(&self, obj: &ObjectRef) -> ReflectResult<()> {
        self.check_owner(obj)?;
        obj.write_slot(self.decl.slot, None);
        Ok(())
    }

    fn check_owner(&self, obj: &ObjectRef) -> ReflectResult<()> {
        if obj.instance_of(&self.class) {
            Ok(())
        } else {
            Err(ReflectError::TypeError(format!(
                "{} is not an instance of {}",
                obj.class().name(),
                self.class.name()
            )))
        }
    }
}

impl fmt::Debug for ReflectionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectionProperty({}::${})", self.class.name(), self.decl.name)
    }
}

/// Run a method body inside its frame
pub(crate) fn invoke_decl(
    declaring: &ClassRef,
    decl: &MethodDecl,
    this: Option<ObjectRef>,
    args: Vec<Value>,
) -> ReflectResult<Value> {
    // Class-level code never sees an instance
    let this = if decl.is_static { None } else { this };
    let _frame = CallStack::enter(Frame {
        class: declaring.clone(),
        this: this.clone(),
        function: decl.name.clone(),
    });
    let invocation = Invocation {
        class: declaring.clone(),
        this,
        method: decl.name.clone(),
        args,
    };
    (decl.body)(&invocation)
}
