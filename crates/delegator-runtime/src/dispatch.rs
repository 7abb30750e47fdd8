//! Member dispatch
//!
//! Ordinary (non-reflective) access. A member is resolved locally when the
//! receiver's class declares it and it is visible from the calling scope (the
//! class of the innermost frame). Anything else is *unresolved*: it goes to
//! the receiver's hooks when present, and fails otherwise.
//!
//! Hook dispatch runs inside a frame of the receiver's class, so code that
//! walks the stack from inside a hook sees the hook as belonging to the host.

use crate::error::{ReflectError, ReflectResult};
use crate::object::{Class, ClassRef, FieldDecl, MethodDecl, ObjectRef, Visibility};
use crate::reflect::invoke_decl;
use crate::stack::{CallStack, Frame};
use crate::value::Value;

/// Frame name used while an unresolved method call is being handled
pub const HOOK_CALL: &str = "{call}";
/// Frame name used while an unresolved static call is being handled
pub const HOOK_CALL_STATIC: &str = "{callStatic}";
/// Frame name used while an unresolved property read is being handled
pub const HOOK_GET: &str = "{get}";
/// Frame name used while an unresolved property write is being handled
pub const HOOK_SET: &str = "{set}";
/// Frame name used while an unresolved presence check is being handled
pub const HOOK_ISSET: &str = "{isset}";
/// Frame name used while an unresolved property removal is being handled
pub const HOOK_UNSET: &str = "{unset}";

const NO_SCOPE: &str = "{main}";

/// Whether a member declared on `declaring` with `visibility` can be reached
/// from `scope`
pub fn is_accessible(scope: Option<&ClassRef>, declaring: &ClassRef, visibility: Visibility) -> bool {
    match visibility {
        Visibility::Public => true,
        Visibility::Private => scope.map_or(false, |s| s.id() == declaring.id()),
        Visibility::Protected => scope.map_or(false, |s| {
            s.is_subclass_of(declaring.id()) || declaring.is_subclass_of(s.id())
        }),
    }
}

fn current_scope() -> Option<ClassRef> {
    CallStack::current().map(|frame| frame.class)
}

fn scope_name(scope: Option<&ClassRef>) -> String {
    scope
        .map(|s| s.name().to_string())
        .unwrap_or_else(|| NO_SCOPE.to_string())
}

enum MethodResolution {
    Local(ClassRef, MethodDecl),
    Hidden(ClassRef, MethodDecl),
    Missing,
}

fn resolve_method(class: &ClassRef, method: &str, scope: Option<&ClassRef>) -> MethodResolution {
    match Class::lookup_method(class, method) {
        Some((declaring, decl)) if is_accessible(scope, &declaring, decl.visibility) => {
            MethodResolution::Local(declaring, decl)
        }
        Some((declaring, decl)) => MethodResolution::Hidden(declaring, decl),
        None => MethodResolution::Missing,
    }
}

fn method_error(
    resolution: MethodResolution,
    class: &ClassRef,
    method: &str,
    scope: Option<&ClassRef>,
) -> ReflectError {
    match resolution {
        MethodResolution::Hidden(declaring, decl) => ReflectError::MethodNotAccessible {
            method: method.to_string(),
            class: declaring.name().to_string(),
            visibility: decl.visibility,
            scope: scope_name(scope),
        },
        _ => ReflectError::no_such_method(method, class.name()),
    }
}

enum FieldResolution {
    Local(FieldDecl),
    Hidden(ClassRef, FieldDecl),
    Missing,
}

fn resolve_field(obj: &ObjectRef, property: &str, scope: Option<&ClassRef>) -> FieldResolution {
    let Some(decl) = obj.class().field(property) else {
        return FieldResolution::Missing;
    };
    let declaring =
        Class::ancestor(obj.class(), decl.declaring_class).unwrap_or_else(|| obj.class().clone());
    if is_accessible(scope, &declaring, decl.visibility) {
        FieldResolution::Local(decl.clone())
    } else {
        FieldResolution::Hidden(declaring, decl.clone())
    }
}

fn field_error(resolution: FieldResolution, obj: &ObjectRef, property: &str, scope: Option<&ClassRef>) -> ReflectError {
    match resolution {
        FieldResolution::Hidden(declaring, decl) => ReflectError::PropertyNotAccessible {
            property: property.to_string(),
            class: declaring.name().to_string(),
            visibility: decl.visibility,
            scope: scope_name(scope),
        },
        _ => ReflectError::no_such_property(property, obj.class().name()),
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Call `method` on `obj`
pub fn call_method(obj: &ObjectRef, method: &str, args: Vec<Value>) -> ReflectResult<Value> {
    let scope = current_scope();
    match resolve_method(obj.class(), method, scope.as_ref()) {
        MethodResolution::Local(declaring, decl) => invoke_decl(&declaring, &decl, Some(obj.clone()), args),
        unresolved => call_instance_hook(obj, method, args)
            .unwrap_or_else(|| Err(method_error(unresolved, obj.class(), method, scope.as_ref()))),
    }
}

/// Call class-level `method` on `class`
pub fn call_static(class: &ClassRef, method: &str, args: Vec<Value>) -> ReflectResult<Value> {
    let scope = current_scope();
    match resolve_method(class, method, scope.as_ref()) {
        MethodResolution::Local(declaring, decl) => invoke_decl(&declaring, &decl, None, args),
        unresolved => match class.static_hook() {
            Some(hook) => {
                let _frame = CallStack::enter(Frame::class_level(class, HOOK_CALL_STATIC));
                hook.call_static(class, method, args)
            }
            None => Err(method_error(unresolved, class, method, scope.as_ref())),
        },
    }
}

/// Call `method` relative to the running code's own class (`self::method()`).
///
/// From code bound to an instance of that class this is an instance call on
/// the bound object, so an unresolved name reaches the object's *instance*
/// hooks rather than the class-level static hook. From class-level code it is
/// a static call.
pub fn call_scoped(method: &str, args: Vec<Value>) -> ReflectResult<Value> {
    let frame = CallStack::current()
        .ok_or_else(|| ReflectError::TypeError("Cannot use self:: when no class scope is active".into()))?;
    let scope = frame.class.clone();
    let this = frame.this.filter(|obj| obj.instance_of(&scope));

    let Some(obj) = this else {
        return call_static(&scope, method, args);
    };
    match resolve_method(&scope, method, Some(&scope)) {
        MethodResolution::Local(declaring, decl) => invoke_decl(&declaring, &decl, Some(obj), args),
        unresolved => call_instance_hook(&obj, method, args)
            .unwrap_or_else(|| Err(method_error(unresolved, &scope, method, Some(&scope)))),
    }
}

fn call_instance_hook(obj: &ObjectRef, method: &str, args: Vec<Value>) -> Option<ReflectResult<Value>> {
    let hooks = obj.hooks()?;
    let _frame = CallStack::enter(Frame::instance(obj, HOOK_CALL));
    Some(hooks.call(obj, method, args))
}

// ============================================================================
// Properties
// ============================================================================

/// Read `property` on `obj`; an unset declared slot reads as null
pub fn get_property(obj: &ObjectRef, property: &str) -> ReflectResult<Value> {
    let scope = current_scope();
    match resolve_field(obj, property, scope.as_ref()) {
        FieldResolution::Local(decl) => Ok(obj.read_slot(decl.slot).unwrap_or_default()),
        unresolved => match obj.hooks() {
            Some(hooks) => {
                let _frame = CallStack::enter(Frame::instance(obj, HOOK_GET));
                hooks.get(obj, property)
            }
            None => Err(field_error(unresolved, obj, property, scope.as_ref())),
        },
    }
}

/// Write `property` on `obj`
pub fn set_property(obj: &ObjectRef, property: &str, value: Value) -> ReflectResult<()> {
    let scope = current_scope();
    match resolve_field(obj, property, scope.as_ref()) {
        FieldResolution::Local(decl) => {
            obj.write_slot(decl.slot, Some(value));
            Ok(())
        }
        unresolved => match obj.hooks() {
            Some(hooks) => {
                let _frame = CallStack::enter(Frame::instance(obj, HOOK_SET));
                hooks.set(obj, property, value)
            }
            None => Err(field_error(unresolved, obj, property, scope.as_ref())),
        },
    }
}

/// Whether `property` on `obj` holds a defined, non-null value
pub fn has_property(obj: &ObjectRef, property: &str) -> ReflectResult<bool> {
    let scope = current_scope();
    match resolve_field(obj, property, scope.as_ref()) {
        FieldResolution::Local(decl) => {
            Ok(matches!(obj.read_slot(decl.slot), Some(v) if !v.is_null()))
        }
        _ => match obj.hooks() {
            Some(hooks) => {
                let _frame = CallStack::enter(Frame::instance(obj, HOOK_ISSET));
                hooks.isset(obj, property)
            }
            None => Ok(false),
        },
    }
}

/// Clear `property` on `obj`.
///
/// Removing an undeclared property from an object without hooks is a no-op.
pub fn unset_property(obj: &ObjectRef, property: &str) -> ReflectResult<()> {
    let scope = current_scope();
    match resolve_field(obj, property, scope.as_ref()) {
        FieldResolution::Local(decl) => {
            obj.write_slot(decl.slot, None);
            Ok(())
        }
        unresolved => match obj.hooks() {
            Some(hooks) => {
                let _frame = CallStack::enter(Frame::instance(obj, HOOK_UNSET));
                hooks.unset(obj, property)
            }
            None => match unresolved {
                FieldResolution::Hidden(..) => Err(field_error(unresolved, obj, property, scope.as_ref())),
                _ => Ok(()),
            },
        },
    }
}
