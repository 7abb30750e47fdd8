//! Integration tests for the logging delegatee
//!
//! Exercises forwarding against a target with private and protected members,
//! the record-count contract and the error kinds for undeclared members.

use std::sync::Arc;

use serde_json::json;

use delegator_runtime::dispatch::get_property;
use delegator_runtime::{ClassBuilder, ClassRef, Object, ObjectRef, ReflectError, Value, Visibility};
use simple_delegator::{Caller, Delegatee, LoggableDelegatee, MemoryLogger};

fn base_class() -> ClassRef {
    ClassBuilder::new("Base")
        .field_with_default("inherited", Visibility::Protected, "from base")
        .method("greet", Visibility::Protected, |inv| {
            Ok(Value::from(format!("hello {}", inv.arg(0).as_str().unwrap_or("nobody"))))
        })
        .build()
}

fn target_class() -> ClassRef {
    ClassBuilder::new("Target")
        .extends(&base_class())
        .field_with_default("secret", Visibility::Private, 7)
        .field("pending", Visibility::Public)
        .method("reveal", Visibility::Private, |inv| get_property(inv.this()?, "secret"))
        .method("fail", Visibility::Public, |_| Err(ReflectError::Thrown("boom".into())))
        .build()
}

fn setup() -> (ObjectRef, LoggableDelegatee, Arc<MemoryLogger>) {
    let target = Object::instantiate(&target_class());
    let logger = Arc::new(MemoryLogger::new());
    let delegatee = LoggableDelegatee::new(Caller::Object(target.clone()), logger.clone());
    (target, delegatee, logger)
}

// ============================================================================
// Private members
// ============================================================================

#[test]
fn test_private_field_and_method_are_reachable() {
    let (_target, delegatee, logger) = setup();

    assert_eq!(delegatee.get("secret").unwrap(), Value::Int(7));
    assert_eq!(delegatee.call("reveal", vec![]).unwrap(), Value::Int(7));
    assert_eq!(logger.len(), 2);
}

#[test]
fn test_inherited_members_count_as_declared() {
    let (_target, delegatee, _logger) = setup();

    assert_eq!(
        delegatee.call("greet", vec![Value::from("ada")]).unwrap(),
        Value::from("hello ada")
    );
    assert_eq!(delegatee.get("inherited").unwrap(), Value::from("from base"));
}

#[test]
fn test_set_then_get_round_trip() {
    let (target, delegatee, _logger) = setup();

    delegatee.set("secret", Value::Int(11)).unwrap();

    assert_eq!(delegatee.get("secret").unwrap(), Value::Int(11));
    assert_eq!(delegatee.call("reveal", vec![]).unwrap(), Value::Int(11));
    assert!(matches!(
        get_property(&target, "secret"),
        Err(ReflectError::PropertyNotAccessible { .. })
    ));
}

// ============================================================================
// Presence
// ============================================================================

#[test]
fn test_property_is_set_semantics() {
    let (_target, delegatee, logger) = setup();

    assert!(delegatee.property_is_set("secret"));
    assert!(!delegatee.property_is_set("pending"));
    assert!(!delegatee.property_is_set("missingField"));

    delegatee.set("pending", Value::Null).unwrap();
    assert!(!delegatee.property_is_set("pending"));
    delegatee.set("pending", Value::Bool(false)).unwrap();
    assert!(delegatee.property_is_set("pending"));

    delegatee.unset_property("secret").unwrap();
    assert!(!delegatee.property_is_set("secret"));
    assert_eq!(delegatee.get("secret").unwrap(), Value::Null);

    // one per presence check, one per successful set/unset/get
    assert_eq!(logger.len(), 10);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_field_scenario() {
    let (_target, delegatee, logger) = setup();

    assert_eq!(
        delegatee.get("missingField").unwrap_err(),
        ReflectError::no_such_property("missingField", "Target")
    );
    assert!(logger.is_empty());

    assert!(!delegatee.property_is_set("missingField"));
    assert_eq!(logger.len(), 1);
    assert_eq!(logger.records()[0].context["member"], json!("missingField"));
}

#[test]
fn test_failures_propagate_unchanged_without_record() {
    let (_target, delegatee, logger) = setup();

    assert_eq!(
        delegatee.call("missingMethod", vec![]).unwrap_err(),
        ReflectError::no_such_method("missingMethod", "Target")
    );
    assert_eq!(
        delegatee.call("fail", vec![]).unwrap_err(),
        ReflectError::Thrown("boom".into())
    );
    assert_eq!(
        delegatee.set("missingField", Value::Int(1)).unwrap_err(),
        ReflectError::no_such_property("missingField", "Target")
    );
    assert_eq!(
        delegatee.unset_property("missingField").unwrap_err(),
        ReflectError::no_such_property("missingField", "Target")
    );
    assert!(logger.is_empty());
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_shape() {
    let (target, delegatee, logger) = setup();

    delegatee.call("reveal", vec![Value::Int(1), Value::Object(target.clone())]).unwrap();
    delegatee.set("pending", Value::from("done")).unwrap();

    let records = logger.records();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].level, tracing::Level::DEBUG);
    assert_eq!(records[0].message, "Delegated call to Target::reveal()");
    assert_eq!(records[0].context["class"], json!("Target"));
    assert_eq!(
        records[0].context["args"],
        json!([1, format!("Target#{}", target.id())])
    );

    assert_eq!(records[1].message, "Delegated set of Target::$pending");
    assert_eq!(records[1].context["operation"], json!("set"));
    assert_eq!(records[1].context["value"], json!("done"));
}
