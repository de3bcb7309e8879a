//! Coercion-table tests for the dynamic value model.

use parlo::runtime::value::Value;

#[test]
fn integers_coerce_everywhere() {
    let v = Value::Int(3);
    assert_eq!(v.to_integer(), Ok(3));
    assert_eq!(v.to_floating(), Ok(3.0));
    assert_eq!(v.to_boolean(), Ok(true));
    assert_eq!(Value::Int(0).to_boolean(), Ok(false));
    assert_eq!(v.to_string(), "3");
}

#[test]
fn floats_truncate_toward_zero() {
    assert_eq!(Value::Float(2.9).to_integer(), Ok(2));
    assert_eq!(Value::Float(-2.9).to_integer(), Ok(-2));
    assert_eq!(Value::Float(0.0).to_boolean(), Ok(false));
    assert_eq!(Value::Float(2.5).to_string(), "2.500000");
}

#[test]
fn booleans_map_to_one_and_zero() {
    assert_eq!(Value::Bool(true).to_integer(), Ok(1));
    assert_eq!(Value::Bool(false).to_floating(), Ok(0.0));
    assert_eq!(Value::Bool(true).to_string(), "true");
}

#[test]
fn strings_parse_as_numbers_but_not_booleans() {
    assert_eq!(Value::Str("42".to_string()).to_integer(), Ok(42));
    assert_eq!(Value::Str("2.5".to_string()).to_floating(), Ok(2.5));

    let err = Value::Str("abc".to_string()).to_integer().unwrap_err();
    assert!(err.contains("cannot convert STRING \"abc\" to INT"), "got: {err}");

    let err = Value::Str("x".to_string()).to_boolean().unwrap_err();
    assert!(err.contains("invalid conversion: STRING to BOOLEAN"), "got: {err}");
}

#[test]
fn null_coerces_to_zero_and_false() {
    assert_eq!(Value::Null.to_integer(), Ok(0));
    assert_eq!(Value::Null.to_floating(), Ok(0.0));
    assert_eq!(Value::Null.to_boolean(), Ok(false));
    assert_eq!(Value::Null.to_string(), "null");
}

#[test]
fn composites_refuse_numeric_coercion() {
    let array = Value::array(vec![Value::Int(1), Value::Str("two".to_string())]);
    assert!(array.to_integer().is_err());
    assert!(array.to_boolean().is_err());
    assert_eq!(array.to_string(), "[1, two]");
}

#[test]
fn nested_arrays_render_recursively() {
    let inner = Value::array(vec![Value::Int(3)]);
    let outer = Value::array(vec![Value::Int(1), inner, Value::Null]);
    assert_eq!(outer.to_string(), "[1, [3], null]");
}
