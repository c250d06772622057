//! This module defines the value universe of the interpreter. A single enum,
//! [`Value`], represents source expressions and runtime data alike: the parser
//! produces `Value`s, the evaluator consumes and returns them, and a list
//! produced at runtime is the same structure as a list read from text.
//!
//! Ergonomic helpers [`val`], [`sym`] and [`nil`] build trees in code and
//! tests. `Display` is the printer: it renders any value back into text that
//! the parser reads as the same value.

use crate::evaluator::{OperationFn, Procedure};
use std::fmt;
use std::rc::Rc;

/// Type alias for integer values in interpreter
pub type NumberType = i64;

/// Type alias for real values in interpreter
pub type RealType = f64;

/// Core value type in interpreter
///
/// To build a tree, use the helper functions:
/// - `val(42)` / `val(2.5)` for numbers, `sym("name")` for symbols, `nil()` for empty lists
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone)]
pub enum Value {
    /// Exact integers
    Integer(NumberType),
    /// Inexact reals
    Real(RealType),
    /// Symbols (identifiers and special-form keywords)
    Symbol(String),
    /// Lists, both as code (list forms) and as data. The empty list is nil.
    List(Vec<Value>),
    /// Host-provided functions, compared by id
    BuiltinFunction {
        id: String,
        func: Rc<OperationFn>,
    },
    /// User-defined closures created by `lambda`
    Procedure(Rc<Procedure>),
    /// The "no value" result of `define`, `set!` and `print`.
    /// Never equal to anything, itself included.
    Unspecified,
}

impl Value {
    /// Truthiness: zero, the empty list and the no-value marker are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Real(x) => *x != 0.0,
            Value::List(elements) => !elements.is_empty(),
            Value::Unspecified => false,
            Value::Symbol(_) | Value::BuiltinFunction { .. } | Value::Procedure(_) => true,
        }
    }

    /// Check if a value represents nil (empty list)
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }

    /// Builtins and procedures can appear in operator position
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::BuiltinFunction { .. } | Value::Procedure(_))
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::BuiltinFunction { .. } | Value::Procedure(_) => "procedure",
            Value::Unspecified => "unspecified",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Real(x) => write!(f, "Real({x:?})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
            Value::BuiltinFunction { id, .. } => write!(f, "BuiltinFunction({id})"),
            Value::Procedure(proc) => write!(
                f,
                "Procedure(params={:?}, body={:?})",
                proc.params(),
                proc.body()
            ),
            Value::Unspecified => write!(f, "Unspecified"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Integer(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl From<RealType> for Value {
    fn from(x: RealType) -> Self {
        Value::Real(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(NumberType::from(b))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(slice: &[T]) -> Self {
        Value::List(slice.iter().cloned().map(|x| x.into()).collect())
    }
}

/// Helper function for creating symbols - works great in mixed lists!
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values - works great in mixed lists!
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating empty lists (nil)
pub fn nil() -> Value {
    Value::List(vec![])
}

/// Write a real so that it reads back as a real: `3.0`, not `3`
fn write_real(f: &mut fmt::Formatter<'_>, x: RealType) -> fmt::Result {
    if x.is_nan() {
        write!(f, "nan")
    } else {
        // Debug output is the shortest round-trip form and keeps the decimal point
        write!(f, "{x:?}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Real(x) => write_real(f, *x),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::BuiltinFunction { id, .. } => write!(f, "#<builtin:{id}>"),
            Value::Procedure(_) => write!(f, "#<procedure>"),
            Value::Unspecified => write!(f, "#<unspecified>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::BuiltinFunction { id: id1, .. }, Value::BuiltinFunction { id: id2, .. }) => {
                // Compare BuiltinFunctions by id string, not function pointer
                id1 == id2
            }
            // Closures are equal only if they are the same closure
            (Value::Procedure(p1), Value::Procedure(p2)) => Rc::ptr_eq(p1, p2),
            (Value::Unspecified, _) | (_, Value::Unspecified) => false,
            _ => false, // Different variants are never equal, 1 and 1.0 included
        }
    }
}

#[cfg(test)]
mod helper_function_tests {
    use super::*;

    #[test]
    fn test_helper_functions_data_driven() {
        // Test cases as (Value, Value) tuples: (helper_result, expected_value)
        let test_cases = vec![
            (val(42), Value::Integer(42)),
            (val(-17), Value::Integer(-17)),
            (val(4294967295u32), Value::Integer(4294967295)),
            (val(-128i8), Value::Integer(-128)),
            (val(NumberType::MAX), Value::Integer(NumberType::MAX)),
            (val(2.5), Value::Real(2.5)),
            (val(true), Value::Integer(1)),
            (val(false), Value::Integer(0)),
            (sym("set!"), Value::Symbol("set!".to_owned())),
            (sym(String::from("x")), Value::Symbol("x".to_owned())),
            (nil(), Value::List(vec![])),
            (
                val([1, 2, 3]),
                Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
            ),
            (
                val(vec![sym("+"), val(1), val(0.5)]),
                Value::List(vec![
                    Value::Symbol("+".to_owned()),
                    Value::Integer(1),
                    Value::Real(0.5),
                ]),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} failed", i + 1);
        }
    }

    #[test]
    fn test_truthiness() {
        let falsy = [val(0), val(0.0), val(-0.0), nil(), Value::Unspecified];
        let truthy = [val(1), val(-3), val(0.25), sym("x"), val([0])];

        for value in &falsy {
            assert!(!value.is_truthy(), "{value:?} should be false");
        }
        for value in &truthy {
            assert!(value.is_truthy(), "{value:?} should be true");
        }
    }

    #[test]
    fn test_display() {
        let test_cases = vec![
            (val(42), "42"),
            (val(-7), "-7"),
            (val(3.0), "3.0"),
            (val(0.1), "0.1"),
            (val(-2.5), "-2.5"),
            (val(RealType::INFINITY), "inf"),
            (val(RealType::NAN), "nan"),
            (sym("foo"), "foo"),
            (nil(), "()"),
            (val(vec![sym("a"), val([1, 2]), nil()]), "(a (1 2) ())"),
            (Value::Unspecified, "#<unspecified>"),
        ];

        for (value, expected) in test_cases {
            assert_eq!(format!("{value}"), expected);
        }
    }

    #[test]
    fn test_integer_and_real_are_distinct() {
        assert_ne!(val(1), val(1.0));
        assert_eq!(val(1.0), val(1.0));
        assert_ne!(val([1]), val([1.0]));
    }

    #[test]
    fn test_unspecified_values() {
        // Unspecified never equals anything, including itself
        let unspec = Value::Unspecified;
        assert_ne!(unspec, unspec.clone());
        assert_ne!(unspec, Value::Unspecified);
        assert_ne!(unspec, val(0));
    }
}
