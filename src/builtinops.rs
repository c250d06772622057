//! Built-in operations registry.
//!
//! This module is the standard library installed into the global environment
//! by [`crate::evaluator::create_global_env`]. The evaluator knows nothing
//! about what is in here: every entry is just a named callable with an arity.
//!
//! ```scheme
//! (+ 1 2)              ; 3
//! (/ 7 2)              ; 3.5
//! (cons 1 (list 2 3))  ; (1 2 3)
//! (map abs (list -1 2))
//! ```
//!
//! ## Conventions
//!
//! - There is no boolean type. Predicates and comparisons return `1` or `0`.
//! - Integer arithmetic is exact and reports overflow; mixing an integer with
//!   a real produces a real. `/` always produces a real.
//! - Arity is checked before the function body runs.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with the signature `fn(args: &[Value]) -> Result<Value, Error>`
//! 2. **Add to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering edge cases and error conditions

use crate::Error;
use crate::ast::{NumberType, RealType, Value};
use crate::evaluator::{Arity, apply};
use std::cmp::Ordering;
use std::f64::consts;

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The identifier this operation is bound to in the global environment
    pub id: &'static str,
    /// The implementation, receiving already-evaluated arguments
    pub func: fn(&[Value]) -> Result<Value, Error>,
    /// Expected number of arguments
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A number extracted from a `Value` for arithmetic
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(NumberType),
    Real(RealType),
}

impl Number {
    fn from_value(value: &Value, op: &str) -> Result<Number, Error> {
        match value {
            Value::Integer(n) => Ok(Number::Int(*n)),
            Value::Real(x) => Ok(Number::Real(*x)),
            other => Err(Error::TypeError(format!(
                "{op} requires numbers, got {}: {other}",
                other.type_name()
            ))),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_real(self) -> RealType {
        match self {
            Number::Int(n) => n as RealType,
            Number::Real(x) => x,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(n) => Value::Integer(n),
            Number::Real(x) => Value::Real(x),
        }
    }

    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_real().partial_cmp(&b.as_real()),
        }
    }
}

fn truth(b: bool) -> Value {
    Value::Integer(NumberType::from(b))
}

fn overflow(op: &str) -> Error {
    Error::EvalError(format!("Integer overflow in {op}"))
}

/// Apply an integer operation when both operands are integers, otherwise a real one
fn arithmetic(
    args: &[Value],
    op: &str,
    int_op: fn(NumberType, NumberType) -> Option<NumberType>,
    real_op: fn(RealType, RealType) -> RealType,
) -> Result<Value, Error> {
    let a = Number::from_value(&args[0], op)?;
    let b = Number::from_value(&args[1], op)?;
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_op(x, y)
            .map(Value::Integer)
            .ok_or_else(|| overflow(op)),
        (x, y) => Ok(Value::Real(real_op(x.as_real(), y.as_real()))),
    }
}

fn list_arg<'a>(value: &'a Value, op: &str) -> Result<&'a [Value], Error> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(Error::TypeError(format!(
            "{op} requires a list, got {}: {other}",
            other.type_name()
        ))),
    }
}

//
// Builtin Function Implementations
//

// `+` also concatenates two lists, which is what `append` is bound to
fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    if let [Value::List(a), Value::List(b)] = args {
        let mut joined = a.clone();
        joined.extend_from_slice(b);
        return Ok(Value::List(joined));
    }
    arithmetic(args, "+", NumberType::checked_add, |a, b| a + b)
}

fn builtin_sub(args: &[Value]) -> Result<Value, Error> {
    arithmetic(args, "-", NumberType::checked_sub, |a, b| a - b)
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    arithmetic(args, "*", NumberType::checked_mul, |a, b| a * b)
}

fn builtin_div(args: &[Value]) -> Result<Value, Error> {
    let a = Number::from_value(&args[0], "/")?.as_real();
    let b = Number::from_value(&args[1], "/")?.as_real();
    if b == 0.0 {
        return Err(Error::EvalError("division by zero".to_owned()));
    }
    Ok(Value::Real(a / b))
}

// Comparisons order numbers, or symbols alphabetically
fn compare_values(args: &[Value], op: &str) -> Result<Option<Ordering>, Error> {
    match (&args[0], &args[1]) {
        (Value::Symbol(a), Value::Symbol(b)) => Ok(Some(a.cmp(b))),
        (a, b) => {
            let a = Number::from_value(a, op)?;
            let b = Number::from_value(b, op)?;
            Ok(a.compare(b))
        }
    }
}

macro_rules! comparison {
    ($name:ident, $op_str:expr, $($ordering:pat_param)|+) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            Ok(truth(matches!(compare_values(args, $op_str)?, Some($($ordering)|+))))
        }
    };
}

comparison!(builtin_lt, "<", Ordering::Less);
comparison!(builtin_gt, ">", Ordering::Greater);
comparison!(builtin_le, "<=", Ordering::Less | Ordering::Equal);
comparison!(builtin_ge, ">=", Ordering::Greater | Ordering::Equal);

/// Structural equality where `1` equals `1.0`
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(_) | Value::Real(_), Value::Integer(_) | Value::Real(_)) => {
            let x = Number::from_value(a, "=").ok();
            let y = Number::from_value(b, "=").ok();
            matches!((x, y), (Some(x), Some(y)) if x.compare(y) == Some(Ordering::Equal))
        }
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Unspecified, Value::Unspecified) => true,
        _ => a == b,
    }
}

fn builtin_equal(args: &[Value]) -> Result<Value, Error> {
    Ok(truth(values_equal(&args[0], &args[1])))
}

// Identity: atoms by value, lists only when both are empty
fn builtin_eq(args: &[Value]) -> Result<Value, Error> {
    let same = match (&args[0], &args[1]) {
        (Value::List(a), Value::List(b)) => a.is_empty() && b.is_empty(),
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
        (a, b) => a == b,
    };
    Ok(truth(same))
}

fn builtin_abs(args: &[Value]) -> Result<Value, Error> {
    match Number::from_value(&args[0], "abs")? {
        Number::Int(n) => n
            .checked_abs()
            .map(Value::Integer)
            .ok_or_else(|| overflow("abs")),
        Number::Real(x) => Ok(Value::Real(x.abs())),
    }
}

fn builtin_expt(args: &[Value]) -> Result<Value, Error> {
    let base = Number::from_value(&args[0], "expt")?;
    let exponent = Number::from_value(&args[1], "expt")?;
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => {
            let e = u32::try_from(e).map_err(|_| overflow("expt"))?;
            b.checked_pow(e)
                .map(Value::Integer)
                .ok_or_else(|| overflow("expt"))
        }
        (b, e) => Ok(Value::Real(b.as_real().powf(e.as_real()))),
    }
}

fn builtin_apply(args: &[Value]) -> Result<Value, Error> {
    let call_args = list_arg(&args[1], "apply")?;
    apply(&args[0], call_args.to_vec())
}

fn builtin_begin(args: &[Value]) -> Result<Value, Error> {
    Ok(args.last().cloned().unwrap_or(Value::Unspecified))
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    match list_arg(&args[0], "car")? {
        [first, ..] => Ok(first.clone()),
        [] => Err(Error::EvalError("car of empty list".into())),
    }
}

// The rest of an empty list is the empty list
fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    let list = list_arg(&args[0], "cdr")?;
    Ok(Value::List(list.iter().skip(1).cloned().collect()))
}

fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    let tail = list_arg(&args[1], "cons")?;
    let mut new_list = Vec::with_capacity(tail.len() + 1);
    new_list.push(args[0].clone());
    new_list.extend_from_slice(tail);
    Ok(Value::List(new_list))
}

fn builtin_length(args: &[Value]) -> Result<Value, Error> {
    let list = list_arg(&args[0], "length")?;
    NumberType::try_from(list.len())
        .map(Value::Integer)
        .map_err(|_| overflow("length"))
}

fn builtin_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(args.to_vec()))
}

fn builtin_is_list(args: &[Value]) -> Result<Value, Error> {
    Ok(truth(matches!(args[0], Value::List(_))))
}

// (map f list ...) stops at the shortest list
fn builtin_map(args: &[Value]) -> Result<Value, Error> {
    let func = &args[0];
    let lists = args[1..]
        .iter()
        .map(|list| list_arg(list, "map"))
        .collect::<Result<Vec<_>, _>>()?;
    let shortest = lists.iter().map(|list| list.len()).min().unwrap_or(0);

    (0..shortest)
        .map(|i| apply(func, lists.iter().map(|list| list[i].clone()).collect()))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

// A single list argument is searched element-wise
fn extremum(args: &[Value], op: &str, wanted: Ordering) -> Result<Value, Error> {
    let candidates = match args {
        [Value::List(items)] => items.as_slice(),
        _ => args,
    };
    let Some((first, rest)) = candidates.split_first() else {
        return Err(Error::EvalError(format!("{op} of empty list")));
    };

    let mut best = Number::from_value(first, op)?;
    for candidate in rest {
        let number = Number::from_value(candidate, op)?;
        if number.compare(best) == Some(wanted) {
            best = number;
        }
    }
    Ok(best.into_value())
}

fn builtin_max(args: &[Value]) -> Result<Value, Error> {
    extremum(args, "max", Ordering::Greater)
}

fn builtin_min(args: &[Value]) -> Result<Value, Error> {
    extremum(args, "min", Ordering::Less)
}

fn builtin_not(args: &[Value]) -> Result<Value, Error> {
    Ok(truth(!args[0].is_truthy()))
}

fn builtin_null(args: &[Value]) -> Result<Value, Error> {
    Ok(truth(args[0].is_nil()))
}

fn builtin_is_number(args: &[Value]) -> Result<Value, Error> {
    Ok(truth(args[0].is_number()))
}

fn builtin_print(args: &[Value]) -> Result<Value, Error> {
    let parts: Vec<String> = args.iter().map(|value| format!("{value}")).collect();
    println!("{}", parts.join(" "));
    Ok(Value::Unspecified)
}

fn builtin_is_procedure(args: &[Value]) -> Result<Value, Error> {
    Ok(truth(args[0].is_callable()))
}

fn builtin_is_symbol(args: &[Value]) -> Result<Value, Error> {
    Ok(truth(matches!(args[0], Value::Symbol(_))))
}

/// Convert an integral real to an integer, rejecting inf/nan/out of range
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn real_to_integer(x: RealType, op: &str) -> Result<Value, Error> {
    if x.is_finite() && x >= NumberType::MIN as RealType && x < NumberType::MAX as RealType {
        Ok(Value::Integer(x as NumberType))
    } else {
        Err(Error::EvalError(format!("{op}: cannot convert {x} to integer")))
    }
}

// Beyond this many digits either way, rounding is a no-op or yields zero
const MAX_ROUND_DIGITS: NumberType = 400;

// One argument rounds half to even and returns an integer; two round to n digits
fn builtin_round(args: &[Value]) -> Result<Value, Error> {
    let x = Number::from_value(&args[0], "round")?;
    let Some(digits) = args.get(1) else {
        return match x {
            Number::Int(n) => Ok(Value::Integer(n)),
            Number::Real(r) => real_to_integer(r.round_ties_even(), "round"),
        };
    };

    let digits = match Number::from_value(digits, "round")? {
        Number::Int(d) => i32::try_from(d.clamp(-MAX_ROUND_DIGITS, MAX_ROUND_DIGITS))
            .map_err(|_| overflow("round"))?,
        Number::Real(_) => {
            return Err(Error::TypeError("round requires an integer digit count".into()));
        }
    };
    if let Number::Int(n) = x
        && digits >= 0
    {
        return Ok(Value::Integer(n));
    }

    let value = x.as_real();
    let rounded = if digits >= 0 {
        let scale = RealType::powi(10.0, digits);
        let scaled = value * scale;
        if scaled.is_finite() {
            scaled.round_ties_even() / scale
        } else {
            // More digits than the value carries
            value
        }
    } else {
        let factor = RealType::powi(10.0, -digits);
        if factor.is_finite() {
            (value / factor).round_ties_even() * factor
        } else {
            RealType::copysign(0.0, value)
        }
    };
    match x {
        Number::Int(_) => real_to_integer(rounded, "round"),
        Number::Real(_) => Ok(Value::Real(rounded)),
    }
}

//
// Math library
//

macro_rules! real_function {
    ($name:ident, $op_str:expr, $f:expr) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let x = Number::from_value(&args[0], $op_str)?.as_real();
            let f: fn(RealType) -> RealType = $f;
            Ok(Value::Real(f(x)))
        }
    };
}

real_function!(builtin_sin, "sin", RealType::sin);
real_function!(builtin_cos, "cos", RealType::cos);
real_function!(builtin_tan, "tan", RealType::tan);
real_function!(builtin_atan, "atan", RealType::atan);
real_function!(builtin_exp, "exp", RealType::exp);
real_function!(builtin_fabs, "fabs", RealType::abs);
real_function!(builtin_sinh, "sinh", RealType::sinh);
real_function!(builtin_cosh, "cosh", RealType::cosh);
real_function!(builtin_tanh, "tanh", RealType::tanh);
real_function!(builtin_degrees, "degrees", RealType::to_degrees);
real_function!(builtin_radians, "radians", RealType::to_radians);

macro_rules! real_function2 {
    ($name:ident, $op_str:expr, $f:expr) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let x = Number::from_value(&args[0], $op_str)?.as_real();
            let y = Number::from_value(&args[1], $op_str)?.as_real();
            let f: fn(RealType, RealType) -> RealType = $f;
            Ok(Value::Real(f(x, y)))
        }
    };
}

real_function2!(builtin_atan2, "atan2", RealType::atan2);
real_function2!(builtin_hypot, "hypot", RealType::hypot);
real_function2!(builtin_copysign, "copysign", RealType::copysign);

macro_rules! real_predicate {
    ($name:ident, $op_str:expr, $f:expr) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let x = Number::from_value(&args[0], $op_str)?.as_real();
            let f: fn(RealType) -> bool = $f;
            Ok(truth(f(x)))
        }
    };
}

real_predicate!(builtin_isnan, "isnan", RealType::is_nan);
real_predicate!(builtin_isinf, "isinf", RealType::is_infinite);
real_predicate!(builtin_isfinite, "isfinite", RealType::is_finite);

fn domain_error(op: &str) -> Error {
    Error::EvalError(format!("{op}: math domain error"))
}

fn builtin_sqrt(args: &[Value]) -> Result<Value, Error> {
    let x = Number::from_value(&args[0], "sqrt")?.as_real();
    if x < 0.0 {
        return Err(domain_error("sqrt"));
    }
    Ok(Value::Real(x.sqrt()))
}

fn builtin_asin(args: &[Value]) -> Result<Value, Error> {
    let x = Number::from_value(&args[0], "asin")?.as_real();
    if !(-1.0..=1.0).contains(&x) {
        return Err(domain_error("asin"));
    }
    Ok(Value::Real(x.asin()))
}

fn builtin_acos(args: &[Value]) -> Result<Value, Error> {
    let x = Number::from_value(&args[0], "acos")?.as_real();
    if !(-1.0..=1.0).contains(&x) {
        return Err(domain_error("acos"));
    }
    Ok(Value::Real(x.acos()))
}

// (log x) is the natural logarithm, (log x base) any other
fn builtin_log(args: &[Value]) -> Result<Value, Error> {
    let x = Number::from_value(&args[0], "log")?.as_real();
    if x <= 0.0 {
        return Err(domain_error("log"));
    }
    match args.get(1) {
        None => Ok(Value::Real(x.ln())),
        Some(base) => {
            let base = Number::from_value(base, "log")?.as_real();
            if base <= 0.0 || base == 1.0 {
                return Err(domain_error("log"));
            }
            Ok(Value::Real(x.ln() / base.ln()))
        }
    }
}

fn positive_arg(args: &[Value], op: &str) -> Result<RealType, Error> {
    let x = Number::from_value(&args[0], op)?.as_real();
    if x <= 0.0 {
        return Err(domain_error(op));
    }
    Ok(x)
}

fn builtin_log10(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Real(positive_arg(args, "log10")?.log10()))
}

fn builtin_log2(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Real(positive_arg(args, "log2")?.log2()))
}

// Remainder with the sign of the dividend
fn builtin_fmod(args: &[Value]) -> Result<Value, Error> {
    let x = Number::from_value(&args[0], "fmod")?.as_real();
    let y = Number::from_value(&args[1], "fmod")?.as_real();
    if y == 0.0 || x.is_infinite() {
        return Err(domain_error("fmod"));
    }
    Ok(Value::Real(x % y))
}

fn builtin_pow(args: &[Value]) -> Result<Value, Error> {
    let base = Number::from_value(&args[0], "pow")?.as_real();
    let exponent = Number::from_value(&args[1], "pow")?.as_real();
    Ok(Value::Real(base.powf(exponent)))
}

macro_rules! integer_rounding {
    ($name:ident, $op_str:expr, $f:expr) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            match Number::from_value(&args[0], $op_str)? {
                Number::Int(n) => Ok(Value::Integer(n)),
                Number::Real(x) => {
                    let f: fn(RealType) -> RealType = $f;
                    real_to_integer(f(x), $op_str)
                }
            }
        }
    };
}

integer_rounding!(builtin_floor, "floor", RealType::floor);
integer_rounding!(builtin_ceil, "ceil", RealType::ceil);
integer_rounding!(builtin_trunc, "trunc", RealType::trunc);

fn integer_arg(value: &Value, op: &str) -> Result<NumberType, Error> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(Error::TypeError(format!(
            "{op} requires integers, got {}: {other}",
            other.type_name()
        ))),
    }
}

fn builtin_gcd(args: &[Value]) -> Result<Value, Error> {
    let mut a = integer_arg(&args[0], "gcd")?.unsigned_abs();
    let mut b = integer_arg(&args[1], "gcd")?.unsigned_abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    NumberType::try_from(a)
        .map(Value::Integer)
        .map_err(|_| overflow("gcd"))
}

fn builtin_factorial(args: &[Value]) -> Result<Value, Error> {
    let n = integer_arg(&args[0], "factorial")?;
    if n < 0 {
        return Err(Error::EvalError(
            "factorial not defined for negative values".into(),
        ));
    }
    (2..=n)
        .try_fold(1 as NumberType, NumberType::checked_mul)
        .map(Value::Integer)
        .ok_or_else(|| overflow("factorial"))
}

/// Registry of all built-in operations, in the order they are installed
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Arithmetic operations
    BuiltinOp { id: "+", func: builtin_add, arity: Arity::Exact(2) },
    BuiltinOp { id: "-", func: builtin_sub, arity: Arity::Exact(2) },
    BuiltinOp { id: "*", func: builtin_mul, arity: Arity::Exact(2) },
    BuiltinOp { id: "/", func: builtin_div, arity: Arity::Exact(2) },
    BuiltinOp { id: "abs", func: builtin_abs, arity: Arity::Exact(1) },
    BuiltinOp { id: "expt", func: builtin_expt, arity: Arity::Exact(2) },
    BuiltinOp { id: "round", func: builtin_round, arity: Arity::Range(1, 2) },
    BuiltinOp { id: "max", func: builtin_max, arity: Arity::AtLeast(1) },
    BuiltinOp { id: "min", func: builtin_min, arity: Arity::AtLeast(1) },
    // Comparison operations
    BuiltinOp { id: "<", func: builtin_lt, arity: Arity::Exact(2) },
    BuiltinOp { id: ">", func: builtin_gt, arity: Arity::Exact(2) },
    BuiltinOp { id: "<=", func: builtin_le, arity: Arity::Exact(2) },
    BuiltinOp { id: ">=", func: builtin_ge, arity: Arity::Exact(2) },
    BuiltinOp { id: "=", func: builtin_equal, arity: Arity::Exact(2) },
    BuiltinOp { id: "equal?", func: builtin_equal, arity: Arity::Exact(2) },
    BuiltinOp { id: "eq?", func: builtin_eq, arity: Arity::Exact(2) },
    BuiltinOp { id: "not", func: builtin_not, arity: Arity::Exact(1) },
    // List operations
    BuiltinOp { id: "append", func: builtin_add, arity: Arity::Exact(2) },
    BuiltinOp { id: "car", func: builtin_car, arity: Arity::Exact(1) },
    BuiltinOp { id: "cdr", func: builtin_cdr, arity: Arity::Exact(1) },
    BuiltinOp { id: "cons", func: builtin_cons, arity: Arity::Exact(2) },
    BuiltinOp { id: "length", func: builtin_length, arity: Arity::Exact(1) },
    BuiltinOp { id: "list", func: builtin_list, arity: Arity::Any },
    BuiltinOp { id: "list?", func: builtin_is_list, arity: Arity::Exact(1) },
    BuiltinOp { id: "null?", func: builtin_null, arity: Arity::Exact(1) },
    // Type predicates
    BuiltinOp { id: "number?", func: builtin_is_number, arity: Arity::Exact(1) },
    BuiltinOp { id: "procedure?", func: builtin_is_procedure, arity: Arity::Exact(1) },
    BuiltinOp { id: "symbol?", func: builtin_is_symbol, arity: Arity::Exact(1) },
    // Procedures and sequencing
    BuiltinOp { id: "apply", func: builtin_apply, arity: Arity::Exact(2) },
    BuiltinOp { id: "map", func: builtin_map, arity: Arity::AtLeast(2) },
    BuiltinOp { id: "begin", func: builtin_begin, arity: Arity::AtLeast(1) },
    BuiltinOp { id: "print", func: builtin_print, arity: Arity::Any },
    // Math library
    BuiltinOp { id: "sqrt", func: builtin_sqrt, arity: Arity::Exact(1) },
    BuiltinOp { id: "exp", func: builtin_exp, arity: Arity::Exact(1) },
    BuiltinOp { id: "log", func: builtin_log, arity: Arity::Range(1, 2) },
    BuiltinOp { id: "pow", func: builtin_pow, arity: Arity::Exact(2) },
    BuiltinOp { id: "sin", func: builtin_sin, arity: Arity::Exact(1) },
    BuiltinOp { id: "cos", func: builtin_cos, arity: Arity::Exact(1) },
    BuiltinOp { id: "tan", func: builtin_tan, arity: Arity::Exact(1) },
    BuiltinOp { id: "asin", func: builtin_asin, arity: Arity::Exact(1) },
    BuiltinOp { id: "acos", func: builtin_acos, arity: Arity::Exact(1) },
    BuiltinOp { id: "atan", func: builtin_atan, arity: Arity::Exact(1) },
    BuiltinOp { id: "fabs", func: builtin_fabs, arity: Arity::Exact(1) },
    BuiltinOp { id: "atan2", func: builtin_atan2, arity: Arity::Exact(2) },
    BuiltinOp { id: "sinh", func: builtin_sinh, arity: Arity::Exact(1) },
    BuiltinOp { id: "cosh", func: builtin_cosh, arity: Arity::Exact(1) },
    BuiltinOp { id: "tanh", func: builtin_tanh, arity: Arity::Exact(1) },
    BuiltinOp { id: "log10", func: builtin_log10, arity: Arity::Exact(1) },
    BuiltinOp { id: "log2", func: builtin_log2, arity: Arity::Exact(1) },
    BuiltinOp { id: "hypot", func: builtin_hypot, arity: Arity::Exact(2) },
    BuiltinOp { id: "fmod", func: builtin_fmod, arity: Arity::Exact(2) },
    BuiltinOp { id: "copysign", func: builtin_copysign, arity: Arity::Exact(2) },
    BuiltinOp { id: "degrees", func: builtin_degrees, arity: Arity::Exact(1) },
    BuiltinOp { id: "radians", func: builtin_radians, arity: Arity::Exact(1) },
    BuiltinOp { id: "isnan", func: builtin_isnan, arity: Arity::Exact(1) },
    BuiltinOp { id: "isinf", func: builtin_isinf, arity: Arity::Exact(1) },
    BuiltinOp { id: "isfinite", func: builtin_isfinite, arity: Arity::Exact(1) },
    BuiltinOp { id: "floor", func: builtin_floor, arity: Arity::Exact(1) },
    BuiltinOp { id: "ceil", func: builtin_ceil, arity: Arity::Exact(1) },
    BuiltinOp { id: "trunc", func: builtin_trunc, arity: Arity::Exact(1) },
    BuiltinOp { id: "gcd", func: builtin_gcd, arity: Arity::Exact(2) },
    BuiltinOp { id: "factorial", func: builtin_factorial, arity: Arity::Exact(1) },
];

/// Named real constants installed alongside the operations
static BUILTIN_CONSTANTS: &[(&str, RealType)] = &[
    ("pi", consts::PI),
    ("e", consts::E),
    ("tau", consts::TAU),
    ("inf", RealType::INFINITY),
    ("nan", RealType::NAN),
];

/// Get all builtin operations (for internal use by evaluator)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

pub(crate) fn get_builtin_constants() -> &'static [(&'static str, RealType)] {
    BUILTIN_CONSTANTS
}

/// Find a builtin operation by its identifier
pub fn find_builtin_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_OPS.iter().find(|op| op.id == id)
}

#[cfg(all(test, feature = "scheme"))]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};
    use crate::evaluator::{create_global_env, eval};
    use crate::scheme::parse_scheme;

    /// Test result variants for builtin tests
    #[derive(Debug)]
    enum TestResult {
        Success(Value),
        SpecificError(&'static str),
        Error,
    }
    use TestResult::*;

    fn success<T: Into<Value>>(value: T) -> TestResult {
        Success(value.into())
    }

    fn run_builtin_tests(test_cases: Vec<(&str, TestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Builtin test #{} '{input}'", i + 1);
            let env = create_global_env();
            let expr = parse_scheme(input).unwrap();

            match (eval(&expr, &env), expected) {
                (Ok(actual), Success(expected_val)) => {
                    assert!(
                        actual == *expected_val,
                        "{test_id}: expected {expected_val:?}, got {actual:?}"
                    );
                }
                (Err(_), Error) => {}
                (Err(err), SpecificError(text)) => {
                    let msg = format!("{err}");
                    assert!(msg.contains(text), "{test_id}: '{msg}' should contain '{text}'");
                }
                (Ok(actual), _) => panic!("{test_id}: expected error, got {actual:?}"),
                (Err(err), Success(_)) => panic!("{test_id}: unexpected error {err:?}"),
            }
        }
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_builtins_data_driven() {
        let test_cases = vec![
            // === ARITHMETIC ===
            ("(+ 1 2)", success(3)),
            ("(+ 1 2.5)", success(3.5)),
            ("(- 10 4)", success(6)),
            ("(- 1 0.5)", success(0.5)),
            ("(* 6 7)", success(42)),
            ("(* 2 0.5)", success(1.0)),
            ("(/ 7 2)", success(3.5)),
            ("(/ 6 3)", success(2.0)),
            ("(/ 1 0)", SpecificError("division by zero")),
            ("(+ 1 2 3)", SpecificError("ArityMismatch")),
            ("(+ 1 (quote a))", SpecificError("+ requires numbers")),
            ("(+ 9223372036854775807 1)", SpecificError("Integer overflow in +")),
            ("(* 9223372036854775807 2)", SpecificError("Integer overflow")),
            ("(abs -5)", success(5)),
            ("(abs -2.5)", success(2.5)),
            ("(expt 2 10)", success(1024)),
            ("(expt 2 -1)", success(0.5)),
            ("(expt 2.0 3)", success(8.0)),
            ("(expt 2 64)", SpecificError("Integer overflow")),
            ("(round 2.5)", success(2)),
            ("(round 3.5)", success(4)),
            ("(round -1.4)", success(-1)),
            ("(round 7)", success(7)),
            ("(round 3.14159 2)", success(3.14)),
            ("(round inf)", Error),
            ("(round 3.14 400)", success(3.14)),
            ("(round 3.14 10000000000000)", success(3.14)),
            ("(round 1e300 10)", success(1e300)),
            ("(round 3.14 -400)", success(0.0)),
            ("(round 1234 -2)", success(1200)),
            ("(round 1250 -2)", success(1200)),
            ("(round 1234.5 -1)", success(1230.0)),
            ("(round 7 2)", success(7)),
            ("(round 5 -400)", success(0)),
            ("(max 1 5 3)", success(5)),
            ("(max 1 2.5)", success(2.5)),
            ("(max (list 4 9 2))", success(9)),
            ("(min 4 -1 2)", success(-1)),
            ("(min (quote ()))", SpecificError("min of empty list")),
            ("(max 1 (quote a))", SpecificError("max requires numbers")),
            // === LIST CONCATENATION THROUGH + AND append ===
            ("(+ (list 1) (list 2 3))", success([1, 2, 3])),
            ("(append (list 1 2) (quote ()))", success([1, 2])),
            // === COMPARISON (1 = true, 0 = false) ===
            ("(< 1 2)", success(1)),
            ("(< 2 1)", success(0)),
            ("(> 2.5 2)", success(1)),
            ("(<= 2 2)", success(1)),
            ("(>= 1 2)", success(0)),
            ("(< (quote a) (quote b))", success(1)),
            ("(< 1 (quote b))", SpecificError("< requires numbers")),
            ("(< nan 1)", success(0)),
            ("(= 1 1)", success(1)),
            ("(= 1 1.0)", success(1)),
            ("(= 1 2)", success(0)),
            ("(= (quote a) (quote a))", success(1)),
            ("(equal? (list 1 (list 2)) (list 1.0 (list 2)))", success(1)),
            ("(equal? (list 1) (list 1 2))", success(0)),
            ("(eq? (quote a) (quote a))", success(1)),
            ("(eq? (quote ()) (quote ()))", success(1)),
            ("(eq? (list 1) (list 1))", success(0)),
            ("(eq? car car)", success(1)),
            ("(not 0)", success(1)),
            ("(not 5)", success(0)),
            ("(not (quote ()))", success(1)),
            // Comparison results take part in arithmetic
            ("(+ (< 1 2) (< 1 2))", success(2)),
            // === LISTS ===
            ("(car (list 1 2 3))", success(1)),
            ("(car (quote ()))", SpecificError("car of empty list")),
            ("(car 5)", SpecificError("car requires a list")),
            ("(cdr (list 1 2 3))", success([2, 3])),
            ("(cdr (quote ()))", success(nil())),
            ("(cons 1 (list 2 3))", success([1, 2, 3])),
            ("(cons (quote a) (quote ()))", success([sym("a")])),
            ("(cons 1 2)", SpecificError("cons requires a list")),
            ("(length (list 1 2 3))", success(3)),
            ("(length (quote ()))", success(0)),
            ("(list)", success(nil())),
            ("(list 1 (quote b) 2.5)", success(vec![val(1), sym("b"), val(2.5)])),
            ("(list? (list))", success(1)),
            ("(list? 1)", success(0)),
            ("(null? (quote ()))", success(1)),
            ("(null? (list 1))", success(0)),
            ("(null? 0)", success(0)),
            // === TYPE PREDICATES ===
            ("(number? 1)", success(1)),
            ("(number? 1.5)", success(1)),
            ("(number? (quote a))", success(0)),
            ("(symbol? (quote a))", success(1)),
            ("(symbol? 1)", success(0)),
            ("(procedure? car)", success(1)),
            ("(procedure? (lambda (x) x))", success(1)),
            ("(procedure? (quote car))", success(0)),
            // === HIGHER ORDER ===
            ("(apply + (list 1 2))", success(3)),
            ("(apply (lambda (x y) (* x y)) (list 3 4))", success(12)),
            ("(apply + 1)", SpecificError("apply requires a list")),
            ("(apply 1 (list))", SpecificError("Not callable")),
            ("(map abs (list -1 2 -3))", success([1, 2, 3])),
            ("(map (lambda (x) (* x x)) (list 1 2 3))", success([1, 4, 9])),
            ("(map + (list 1 2 3) (list 10 20))", success([11, 22])),
            ("(map car (quote ()))", success(nil())),
            ("(begin 1 2 3)", success(3)),
            ("(begin (quote a))", success(sym("a"))),
            // === MATH LIBRARY ===
            ("(sqrt 16)", success(4.0)),
            ("(sqrt -1)", SpecificError("math domain error")),
            ("(exp 0)", success(1.0)),
            ("(log 1)", success(0.0)),
            ("(log 8 2)", success(3.0)),
            ("(log 0)", SpecificError("math domain error")),
            ("(pow 2 3)", success(8.0)),
            ("(sin 0)", success(0.0)),
            ("(cos 0)", success(1.0)),
            ("(asin 2)", SpecificError("math domain error")),
            ("(fabs -3)", success(3.0)),
            ("(floor 2.7)", success(2)),
            ("(floor -2.5)", success(-3)),
            ("(ceil 2.1)", success(3)),
            ("(trunc -2.7)", success(-2)),
            ("(floor 4)", success(4)),
            ("(gcd 12 18)", success(6)),
            ("(gcd -4 6)", success(2)),
            ("(gcd 1.5 3)", SpecificError("gcd requires integers")),
            ("(factorial 5)", success(120)),
            ("(factorial 0)", success(1)),
            ("(factorial 21)", SpecificError("Integer overflow")),
            ("(factorial -1)", Error),
            ("(atan2 0 1)", success(0.0)),
            ("(atan2 1 0)", success(consts::FRAC_PI_2)),
            ("(hypot 3 4)", success(5.0)),
            ("(log10 1000)", success(3.0)),
            ("(log2 8)", success(3.0)),
            ("(log10 0)", SpecificError("math domain error")),
            ("(log2 -1)", SpecificError("math domain error")),
            ("(fmod 7 3)", success(1.0)),
            ("(fmod -7 3)", success(-1.0)),
            ("(fmod 1 0)", SpecificError("math domain error")),
            ("(copysign 3 -0.0)", success(-3.0)),
            ("(radians 0)", success(0.0)),
            ("(< (abs (- (degrees pi) 180)) 0.000000001)", success(1)),
            ("(< (abs (- (radians 180) pi)) 0.000000001)", success(1)),
            ("(tanh 0)", success(0.0)),
            ("(cosh 0)", success(1.0)),
            ("(isnan nan)", success(1)),
            ("(isnan 1)", success(0)),
            ("(isinf inf)", success(1)),
            ("(isinf -inf)", success(1)),
            ("(isinf 5)", success(0)),
            ("(isfinite 5)", success(1)),
            ("(isfinite nan)", success(0)),
            ("(max 1 2.5 2)", success(2.5)),
            ("(min 3 1.5 1.5)", success(1.5)),
            ("pi", success(consts::PI)),
            ("(* 2 pi)", success(consts::TAU)),
        ];

        run_builtin_tests(test_cases);
    }

    #[test]
    fn test_print_returns_no_value() {
        let env = create_global_env();
        let result = eval(&parse_scheme("(print 1 (list 2 3))").unwrap(), &env).unwrap();
        assert!(matches!(result, Value::Unspecified));
    }

    #[test]
    fn test_registry_lookup() {
        let car = find_builtin_op("car").unwrap();
        assert_eq!(car.arity, Arity::Exact(1));
        assert!(find_builtin_op("quote").is_none());
        assert!(find_builtin_op("no-such-op").is_none());

        // Identifiers are unique
        let ops = get_builtin_ops();
        for (i, op) in ops.iter().enumerate() {
            assert!(
                ops[i + 1..].iter().all(|other| other.id != op.id),
                "duplicate builtin id {}",
                op.id
            );
        }
    }

    #[test]
    fn test_nan_constant_is_not_equal_to_itself() {
        let env = create_global_env();
        let result = eval(&parse_scheme("(= nan nan)").unwrap(), &env).unwrap();
        assert_eq!(result, val(0));
    }
}
