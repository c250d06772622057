//! sclisp - a minimal Lisp-family expression interpreter
//!
//! This crate reads parenthesized expressions, parses them into a tree of
//! [`ast::Value`]s and evaluates that tree under a chain of lexical
//! environments. The language is deliberately small:
//!
//! ```scheme
//! (define square (lambda (x) (* x x)))
//! (square 7)                           ; 49
//! (if (< 1 2) (quote yes) (quote no))  ; yes
//! (define counter 0)
//! (set! counter (+ counter 1))
//! ```
//!
//! ## Language summary
//!
//! - Atoms are integers (`i64`), reals (`f64`) or symbols. A token is an
//!   integer if it reads as one, otherwise a real if it reads as one,
//!   otherwise a symbol.
//! - There is no boolean type. `0`, `0.0`, `()` and the "no value" result of
//!   `define`/`set!` are false, everything else is true. Predicates return
//!   `1` or `0`.
//! - Special forms: `quote`, `if`, `define`, `set!`, `lambda`.
//! - Procedures are closures over the environment they were created in and
//!   check their argument count strictly.
//!
//! ## Modules
//!
//! - `scheme`: tokenizer and parser for the textual syntax
//! - `ast`: the value universe shared by source code and runtime data
//! - `evaluator`: environments, closures and the evaluation engine
//! - `builtinops`: the standard library installed in the global environment

use std::fmt;

/// Maximum parsing depth to prevent stack overflow on deeply nested input
pub const MAX_PARSE_DEPTH: usize = 128;

/// Maximum evaluation depth to prevent stack overflow in recursive evaluation.
/// A recursive procedure call consumes about three levels, so ordinary
/// non-tail recursion can go several hundred calls deep.
pub const MAX_EVAL_DEPTH: usize = 2048;

/// Thread stack size that fits [`MAX_EVAL_DEPTH`] nested evaluations, with
/// room to spare in unoptimized builds
pub const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed token stream: missing tokens or an unmatched `)`
    SyntaxError(String),
    /// Symbol lookup or `set!` target missing from the whole environment chain
    UnboundVariable(String),
    /// Application of a value that is neither a builtin nor a procedure
    NotCallable(String),
    /// Wrong number of arguments to a procedure, builtin or special form
    ArityMismatch {
        expected: usize,
        got: usize,
        expression: Option<String>, // Optional expression context
    },
    /// Operand of the wrong type
    TypeError(String),
    /// Runtime fault raised while evaluating (division by zero, depth limit, ...)
    EvalError(String),
}

impl Error {
    /// Create an ArityMismatch without expression context
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityMismatch {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityMismatch with expression context
    pub fn arity_error_with_expr(expected: usize, got: usize, expression: String) -> Self {
        Error::ArityMismatch {
            expected,
            got,
            expression: Some(expression),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::SyntaxError(msg) => write!(f, "SyntaxError: {msg}"),
            Error::UnboundVariable(var) => write!(f, "Unbound variable: {var}"),
            Error::NotCallable(value) => write!(f, "Not callable: {value}"),
            Error::ArityMismatch {
                expected,
                got,
                expression,
            } => match expression {
                Some(expr) => write!(
                    f,
                    "ArityMismatch: expression {expr}: expected {expected} arguments, got {got}"
                ),
                None => write!(
                    f,
                    "ArityMismatch: procedure expected {expected} arguments but got {got}"
                ),
            },
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub mod ast;
pub mod builtinops;
pub mod evaluator;

#[cfg(feature = "scheme")]
pub mod scheme;
