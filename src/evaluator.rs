use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::Value;
use crate::builtinops::{get_builtin_constants, get_builtin_ops};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Canonical erased builtin function type used by the evaluator.
///
/// Builtins receive ownership of their argument vector, enabling
/// implementations that consume or rearrange arguments if desired.
pub type OperationFn = dyn Fn(Vec<Value>) -> Result<Value, Error>;

/// Signature shared by the special-form handlers: unevaluated operands
/// and the current environment
type SpecialForm = fn(&[Value], &Environment) -> Result<Value, Error>;

/// Procedure arity specification
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    /// Exactly n arguments
    Exact(usize),
    /// At least n arguments
    AtLeast(usize),
    /// Between min and max arguments (inclusive)
    Range(usize, usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    /// Check an argument count, reporting the minimum acceptable count on failure
    pub fn validate(&self, arg_count: usize) -> Result<(), Error> {
        match *self {
            Arity::Exact(n) if arg_count != n => Err(Error::arity_error(n, arg_count)),
            Arity::AtLeast(n) if arg_count < n => Err(Error::arity_error(n, arg_count)),
            Arity::Range(min, _) if arg_count < min => Err(Error::arity_error(min, arg_count)),
            Arity::Range(_, max) if arg_count > max => Err(Error::arity_error(max, arg_count)),
            _ => Ok(()),
        }
    }
}

/// One scope of bindings plus the scope it was created in
#[derive(Default)]
struct Frame {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

/// Environment for variable bindings
///
/// An `Environment` is a handle to a shared frame. Cloning the handle aliases
/// the frame, so a closure that captures its defining environment sees every
/// later `define` or `set!` made through any other handle to the same frame.
#[derive(Clone, Default)]
pub struct Environment {
    frame: Rc<Frame>,
}

impl Environment {
    /// Create an empty root environment
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create an empty environment whose lookups fall back to `parent`
    pub fn with_parent(parent: &Environment) -> Self {
        Environment {
            frame: Rc::new(Frame {
                bindings: RefCell::new(HashMap::new()),
                parent: Some(parent.clone()),
            }),
        }
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.frame.parent.as_ref()
    }

    /// Bind `name` in this frame, replacing any existing binding here.
    /// Outer frames are never consulted.
    pub fn define(&self, name: String, value: Value) {
        self.frame.bindings.borrow_mut().insert(name, value);
    }

    /// Look `name` up through the chain, innermost frame first
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.frame.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            env = env.parent()?;
        }
    }

    /// Find the innermost environment in the chain that binds `name`
    pub fn find(&self, name: &str) -> Option<&Environment> {
        let mut env = self;
        loop {
            if env.frame.bindings.borrow().contains_key(name) {
                return Some(env);
            }
            env = env.parent()?;
        }
    }

    /// Rebind `name` in the innermost frame that already binds it.
    /// Never creates a binding.
    pub fn set(&self, name: &str, value: Value) -> Result<(), Error> {
        let env = self
            .find(name)
            .ok_or_else(|| Error::UnboundVariable(name.to_owned()))?;
        env.define(name.to_owned(), value);
        Ok(())
    }

    /// True if both handles refer to the same frame
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }

    /// Register a custom builtin function in the environment.
    ///
    /// The function receives the evaluated arguments and performs its own
    /// argument checking. Use [`Environment::register_builtin_operation`] to
    /// have the argument count validated before the call.
    ///
    /// # Example
    /// ```
    /// use sclisp::evaluator::create_global_env;
    /// use sclisp::ast::Value;
    /// use sclisp::Error;
    ///
    /// fn answer(_args: &[Value]) -> Result<Value, Error> {
    ///     Ok(Value::Integer(42))
    /// }
    ///
    /// let env = create_global_env();
    /// env.register_builtin_function("answer", answer);
    /// // Now (answer) can be called from evaluated expressions
    /// ```
    pub fn register_builtin_function(&self, name: &str, func: fn(&[Value]) -> Result<Value, Error>) {
        let wrapped: Rc<OperationFn> = Rc::new(move |args: Vec<Value>| func(&args));
        self.define(
            name.to_owned(),
            Value::BuiltinFunction {
                id: name.to_owned(),
                func: wrapped,
            },
        );
    }

    /// Register a builtin whose argument count is validated against `arity`
    /// before `func` runs. Closures are accepted, so hosts can capture state.
    pub fn register_builtin_operation<F>(&self, name: &str, arity: Arity, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, Error> + 'static,
    {
        let wrapped: Rc<OperationFn> = Rc::new(move |args: Vec<Value>| {
            arity.validate(args.len())?;
            func(&args)
        });
        self.define(
            name.to_owned(),
            Value::BuiltinFunction {
                id: name.to_owned(),
                func: wrapped,
            },
        );
    }

    /// Get all bindings in this environment and its parents
    /// Returns a Vec of (name, value) pairs sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        // Start with parent bindings (so they can be overridden by local bindings)
        if let Some(parent) = self.parent() {
            for (name, value) in parent.get_all_bindings() {
                bindings.insert(name, value);
            }
        }

        for (name, value) in self.frame.bindings.borrow().iter() {
            bindings.insert(name.clone(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Frames may contain closures that point back at them; print names only
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.frame.bindings.borrow();
        let mut names: Vec<&String> = bindings.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("parent", &self.parent())
            .finish()
    }
}

/// A user-defined closure: parameters, a single body expression and the
/// environment the `lambda` was evaluated in
#[derive(Debug)]
pub struct Procedure {
    params: Vec<String>,
    body: Value,
    env: Environment,
}

impl Procedure {
    pub fn new(params: Vec<String>, body: Value, env: Environment) -> Self {
        Procedure { params, body, env }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The captured defining environment
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Call the procedure with already-evaluated arguments
    pub fn invoke(&self, args: Vec<Value>) -> Result<Value, Error> {
        if self.params.len() != args.len() {
            return Err(Error::arity_error_with_expr(
                self.params.len(),
                args.len(),
                format!("(lambda ({}) {})", self.params.join(" "), self.body),
            ));
        }

        // Every call gets a fresh frame chained to the captured environment
        let call_env = Environment::with_parent(&self.env);
        for (param, arg) in self.params.iter().zip(args) {
            call_env.define(param.clone(), arg);
        }
        log::trace!(
            "invoking procedure ({}) at depth {}",
            self.params.join(" "),
            current_depth()
        );

        eval(&self.body, &call_env).map_err(|err| match err {
            Error::EvalError(msg) if !msg.contains("In lambda:") => {
                Error::EvalError(format!("{msg}\n  In lambda: {}", self.body))
            }
            Error::TypeError(msg) if !msg.contains("In lambda:") => {
                Error::TypeError(format!("{msg}\n  In lambda: {}", self.body))
            }
            other => other,
        })
    }
}

// Nesting depth of `eval` on this thread. Builtins such as `apply` and `map`
// re-enter the evaluator through `apply`, so the count lives outside any
// single call chain.
thread_local! {
    static EVAL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

fn current_depth() -> usize {
    EVAL_DEPTH.with(Cell::get)
}

/// One level of evaluation nesting, released on drop
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<DepthGuard, Error> {
        EVAL_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= MAX_EVAL_DEPTH {
                return Err(Error::EvalError(format!(
                    "Evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
                )));
            }
            depth.set(current + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        EVAL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Evaluate an expression.
///
/// Nesting is bounded by [`MAX_EVAL_DEPTH`]; exceeding it fails with an
/// `EvalError`. Reaching the limit needs more stack than a default spawned
/// thread provides, so hosts running untrusted code should evaluate on a
/// thread with [`crate::EVAL_STACK_SIZE`] bytes of stack.
pub fn eval(expr: &Value, env: &Environment) -> Result<Value, Error> {
    let _depth = DepthGuard::enter()?;
    match expr {
        // Variable lookup
        Value::Symbol(name) => env
            .get(name)
            .ok_or_else(|| Error::UnboundVariable(name.clone())),

        // Special forms and procedure application
        Value::List(elements) => eval_list(elements, env).map_err(|err| add_context(err, expr)),

        // Self-evaluating forms
        Value::Integer(_)
        | Value::Real(_)
        | Value::BuiltinFunction { .. }
        | Value::Procedure(_)
        | Value::Unspecified => Ok(expr.clone()),
    }
}

/// Invoke any callable value with already-evaluated arguments
pub fn apply(func: &Value, args: Vec<Value>) -> Result<Value, Error> {
    match func {
        Value::BuiltinFunction { func, .. } => func(args),
        Value::Procedure(procedure) => procedure.invoke(args),
        other => Err(Error::NotCallable(format!("{other}"))),
    }
}

/// Helper function to add expression context to errors.
/// Only the innermost failing expression is recorded.
fn add_context(error: Error, expr: &Value) -> Error {
    let context = format!("while evaluating: {expr}");
    match error {
        Error::EvalError(msg) if !msg.contains("Context:") => {
            Error::EvalError(format!("{msg}\n  Context: {context}"))
        }
        Error::TypeError(msg) if !msg.contains("Context:") => {
            Error::TypeError(format!("{msg}\n  Context: {context}"))
        }
        // Unbound variables and arity errors carry their own context
        other => other,
    }
}

/// Helper function to evaluate argument expressions left to right
fn eval_args(args: &[Value], env: &Environment) -> Result<Vec<Value>, Error> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval(arg, env)?);
    }
    Ok(values)
}

/// Look up the handler for a special-form keyword
fn find_special_form(keyword: &str) -> Option<SpecialForm> {
    match keyword {
        "quote" => Some(eval_quote),
        "if" => Some(eval_if),
        "define" => Some(eval_define),
        "set!" => Some(eval_set),
        "lambda" => Some(eval_lambda),
        _ => None,
    }
}

/// True if `name` is one of the keywords intercepted before procedure application
pub fn is_special_form(name: &str) -> bool {
    find_special_form(name).is_some()
}

/// Evaluate a list expression: a special form if the head is a keyword
/// symbol, otherwise a procedure application
fn eval_list(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    // Keywords are recognized syntactically, before any environment lookup
    if let [Value::Symbol(keyword), args @ ..] = elements
        && let Some(special_form) = find_special_form(keyword)
    {
        log::trace!("special form {keyword} at depth {}", current_depth());
        return special_form(args, env);
    }

    match elements {
        [] => Err(Error::EvalError("Cannot evaluate empty list".to_owned())),

        // Operator, then operands left to right, then the call. A
        // non-callable operator is only reported once the operands are done.
        [func_expr, arg_exprs @ ..] => {
            let func = eval(func_expr, env)?;
            let args = eval_args(arg_exprs, env)?;
            apply(&func, args)
        }
    }
}

/// Render a special form back to text for error messages
fn form_text(keyword: &str, args: &[Value]) -> String {
    let mut elements = vec![Value::Symbol(keyword.to_owned())];
    elements.extend_from_slice(args);
    format!("{}", Value::List(elements))
}

/// Evaluate quote special form
fn eval_quote(args: &[Value], _env: &Environment) -> Result<Value, Error> {
    match args {
        [expr] => Ok(expr.clone()),
        _ => Err(Error::arity_error_with_expr(
            1,
            args.len(),
            form_text("quote", args),
        )),
    }
}

/// Evaluate if special form. Only the selected branch is evaluated.
fn eval_if(args: &[Value], env: &Environment) -> Result<Value, Error> {
    match args {
        [condition_expr, then_expr, else_expr] => {
            let condition = eval(condition_expr, env)?;
            if condition.is_truthy() {
                eval(then_expr, env)
            } else {
                eval(else_expr, env)
            }
        }
        _ => Err(Error::arity_error_with_expr(3, args.len(), form_text("if", args))),
    }
}

/// Evaluate define special form
fn eval_define(args: &[Value], env: &Environment) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval(expr, env)?;
            env.define(name.clone(), value);
            Ok(Value::Unspecified)
        }
        [_, _] => Err(Error::TypeError("define requires a symbol".to_owned())),
        _ => Err(Error::arity_error_with_expr(
            2,
            args.len(),
            form_text("define", args),
        )),
    }
}

/// Evaluate set! special form
fn eval_set(args: &[Value], env: &Environment) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval(expr, env)?;
            env.set(name, value)?;
            Ok(Value::Unspecified)
        }
        [_, _] => Err(Error::TypeError("set! requires a symbol".to_owned())),
        _ => Err(Error::arity_error_with_expr(
            2,
            args.len(),
            form_text("set!", args),
        )),
    }
}

/// Evaluate lambda special form
fn eval_lambda(args: &[Value], env: &Environment) -> Result<Value, Error> {
    match args {
        [Value::List(param_list), body] => {
            let mut params = Vec::new();
            for param in param_list {
                match param {
                    Value::Symbol(name) => {
                        if params.contains(name) {
                            return Err(Error::EvalError(format!(
                                "Duplicate parameter name: {name}"
                            )));
                        }
                        params.push(name.clone());
                    }
                    _ => {
                        return Err(Error::TypeError(
                            "Lambda parameters must be symbols".to_owned(),
                        ));
                    }
                }
            }

            // Capture the current environment by handle, not by copy
            Ok(Value::Procedure(Rc::new(Procedure::new(
                params,
                body.clone(),
                env.clone(),
            ))))
        }
        [_, _] => Err(Error::TypeError(
            "Lambda parameters must be a list".to_owned(),
        )),
        _ => Err(Error::arity_error_with_expr(
            2,
            args.len(),
            form_text("lambda", args),
        )),
    }
}

/// Create a global environment with built-in functions
pub fn create_global_env() -> Environment {
    let env = Environment::new();

    for builtin_op in get_builtin_ops() {
        env.register_builtin_operation(builtin_op.id, builtin_op.arity, builtin_op.func);
    }
    for (name, value) in get_builtin_constants() {
        env.define((*name).to_owned(), Value::Real(*value));
    }

    log::debug!(
        "global environment created with {} builtins and {} constants",
        get_builtin_ops().len(),
        get_builtin_constants().len()
    );
    env
}
