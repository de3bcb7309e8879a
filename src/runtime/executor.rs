use std::rc::Rc;
use std::sync::Arc;

use crate::parser::ast::{Expr, LiteralValue, Program, Span, Stmt};
use crate::runtime::errors::RuntimeError;
use crate::runtime::scope::{Scope, ScopeRef};
use crate::runtime::value::{Function, Value};

/// Non-local control transfer, threaded back through statement
/// evaluation. The construct that receives a signal decides whether it is
/// legal there.
enum Signal {
    Break,
    Continue,
    Return(Value),
}

impl Signal {
    fn describe(&self) -> &'static str {
        match self {
            Signal::Break => "BREAK",
            Signal::Continue => "CONTINUE",
            Signal::Return(_) => "RETURN",
        }
    }
}

enum NumPair {
    Ints(i64, i64),
    Floats(f64, f64),
}

/// Tree-walking evaluator. Holds the current scope frame and the position
/// of the statement being executed, for error reporting.
pub struct Executor {
    scope: ScopeRef,
    last_span: Span,
    output_sink: Option<Arc<dyn Fn(String) + Send + Sync>>,
}

impl Executor {
    pub fn new() -> Self {
        Executor {
            scope: Scope::root(),
            last_span: Span { line: 1, column: 1 },
            output_sink: None,
        }
    }

    pub fn set_output_sink(&mut self, sink: Option<Arc<dyn Fn(String) + Send + Sync>>) {
        self.output_sink = sink;
    }

    pub fn execute(&mut self, program: &Program) -> Result<(), RuntimeError> {
        if let Some(signal) = self.eval_statements(&program.statements)? {
            return Err(self.err(&format!("unexpected callback {}", signal.describe())));
        }
        Ok(())
    }

    /// Like `execute`, but yields the value of the last top-level
    /// expression statement so the REPL can echo it.
    pub fn execute_repl(&mut self, program: &Program) -> Result<Option<Value>, RuntimeError> {
        let mut last = None;
        for stmt in &program.statements {
            match stmt {
                Stmt::Expr { expr, span } => {
                    self.last_span = *span;
                    last = Some(self.eval_expr(expr)?);
                }
                _ => {
                    if let Some(signal) = self.exec_stmt(stmt)? {
                        return Err(
                            self.err(&format!("unexpected callback {}", signal.describe()))
                        );
                    }
                }
            }
        }
        Ok(last)
    }

    /// Root-frame bindings, for the REPL's `:vars`.
    pub fn list_globals(&self) -> Vec<(String, Value)> {
        let mut current = Rc::clone(&self.scope);
        loop {
            let parent = current.borrow().parent();
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        let bindings = current.borrow().bindings();
        bindings
    }

    fn eval_statements(&mut self, statements: &[Stmt]) -> Result<Option<Signal>, RuntimeError> {
        for stmt in statements {
            if let Some(signal) = self.exec_stmt(stmt)? {
                return Ok(Some(signal));
            }
        }
        Ok(None)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Option<Signal>, RuntimeError> {
        self.last_span = stmt.span();
        match stmt {
            Stmt::Break { .. } => Ok(Some(Signal::Break)),
            Stmt::Continue { .. } => Ok(Some(Signal::Continue)),
            Stmt::Return { expr, .. } => {
                let value = self
                    .eval_expr(expr)
                    .map_err(|e| e.context("while evaluating RETURN statement"))?;
                Ok(Some(Signal::Return(value)))
            }
            Stmt::Let { name, init, .. } => {
                let value = match init {
                    Some(expr) => self
                        .eval_expr(expr)
                        .map_err(|e| e.context("while evaluating LET statement"))?,
                    None => Value::Null,
                };
                self.scope
                    .borrow_mut()
                    .define(name, value)
                    .map_err(|e| self.err(&e))?;
                Ok(None)
            }
            Stmt::For { cond, body, span } => {
                loop {
                    self.last_span = *span;
                    let test = self
                        .eval_expr(cond)
                        .map_err(|e| e.context("while evaluating FOR condition"))?;
                    if !test.to_boolean().map_err(|e| self.err(&e))? {
                        break;
                    }
                    self.push_scope();
                    let result = self.eval_statements(body);
                    self.pop_scope();
                    match result? {
                        Some(Signal::Break) => break,
                        Some(Signal::Continue) | None => {}
                        Some(signal @ Signal::Return(_)) => return Ok(Some(signal)),
                    }
                }
                Ok(None)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let test = self
                    .eval_expr(cond)
                    .map_err(|e| e.context("while evaluating IF condition"))?;
                let branch = if test.to_boolean().map_err(|e| self.err(&e))? {
                    then_branch
                } else {
                    match else_branch {
                        Some(statements) => statements,
                        None => return Ok(None),
                    }
                };
                self.push_scope();
                let result = self.eval_statements(branch);
                self.pop_scope();
                result
            }
            Stmt::Say { expr, .. } => {
                let value = self
                    .eval_expr(expr)
                    .map_err(|e| e.context("while evaluating SAY statement"))?;
                self.emit_output(value.to_string());
                Ok(None)
            }
            Stmt::Expr { expr, .. } => {
                self.eval_expr(expr)
                    .map_err(|e| e.context("while evaluating EXPRESSION statement"))?;
                Ok(None)
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Literal { value } => Ok(match value {
                LiteralValue::Int(n) => Value::Int(*n),
                LiteralValue::Float(x) => Value::Float(*x),
                LiteralValue::Str(s) => Value::Str(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
            }),
            Expr::Variable { name } => {
                let result = self.scope.borrow().get(name);
                result.map_err(|e| self.err(&e))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                self.eval_unary(op, value)
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                self.eval_binary(op, l, r)
            }
            Expr::Assign { op, name, value } => {
                let rhs = self.eval_expr(value)?;
                let result = if op == "=" {
                    rhs
                } else {
                    // `x += e` applies the operator named by the first
                    // character of the compound to the current binding.
                    let current = {
                        let lookup = self.scope.borrow().get(name);
                        lookup.map_err(|e| self.err(&e))?
                    };
                    self.eval_binary(&op[..1], current, rhs)?
                };
                let written = self.scope.borrow_mut().assign(name, result.clone());
                written.map_err(|e| self.err(&e))?;
                Ok(result)
            }
            Expr::Array { elements } => {
                let mut values = Vec::new();
                for element in elements {
                    values.push(self.eval_expr(element)?);
                }
                Ok(Value::array(values))
            }
            Expr::Index { receiver, index } => {
                let target = self.eval_expr(receiver)?;
                let elements = match target {
                    Value::Array(elements) => elements,
                    _ => return Err(self.err("cannot get index of non-array")),
                };
                let idx = match self.eval_expr(index)? {
                    Value::Int(n) => n,
                    _ => return Err(self.err("index must be INT")),
                };
                if idx < 0 {
                    return Err(self.err(&format!("negative index {idx}")));
                }
                // Reading past the end yields null rather than an error.
                Ok(elements.get(idx as usize).cloned().unwrap_or(Value::Null))
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
            Expr::Function { name, params, body } => {
                let function = Value::Function(Rc::new(Function {
                    params: params.clone(),
                    body: body.clone(),
                    scope: Rc::clone(&self.scope),
                }));
                if let Some(name) = name {
                    let defined = self.scope.borrow_mut().define(name, function.clone());
                    defined.map_err(|e| self.err(&e))?;
                }
                Ok(function)
            }
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, RuntimeError> {
        let target = self.eval_expr(callee)?;
        let function = match target {
            Value::Function(function) => function,
            other => {
                return Err(self.err(&format!(
                    "cannot call a value of type {}",
                    other.type_name()
                )))
            }
        };
        if function.params.len() != args.len() {
            return Err(self.err(&format!(
                "expected {} args, found {}",
                function.params.len(),
                args.len()
            )));
        }
        let mut values = Vec::new();
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }

        // The call frame is a child of the scope captured at definition,
        // not of the caller's scope. The caller's chain is restored on
        // every exit path.
        let frame = Scope::child(&function.scope);
        for (param, value) in function.params.iter().zip(values) {
            let defined = frame.borrow_mut().define(param, value);
            defined.map_err(|e| self.err(&e))?;
        }

        let saved_scope = Rc::clone(&self.scope);
        let saved_span = self.last_span;
        self.scope = frame;
        let result = self.eval_statements(&function.body);
        self.scope = saved_scope;

        let outcome = match result? {
            Some(Signal::Return(value)) => value,
            Some(signal) => {
                return Err(self.err(&format!(
                    "unexpected callback {} in function body",
                    signal.describe()
                )))
            }
            None => Value::Null,
        };
        self.last_span = saved_span;
        Ok(outcome)
    }

    fn eval_unary(&mut self, op: &str, value: Value) -> Result<Value, RuntimeError> {
        match op {
            "-" => match value {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(self.cannot_apply_unary(op, &other)),
            },
            "+" => match value {
                Value::Int(_) | Value::Float(_) => Ok(value),
                other => Err(self.cannot_apply_unary(op, &other)),
            },
            "!" => match value {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(self.cannot_apply_unary(op, &other)),
            },
            _ => Err(self.err(&format!("unknown unary operator \"{op}\""))),
        }
    }

    fn eval_binary(&mut self, op: &str, l: Value, r: Value) -> Result<Value, RuntimeError> {
        match op {
            "+" => {
                if let (Value::Str(a), Value::Str(b)) = (&l, &r) {
                    return Ok(Value::Str(format!("{a}{b}")));
                }
                match self.promote(op, l, r)? {
                    NumPair::Ints(a, b) => Ok(Value::Int(a + b)),
                    NumPair::Floats(a, b) => Ok(Value::Float(a + b)),
                }
            }
            "-" => match self.promote(op, l, r)? {
                NumPair::Ints(a, b) => Ok(Value::Int(a - b)),
                NumPair::Floats(a, b) => Ok(Value::Float(a - b)),
            },
            "*" => match self.promote(op, l, r)? {
                NumPair::Ints(a, b) => Ok(Value::Int(a * b)),
                NumPair::Floats(a, b) => Ok(Value::Float(a * b)),
            },
            "/" => match self.promote(op, l, r)? {
                NumPair::Ints(a, b) => {
                    if b == 0 {
                        return Err(self.err("division by zero"));
                    }
                    Ok(Value::Int(a / b))
                }
                NumPair::Floats(a, b) => {
                    if b == 0.0 {
                        return Err(self.err("division by zero"));
                    }
                    Ok(Value::Float(a / b))
                }
            },
            "%" => match self.promote(op, l, r)? {
                NumPair::Ints(a, b) => {
                    if b == 0 {
                        return Err(self.err("modulo by zero"));
                    }
                    Ok(Value::Int(a % b))
                }
                NumPair::Floats(a, b) => {
                    if b == 0.0 {
                        return Err(self.err("modulo by zero"));
                    }
                    Ok(Value::Float(a % b))
                }
            },
            "==" | "!=" => {
                let equal = self.values_equal(op, &l, &r)?;
                Ok(Value::Bool(if op == "==" { equal } else { !equal }))
            }
            "<" | "<=" | ">" | ">=" => {
                let result = match self.promote(op, l, r)? {
                    NumPair::Ints(a, b) => match op {
                        "<" => a < b,
                        "<=" => a <= b,
                        ">" => a > b,
                        _ => a >= b,
                    },
                    NumPair::Floats(a, b) => match op {
                        "<" => a < b,
                        "<=" => a <= b,
                        ">" => a > b,
                        _ => a >= b,
                    },
                };
                Ok(Value::Bool(result))
            }
            // Both operands are always evaluated; no short-circuiting.
            "&" => {
                let a = l.to_boolean().map_err(|e| self.err(&e))?;
                let b = r.to_boolean().map_err(|e| self.err(&e))?;
                Ok(Value::Bool(a && b))
            }
            "|" => {
                let a = l.to_boolean().map_err(|e| self.err(&e))?;
                let b = r.to_boolean().map_err(|e| self.err(&e))?;
                Ok(Value::Bool(a || b))
            }
            _ => Err(self.err(&format!("unknown operator \"{op}\""))),
        }
    }

    /// Both-INT stays INT; any FLOAT widens the other side.
    fn promote(&self, op: &str, l: Value, r: Value) -> Result<NumPair, RuntimeError> {
        match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(NumPair::Ints(a, b)),
            (Value::Int(a), Value::Float(b)) => Ok(NumPair::Floats(a as f64, b)),
            (Value::Float(a), Value::Int(b)) => Ok(NumPair::Floats(a, b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(NumPair::Floats(a, b)),
            (l, r) => Err(self.err(&format!(
                "cannot apply \"{op}\" to {} and {}",
                l.type_name(),
                r.type_name()
            ))),
        }
    }

    fn values_equal(&self, op: &str, l: &Value, r: &Value) -> Result<bool, RuntimeError> {
        match (l, r) {
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Null, Value::Null) => Ok(true),
            _ => match self.promote(op, l.clone(), r.clone())? {
                NumPair::Ints(a, b) => Ok(a == b),
                NumPair::Floats(a, b) => Ok(a == b),
            },
        }
    }

    fn cannot_apply_unary(&self, op: &str, value: &Value) -> RuntimeError {
        self.err(&format!("cannot apply \"{op}\" to {}", value.type_name()))
    }

    fn push_scope(&mut self) {
        let child = Scope::child(&self.scope);
        self.scope = child;
    }

    fn pop_scope(&mut self) {
        let parent = self.scope.borrow().parent();
        if let Some(parent) = parent {
            self.scope = parent;
        }
    }

    fn emit_output(&self, line: String) {
        if let Some(sink) = &self.output_sink {
            sink(line);
        } else {
            println!("{line}");
        }
    }

    fn err(&self, message: &str) -> RuntimeError {
        RuntimeError::new(message, self.last_span)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Executor::new()
    }
}
