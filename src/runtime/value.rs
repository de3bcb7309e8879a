use std::fmt;
use std::rc::Rc;

use crate::parser::ast::Stmt;
use crate::runtime::scope::ScopeRef;

/// A user-defined function. The captured scope is the chain that was
/// current where the function expression was evaluated; calls push a
/// child of it, not of the caller's scope.
pub struct Function {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub scope: ScopeRef,
}

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
    Array(Rc<Vec<Value>>),
    Function(Rc<Function>),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(elements))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOATING",
            Value::Bool(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Function(_) => "FUNCTION",
        }
    }

    pub fn to_integer(&self) -> Result<i64, String> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(x) => Ok(*x as i64),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Str(s) => s
                .parse::<i64>()
                .map_err(|_| format!("cannot convert STRING \"{s}\" to INT")),
            Value::Null => Ok(0),
            other => Err(format!("invalid conversion: {} to INT", other.type_name())),
        }
    }

    pub fn to_floating(&self) -> Result<f64, String> {
        match self {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(x) => Ok(*x),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => s
                .parse::<f64>()
                .map_err(|_| format!("cannot convert STRING \"{s}\" to FLOAT")),
            Value::Null => Ok(0.0),
            other => Err(format!("invalid conversion: {} to FLOAT", other.type_name())),
        }
    }

    /// Strings do not coerce to booleans; neither do arrays or functions.
    pub fn to_boolean(&self) -> Result<bool, String> {
        match self {
            Value::Int(n) => Ok(*n != 0),
            Value::Float(x) => Ok(*x != 0.0),
            Value::Bool(b) => Ok(*b),
            Value::Null => Ok(false),
            other => Err(format!(
                "invalid conversion: {} to BOOLEAN",
                other.type_name()
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:.6}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                let items: Vec<String> = elements.iter().map(Value::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Function(_) => write!(f, "function"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
