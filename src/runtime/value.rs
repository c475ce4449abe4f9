use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::builtins::BuiltinFunction;
use crate::runtime::callable::Function;
use crate::runtime::class::{Class, Instance};

/// A runtime value.
///
/// Primitives compare by value; functions, classes and instances compare by
/// identity.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    NativeFunction(BuiltinFunction),
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    pub fn string(value: impl Into<Rc<str>>) -> Self {
        Value::String(value.into())
    }

    /// Only `nil` and `false` are falsey.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => format_number(*value, f),
            Value::String(value) => write!(f, "{value}"),
            Value::NativeFunction(_) => write!(f, "<native fn>"),
            Value::Function(function) => write!(f, "<fn {}>", function.name()),
            Value::Class(class) => write!(f, "{}", class.name()),
            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class().name()),
        }
    }
}

/// Plain decimal for exponents in `-5 < e < 15`, otherwise `1.5E+20` style
/// with at least two exponent digits. Integral values print without a
/// fraction either way.
fn format_number(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let scientific = format!("{value:e}");
    // `inf` and `NaN` have no exponent part.
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return write!(f, "{value}");
    };
    match exponent.parse::<i32>() {
        Ok(exponent) if !(-5 < exponent && exponent < 15) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            write!(f, "{mantissa}E{sign}{:02}", exponent.abs())
        }
        _ => write!(f, "{value}"),
    }
}
