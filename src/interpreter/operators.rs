use crate::ast::{BinaryOperator, UnaryOperator};
use crate::runtime::{RuntimeError, Value};
use crate::token::Span;

pub(super) fn binary(
    op: BinaryOperator,
    left: Value,
    right: Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOperator::Equal => Ok(Value::Bool(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOperator::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::string(joined))
            }
            _ => Err(RuntimeError::InvalidAddOperands { span }),
        },
        BinaryOperator::Sub => numbers(&left, &right, span).map(|(a, b)| Value::Number(a - b)),
        BinaryOperator::Mul => numbers(&left, &right, span).map(|(a, b)| Value::Number(a * b)),
        BinaryOperator::Div => {
            let (a, b) = numbers(&left, &right, span)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero { span });
            }
            Ok(Value::Number(a / b))
        }
        BinaryOperator::Greater => numbers(&left, &right, span).map(|(a, b)| Value::Bool(a > b)),
        BinaryOperator::GreaterEqual => {
            numbers(&left, &right, span).map(|(a, b)| Value::Bool(a >= b))
        }
        BinaryOperator::Less => numbers(&left, &right, span).map(|(a, b)| Value::Bool(a < b)),
        BinaryOperator::LessEqual => {
            numbers(&left, &right, span).map(|(a, b)| Value::Bool(a <= b))
        }
    }
}

pub(super) fn unary(op: UnaryOperator, right: Value, span: Span) -> Result<Value, RuntimeError> {
    match op {
        UnaryOperator::Not => Ok(Value::Bool(!right.is_truthy())),
        UnaryOperator::Negate => right
            .as_number()
            .map(|value| Value::Number(-value))
            .ok_or(RuntimeError::OperandMustBeNumber { span }),
    }
}

fn numbers(left: &Value, right: &Value, span: Span) -> Result<(f64, f64), RuntimeError> {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::OperandsMustBeNumbers { span }),
    }
}
