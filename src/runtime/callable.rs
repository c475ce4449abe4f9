mod function;

pub use function::Function;

use crate::runtime::class::Class;
use crate::runtime::error::RuntimeError;
use crate::runtime::execution::CallContext;
use crate::runtime::value::Value;
use crate::token::Span;

impl Value {
    /// Number of arguments a call must pass, or `None` if not callable.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Value::NativeFunction(builtin) => Some(builtin.arity()),
            Value::Function(function) => Some(function.arity()),
            Value::Class(class) => Some(class.arity()),
            _ => None,
        }
    }

    /// Calls this value. `span` locates the call for error reports.
    pub fn call(
        &self,
        context: &mut dyn CallContext,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let arity = self
            .arity()
            .ok_or(RuntimeError::NotCallable { span })?;
        RuntimeError::expect_arity(arity, args.len(), span)?;

        match self {
            Value::NativeFunction(builtin) => Ok(builtin.call(&args)),
            Value::Function(function) => function.call(context, args),
            Value::Class(class) => Class::instantiate(class, context, args),
            _ => Err(RuntimeError::NotCallable { span }),
        }
    }
}
