use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::runtime::class::Instance;
use crate::runtime::environment::Environment;
use crate::runtime::error::RuntimeError;
use crate::runtime::execution::{CallContext, ExecResult};
use crate::runtime::value::Value;

/// A user-defined function or method together with the frame it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Environment,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Environment, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.name
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Returns a copy whose closure is a new frame binding `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment = Environment::enclosed(&self.closure);
        environment.define("this", Value::Instance(instance));
        Function::new(self.declaration.clone(), environment, self.is_initializer)
    }

    /// Runs the body in a fresh frame. Arity has already been checked.
    pub fn call(&self, context: &mut dyn CallContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        tracing::trace!(function = self.name(), args = args.len(), "call");
        let environment = Environment::enclosed(&self.closure);
        for (param, arg) in self.declaration.params.iter().zip(args) {
            environment.define(param.name.clone(), arg);
        }

        let result = context.execute_block(&self.declaration.body, environment)?;
        // An initializer always yields its instance, even on a bare `return;`.
        if self.is_initializer {
            return self.closure.get_at(0, "this", self.declaration.name.span);
        }
        match result {
            ExecResult::Return(value) => Ok(value),
            ExecResult::Continue => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}
