use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{Expr, ExprId, ExprKind, FunctionDecl, Ident, Literal, LogicalOperator, Statement};
use crate::runtime::callable::Function;
use crate::runtime::class::{Class, Instance};
use crate::runtime::{CallContext, Environment, ExecResult, RuntimeError, Value};
use crate::stack::ensure_sufficient_stack;
use crate::token::Span;

use super::{Interpreter, MAX_CALL_DEPTH, operators};

type EvalResult<T> = Result<T, RuntimeError>;

impl Interpreter {
    pub(super) fn exec_statements(&mut self, statements: &[Statement]) -> EvalResult<ExecResult> {
        // Execute statements in order until one returns, then bubble that up.
        for statement in statements {
            if let ExecResult::Return(value) = self.exec_statement(statement)? {
                return Ok(ExecResult::Return(value));
            }
        }
        Ok(ExecResult::Continue)
    }

    fn exec_statement(&mut self, statement: &Statement) -> EvalResult<ExecResult> {
        ensure_sufficient_stack(|| self.exec_statement_inner(statement))
    }

    fn exec_statement_inner(&mut self, statement: &Statement) -> EvalResult<ExecResult> {
        match statement {
            Statement::Expression(expr) => {
                self.eval_expression(expr)?;
            }
            Statement::Print(expr) => {
                let value = self.eval_expression(expr)?;
                self.output
                    .println(&value.to_string())
                    .map_err(|error| RuntimeError::Output {
                        kind: error.kind(),
                        span: expr.span,
                    })?;
            }
            Statement::Var { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => self.eval_expression(initializer)?,
                    None => Value::Nil,
                };
                self.environment.define(name.name.clone(), value);
            }
            Statement::Block(statements) => {
                let environment = Environment::enclosed(&self.environment);
                return self.execute_block(statements, environment);
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expression(condition)?.is_truthy() {
                    return self.exec_statement(then_branch);
                }
                if let Some(else_branch) = else_branch {
                    return self.exec_statement(else_branch);
                }
            }
            Statement::While { condition, body } => {
                while self.eval_expression(condition)?.is_truthy() {
                    if let ExecResult::Return(value) = self.exec_statement(body)? {
                        return Ok(ExecResult::Return(value));
                    }
                }
            }
            Statement::Function(declaration) => {
                let function = Function::new(declaration.clone(), self.environment.clone(), false);
                self.environment
                    .define(declaration.name.name.clone(), Value::Function(Rc::new(function)));
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.eval_expression(value)?,
                    None => Value::Nil,
                };
                return Ok(ExecResult::Return(value));
            }
            Statement::Class {
                name,
                superclass,
                methods,
            } => self.exec_class(name, superclass.as_ref(), methods)?,
        }
        Ok(ExecResult::Continue)
    }

    fn exec_class(
        &mut self,
        name: &Ident,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> EvalResult<()> {
        let superclass = match superclass {
            Some(expr) => match self.eval_expression(expr)? {
                Value::Class(class) => Some(class),
                _ => return Err(RuntimeError::SuperclassMustBeClass { span: expr.span }),
            },
            None => None,
        };

        self.environment.define(name.name.clone(), Value::Nil);

        // Methods of a subclass close over an extra frame holding `super`.
        let method_environment = match &superclass {
            Some(superclass) => {
                let environment = Environment::enclosed(&self.environment);
                environment.define("super", Value::Class(superclass.clone()));
                environment
            }
            None => self.environment.clone(),
        };

        let methods = methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.name == "init";
                let function =
                    Function::new(method.clone(), method_environment.clone(), is_initializer);
                (method.name.name.clone(), Rc::new(function))
            })
            .collect::<FxHashMap<_, _>>();

        let class = Class::new(name.name.clone(), superclass, methods);
        self.environment
            .assign(&name.name, Value::Class(Rc::new(class)), name.span)
    }

    fn eval_expression(&mut self, expr: &Expr) -> EvalResult<Value> {
        ensure_sufficient_stack(|| self.eval_expression_inner(expr))
    }

    fn eval_expression_inner(&mut self, expr: &Expr) -> EvalResult<Value> {
        // Expression evaluation can recurse into calls, which may execute statements.
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Nil => Value::Nil,
                Literal::Boolean(value) => Value::Bool(*value),
                Literal::Number(value) => Value::Number(*value),
                Literal::String(value) => Value::string(value.as_str()),
            }),
            ExprKind::Variable(name) => self.lookup_variable(expr.id, &name.name, name.span),
            ExprKind::Assign { name, value } => {
                let value = self.eval_expression(value)?;
                match self.resolutions.depth(expr.id) {
                    Some(distance) => self.environment.assign_at(
                        distance,
                        &name.name,
                        value.clone(),
                        name.span,
                    )?,
                    None => self.globals.assign(&name.name, value.clone(), name.span)?,
                }
                Ok(value)
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                operators::binary(*op, left, right, expr.span)
            }
            ExprKind::Logical { left, op, right } => {
                let left = self.eval_expression(left)?;
                let decided = match op {
                    LogicalOperator::Or => left.is_truthy(),
                    LogicalOperator::And => !left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.eval_expression(right)
                }
            }
            ExprKind::Unary { op, right } => {
                let right = self.eval_expression(right)?;
                operators::unary(*op, right, expr.span)
            }
            ExprKind::Call { callee, args } => {
                let callee = self.eval_expression(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expression(arg)?);
                }
                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::StackOverflow { span: expr.span });
                }
                self.call_depth += 1;
                let result = callee.call(self, values, expr.span);
                self.call_depth -= 1;
                result
            }
            ExprKind::Grouping(inner) => self.eval_expression(inner),
            ExprKind::Get { object, name } => match self.eval_expression(object)? {
                Value::Instance(instance) => Instance::get(&instance, &name.name, name.span),
                _ => Err(RuntimeError::OnlyInstancesHaveProperties { span: name.span }),
            },
            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.eval_expression(object)? else {
                    return Err(RuntimeError::OnlyInstancesHaveFields { span: name.span });
                };
                let value = self.eval_expression(value)?;
                instance.borrow_mut().set(name.name.clone(), value.clone());
                Ok(value)
            }
            ExprKind::This => self.lookup_variable(expr.id, "this", expr.span),
            ExprKind::Super { method } => self.eval_super(expr.id, method, expr.span),
        }
    }

    /// `super` lives one frame outside the `this` frame of the bound method.
    fn eval_super(&mut self, id: ExprId, method: &Ident, span: Span) -> EvalResult<Value> {
        let mismatch = |distance| RuntimeError::ScopeMismatch {
            name: "super".to_string(),
            distance,
            span,
        };
        let distance = self.resolutions.depth(id).ok_or_else(|| mismatch(0))?;
        let this_distance = distance.checked_sub(1).ok_or_else(|| mismatch(distance))?;

        let Value::Class(superclass) = self.environment.get_at(distance, "super", span)? else {
            return Err(mismatch(distance));
        };
        let Value::Instance(instance) = self.environment.get_at(this_distance, "this", span)?
        else {
            return Err(mismatch(this_distance));
        };

        match superclass.find_method(&method.name) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(RuntimeError::UndefinedProperty {
                name: method.name.clone(),
                span: method.span,
            }),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &str, span: Span) -> EvalResult<Value> {
        match self.resolutions.depth(id) {
            Some(distance) => self.environment.get_at(distance, name, span),
            None => self.globals.get(name, span),
        }
    }
}

impl CallContext for Interpreter {
    fn execute_block(
        &mut self,
        statements: &[Statement],
        environment: Environment,
    ) -> EvalResult<ExecResult> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.exec_statements(statements);
        self.environment = previous;
        result
    }
}
