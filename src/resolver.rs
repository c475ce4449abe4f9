//! Static scope resolution.
//!
//! Walks the tree once before evaluation and records, for every local
//! variable reference (including `this` and `super`), how many environment
//! frames outward its binding lives. References with no entry are globals.
//! The frames pushed here mirror the frames the interpreter creates at
//! runtime one for one: blocks, function calls, the `this` frame of a bound
//! method and the `super` frame of a subclass.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{Expr, ExprId, ExprKind, FunctionDecl, Ident, Program, Statement};
use crate::stack::ensure_sufficient_stack;

pub mod error;

pub use error::{ResolveError, ResolveErrors};

/// Scope distances keyed by expression id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolutions {
    depths: FxHashMap<ExprId, usize>,
}

impl Resolutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance to the binding, or `None` for a global reference.
    pub fn depth(&self, id: ExprId) -> Option<usize> {
        self.depths.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Adds entries from a later resolution pass of the same session.
    pub fn merge(&mut self, other: Resolutions) {
        self.depths.extend(other.depths);
    }

    fn record(&mut self, id: ExprId, depth: usize) {
        self.depths.insert(id, depth);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

pub struct Resolver {
    /// Each frame maps a name to whether its initializer has finished.
    scopes: Vec<FxHashMap<String, bool>>,
    resolutions: Resolutions,
    current_function: FunctionKind,
    current_class: ClassKind,
    errors: Vec<ResolveError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            resolutions: Resolutions::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            errors: Vec::new(),
        }
    }

    pub fn resolve_program(mut self, program: &Program) -> Result<Resolutions, ResolveErrors> {
        for statement in &program.statements {
            self.resolve_statement(statement);
        }

        tracing::debug!(
            resolutions = self.resolutions.len(),
            errors = self.errors.len(),
            "resolved program"
        );
        if self.errors.is_empty() {
            Ok(self.resolutions)
        } else {
            Err(ResolveErrors(self.errors))
        }
    }

    fn resolve_statement(&mut self, statement: &Statement) {
        ensure_sufficient_stack(|| self.resolve_statement_inner(statement));
    }

    fn resolve_statement_inner(&mut self, statement: &Statement) {
        match statement {
            Statement::Expression(expr) | Statement::Print(expr) => self.resolve_expr(expr),
            Statement::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Statement::Block(statements) => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch);
                }
            }
            Statement::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_statement(body);
            }
            Statement::Function(function) => {
                self.declare(&function.name);
                self.define(&function.name);
                self.resolve_function(function, FunctionKind::Function);
            }
            Statement::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.errors.push(ResolveError::TopLevelReturn {
                        lexeme: "return".to_string(),
                        line: keyword.line,
                    });
                }
                if let Some(value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        self.errors.push(ResolveError::ValueReturnFromInitializer {
                            lexeme: "return".to_string(),
                            line: keyword.line,
                        });
                    }
                    self.resolve_expr(value);
                }
            }
            Statement::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),
        }
    }

    fn resolve_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.resolve_statement(statement);
        }
    }

    fn resolve_class(
        &mut self,
        name: &Ident,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let ExprKind::Variable(superclass_name) = &superclass.kind
                && superclass_name.name == name.name
            {
                self.errors.push(ResolveError::SelfInheritance {
                    lexeme: superclass_name.name.clone(),
                    line: superclass_name.span.line,
                });
            }
            self.current_class = ClassKind::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.bind_implicit("super");
        }

        self.begin_scope();
        self.bind_implicit("this");

        for method in methods {
            let kind = if method.name.name == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }
        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.resolve_expr_inner(expr));
    }

    fn resolve_expr_inner(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Variable(name) => {
                if let Some(scope) = self.scopes.last()
                    && scope.get(&name.name) == Some(&false)
                {
                    self.errors.push(ResolveError::ReadInOwnInitializer {
                        lexeme: name.name.clone(),
                        line: name.span.line,
                    });
                }
                self.resolve_local(expr.id, &name.name);
            }
            ExprKind::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr.id, &name.name);
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Unary { right, .. } => self.resolve_expr(right),
            ExprKind::Call { callee, args } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::Grouping(inner) => self.resolve_expr(inner),
            ExprKind::Get { object, .. } => self.resolve_expr(object),
            ExprKind::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            ExprKind::This => {
                if self.current_class == ClassKind::None {
                    self.errors.push(ResolveError::ThisOutsideClass {
                        lexeme: "this".to_string(),
                        line: expr.span.line,
                    });
                    return;
                }
                self.resolve_local(expr.id, "this");
            }
            ExprKind::Super { .. } => {
                let lexeme = "super".to_string();
                let line = expr.span.line;
                match self.current_class {
                    ClassKind::None => self
                        .errors
                        .push(ResolveError::SuperOutsideClass { lexeme, line }),
                    ClassKind::Class => self
                        .errors
                        .push(ResolveError::SuperWithoutSuperclass { lexeme, line }),
                    ClassKind::Subclass => {}
                }
                self.resolve_local(expr.id, "super");
            }
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &str) {
        let innermost = self.scopes.len();
        for (index, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains_key(name) {
                let depth = innermost - 1 - index;
                tracing::trace!(name, depth, "resolved local");
                self.resolutions.record(id, depth);
                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Ident) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.contains_key(&name.name) {
            self.errors.push(ResolveError::AlreadyDeclared {
                lexeme: name.name.clone(),
                line: name.span.line,
            });
        }
        scope.insert(name.name.clone(), false);
    }

    fn define(&mut self, name: &Ident) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.name.clone(), true);
        }
    }

    fn bind_implicit(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }
}

pub fn resolve(program: &Program) -> Result<Resolutions, ResolveErrors> {
    Resolver::new().resolve_program(program)
}
