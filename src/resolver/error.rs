use std::fmt;

use thiserror::Error;

/// A static scoping error found before evaluation.
///
/// `lexeme` is the token the diagnostic points at, `line` its source line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("[line {line}] Error at '{lexeme}': Already a variable with this name in this scope.")]
    AlreadyDeclared { lexeme: String, line: usize },
    #[error("[line {line}] Error at '{lexeme}': Can't read local variable in its own initializer.")]
    ReadInOwnInitializer { lexeme: String, line: usize },
    #[error("[line {line}] Error at '{lexeme}': Can't return from top-level code.")]
    TopLevelReturn { lexeme: String, line: usize },
    #[error("[line {line}] Error at '{lexeme}': Can't return a value from an initializer.")]
    ValueReturnFromInitializer { lexeme: String, line: usize },
    #[error("[line {line}] Error at '{lexeme}': Can't use 'this' outside of a class.")]
    ThisOutsideClass { lexeme: String, line: usize },
    #[error("[line {line}] Error at '{lexeme}': Can't use 'super' outside of a class.")]
    SuperOutsideClass { lexeme: String, line: usize },
    #[error("[line {line}] Error at '{lexeme}': Can't use 'super' in a class with no superclass.")]
    SuperWithoutSuperclass { lexeme: String, line: usize },
    #[error("[line {line}] Error at '{lexeme}': A class can't inherit from itself.")]
    SelfInheritance { lexeme: String, line: usize },
}

impl ResolveError {
    pub fn line(&self) -> usize {
        match self {
            Self::AlreadyDeclared { line, .. }
            | Self::ReadInOwnInitializer { line, .. }
            | Self::TopLevelReturn { line, .. }
            | Self::ValueReturnFromInitializer { line, .. }
            | Self::ThisOutsideClass { line, .. }
            | Self::SuperOutsideClass { line, .. }
            | Self::SuperWithoutSuperclass { line, .. }
            | Self::SelfInheritance { line, .. } => *line,
        }
    }
}

/// Every static error collected during one resolution pass, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveErrors(pub Vec<ResolveError>);

impl ResolveErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolveError> {
        self.0.iter()
    }
}

impl fmt::Display for ResolveErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolveErrors {}
