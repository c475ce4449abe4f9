use std::io;

use thiserror::Error;

use crate::token::Span;

/// Errors raised while evaluating a resolved program.
///
/// Every variant carries the span of the token the report should point at.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers { span: Span },
    #[error("Operand must be a number.")]
    OperandMustBeNumber { span: Span },
    #[error("Operands must be two numbers or two strings.")]
    InvalidAddOperands { span: Span },
    #[error("Division by zero.")]
    DivisionByZero { span: Span },
    #[error("Can only call functions and classes.")]
    NotCallable { span: Span },
    #[error("Expected {expected} arguments but got {found}.")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("Only instances have properties.")]
    OnlyInstancesHaveProperties { span: Span },
    #[error("Only instances have fields.")]
    OnlyInstancesHaveFields { span: Span },
    #[error("Superclass must be a class.")]
    SuperclassMustBeClass { span: Span },
    #[error("Undefined property '{name}'.")]
    UndefinedProperty { name: String, span: Span },
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, span: Span },
    #[error("Stack overflow.")]
    StackOverflow { span: Span },
    /// `print` could not write, e.g. stdout was closed by the reader.
    #[error("Could not write output: {kind}.")]
    Output { kind: io::ErrorKind, span: Span },
    /// The resolver and the environment chain disagree. Never raised for a
    /// program the resolver accepted unless there is a bug in either pass.
    #[error("No binding for '{name}' at scope distance {distance}.")]
    ScopeMismatch {
        name: String,
        distance: usize,
        span: Span,
    },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            Self::OperandsMustBeNumbers { span }
            | Self::OperandMustBeNumber { span }
            | Self::InvalidAddOperands { span }
            | Self::DivisionByZero { span }
            | Self::NotCallable { span }
            | Self::ArityMismatch { span, .. }
            | Self::OnlyInstancesHaveProperties { span }
            | Self::OnlyInstancesHaveFields { span }
            | Self::SuperclassMustBeClass { span }
            | Self::UndefinedProperty { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::StackOverflow { span }
            | Self::Output { span, .. }
            | Self::ScopeMismatch { span, .. } => *span,
        }
    }

    pub fn line(&self) -> usize {
        self.span().line
    }

    pub(crate) fn expect_arity(expected: usize, found: usize, span: Span) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::ArityMismatch {
                expected,
                found,
                span,
            })
        }
    }
}
