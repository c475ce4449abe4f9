use std::fmt;

use thiserror::Error;

use crate::token::Token;

/// A syntax error at a specific token.
///
/// `location` is either `'lexeme'` or `end`, matching how the token is
/// rendered in diagnostics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("[line {line}] Error at {location}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub location: String,
}

impl ParseError {
    pub(crate) fn at(token: &Token<'_>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: token.span.line,
            location: token.to_string(),
        }
    }
}

/// Every syntax error found in one parse, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        write!(f, "{rendered}")
    }
}

impl std::error::Error for ParseErrors {}
