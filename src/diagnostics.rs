//! Error reporting for a session run.
//!
//! Each phase hands its errors to a [`Reporter`]. The console reporter
//! prints them to stderr in the usual Lox formats; the collecting reporter
//! keeps them for inspection.

use std::fmt;

use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::resolver::ResolveError;
use crate::runtime::RuntimeError;

/// One reported error from any phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Lex(LexError),
    Parse(ParseError),
    Resolve(ResolveError),
    Runtime(RuntimeError),
}

impl Diagnostic {
    /// True for errors found before evaluation starts.
    pub fn is_static(&self) -> bool {
        !matches!(self, Diagnostic::Runtime(_))
    }

    pub fn line(&self) -> usize {
        match self {
            Diagnostic::Lex(error) => error.line(),
            Diagnostic::Parse(error) => error.line,
            Diagnostic::Resolve(error) => error.line(),
            Diagnostic::Runtime(error) => error.line(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Lex(error) => write!(f, "[line {}] Error: {error}", error.line()),
            Diagnostic::Parse(error) => write!(f, "{error}"),
            Diagnostic::Resolve(error) => write!(f, "{error}"),
            Diagnostic::Runtime(error) => write!(f, "{error}\n[line {}]", error.line()),
        }
    }
}

pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Writes every diagnostic to stderr, one per line.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        eprintln!("{diagnostic}");
    }
}

/// Keeps diagnostics in report order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn rendered(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
