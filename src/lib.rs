//! A tree-walking interpreter for Lox.
//!
//! Source text flows through [`lexer`], [`parser`] and [`resolver`] before
//! the [`interpreter`] evaluates it; [`session::Session`] drives all four and
//! keeps state between runs.
pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod runtime;
pub mod session;
mod stack;
pub mod token;

pub use diagnostics::{CollectingReporter, ConsoleReporter, Diagnostic, Reporter};
pub use session::{RunOutcome, Session};
