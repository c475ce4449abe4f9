use crate::ast::Statement;
use crate::runtime::environment::Environment;
use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

/// Control-flow marker for statement execution.
///
/// `Return` unwinds through blocks and loops and stops at the nearest call
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    Continue,
    Return(Value),
}

/// What a callable needs from the evaluator to run a body.
pub trait CallContext {
    fn execute_block(
        &mut self,
        statements: &[Statement],
        environment: Environment,
    ) -> Result<ExecResult, RuntimeError>;
}
