use crate::diagnostics::{Diagnostic, Reporter};
use crate::interpreter::Interpreter;
use crate::lexer;
use crate::parser::Parser;
use crate::resolver;

/// How one [`Session::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Ok,
    /// Lexing, parsing or resolution failed; nothing was evaluated.
    StaticError,
    /// Evaluation stopped at a runtime error.
    RuntimeError,
}

impl RunOutcome {
    /// Process exit status for a script run.
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Ok => 0,
            RunOutcome::StaticError => 65,
            RunOutcome::RuntimeError => 70,
        }
    }
}

/// One program execution context: globals, resolutions and expression ids
/// persist across calls to [`Session::run`], so a REPL can feed it line by
/// line. Independent sessions share nothing.
pub struct Session {
    interpreter: Interpreter,
    next_id: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    /// A session whose `print` output is kept for [`Self::take_output`].
    pub fn capturing() -> Self {
        Self::with_interpreter(Interpreter::capturing())
    }

    fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            next_id: 0,
        }
    }

    pub fn run(&mut self, source: &str, reporter: &mut dyn Reporter) -> RunOutcome {
        let tokens = match lexer::tokenize(source) {
            Ok(tokens) => tokens,
            Err(error) => {
                reporter.report(Diagnostic::Lex(error));
                return RunOutcome::StaticError;
            }
        };

        let mut parser = Parser::with_first_id(tokens, self.next_id);
        let parsed = parser.parse_program();
        self.next_id = parser.next_id();
        let program = match parsed {
            Ok(program) => program,
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "parse failed");
                for error in errors.0 {
                    reporter.report(Diagnostic::Parse(error));
                }
                return RunOutcome::StaticError;
            }
        };

        let resolutions = match resolver::resolve(&program) {
            Ok(resolutions) => resolutions,
            Err(errors) => {
                for error in errors.0 {
                    reporter.report(Diagnostic::Resolve(error));
                }
                return RunOutcome::StaticError;
            }
        };

        match self.interpreter.interpret(&program, resolutions) {
            Ok(()) => RunOutcome::Ok,
            Err(error) => {
                reporter.report(Diagnostic::Runtime(error));
                RunOutcome::RuntimeError
            }
        }
    }

    pub fn take_output(&mut self) -> String {
        self.interpreter.take_output()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingReporter;
    use indoc::indoc;

    #[test]
    fn runs_program_and_captures_output() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        let outcome = session.run("print \"hello\";", &mut reporter);
        assert_eq!(outcome, RunOutcome::Ok);
        assert_eq!(session.take_output(), "hello\n");
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn reports_every_parse_error_without_running() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        let outcome = session.run("print 1; var = 2; print (;", &mut reporter);
        assert_eq!(outcome, RunOutcome::StaticError);
        assert_eq!(outcome.exit_code(), 65);
        assert_eq!(
            reporter.rendered(),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 1] Error at ';': Expect expression.",
            ]
        );
        assert_eq!(session.take_output(), "");
    }

    #[test]
    fn resolve_errors_prevent_evaluation() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        let source = indoc! {"
            print 1;
            fun f() { var a = 1; var a = 2; }
            return;
        "};
        assert_eq!(session.run(source, &mut reporter), RunOutcome::StaticError);
        assert_eq!(reporter.diagnostics().len(), 2);
        assert!(reporter.diagnostics().iter().all(Diagnostic::is_static));
        assert_eq!(session.take_output(), "");
    }

    #[test]
    fn lex_error_is_static() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        assert_eq!(session.run("var a = #;", &mut reporter), RunOutcome::StaticError);
        assert_eq!(
            reporter.rendered(),
            vec!["[line 1] Error: Unexpected character '#'."]
        );
    }

    #[test]
    fn runtime_error_reports_message_and_line() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        let outcome = session.run("print 1;\nprint 1 / 0;\nprint 3;", &mut reporter);
        assert_eq!(outcome, RunOutcome::RuntimeError);
        assert_eq!(outcome.exit_code(), 70);
        assert_eq!(reporter.rendered(), vec!["Division by zero.\n[line 2]"]);
        assert_eq!(session.take_output(), "1\n");
    }

    #[test]
    fn later_runs_see_earlier_globals_and_closures() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        let lines = [
            "fun wrap(x) { fun f() { return x; } return f; } var g = wrap(\"inner\");",
            "var x = \"top\";",
            "print x + g();",
        ];
        for line in lines {
            assert_eq!(session.run(line, &mut reporter), RunOutcome::Ok, "{line}");
        }
        assert_eq!(session.take_output(), "topinner\n");
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn session_continues_after_errors() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        assert_eq!(session.run("var a = 1;", &mut reporter), RunOutcome::Ok);
        assert_eq!(session.run("a = a + ;", &mut reporter), RunOutcome::StaticError);
        assert_eq!(session.run("a = a + nil;", &mut reporter), RunOutcome::RuntimeError);
        assert_eq!(session.run("print a;", &mut reporter), RunOutcome::Ok);
        assert_eq!(session.take_output(), "1\n");
    }

    #[test]
    fn stack_overflow_is_reported_and_session_keeps_globals() {
        let mut session = Session::capturing();
        let mut reporter = CollectingReporter::new();
        let define = "fun depth(n) { if (n == 0) return 0; return 1 + depth(n - 1); }";
        assert_eq!(session.run(define, &mut reporter), RunOutcome::Ok);
        assert_eq!(
            session.run("print depth(100000);", &mut reporter),
            RunOutcome::RuntimeError
        );
        assert_eq!(reporter.rendered(), vec!["Stack overflow.\n[line 1]"]);

        assert_eq!(session.run("print depth(10);", &mut reporter), RunOutcome::Ok);
        assert_eq!(session.take_output(), "10\n");
    }

    #[test]
    fn independent_sessions_do_not_share_globals() {
        let mut reporter = CollectingReporter::new();
        let mut first = Session::capturing();
        let mut second = Session::capturing();
        assert_eq!(first.run("var shared = 1;", &mut reporter), RunOutcome::Ok);
        assert_eq!(
            second.run("print shared;", &mut reporter),
            RunOutcome::RuntimeError
        );
        assert_eq!(
            reporter.rendered(),
            vec!["Undefined variable 'shared'.\n[line 1]"]
        );
    }
}
