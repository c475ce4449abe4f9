use crate::ast::Program;
use crate::builtins;
use crate::resolver::Resolutions;
use crate::runtime::{Environment, ExecResult, RuntimeError};

mod operators;
mod print_sink;
mod runtime;

pub use print_sink::PrintSink;

/// Nested Lox calls allowed before a run fails with a stack overflow.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Tree-walking evaluator.
///
/// Holds the global frame and every resolution recorded so far, so several
/// programs can run one after another against the same globals.
pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    resolutions: Resolutions,
    output: PrintSink,
    call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_sink(PrintSink::Stdout)
    }

    /// An interpreter whose `print` output is kept for [`Self::take_output`].
    pub fn capturing() -> Self {
        Self::with_sink(PrintSink::buffer())
    }

    pub fn with_sink(output: PrintSink) -> Self {
        let globals = Environment::global();
        builtins::seed_globals(&globals);
        Self {
            environment: globals.clone(),
            globals,
            resolutions: Resolutions::new(),
            output,
            call_depth: 0,
        }
    }

    /// Runs top-level statements in order, stopping at the first runtime error.
    ///
    /// `resolutions` must come from resolving `program`; they are merged into
    /// the table kept from earlier runs.
    pub fn interpret(
        &mut self,
        program: &Program,
        resolutions: Resolutions,
    ) -> Result<(), RuntimeError> {
        self.resolutions.merge(resolutions);
        let result = self.exec_statements(&program.statements);
        // A failing call leaves no frame behind; this only guards the invariant.
        self.environment = self.globals.clone();
        self.call_depth = 0;

        match result {
            Ok(ExecResult::Continue | ExecResult::Return(_)) => Ok(()),
            Err(error) => {
                tracing::debug!(%error, line = error.line(), "runtime error");
                Err(error)
            }
        }
    }

    pub fn take_output(&mut self) -> String {
        self.output.take_output()
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse_tokens;
    use crate::resolver::resolve;
    use crate::runtime::Value;
    use crate::token::Span;
    use indoc::indoc;

    fn run(source: &str) -> (String, Result<(), RuntimeError>) {
        let mut interpreter = Interpreter::capturing();
        let result = run_in(&mut interpreter, source);
        (interpreter.take_output(), result)
    }

    fn run_in(interpreter: &mut Interpreter, source: &str) -> Result<(), RuntimeError> {
        let program = parse_tokens(tokenize(source).expect("tokenize failed")).expect("parse failed");
        let resolutions = resolve(&program).expect("resolve failed");
        interpreter.interpret(&program, resolutions)
    }

    fn output_of(source: &str) -> String {
        let (output, result) = run(source);
        result.expect("run failed");
        output
    }

    fn error_of(source: &str) -> RuntimeError {
        run(source).1.expect_err("expected runtime error")
    }

    #[test]
    fn evaluates_arithmetic_and_concatenation() {
        let output = output_of(indoc! {r#"
            print 1 + 2;
            print "a" + "b";
            print 7 / 2;
            print -(3 * 2) + 1;
        "#});
        assert_eq!(output, "3\nab\n3.5\n-5\n");
    }

    #[test]
    fn division_by_zero_is_runtime_error() {
        let error = error_of("print 10 / 0;");
        assert_eq!(error.to_string(), "Division by zero.");
        assert_eq!(error.line(), 1);
    }

    #[test]
    fn adding_string_and_number_is_runtime_error() {
        let error = error_of("\n\"a\" + 1;");
        assert_eq!(error, RuntimeError::InvalidAddOperands { span: error.span() });
        assert_eq!(error.line(), 2);
    }

    #[test]
    fn logical_operators_short_circuit_and_yield_operand() {
        let output = output_of(indoc! {r#"
            print nil or "yes";
            print 0 and "second";
            print false and undefined;
            print true or undefined;
        "#});
        assert_eq!(output, "yes\nsecond\nfalse\ntrue\n");
    }

    #[test]
    fn equality_uses_identity_for_objects() {
        let output = output_of(indoc! {"
            class A {}
            var a = A();
            var b = a;
            print a == b;
            print a == A();
            print nil == false;
            print clock == clock;
        "});
        assert_eq!(output, "true\nfalse\nfalse\ntrue\n");
    }

    #[test]
    fn closures_keep_captured_locals() {
        let output = output_of(indoc! {"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            var counter = makeCounter();
            counter();
            print counter();
        "});
        assert_eq!(output, "2\n");
    }

    #[test]
    fn closure_binds_declaration_time_scope() {
        let output = output_of(indoc! {r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#});
        assert_eq!(output, "global\nglobal\n");
    }

    #[test]
    fn control_flow_runs_loops_and_branches() {
        let output = output_of(indoc! {r#"
            var total = 0;
            for (var i = 0; i < 5; i = i + 1) {
                if (i == 3) total = total + 100; else total = total + i;
            }
            print total;
            var n = 3;
            while (n > 0) n = n - 1;
            print n;
        "#});
        assert_eq!(output, "107\n0\n");
    }

    #[test]
    fn return_unwinds_through_loops_to_call_boundary() {
        let output = output_of(indoc! {"
            fun firstOver(limit) {
                var i = 0;
                while (true) {
                    { if (i > limit) return i; }
                    i = i + 1;
                }
            }
            print firstOver(4);
            fun nothing() {}
            print nothing();
        "});
        assert_eq!(output, "5\nnil\n");
    }

    #[test]
    fn arity_mismatch_names_both_counts() {
        let error = error_of("fun f(a, b) {} f(1);");
        assert_eq!(
            error,
            RuntimeError::ArityMismatch {
                expected: 2,
                found: 1,
                span: error.span(),
            }
        );
        assert_eq!(error.to_string(), "Expected 2 arguments but got 1.");
    }

    #[test]
    fn calling_non_callable_is_runtime_error() {
        assert_eq!(
            error_of(r#""text"();"#).to_string(),
            "Can only call functions and classes."
        );
    }

    #[test]
    fn undefined_global_is_runtime_error() {
        assert_eq!(
            error_of("print missing;").to_string(),
            "Undefined variable 'missing'."
        );
        assert_eq!(
            error_of("missing = 1;").to_string(),
            "Undefined variable 'missing'."
        );
    }

    #[test]
    fn fields_shadow_methods_and_render_instances() {
        let output = output_of(indoc! {r#"
            class Box {
                value() { return "method"; }
            }
            var box = Box();
            print box.value();
            box.value = "field";
            print box.value;
            print box;
            print Box;
            print box.value == "field";
        "#});
        assert_eq!(output, "method\nfield\nBox instance\nBox\ntrue\n");
    }

    #[test]
    fn property_errors_distinguish_get_and_set() {
        assert_eq!(
            error_of("var n = 1; print n.x;").to_string(),
            "Only instances have properties."
        );
        assert_eq!(
            error_of("var n = 1; n.x = 2;").to_string(),
            "Only instances have fields."
        );
        assert_eq!(
            error_of("class A {} print A().missing;").to_string(),
            "Undefined property 'missing'."
        );
    }

    #[test]
    fn inherited_methods_bind_this_to_subclass_instance() {
        let output = output_of(indoc! {r#"
            class Animal {
                describe() { return this.name + " says " + this.sound(); }
            }
            class Dog < Animal {
                init(name) { this.name = name; }
                sound() { return "woof"; }
            }
            print Dog("rex").describe();
        "#});
        assert_eq!(output, "rex says woof\n");
    }

    #[test]
    fn super_calls_reach_superclass_method() {
        let output = output_of(indoc! {r#"
            class A {
                method() { return "A"; }
            }
            class B < A {
                method() { return "B>" + super.method(); }
            }
            class C < B {}
            print C().method();
        "#});
        assert_eq!(output, "B>A\n");
    }

    #[test]
    fn missing_super_method_is_undefined_property() {
        let error = error_of(indoc! {"
            class A {}
            class B < A {
                go() { return super.go(); }
            }
            B().go();
        "});
        assert_eq!(error.to_string(), "Undefined property 'go'.");
        assert_eq!(error.line(), 3);
    }

    #[test]
    fn initializer_returns_instance() {
        let output = output_of(indoc! {r#"
            class Point {
                init(x) {
                    this.x = x;
                    return;
                }
            }
            var p = Point(4);
            print p.x;
            print p.init(9) == p;
            print p.x;
        "#});
        assert_eq!(output, "4\ntrue\n9\n");
    }

    #[test]
    fn class_arity_follows_inherited_initializer() {
        let error = error_of(indoc! {"
            class A { init(a, b) {} }
            class B < A {}
            B(1);
        "});
        assert_eq!(error.to_string(), "Expected 2 arguments but got 1.");
        assert_eq!(error_of("class A {} A(1);").to_string(), "Expected 0 arguments but got 1.");
    }

    #[test]
    fn superclass_must_be_a_class() {
        assert_eq!(
            error_of("var NotClass = 1; class A < NotClass {}").to_string(),
            "Superclass must be a class."
        );
    }

    #[test]
    fn renders_callables() {
        let output = output_of(indoc! {"
            fun f() {}
            class A { m() {} }
            print f;
            print clock;
            print A().m;
        "});
        assert_eq!(output, "<fn f>\n<native fn>\n<fn m>\n");
    }

    #[test]
    fn runtime_error_keeps_earlier_output() {
        let (output, result) = run(indoc! {"
            print 1;
            print -nil;
            print 2;
        "});
        assert_eq!(output, "1\n");
        assert_eq!(
            result.expect_err("expected runtime error").to_string(),
            "Operand must be a number."
        );
    }

    #[test]
    fn globals_survive_between_programs() {
        let mut interpreter = Interpreter::capturing();
        run_in(&mut interpreter, "var a = 1;").expect("first run failed");
        run_in(&mut interpreter, "a = a + 1; print -nil; a = 10;")
            .expect_err("expected runtime error");
        assert_eq!(
            interpreter.globals().get("a", Span::default()),
            Ok(Value::Number(2.0))
        );
    }

    #[test]
    fn deep_recursion_below_the_call_limit_succeeds() {
        let output = output_of(indoc! {"
            fun depth(n) { if (n == 0) return 0; return 1 + depth(n - 1); }
            print depth(3000);
        "});
        assert_eq!(output, "3000\n");
    }

    #[test]
    fn unbounded_recursion_is_a_stack_overflow() {
        let mut interpreter = Interpreter::capturing();
        let error = run_in(&mut interpreter, "fun forever() { forever(); }\nforever();")
            .expect_err("expected runtime error");
        assert_eq!(error, RuntimeError::StackOverflow { span: error.span() });
        assert_eq!(error.to_string(), "Stack overflow.");
        assert_eq!(error.line(), 1);

        run_in(&mut interpreter, "print forever == forever;").expect("second run failed");
        assert_eq!(interpreter.take_output(), "true\n");
    }

    #[test]
    fn clock_is_a_number() {
        assert_eq!(output_of("print clock() > 0;"), "true\n");
    }
}
