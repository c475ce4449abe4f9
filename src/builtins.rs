use std::time::{SystemTime, UNIX_EPOCH};

use crate::runtime::environment::Environment;
use crate::runtime::value::Value;

/// Functions bound in every global environment before user code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Clock,
}

impl BuiltinFunction {
    pub const ALL: [BuiltinFunction; 1] = [BuiltinFunction::Clock];

    pub fn name(self) -> &'static str {
        match self {
            Self::Clock => "clock",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Clock => 0,
        }
    }

    /// Arity is checked by the caller.
    pub fn call(self, _args: &[Value]) -> Value {
        match self {
            // Seconds since the Unix epoch; a clock set before 1970 reads 0.
            Self::Clock => Value::Number(
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_secs_f64())
                    .unwrap_or_default(),
            ),
        }
    }
}

pub(crate) fn seed_globals(globals: &Environment) {
    for builtin in BuiltinFunction::ALL {
        globals.define(builtin.name(), Value::NativeFunction(builtin));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Span;

    #[test]
    fn seeds_clock_as_native_function() {
        let globals = Environment::global();
        seed_globals(&globals);
        let clock = globals
            .get("clock", Span::default())
            .expect("clock should be defined");
        assert_eq!(clock, Value::NativeFunction(BuiltinFunction::Clock));
    }

    #[test]
    fn clock_returns_positive_seconds() {
        let Value::Number(seconds) = BuiltinFunction::Clock.call(&[]) else {
            panic!("clock should return a number");
        };
        assert!(seconds > 0.0);
    }
}
