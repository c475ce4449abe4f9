use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;
use crate::token::Span;

#[derive(Debug, Default)]
struct Frame {
    values: FxHashMap<String, Value>,
    enclosing: Option<Environment>,
}

/// Shared handle to one scope frame and, through it, its enclosing chain.
///
/// Cloning the handle shares the frame: closures, bound methods and the
/// interpreter all see the same bindings.
#[derive(Debug, Clone, Default)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn enclosed(enclosing: &Environment) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            values: FxHashMap::default(),
            enclosing: Some(enclosing.clone()),
        })))
    }

    /// Binds `name` in this frame, replacing any earlier binding here.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().values.insert(name.into(), value);
    }

    /// Searches this frame and then each enclosing one.
    pub fn get(&self, name: &str, span: Span) -> Result<Value, RuntimeError> {
        let frame = self.0.borrow();
        if let Some(value) = frame.values.get(name) {
            return Ok(value.clone());
        }
        match &frame.enclosing {
            Some(enclosing) => enclosing.get(name, span),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                span,
            }),
        }
    }

    pub fn assign(&self, name: &str, value: Value, span: Span) -> Result<(), RuntimeError> {
        let mut frame = self.0.borrow_mut();
        if let Some(slot) = frame.values.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &frame.enclosing {
            Some(enclosing) => enclosing.assign(name, value, span),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                span,
            }),
        }
    }

    /// Reads `name` from exactly `distance` frames out, without searching.
    pub fn get_at(&self, distance: usize, name: &str, span: Span) -> Result<Value, RuntimeError> {
        let frame = self.ancestor(distance, name, span)?;
        let value = frame.0.borrow().values.get(name).cloned();
        value.ok_or_else(|| RuntimeError::ScopeMismatch {
            name: name.to_string(),
            distance,
            span,
        })
    }

    /// Overwrites an existing binding exactly `distance` frames out. A missing
    /// binding is an error; nothing is created.
    pub fn assign_at(
        &self,
        distance: usize,
        name: &str,
        value: Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let frame = self.ancestor(distance, name, span)?;
        let mut frame = frame.0.borrow_mut();
        match frame.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::ScopeMismatch {
                name: name.to_string(),
                distance,
                span,
            }),
        }
    }

    /// The frame `distance` links out from this one.
    pub fn ancestor(&self, distance: usize, name: &str, span: Span) -> Result<Self, RuntimeError> {
        let mut environment = self.clone();
        for _ in 0..distance {
            let enclosing = environment.0.borrow().enclosing.clone();
            environment = enclosing.ok_or_else(|| RuntimeError::ScopeMismatch {
                name: name.to_string(),
                distance,
                span,
            })?;
        }
        Ok(environment)
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 1, 7, 0)
    }

    #[test]
    fn redefining_in_same_frame_overwrites() {
        let env = Environment::global();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Number(2.0));
        assert_eq!(env.get("a", span()), Ok(Value::Number(2.0)));
    }

    #[test]
    fn get_searches_enclosing_frames() {
        let global = Environment::global();
        global.define("a", Value::Bool(true));
        let inner = Environment::enclosed(&Environment::enclosed(&global));
        assert_eq!(inner.get("a", span()), Ok(Value::Bool(true)));
    }

    #[test]
    fn get_reports_undefined_variable() {
        let env = Environment::global();
        let error = env.get("missing", span()).expect_err("expected error");
        assert_eq!(error.to_string(), "Undefined variable 'missing'.");
        assert_eq!(error.line(), 7);
    }

    #[test]
    fn get_at_reads_exact_frame_without_searching() {
        let global = Environment::global();
        global.define("a", Value::Number(1.0));
        let middle = Environment::enclosed(&global);
        middle.define("a", Value::Number(2.0));
        let inner = Environment::enclosed(&middle);

        assert_eq!(inner.get_at(1, "a", span()), Ok(Value::Number(2.0)));
        assert_eq!(inner.get_at(2, "a", span()), Ok(Value::Number(1.0)));
        assert!(matches!(
            inner.get_at(0, "a", span()),
            Err(RuntimeError::ScopeMismatch { distance: 0, .. })
        ));
    }

    #[test]
    fn ancestor_past_global_is_scope_mismatch() {
        let global = Environment::global();
        assert!(matches!(
            global.ancestor(1, "a", span()),
            Err(RuntimeError::ScopeMismatch { distance: 1, .. })
        ));
        let inner = Environment::enclosed(&global);
        let found = inner.ancestor(1, "a", span()).expect("ancestor exists");
        assert!(found.ptr_eq(&global));
    }

    #[test]
    fn assign_updates_nearest_existing_binding() {
        let global = Environment::global();
        global.define("a", Value::Number(1.0));
        let inner = Environment::enclosed(&global);
        inner
            .assign("a", Value::Number(5.0), span())
            .expect("assign failed");
        assert_eq!(global.get("a", span()), Ok(Value::Number(5.0)));
        assert!(matches!(
            inner.assign("b", Value::Nil, span()),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn assign_at_requires_existing_binding() {
        let global = Environment::global();
        let inner = Environment::enclosed(&global);
        inner.define("a", Value::Nil);

        inner
            .assign_at(0, "a", Value::Number(3.0), span())
            .expect("assign_at failed");
        assert_eq!(inner.get_at(0, "a", span()), Ok(Value::Number(3.0)));

        assert!(matches!(
            inner.assign_at(1, "a", Value::Nil, span()),
            Err(RuntimeError::ScopeMismatch { .. })
        ));
        assert!(matches!(
            global.get("a", span()),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn closures_share_frames() {
        let frame = Environment::global();
        let alias = frame.clone();
        frame.define("count", Value::Number(0.0));
        alias
            .assign("count", Value::Number(1.0), span())
            .expect("assign failed");
        assert_eq!(frame.get("count", span()), Ok(Value::Number(1.0)));
    }
}
