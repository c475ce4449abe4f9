use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::runtime::class::Class;
use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;
use crate::token::Span;

/// An instance: its class plus fields created on first assignment.
pub struct Instance {
    class: Rc<Class>,
    fields: FxHashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: FxHashMap::default(),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Reads a property. Fields shadow methods; methods come back bound to
    /// `instance`.
    pub fn get(
        instance: &Rc<RefCell<Instance>>,
        name: &str,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let this = instance.borrow();
        if let Some(value) = this.fields.get(name) {
            return Ok(value.clone());
        }
        match this.class.find_method(name) {
            Some(method) => Ok(Value::Function(Rc::new(method.bind(instance.clone())))),
            None => Err(RuntimeError::UndefinedProperty {
                name: name.to_string(),
                span,
            }),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = self.fields.keys().collect::<Vec<_>>();
        fields.sort();
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("fields", &fields)
            .finish()
    }
}
