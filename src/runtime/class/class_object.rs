use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::runtime::callable::Function;
use crate::runtime::class::Instance;
use crate::runtime::error::RuntimeError;
use crate::runtime::execution::CallContext;
use crate::runtime::value::Value;

const INITIALIZER: &str = "init";

/// A class: its name, optional superclass and unbound methods.
pub struct Class {
    name: String,
    superclass: Option<Rc<Class>>,
    methods: FxHashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<Class>>,
        methods: FxHashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks `name` up here, then along the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// The initializer's arity, or 0 without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map(|init| init.arity())
            .unwrap_or(0)
    }

    /// Allocates an instance and runs `init` on it, if any. Arity has already
    /// been checked.
    pub fn instantiate(
        class: &Rc<Class>,
        context: &mut dyn CallContext,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let instance = Rc::new(RefCell::new(Instance::new(class.clone())));
        if let Some(init) = class.find_method(INITIALIZER) {
            init.bind(instance.clone()).call(context, args)?;
        }
        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.methods.keys().collect::<Vec<_>>();
        methods.sort();
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|class| class.name()))
            .field("methods", &methods)
            .finish()
    }
}
