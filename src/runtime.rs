//! Runtime object model shared by the interpreter and the callables it
//! creates: values, environment frames, functions, classes and instances.
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod execution;
pub mod value;

pub use environment::Environment;
pub use error::RuntimeError;
pub use execution::{CallContext, ExecResult};
pub use value::Value;
