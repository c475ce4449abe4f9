mod class_object;
mod instance_object;

pub use class_object::Class;
pub use instance_object::Instance;
