//! Class file structure: the class writer, fields, methods, and attribute encoders

mod annotation;
mod attribute;
mod class;
mod field;
mod method;
mod stack_map;

pub use annotation::*;
pub use attribute::*;
pub use class::*;
pub use field::*;
pub use method::*;
pub use stack_map::*;
