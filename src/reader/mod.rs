//! Reading JVM class files
//!
//! The reader mirrors the writer in [`crate::jvm`] but shares no state with it: a class file is
//! parsed from a byte slice through a [`ClassCursor`] into a [`ClassFile`], with attribute bodies
//! decoded into [`AttributeData`] and code arrays disassembled by [`decode_instructions`].
//!
//! Malformed input is reported with [`ReadError`] rather than the writer's [`crate::Error`].

mod attribute;
mod bytecode;
mod class;
mod constant_pool;
mod cursor;
mod errors;

pub use attribute::*;
pub use bytecode::*;
pub use class::*;
pub use constant_pool::*;
pub use cursor::*;
pub use errors::*;
