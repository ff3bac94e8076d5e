//! Assembler and disassembler for JVM class files
//!
//!   - [`buffer`] has the chunked byte buffers everything gets encoded into
//!   - [`jvm`] builds class files (constant pool, bytecode, attributes)
//!   - [`reader`] parses class files back

pub mod buffer;
pub mod jvm;
pub mod reader;

pub use jvm::{Error, ErrorKind};
