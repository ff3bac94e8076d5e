//! Writing JVM class files
//!
//! The pieces fit together like this: constants are interned into a [`SymbolTable`], method
//! bodies are emitted with a [`code::InstructionStream`], and everything is assembled by a
//! [`class_file::ClassBuilder`]. All of them encode straight into
//! [`crate::buffer::BufferChain`]s, which are spliced together at the end.
//!
//! ```
//! use classasm::jvm::class_file::{ClassBuilder, Code};
//! use classasm::jvm::code::{Instruction, InstructionStream};
//! use classasm::jvm::{ClassAccessFlags, MethodAccessFlags, Version};
//!
//! let mut class = ClassBuilder::new(
//!     Version::JAVA8,
//!     ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
//!     "me/Empty",
//!     Some("java/lang/Object"),
//! )?;
//!
//! let mut code = InstructionStream::with_buffer(class.new_chain());
//! code.emit(Instruction::Return)?;
//! let code = class.attribute(Code {
//!     max_stack: 0,
//!     max_locals: 0,
//!     code: code.finish()?,
//!     exception_table: vec![],
//!     attributes: vec![],
//! })?;
//! class.add_method(MethodAccessFlags::STATIC, "nothing", "()V", vec![code])?;
//!
//! let bytes = class.finish()?.to_vec()?;
//! assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
//! # Ok::<(), classasm::Error>(())
//! ```

mod access_flags;
mod binary_format;
mod errors;
mod mutf8;
mod symbol_table;
mod version;

pub mod class_file;
pub mod code;

pub use access_flags::*;
pub use binary_format::*;
pub use errors::*;
pub use mutf8::*;
pub use symbol_table::*;
pub use version::*;
