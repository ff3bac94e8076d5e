//! Method bodies: opcodes, instructions, labels, and the stream that encodes them

mod instruction;
mod label;
mod opcode;
mod stream;

pub use instruction::*;
pub use label::*;
pub use opcode::*;
pub use stream::*;
