use super::{ClassCursor, ReadError};
use crate::jvm::code::{BaseType, Opcode, OperandKind};
use std::fmt;

/// Instruction decoded from a code array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Offset of the opcode (or of the `wide` prefix) in the code array
    pub offset: usize,

    /// Opcode, or the modified opcode for `wide` instructions
    pub opcode: Opcode,

    /// Whether the instruction was prefixed by `wide`
    pub wide: bool,

    pub operands: Operands,
}

/// Operands of a decoded instruction
///
/// Jump offsets are relative to the offset of the instruction, as in the code array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
    None,
    Byte(i8),
    Short(i16),
    Constant(u16),
    Local(u16),
    IInc { index: u16, delta: i16 },
    Branch(i32),
    TableSwitch {
        default: i32,
        low: i32,
        high: i32,
        offsets: Vec<i32>,
    },
    LookupSwitch {
        default: i32,
        pairs: Vec<(i32, i32)>,
    },
    InvokeInterface { index: u16, count: u8 },
    InvokeDynamic(u16),
    ArrayType(BaseType),
    MultiANewArray { index: u16, dimensions: u8 },
}

/// Disassemble a code array
///
/// Switch padding is computed relative to the start of `code`, which must therefore be the whole
/// code array of a method.
pub fn decode_instructions(code: &[u8]) -> Result<Vec<DecodedInstruction>, ReadError> {
    let mut cursor = ClassCursor::new(code);
    let mut instructions = vec![];
    while !cursor.is_at_end() {
        instructions.push(read_instruction(&mut cursor)?);
    }
    Ok(instructions)
}

fn read_opcode(cursor: &mut ClassCursor<'_>) -> Result<Opcode, ReadError> {
    let offset = cursor.position();
    let opcode = cursor.read_u1()?;
    Opcode::from_code(opcode).ok_or(ReadError::BadOpcode { offset, opcode })
}

fn bad_code(reason: &'static str) -> ReadError {
    ReadError::BadAttribute {
        name: String::from("Code"),
        reason,
    }
}

fn read_instruction(cursor: &mut ClassCursor<'_>) -> Result<DecodedInstruction, ReadError> {
    let offset = cursor.position();
    let mut opcode = read_opcode(cursor)?;
    let mut wide = false;

    let operands = match opcode.operands() {
        OperandKind::None => Operands::None,
        OperandKind::Byte => Operands::Byte(cursor.read_i1()?),
        OperandKind::Short => Operands::Short(cursor.read_i2()?),
        OperandKind::ConstantU1 => Operands::Constant(cursor.read_u1()? as u16),
        OperandKind::Constant => Operands::Constant(cursor.read_u2()?),
        OperandKind::Local => Operands::Local(cursor.read_u1()? as u16),
        OperandKind::IInc => Operands::IInc {
            index: cursor.read_u1()? as u16,
            delta: cursor.read_i1()? as i16,
        },
        OperandKind::Branch => Operands::Branch(cursor.read_i2()? as i32),
        OperandKind::BranchWide => Operands::Branch(cursor.read_i4()?),
        OperandKind::TableSwitch => {
            skip_padding(cursor, offset)?;
            let default = cursor.read_i4()?;
            let low = cursor.read_i4()?;
            let high = cursor.read_i4()?;
            let count = high as i64 - low as i64 + 1;
            if count < 0 {
                return Err(bad_code("tableswitch has high < low - 1"));
            }
            let offsets = (0..count)
                .map(|_| cursor.read_i4())
                .collect::<Result<_, _>>()?;
            Operands::TableSwitch {
                default,
                low,
                high,
                offsets,
            }
        }
        OperandKind::LookupSwitch => {
            skip_padding(cursor, offset)?;
            let default = cursor.read_i4()?;
            let npairs = cursor.read_i4()?;
            if npairs < 0 {
                return Err(bad_code("lookupswitch has a negative number of pairs"));
            }
            let pairs = (0..npairs)
                .map(|_| Ok((cursor.read_i4()?, cursor.read_i4()?)))
                .collect::<Result<_, ReadError>>()?;
            Operands::LookupSwitch { default, pairs }
        }
        OperandKind::InvokeInterface => {
            let index = cursor.read_u2()?;
            let count = cursor.read_u1()?;
            cursor.skip(1)?;
            Operands::InvokeInterface { index, count }
        }
        OperandKind::InvokeDynamic => {
            let index = cursor.read_u2()?;
            cursor.skip(2)?;
            Operands::InvokeDynamic(index)
        }
        OperandKind::ArrayType => {
            let code = cursor.read_u1()?;
            let base_type = BaseType::from_array_type_code(code)
                .ok_or_else(|| bad_code("unknown newarray element type"))?;
            Operands::ArrayType(base_type)
        }
        OperandKind::MultiANewArray => Operands::MultiANewArray {
            index: cursor.read_u2()?,
            dimensions: cursor.read_u1()?,
        },
        OperandKind::Wide => {
            let modified_offset = cursor.position();
            let modified = read_opcode(cursor)?;
            wide = true;
            opcode = modified;
            match modified.operands() {
                OperandKind::Local => Operands::Local(cursor.read_u2()?),
                OperandKind::IInc => Operands::IInc {
                    index: cursor.read_u2()?,
                    delta: cursor.read_i2()?,
                },
                _ => {
                    return Err(ReadError::BadOpcode {
                        offset: modified_offset,
                        opcode: modified.code(),
                    })
                }
            }
        }
    };

    Ok(DecodedInstruction {
        offset,
        opcode,
        wide,
        operands,
    })
}

/// Skip the 0-3 bytes which align switch operands on a multiple of 4
fn skip_padding(cursor: &mut ClassCursor<'_>, opcode_offset: usize) -> Result<(), ReadError> {
    let padding = (4 - (opcode_offset + 1) % 4) % 4;
    cursor.skip(padding)
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let target = |relative: i32| self.offset as i64 + relative as i64;

        write!(f, "{:>5}: ", self.offset)?;
        if self.wide {
            write!(f, "wide ")?;
        }
        write!(f, "{}", self.opcode.mnemonic())?;
        match &self.operands {
            Operands::None => Ok(()),
            Operands::Byte(value) => write!(f, " {}", value),
            Operands::Short(value) => write!(f, " {}", value),
            Operands::Constant(index) => write!(f, " #{}", index),
            Operands::Local(index) => write!(f, " {}", index),
            Operands::IInc { index, delta } => write!(f, " {} {:+}", index, delta),
            Operands::Branch(relative) => write!(f, " {}", target(*relative)),
            Operands::TableSwitch {
                default,
                low,
                offsets,
                ..
            } => {
                write!(f, " {{")?;
                for (key, relative) in (*low as i64..).zip(offsets) {
                    write!(f, " {}: {},", key, target(*relative))?;
                }
                write!(f, " default: {} }}", target(*default))
            }
            Operands::LookupSwitch { default, pairs } => {
                write!(f, " {{")?;
                for (key, relative) in pairs {
                    write!(f, " {}: {},", key, target(*relative))?;
                }
                write!(f, " default: {} }}", target(*default))
            }
            Operands::InvokeInterface { index, count } => write!(f, " #{} {}", index, count),
            Operands::InvokeDynamic(index) => write!(f, " #{}", index),
            Operands::ArrayType(base_type) => write!(f, " {:?}", base_type),
            Operands::MultiANewArray { index, dimensions } => {
                write!(f, " #{} {}", index, dimensions)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::code::{BranchOpcode, Instruction, InstructionStream};

    #[test]
    fn decodes_emitted_switches() {
        let mut stream = InstructionStream::new();
        stream.emit(Instruction::ILoad(1)).unwrap();
        let default = stream.define_label();
        let case = stream.define_label();
        {
            let mut switch = stream.table_switch(default, -1).unwrap();
            switch.case(case).unwrap();
            switch.case(default).unwrap();
        }
        stream.mark_label(case).unwrap();
        stream.emit(Instruction::ILoad(0)).unwrap();
        {
            let mut switch = stream.lookup_switch(default).unwrap();
            switch.case(7, case).unwrap();
        }
        stream.mark_label(default).unwrap();
        stream.emit(Instruction::Return).unwrap();
        let code = stream.finish().unwrap().to_vec().unwrap();

        let decoded = decode_instructions(&code).unwrap();
        let opcodes: Vec<Opcode> = decoded.iter().map(|i| i.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::ILoad1,
                Opcode::TableSwitch,
                Opcode::ILoad0,
                Opcode::LookupSwitch,
                Opcode::Return
            ]
        );

        // tableswitch at 1: padding 2, then default/low/high/2 offsets
        assert_eq!(decoded[2].offset, 24);
        assert_eq!(
            decoded[1].operands,
            Operands::TableSwitch {
                default: 43,
                low: -1,
                high: 0,
                offsets: vec![23, 43],
            }
        );

        // lookupswitch at 25: padding 2, then default/npairs/1 pair
        assert_eq!(decoded[4].offset, 44);
        assert_eq!(
            decoded[3].operands,
            Operands::LookupSwitch {
                default: 19,
                pairs: vec![(7, -1)],
            }
        );
    }

    #[test]
    fn decodes_wide_and_branches() {
        let mut stream = InstructionStream::new();
        let top = stream.define_label();
        stream.mark_label(top).unwrap();
        stream.emit(Instruction::IInc(300, -2)).unwrap();
        stream.emit(Instruction::ALoad(256)).unwrap();
        stream.branch(BranchOpcode::Goto, top).unwrap();
        let code = stream.finish().unwrap().to_vec().unwrap();

        let decoded = decode_instructions(&code).unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(decoded[0].wide);
        assert_eq!(decoded[0].opcode, Opcode::IInc);
        assert_eq!(
            decoded[0].operands,
            Operands::IInc {
                index: 300,
                delta: -2
            }
        );
        assert_eq!(decoded[1].offset, 6);
        assert_eq!(decoded[1].operands, Operands::Local(256));
        assert_eq!(decoded[2].offset, 10);
        assert_eq!(decoded[2].operands, Operands::Branch(-10));
        assert_eq!(decoded[2].to_string(), "   10: goto 0");
    }

    #[test]
    fn rejects_bad_code() {
        assert_eq!(
            decode_instructions(&[0x00, 0xcb]),
            Err(ReadError::BadOpcode {
                offset: 1,
                opcode: 0xcb
            })
        );
        assert_eq!(
            decode_instructions(&[0xc4, 0x60]),
            Err(ReadError::BadOpcode {
                offset: 1,
                opcode: 0x60
            })
        );
        assert!(matches!(
            decode_instructions(&[0x10]),
            Err(ReadError::Truncated { offset: 1, .. })
        ));
    }
}
