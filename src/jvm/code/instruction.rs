//! Non-branching instructions. The representation is slightly different from the usual
//! presentation to make it more convenient to construct bytecode:
//!
//!   - The "wide" instruction doesn't show up at all, but instead gets merged into the
//!     instructions it is allowed to modify. The narrowest encoding is picked when serializing.
//!
//!   - Some instructions get abstracted into one instruction with a field (eg. shifts and
//!     floating point comparisons).
//!
//! Instructions which refer to labels live in [`super::BranchOpcode`] and are emitted through
//! the [`super::InstructionStream`], since their operands depend on where the label ends up.

use super::{JumpWidth, Opcode};
use crate::buffer::BufferChain;
use crate::jvm::{
    ClassConstantIndex, ConstantIndex, Error, FieldRefConstantIndex, InvokeDynamicConstantIndex,
    Serialize,
};
use std::convert::TryFrom;
use std::ops::Not;

/// Non-branching JVM bytecode instruction
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Instruction {
    Nop,
    AConstNull,
    IConstM1,
    IConst0,
    IConst1,
    IConst2,
    IConst3,
    IConst4,
    IConst5,
    LConst0,
    LConst1,
    FConst0,
    FConst1,
    FConst2,
    DConst0,
    DConst1,
    BiPush(i8),
    SiPush(i16),
    Ldc(ConstantIndex), // covers both `ldc` and `ldc_w`
    Ldc2(ConstantIndex),
    ILoad(u16), // covers `iload`, `iload{0,3}`, and `wide iload`
    LLoad(u16),
    FLoad(u16),
    DLoad(u16),
    ALoad(u16),
    IALoad,
    LALoad,
    FALoad,
    DALoad,
    AALoad,
    BALoad,
    CALoad,
    SALoad,
    IStore(u16), // covers `istore`, `istore{0,3}`, and `wide istore`
    LStore(u16),
    FStore(u16),
    DStore(u16),
    AStore(u16),
    IAStore,
    LAStore,
    FAStore,
    DAStore,
    AAStore,
    BAStore,
    CAStore,
    SAStore,
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,
    IAdd,
    LAdd,
    FAdd,
    DAdd,
    ISub,
    LSub,
    FSub,
    DSub,
    IMul,
    LMul,
    FMul,
    DMul,
    IDiv,
    LDiv,
    FDiv,
    DDiv,
    IRem,
    LRem,
    FRem,
    DRem,
    INeg,
    LNeg,
    FNeg,
    DNeg,
    ISh(ShiftType), // covers `ishr`, `ishl`, and `iushr`
    LSh(ShiftType), // covers `lshr`, `lshl`, and `lushr`
    IAnd,
    LAnd,
    IOr,
    LOr,
    IXor,
    LXor,
    IInc(u16, i16), // covers `iinc` and `wide iinc`
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
    LCmp,
    FCmp(CompareMode), // covers `fcmpl` and `fcmpg`
    DCmp(CompareMode), // covers `dcmpl` and `dcmpg`
    Ret(u16),          // covers `ret` and `wide ret`
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
    Return,
    GetStatic(FieldRefConstantIndex),
    PutStatic(FieldRefConstantIndex),
    GetField(FieldRefConstantIndex),
    PutField(FieldRefConstantIndex),

    /// Index is to a `MethodRef` or (for `invokeinterface`, and optionally for `invokestatic`
    /// and `invokespecial`) an `InterfaceMethodRef`
    Invoke(InvokeType, ConstantIndex),

    InvokeDynamic(InvokeDynamicConstantIndex),
    New(ClassConstantIndex),
    NewArray(BaseType),
    ANewArray(ClassConstantIndex),
    ArrayLength,
    AThrow,
    CheckCast(ClassConstantIndex),
    InstanceOf(ClassConstantIndex),
    MonitorEnter,
    MonitorExit,
    MultiANewArray(ClassConstantIndex, u8),
}

impl Instruction {
    /// Opcode of the instruction in its regular form
    ///
    /// Instructions which have short and wide forms report the form taking a one byte operand
    /// (so `ILoad(0)` reports `iload` even though it gets serialized as `iload_0`).
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::AConstNull => Opcode::AConstNull,
            Instruction::IConstM1 => Opcode::IConstM1,
            Instruction::IConst0 => Opcode::IConst0,
            Instruction::IConst1 => Opcode::IConst1,
            Instruction::IConst2 => Opcode::IConst2,
            Instruction::IConst3 => Opcode::IConst3,
            Instruction::IConst4 => Opcode::IConst4,
            Instruction::IConst5 => Opcode::IConst5,
            Instruction::LConst0 => Opcode::LConst0,
            Instruction::LConst1 => Opcode::LConst1,
            Instruction::FConst0 => Opcode::FConst0,
            Instruction::FConst1 => Opcode::FConst1,
            Instruction::FConst2 => Opcode::FConst2,
            Instruction::DConst0 => Opcode::DConst0,
            Instruction::DConst1 => Opcode::DConst1,
            Instruction::BiPush(_) => Opcode::BiPush,
            Instruction::SiPush(_) => Opcode::SiPush,
            Instruction::Ldc(_) => Opcode::Ldc,
            Instruction::Ldc2(_) => Opcode::Ldc2W,
            Instruction::ILoad(_) => Opcode::ILoad,
            Instruction::LLoad(_) => Opcode::LLoad,
            Instruction::FLoad(_) => Opcode::FLoad,
            Instruction::DLoad(_) => Opcode::DLoad,
            Instruction::ALoad(_) => Opcode::ALoad,
            Instruction::IALoad => Opcode::IALoad,
            Instruction::LALoad => Opcode::LALoad,
            Instruction::FALoad => Opcode::FALoad,
            Instruction::DALoad => Opcode::DALoad,
            Instruction::AALoad => Opcode::AALoad,
            Instruction::BALoad => Opcode::BALoad,
            Instruction::CALoad => Opcode::CALoad,
            Instruction::SALoad => Opcode::SALoad,
            Instruction::IStore(_) => Opcode::IStore,
            Instruction::LStore(_) => Opcode::LStore,
            Instruction::FStore(_) => Opcode::FStore,
            Instruction::DStore(_) => Opcode::DStore,
            Instruction::AStore(_) => Opcode::AStore,
            Instruction::IAStore => Opcode::IAStore,
            Instruction::LAStore => Opcode::LAStore,
            Instruction::FAStore => Opcode::FAStore,
            Instruction::DAStore => Opcode::DAStore,
            Instruction::AAStore => Opcode::AAStore,
            Instruction::BAStore => Opcode::BAStore,
            Instruction::CAStore => Opcode::CAStore,
            Instruction::SAStore => Opcode::SAStore,
            Instruction::Pop => Opcode::Pop,
            Instruction::Pop2 => Opcode::Pop2,
            Instruction::Dup => Opcode::Dup,
            Instruction::DupX1 => Opcode::DupX1,
            Instruction::DupX2 => Opcode::DupX2,
            Instruction::Dup2 => Opcode::Dup2,
            Instruction::Dup2X1 => Opcode::Dup2X1,
            Instruction::Dup2X2 => Opcode::Dup2X2,
            Instruction::Swap => Opcode::Swap,
            Instruction::IAdd => Opcode::IAdd,
            Instruction::LAdd => Opcode::LAdd,
            Instruction::FAdd => Opcode::FAdd,
            Instruction::DAdd => Opcode::DAdd,
            Instruction::ISub => Opcode::ISub,
            Instruction::LSub => Opcode::LSub,
            Instruction::FSub => Opcode::FSub,
            Instruction::DSub => Opcode::DSub,
            Instruction::IMul => Opcode::IMul,
            Instruction::LMul => Opcode::LMul,
            Instruction::FMul => Opcode::FMul,
            Instruction::DMul => Opcode::DMul,
            Instruction::IDiv => Opcode::IDiv,
            Instruction::LDiv => Opcode::LDiv,
            Instruction::FDiv => Opcode::FDiv,
            Instruction::DDiv => Opcode::DDiv,
            Instruction::IRem => Opcode::IRem,
            Instruction::LRem => Opcode::LRem,
            Instruction::FRem => Opcode::FRem,
            Instruction::DRem => Opcode::DRem,
            Instruction::INeg => Opcode::INeg,
            Instruction::LNeg => Opcode::LNeg,
            Instruction::FNeg => Opcode::FNeg,
            Instruction::DNeg => Opcode::DNeg,
            Instruction::ISh(ShiftType::Left) => Opcode::IShl,
            Instruction::ISh(ShiftType::ArithmeticRight) => Opcode::IShr,
            Instruction::ISh(ShiftType::LogicalRight) => Opcode::IUShr,
            Instruction::LSh(ShiftType::Left) => Opcode::LShl,
            Instruction::LSh(ShiftType::ArithmeticRight) => Opcode::LShr,
            Instruction::LSh(ShiftType::LogicalRight) => Opcode::LUShr,
            Instruction::IAnd => Opcode::IAnd,
            Instruction::LAnd => Opcode::LAnd,
            Instruction::IOr => Opcode::IOr,
            Instruction::LOr => Opcode::LOr,
            Instruction::IXor => Opcode::IXor,
            Instruction::LXor => Opcode::LXor,
            Instruction::IInc(_, _) => Opcode::IInc,
            Instruction::I2L => Opcode::I2L,
            Instruction::I2F => Opcode::I2F,
            Instruction::I2D => Opcode::I2D,
            Instruction::L2I => Opcode::L2I,
            Instruction::L2F => Opcode::L2F,
            Instruction::L2D => Opcode::L2D,
            Instruction::F2I => Opcode::F2I,
            Instruction::F2L => Opcode::F2L,
            Instruction::F2D => Opcode::F2D,
            Instruction::D2I => Opcode::D2I,
            Instruction::D2L => Opcode::D2L,
            Instruction::D2F => Opcode::D2F,
            Instruction::I2B => Opcode::I2B,
            Instruction::I2C => Opcode::I2C,
            Instruction::I2S => Opcode::I2S,
            Instruction::LCmp => Opcode::LCmp,
            Instruction::FCmp(CompareMode::L) => Opcode::FCmpL,
            Instruction::FCmp(CompareMode::G) => Opcode::FCmpG,
            Instruction::DCmp(CompareMode::L) => Opcode::DCmpL,
            Instruction::DCmp(CompareMode::G) => Opcode::DCmpG,
            Instruction::Ret(_) => Opcode::Ret,
            Instruction::IReturn => Opcode::IReturn,
            Instruction::LReturn => Opcode::LReturn,
            Instruction::FReturn => Opcode::FReturn,
            Instruction::DReturn => Opcode::DReturn,
            Instruction::AReturn => Opcode::AReturn,
            Instruction::Return => Opcode::Return,
            Instruction::GetStatic(_) => Opcode::GetStatic,
            Instruction::PutStatic(_) => Opcode::PutStatic,
            Instruction::GetField(_) => Opcode::GetField,
            Instruction::PutField(_) => Opcode::PutField,
            Instruction::Invoke(InvokeType::Virtual, _) => Opcode::InvokeVirtual,
            Instruction::Invoke(InvokeType::Special, _) => Opcode::InvokeSpecial,
            Instruction::Invoke(InvokeType::Static, _) => Opcode::InvokeStatic,
            Instruction::Invoke(InvokeType::Interface(_), _) => Opcode::InvokeInterface,
            Instruction::InvokeDynamic(_) => Opcode::InvokeDynamic,
            Instruction::New(_) => Opcode::New,
            Instruction::NewArray(_) => Opcode::NewArray,
            Instruction::ANewArray(_) => Opcode::ANewArray,
            Instruction::ArrayLength => Opcode::ArrayLength,
            Instruction::AThrow => Opcode::AThrow,
            Instruction::CheckCast(_) => Opcode::CheckCast,
            Instruction::InstanceOf(_) => Opcode::InstanceOf,
            Instruction::MonitorEnter => Opcode::MonitorEnter,
            Instruction::MonitorExit => Opcode::MonitorExit,
            Instruction::MultiANewArray(_, _) => Opcode::MultiANewArray,
        }
    }
}

/* The load/store instructions follow the same pattern:
 *
 *   - short form (0-3) have special opcodes (only if `short_form` is given)
 *   - normal form (0-255) use eg. `iload` plus a byte operand
 *   - wide form (255-65535) use `wide iload` plus two byte operands
 */
fn serialize_local(
    index: u16,
    short_form: Option<Opcode>,
    normal_form: Opcode,
    out: &mut BufferChain,
) -> Result<(), Error> {
    match (u8::try_from(index), short_form) {
        (Ok(n @ 0..=3), Some(short_form)) => out.write_u8(short_form.code() + n),
        (Ok(n), _) => {
            out.write_u8(normal_form.code())?;
            out.write_u8(n)
        }
        (Err(_), _) => {
            out.write_u8(Opcode::Wide.code())?;
            out.write_u8(normal_form.code())?;
            out.write_u16(index)
        }
    }
}

impl Serialize for Instruction {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        let opcode = self.opcode();
        match self {
            Instruction::BiPush(b) => {
                out.write_u8(opcode.code())?;
                out.write_i8(b)?;
            }
            Instruction::SiPush(s) => {
                out.write_u8(opcode.code())?;
                out.write_i16(s)?;
            }
            Instruction::Ldc(ConstantIndex(idx)) => match u8::try_from(idx) {
                Ok(b) => {
                    out.write_u8(Opcode::Ldc.code())?;
                    out.write_u8(b)?;
                }
                Err(_) => {
                    out.write_u8(Opcode::LdcW.code())?;
                    out.write_u16(idx)?;
                }
            },
            Instruction::ILoad(idx) => serialize_local(idx, Some(Opcode::ILoad0), opcode, out)?,
            Instruction::LLoad(idx) => serialize_local(idx, Some(Opcode::LLoad0), opcode, out)?,
            Instruction::FLoad(idx) => serialize_local(idx, Some(Opcode::FLoad0), opcode, out)?,
            Instruction::DLoad(idx) => serialize_local(idx, Some(Opcode::DLoad0), opcode, out)?,
            Instruction::ALoad(idx) => serialize_local(idx, Some(Opcode::ALoad0), opcode, out)?,
            Instruction::IStore(idx) => serialize_local(idx, Some(Opcode::IStore0), opcode, out)?,
            Instruction::LStore(idx) => serialize_local(idx, Some(Opcode::LStore0), opcode, out)?,
            Instruction::FStore(idx) => serialize_local(idx, Some(Opcode::FStore0), opcode, out)?,
            Instruction::DStore(idx) => serialize_local(idx, Some(Opcode::DStore0), opcode, out)?,
            Instruction::AStore(idx) => serialize_local(idx, Some(Opcode::AStore0), opcode, out)?,
            Instruction::Ret(idx) => serialize_local(idx, None, opcode, out)?,
            Instruction::IInc(idx, diff) => match (u8::try_from(idx), i8::try_from(diff)) {
                (Ok(b), Ok(d)) => {
                    out.write_u8(opcode.code())?;
                    out.write_u8(b)?;
                    out.write_i8(d)?;
                }
                _ => {
                    out.write_u8(Opcode::Wide.code())?;
                    out.write_u8(opcode.code())?;
                    out.write_u16(idx)?;
                    out.write_i16(diff)?;
                }
            },
            Instruction::Ldc2(idx)
            | Instruction::Invoke(
                InvokeType::Virtual | InvokeType::Special | InvokeType::Static,
                idx,
            ) => {
                out.write_u8(opcode.code())?;
                idx.serialize(out)?;
            }
            Instruction::Invoke(InvokeType::Interface(count), idx) => {
                out.write_u8(opcode.code())?;
                idx.serialize(out)?;
                out.write_u8(count)?;
                out.write_u8(0)?;
            }
            Instruction::GetStatic(idx)
            | Instruction::PutStatic(idx)
            | Instruction::GetField(idx)
            | Instruction::PutField(idx) => {
                out.write_u8(opcode.code())?;
                idx.serialize(out)?;
            }
            Instruction::InvokeDynamic(idx) => {
                out.write_u8(opcode.code())?;
                idx.serialize(out)?;
                out.write_u16(0)?;
            }
            Instruction::New(idx)
            | Instruction::ANewArray(idx)
            | Instruction::CheckCast(idx)
            | Instruction::InstanceOf(idx) => {
                out.write_u8(opcode.code())?;
                idx.serialize(out)?;
            }
            Instruction::NewArray(base_type) => {
                out.write_u8(opcode.code())?;
                out.write_u8(base_type.array_type_code())?;
            }
            Instruction::MultiANewArray(idx, dimensions) => {
                out.write_u8(opcode.code())?;
                idx.serialize(out)?;
                out.write_u8(dimensions)?;
            }
            _ => out.write_u8(opcode.code())?,
        }
        Ok(())
    }
}

/// Instructions whose only operand is a jump to a label
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BranchOpcode {
    If(OrdComparison), // covers `ifeq`, `ifne`, `iflt`, `ifge`, `ifgt`, `ifle`
    IfICmp(OrdComparison), // covers `if_icmpeq`, `if_icmpne`, `if_icmplt`, ... `if_icmple`
    IfACmp(EqComparison), // covers `if_acmpeq`, `if_acmpne`
    IfNull(EqComparison), // covers `ifnull`, `ifnonnull`
    Goto,
    GotoW,
    Jsr,
    JsrW,
}

impl BranchOpcode {
    pub fn opcode(self) -> Opcode {
        match self {
            BranchOpcode::If(cmp) => match cmp {
                OrdComparison::EQ => Opcode::IfEq,
                OrdComparison::NE => Opcode::IfNe,
                OrdComparison::LT => Opcode::IfLt,
                OrdComparison::GE => Opcode::IfGe,
                OrdComparison::GT => Opcode::IfGt,
                OrdComparison::LE => Opcode::IfLe,
            },
            BranchOpcode::IfICmp(cmp) => match cmp {
                OrdComparison::EQ => Opcode::IfICmpEq,
                OrdComparison::NE => Opcode::IfICmpNe,
                OrdComparison::LT => Opcode::IfICmpLt,
                OrdComparison::GE => Opcode::IfICmpGe,
                OrdComparison::GT => Opcode::IfICmpGt,
                OrdComparison::LE => Opcode::IfICmpLe,
            },
            BranchOpcode::IfACmp(EqComparison::EQ) => Opcode::IfACmpEq,
            BranchOpcode::IfACmp(EqComparison::NE) => Opcode::IfACmpNe,
            BranchOpcode::IfNull(EqComparison::EQ) => Opcode::IfNull,
            BranchOpcode::IfNull(EqComparison::NE) => Opcode::IfNonNull,
            BranchOpcode::Goto => Opcode::Goto,
            BranchOpcode::GotoW => Opcode::GotoW,
            BranchOpcode::Jsr => Opcode::Jsr,
            BranchOpcode::JsrW => Opcode::JsrW,
        }
    }

    /// Width of the jump offset operand
    pub fn width(self) -> JumpWidth {
        match self {
            BranchOpcode::GotoW | BranchOpcode::JsrW => JumpWidth::Wide,
            _ => JumpWidth::Regular,
        }
    }
}

/// Conditional branches can be inverted (to jump around an unconditional jump)
impl Not for BranchOpcode {
    type Output = Option<BranchOpcode>;

    fn not(self) -> Option<BranchOpcode> {
        match self {
            BranchOpcode::If(cmp) => Some(BranchOpcode::If(!cmp)),
            BranchOpcode::IfICmp(cmp) => Some(BranchOpcode::IfICmp(!cmp)),
            BranchOpcode::IfACmp(cmp) => Some(BranchOpcode::IfACmp(!cmp)),
            BranchOpcode::IfNull(cmp) => Some(BranchOpcode::IfNull(!cmp)),
            _ => None,
        }
    }
}

/// Possible bit shifts
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ShiftType {
    Left,
    LogicalRight,
    ArithmeticRight,
}

/// Comparison modes for floating point
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CompareMode {
    /// -1 on NaN
    L,

    /// 1 on NaN
    G,
}

/// Binary comparison operators available for `int` branches
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum OrdComparison {
    EQ,
    GE,
    GT,
    LE,
    LT,
    NE,
}

impl Not for OrdComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            OrdComparison::EQ => OrdComparison::NE,
            OrdComparison::GE => OrdComparison::LT,
            OrdComparison::GT => OrdComparison::LE,
            OrdComparison::LE => OrdComparison::GT,
            OrdComparison::LT => OrdComparison::GE,
            OrdComparison::NE => OrdComparison::EQ,
        }
    }
}

/// Equality/inequality comparison operators
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum EqComparison {
    EQ,
    NE,
}

impl Not for EqComparison {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            EqComparison::EQ => EqComparison::NE,
            EqComparison::NE => EqComparison::EQ,
        }
    }
}

/// Type of method to invoke
///
/// Note: `InvokeDynamic` is kept separate because the constant argument it expects is not to a
/// `Constant::MethodRef`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum InvokeType {
    Virtual,
    Special,
    Static,
    Interface(u8), // `count` is of total arguments, where `long`/`double` count for 2
}

/// Element types of primitive arrays (`newarray`)
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BaseType {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl BaseType {
    pub fn array_type_code(self) -> u8 {
        match self {
            BaseType::Boolean => 4,
            BaseType::Char => 5,
            BaseType::Float => 6,
            BaseType::Double => 7,
            BaseType::Byte => 8,
            BaseType::Short => 9,
            BaseType::Int => 10,
            BaseType::Long => 11,
        }
    }

    pub fn from_array_type_code(code: u8) -> Option<BaseType> {
        Some(match code {
            4 => BaseType::Boolean,
            5 => BaseType::Char,
            6 => BaseType::Float,
            7 => BaseType::Double,
            8 => BaseType::Byte,
            9 => BaseType::Short,
            10 => BaseType::Int,
            11 => BaseType::Long,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(instruction: Instruction) -> Vec<u8> {
        let mut out = BufferChain::new();
        instruction.serialize(&mut out).unwrap();
        out.to_vec().unwrap()
    }

    #[test]
    fn locals_pick_narrowest_form() {
        assert_eq!(encode(Instruction::ILoad(2)), vec![0x1c]);
        assert_eq!(encode(Instruction::ALoad(4)), vec![0x19, 4]);
        assert_eq!(encode(Instruction::DStore(255)), vec![0x39, 255]);
        assert_eq!(encode(Instruction::LStore(256)), vec![0xc4, 0x37, 1, 0]);
        assert_eq!(encode(Instruction::Ret(3)), vec![0xa9, 3]);
        assert_eq!(encode(Instruction::Ret(300)), vec![0xc4, 0xa9, 1, 44]);
    }

    #[test]
    fn iinc_widens_on_either_operand() {
        assert_eq!(encode(Instruction::IInc(1, -1)), vec![0x84, 1, 0xff]);
        assert_eq!(encode(Instruction::IInc(1, 200)), vec![0xc4, 0x84, 0, 1, 0, 200]);
        assert_eq!(encode(Instruction::IInc(500, 1)), vec![0xc4, 0x84, 1, 244, 0, 1]);
    }

    #[test]
    fn ldc_picks_narrowest_form() {
        assert_eq!(encode(Instruction::Ldc(ConstantIndex(7))), vec![0x12, 7]);
        assert_eq!(encode(Instruction::Ldc(ConstantIndex(256))), vec![0x13, 1, 0]);
        assert_eq!(encode(Instruction::Ldc2(ConstantIndex(3))), vec![0x14, 0, 3]);
    }

    #[test]
    fn operand_encodings() {
        assert_eq!(encode(Instruction::BiPush(-2)), vec![0x10, 0xfe]);
        assert_eq!(encode(Instruction::SiPush(-2)), vec![0x11, 0xff, 0xfe]);
        assert_eq!(
            encode(Instruction::Invoke(InvokeType::Interface(2), ConstantIndex(9))),
            vec![0xb9, 0, 9, 2, 0]
        );
        assert_eq!(
            encode(Instruction::InvokeDynamic(InvokeDynamicConstantIndex(ConstantIndex(4)))),
            vec![0xba, 0, 4, 0, 0]
        );
        assert_eq!(encode(Instruction::NewArray(BaseType::Int)), vec![0xbc, 10]);
        assert_eq!(
            encode(Instruction::MultiANewArray(ClassConstantIndex(ConstantIndex(2)), 3)),
            vec![0xc5, 0, 2, 3]
        );
        assert_eq!(encode(Instruction::LSh(ShiftType::LogicalRight)), vec![0x7d]);
        assert_eq!(encode(Instruction::Return), vec![0xb1]);
    }

    #[test]
    fn inverted_branches() {
        assert_eq!(
            !BranchOpcode::IfICmp(OrdComparison::LT),
            Some(BranchOpcode::IfICmp(OrdComparison::GE))
        );
        assert_eq!(
            (!BranchOpcode::IfNull(EqComparison::EQ)).map(BranchOpcode::opcode),
            Some(Opcode::IfNonNull)
        );
        assert_eq!(!BranchOpcode::Goto, None);
        assert_eq!(BranchOpcode::JsrW.width(), JumpWidth::Wide);
    }
}
