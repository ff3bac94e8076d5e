/// Layout of the operands following an opcode in the code array
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperandKind {
    None,

    /// Signed byte (`bipush`)
    Byte,

    /// Signed short (`sipush`)
    Short,

    /// Unsigned byte constant pool index (`ldc`)
    ConstantU1,

    /// Unsigned short constant pool index
    Constant,

    /// Local variable index: one byte, or two bytes after `wide`
    Local,

    /// Local variable index and signed increment: one byte each, or two bytes each after `wide`
    IInc,

    /// Signed 16-bit jump offset
    Branch,

    /// Signed 32-bit jump offset
    BranchWide,

    /// Padding, default, low, high, then `high - low + 1` jump offsets
    TableSwitch,

    /// Padding, default, npairs, then `npairs` key/offset pairs
    LookupSwitch,

    /// Constant pool index, argument count, and a zero byte
    InvokeInterface,

    /// Constant pool index and two zero bytes
    InvokeDynamic,

    /// Primitive array type code (`newarray`)
    ArrayType,

    /// Constant pool index and number of dimensions
    MultiANewArray,

    /// Modified opcode, then its widened operands
    Wide,
}

macro_rules! opcodes {
    ($($name:ident = $code:literal $mnemonic:literal $operands:ident,)*) => {
        /// Every JVM opcode
        ///
        /// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-6.html
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $code,)*
        }

        impl Opcode {
            pub fn from_code(code: u8) -> Option<Opcode> {
                match code {
                    $($code => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic,)*
                }
            }

            pub fn operands(self) -> OperandKind {
                match self {
                    $(Opcode::$name => OperandKind::$operands,)*
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00 "nop" None,
    AConstNull = 0x01 "aconst_null" None,
    IConstM1 = 0x02 "iconst_m1" None,
    IConst0 = 0x03 "iconst_0" None,
    IConst1 = 0x04 "iconst_1" None,
    IConst2 = 0x05 "iconst_2" None,
    IConst3 = 0x06 "iconst_3" None,
    IConst4 = 0x07 "iconst_4" None,
    IConst5 = 0x08 "iconst_5" None,
    LConst0 = 0x09 "lconst_0" None,
    LConst1 = 0x0a "lconst_1" None,
    FConst0 = 0x0b "fconst_0" None,
    FConst1 = 0x0c "fconst_1" None,
    FConst2 = 0x0d "fconst_2" None,
    DConst0 = 0x0e "dconst_0" None,
    DConst1 = 0x0f "dconst_1" None,
    BiPush = 0x10 "bipush" Byte,
    SiPush = 0x11 "sipush" Short,
    Ldc = 0x12 "ldc" ConstantU1,
    LdcW = 0x13 "ldc_w" Constant,
    Ldc2W = 0x14 "ldc2_w" Constant,
    ILoad = 0x15 "iload" Local,
    LLoad = 0x16 "lload" Local,
    FLoad = 0x17 "fload" Local,
    DLoad = 0x18 "dload" Local,
    ALoad = 0x19 "aload" Local,
    ILoad0 = 0x1a "iload_0" None,
    ILoad1 = 0x1b "iload_1" None,
    ILoad2 = 0x1c "iload_2" None,
    ILoad3 = 0x1d "iload_3" None,
    LLoad0 = 0x1e "lload_0" None,
    LLoad1 = 0x1f "lload_1" None,
    LLoad2 = 0x20 "lload_2" None,
    LLoad3 = 0x21 "lload_3" None,
    FLoad0 = 0x22 "fload_0" None,
    FLoad1 = 0x23 "fload_1" None,
    FLoad2 = 0x24 "fload_2" None,
    FLoad3 = 0x25 "fload_3" None,
    DLoad0 = 0x26 "dload_0" None,
    DLoad1 = 0x27 "dload_1" None,
    DLoad2 = 0x28 "dload_2" None,
    DLoad3 = 0x29 "dload_3" None,
    ALoad0 = 0x2a "aload_0" None,
    ALoad1 = 0x2b "aload_1" None,
    ALoad2 = 0x2c "aload_2" None,
    ALoad3 = 0x2d "aload_3" None,
    IALoad = 0x2e "iaload" None,
    LALoad = 0x2f "laload" None,
    FALoad = 0x30 "faload" None,
    DALoad = 0x31 "daload" None,
    AALoad = 0x32 "aaload" None,
    BALoad = 0x33 "baload" None,
    CALoad = 0x34 "caload" None,
    SALoad = 0x35 "saload" None,
    IStore = 0x36 "istore" Local,
    LStore = 0x37 "lstore" Local,
    FStore = 0x38 "fstore" Local,
    DStore = 0x39 "dstore" Local,
    AStore = 0x3a "astore" Local,
    IStore0 = 0x3b "istore_0" None,
    IStore1 = 0x3c "istore_1" None,
    IStore2 = 0x3d "istore_2" None,
    IStore3 = 0x3e "istore_3" None,
    LStore0 = 0x3f "lstore_0" None,
    LStore1 = 0x40 "lstore_1" None,
    LStore2 = 0x41 "lstore_2" None,
    LStore3 = 0x42 "lstore_3" None,
    FStore0 = 0x43 "fstore_0" None,
    FStore1 = 0x44 "fstore_1" None,
    FStore2 = 0x45 "fstore_2" None,
    FStore3 = 0x46 "fstore_3" None,
    DStore0 = 0x47 "dstore_0" None,
    DStore1 = 0x48 "dstore_1" None,
    DStore2 = 0x49 "dstore_2" None,
    DStore3 = 0x4a "dstore_3" None,
    AStore0 = 0x4b "astore_0" None,
    AStore1 = 0x4c "astore_1" None,
    AStore2 = 0x4d "astore_2" None,
    AStore3 = 0x4e "astore_3" None,
    IAStore = 0x4f "iastore" None,
    LAStore = 0x50 "lastore" None,
    FAStore = 0x51 "fastore" None,
    DAStore = 0x52 "dastore" None,
    AAStore = 0x53 "aastore" None,
    BAStore = 0x54 "bastore" None,
    CAStore = 0x55 "castore" None,
    SAStore = 0x56 "sastore" None,
    Pop = 0x57 "pop" None,
    Pop2 = 0x58 "pop2" None,
    Dup = 0x59 "dup" None,
    DupX1 = 0x5a "dup_x1" None,
    DupX2 = 0x5b "dup_x2" None,
    Dup2 = 0x5c "dup2" None,
    Dup2X1 = 0x5d "dup2_x1" None,
    Dup2X2 = 0x5e "dup2_x2" None,
    Swap = 0x5f "swap" None,
    IAdd = 0x60 "iadd" None,
    LAdd = 0x61 "ladd" None,
    FAdd = 0x62 "fadd" None,
    DAdd = 0x63 "dadd" None,
    ISub = 0x64 "isub" None,
    LSub = 0x65 "lsub" None,
    FSub = 0x66 "fsub" None,
    DSub = 0x67 "dsub" None,
    IMul = 0x68 "imul" None,
    LMul = 0x69 "lmul" None,
    FMul = 0x6a "fmul" None,
    DMul = 0x6b "dmul" None,
    IDiv = 0x6c "idiv" None,
    LDiv = 0x6d "ldiv" None,
    FDiv = 0x6e "fdiv" None,
    DDiv = 0x6f "ddiv" None,
    IRem = 0x70 "irem" None,
    LRem = 0x71 "lrem" None,
    FRem = 0x72 "frem" None,
    DRem = 0x73 "drem" None,
    INeg = 0x74 "ineg" None,
    LNeg = 0x75 "lneg" None,
    FNeg = 0x76 "fneg" None,
    DNeg = 0x77 "dneg" None,
    IShl = 0x78 "ishl" None,
    LShl = 0x79 "lshl" None,
    IShr = 0x7a "ishr" None,
    LShr = 0x7b "lshr" None,
    IUShr = 0x7c "iushr" None,
    LUShr = 0x7d "lushr" None,
    IAnd = 0x7e "iand" None,
    LAnd = 0x7f "land" None,
    IOr = 0x80 "ior" None,
    LOr = 0x81 "lor" None,
    IXor = 0x82 "ixor" None,
    LXor = 0x83 "lxor" None,
    IInc = 0x84 "iinc" IInc,
    I2L = 0x85 "i2l" None,
    I2F = 0x86 "i2f" None,
    I2D = 0x87 "i2d" None,
    L2I = 0x88 "l2i" None,
    L2F = 0x89 "l2f" None,
    L2D = 0x8a "l2d" None,
    F2I = 0x8b "f2i" None,
    F2L = 0x8c "f2l" None,
    F2D = 0x8d "f2d" None,
    D2I = 0x8e "d2i" None,
    D2L = 0x8f "d2l" None,
    D2F = 0x90 "d2f" None,
    I2B = 0x91 "i2b" None,
    I2C = 0x92 "i2c" None,
    I2S = 0x93 "i2s" None,
    LCmp = 0x94 "lcmp" None,
    FCmpL = 0x95 "fcmpl" None,
    FCmpG = 0x96 "fcmpg" None,
    DCmpL = 0x97 "dcmpl" None,
    DCmpG = 0x98 "dcmpg" None,
    IfEq = 0x99 "ifeq" Branch,
    IfNe = 0x9a "ifne" Branch,
    IfLt = 0x9b "iflt" Branch,
    IfGe = 0x9c "ifge" Branch,
    IfGt = 0x9d "ifgt" Branch,
    IfLe = 0x9e "ifle" Branch,
    IfICmpEq = 0x9f "if_icmpeq" Branch,
    IfICmpNe = 0xa0 "if_icmpne" Branch,
    IfICmpLt = 0xa1 "if_icmplt" Branch,
    IfICmpGe = 0xa2 "if_icmpge" Branch,
    IfICmpGt = 0xa3 "if_icmpgt" Branch,
    IfICmpLe = 0xa4 "if_icmple" Branch,
    IfACmpEq = 0xa5 "if_acmpeq" Branch,
    IfACmpNe = 0xa6 "if_acmpne" Branch,
    Goto = 0xa7 "goto" Branch,
    Jsr = 0xa8 "jsr" Branch,
    Ret = 0xa9 "ret" Local,
    TableSwitch = 0xaa "tableswitch" TableSwitch,
    LookupSwitch = 0xab "lookupswitch" LookupSwitch,
    IReturn = 0xac "ireturn" None,
    LReturn = 0xad "lreturn" None,
    FReturn = 0xae "freturn" None,
    DReturn = 0xaf "dreturn" None,
    AReturn = 0xb0 "areturn" None,
    Return = 0xb1 "return" None,
    GetStatic = 0xb2 "getstatic" Constant,
    PutStatic = 0xb3 "putstatic" Constant,
    GetField = 0xb4 "getfield" Constant,
    PutField = 0xb5 "putfield" Constant,
    InvokeVirtual = 0xb6 "invokevirtual" Constant,
    InvokeSpecial = 0xb7 "invokespecial" Constant,
    InvokeStatic = 0xb8 "invokestatic" Constant,
    InvokeInterface = 0xb9 "invokeinterface" InvokeInterface,
    InvokeDynamic = 0xba "invokedynamic" InvokeDynamic,
    New = 0xbb "new" Constant,
    NewArray = 0xbc "newarray" ArrayType,
    ANewArray = 0xbd "anewarray" Constant,
    ArrayLength = 0xbe "arraylength" None,
    AThrow = 0xbf "athrow" None,
    CheckCast = 0xc0 "checkcast" Constant,
    InstanceOf = 0xc1 "instanceof" Constant,
    MonitorEnter = 0xc2 "monitorenter" None,
    MonitorExit = 0xc3 "monitorexit" None,
    Wide = 0xc4 "wide" Wide,
    MultiANewArray = 0xc5 "multianewarray" MultiANewArray,
    IfNull = 0xc6 "ifnull" Branch,
    IfNonNull = 0xc7 "ifnonnull" Branch,
    GotoW = 0xc8 "goto_w" BranchWide,
    JsrW = 0xc9 "jsr_w" BranchWide,
    Breakpoint = 0xca "breakpoint" None,
    ImpDep1 = 0xfe "impdep1" None,
    ImpDep2 = 0xff "impdep2" None,
}

impl Opcode {
    /// Byte value of the opcode
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes_round_trip() {
        let mut count = 0;
        for code in 0..=u8::MAX {
            if let Some(opcode) = Opcode::from_code(code) {
                assert_eq!(opcode.code(), code);
                count += 1;
            }
        }
        // 0x00 through 0xca, plus the two implementation dependent opcodes
        assert_eq!(count, 0xcb + 2);
    }

    #[test]
    fn operand_layouts() {
        assert_eq!(Opcode::Goto.operands(), OperandKind::Branch);
        assert_eq!(Opcode::GotoW.operands(), OperandKind::BranchWide);
        assert_eq!(Opcode::ILoad.operands(), OperandKind::Local);
        assert_eq!(Opcode::ILoad0.operands(), OperandKind::None);
        assert_eq!(Opcode::from_code(0xaa), Some(Opcode::TableSwitch));
        assert_eq!(Opcode::from_code(0xcb), None);
        assert_eq!(Opcode::InvokeDynamic.mnemonic(), "invokedynamic");
    }
}
