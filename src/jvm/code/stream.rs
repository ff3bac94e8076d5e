use super::{BranchOpcode, Instruction, JumpWidth, Label, LabelTable, Opcode};
use crate::buffer::{Blob, BufferChain};
use crate::jvm::class_file::ExceptionHandler;
use crate::jvm::{ClassConstantIndex, Error, Serialize};
use std::convert::TryFrom;

/// Largest code array a method can have
pub const MAX_CODE_LENGTH: usize = 65535;

/// Emitter for the code array of one method
///
/// Instructions are encoded into a [`BufferChain`] as they are emitted. Jumps to labels that
/// haven't been marked yet get a reserved operand which is patched when the label is marked, so
/// the only thing left to do in [`InstructionStream::finish`] is check that every referenced
/// label got marked.
///
/// Jump operands are never widened after the fact: a `goto` whose target ends up more than
/// 32767 bytes away is an error (reported when the second end of the jump becomes known).
/// Use [`BranchOpcode::GotoW`] for jumps that may be that long.
#[derive(Debug)]
pub struct InstructionStream {
    code: BufferChain,

    /// Count of `code` when the stream was created (offsets are relative to this)
    origin: usize,

    labels: LabelTable,
}

impl InstructionStream {
    pub fn new() -> InstructionStream {
        InstructionStream::with_buffer(BufferChain::new())
    }

    /// Make a stream that appends to `code`
    pub fn with_buffer(code: BufferChain) -> InstructionStream {
        InstructionStream {
            origin: code.count(),
            code,
            labels: LabelTable::new(),
        }
    }

    /// Current offset in the code array
    pub fn offset(&self) -> usize {
        self.code.count() - self.origin
    }

    pub fn define_label(&mut self) -> Label {
        self.labels.define()
    }

    /// Place a label at the current offset
    pub fn mark_label(&mut self, label: Label) -> Result<(), Error> {
        let offset = self.offset();
        self.labels.mark(label, offset, &mut self.code)
    }

    /// Write a jump operand to `label` relative to the instruction at offset `from`
    pub fn label(&mut self, label: Label, width: JumpWidth, from: usize) -> Result<(), Error> {
        self.labels.reference(label, width, from, &mut self.code)
    }

    /// Offset of a label, if it has been marked already
    pub fn label_offset(&self, label: Label) -> Result<Option<usize>, Error> {
        self.labels.offset(label)
    }

    /// Offset of a label which must be marked already, as a code array offset
    fn marked_offset(&self, label: Label) -> Result<u16, Error> {
        match self.labels.offset(label)? {
            Some(offset) => u16::try_from(offset).map_err(|_| Error::MethodCodeOverflow(offset)),
            None => Err(Error::UnmarkedLabel(label)),
        }
    }

    pub fn emit(&mut self, instruction: Instruction) -> Result<(), Error> {
        instruction.serialize(&mut self.code)
    }

    /// Emit a jump instruction
    ///
    /// A jump to a marked label that is out of reach is rejected before anything is written.
    pub fn branch(&mut self, opcode: BranchOpcode, target: Label) -> Result<(), Error> {
        let from = self.offset();
        self.labels.check_reference(target, opcode.width(), from)?;
        self.code.write_u8(opcode.opcode().code())?;
        self.label(target, opcode.width(), from)
    }

    /// Emit the opcode, padding and default target shared by both kinds of switches
    fn switch_header(&mut self, opcode: Opcode, default: Label) -> Result<usize, Error> {
        let from = self.offset();
        self.labels.check_reference(default, JumpWidth::Wide, from)?;
        self.code.write_u8(opcode.code())?;
        self.code.align_relative(4, self.origin)?;
        self.label(default, JumpWidth::Wide, from)?;
        Ok(from)
    }

    /// Start a `tableswitch` whose first case is for `low`
    ///
    /// Cases are added with [`TableSwitchBuilder::case`], one per consecutive value starting at
    /// `low`. The `high` field is kept up to date as cases get added.
    pub fn table_switch(
        &mut self,
        default: Label,
        low: i32,
    ) -> Result<TableSwitchBuilder<'_>, Error> {
        let from = self.switch_header(Opcode::TableSwitch, default)?;
        self.code.write_i32(low)?;
        let high = self.code.reserve_bytes(4)?;
        self.code.patch_i32(&high, low.wrapping_sub(1))?;
        Ok(TableSwitchBuilder {
            stream: self,
            from,
            low,
            high,
            cases: 0,
        })
    }

    /// Start a `lookupswitch`
    ///
    /// Cases are added with [`LookupSwitchBuilder::case`], in order of non-decreasing keys. The
    /// `npairs` field is kept up to date as cases get added.
    pub fn lookup_switch(&mut self, default: Label) -> Result<LookupSwitchBuilder<'_>, Error> {
        let from = self.switch_header(Opcode::LookupSwitch, default)?;
        let npairs = self.code.reserve_bytes(4)?;
        Ok(LookupSwitchBuilder {
            stream: self,
            from,
            npairs,
            cases: 0,
            previous_key: None,
        })
    }

    /// Make an exception table entry out of marked labels
    ///
    /// A `catch_type` of `None` catches everything (as for `finally` blocks).
    pub fn exception_handler(
        &self,
        start: Label,
        end: Label,
        handler: Label,
        catch_type: Option<ClassConstantIndex>,
    ) -> Result<ExceptionHandler, Error> {
        Ok(ExceptionHandler {
            start_pc: self.marked_offset(start)?,
            end_pc: self.marked_offset(end)?,
            handler_pc: self.marked_offset(handler)?,
            catch_type,
        })
    }

    /// Check that every jump got resolved and return the code array
    pub fn finish(self) -> Result<BufferChain, Error> {
        if let Some(label) = self.labels.first_unresolved() {
            return Err(Error::UnmarkedLabel(label));
        }
        let len = self.offset();
        if len > MAX_CODE_LENGTH {
            return Err(Error::MethodCodeOverflow(len));
        }
        log::debug!(
            "finished code array: {} bytes, {} labels",
            len,
            self.labels.len()
        );
        Ok(self.code)
    }
}

impl Default for InstructionStream {
    fn default() -> InstructionStream {
        InstructionStream::new()
    }
}

/// Cases of a `tableswitch` being emitted
pub struct TableSwitchBuilder<'a> {
    stream: &'a mut InstructionStream,
    from: usize,
    low: i32,
    high: Blob,
    cases: u32,
}

impl TableSwitchBuilder<'_> {
    /// Add the jump target for the next value (`low`, then `low + 1`, etc.)
    pub fn case(&mut self, target: Label) -> Result<(), Error> {
        let high = i32::try_from(self.low as i64 + self.cases as i64).map_err(|_| {
            Error::TableOverflow {
                table: "tableswitch",
                size: self.cases as usize + 1,
            }
        })?;
        self.stream.label(target, JumpWidth::Wide, self.from)?;
        self.cases += 1;
        self.stream.code.patch_i32(&self.high, high)
    }

    pub fn case_count(&self) -> u32 {
        self.cases
    }
}

/// Cases of a `lookupswitch` being emitted
pub struct LookupSwitchBuilder<'a> {
    stream: &'a mut InstructionStream,
    from: usize,
    npairs: Blob,
    cases: u32,
    previous_key: Option<i32>,
}

impl LookupSwitchBuilder<'_> {
    /// Add a case, which must not have a smaller key than the case before it
    pub fn case(&mut self, key: i32, target: Label) -> Result<(), Error> {
        if let Some(previous) = self.previous_key {
            if key < previous {
                return Err(Error::LookupSwitchKeyOrder { previous, key });
            }
        }
        self.stream
            .labels
            .check_reference(target, JumpWidth::Wide, self.from)?;
        self.stream.code.write_i32(key)?;
        self.stream.label(target, JumpWidth::Wide, self.from)?;
        self.cases += 1;
        self.previous_key = Some(key);
        self.stream.code.patch_u32(&self.npairs, self.cases)
    }

    pub fn case_count(&self) -> u32 {
        self.cases
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::code::OrdComparison;
    use crate::jvm::ErrorKind;

    fn bytes(stream: InstructionStream) -> Vec<u8> {
        stream.finish().unwrap().to_vec().unwrap()
    }

    #[test]
    fn mark_before_or_after_gives_same_code() {
        // Jump forward over a `nop`, with the label marked after the jump is emitted
        let mut late = InstructionStream::new();
        let target = late.define_label();
        late.branch(BranchOpcode::Goto, target).unwrap();
        late.emit(Instruction::Nop).unwrap();
        late.mark_label(target).unwrap();
        late.emit(Instruction::Return).unwrap();
        assert_eq!(bytes(late), vec![0xa7, 0x00, 0x04, 0x00, 0xb1]);

        // Jump backward, with the label already marked
        let mut early = InstructionStream::new();
        let top = early.define_label();
        early.emit(Instruction::Nop).unwrap();
        early.mark_label(top).unwrap();
        early.emit(Instruction::IConst0).unwrap();
        early.emit(Instruction::Pop).unwrap();
        early.branch(BranchOpcode::Goto, top).unwrap();
        assert_eq!(bytes(early), vec![0x00, 0x03, 0x57, 0xa7, 0xff, 0xfe]);

        // Several jumps waiting on the same label all get patched
        let mut many = InstructionStream::new();
        let end = many.define_label();
        many.branch(BranchOpcode::If(OrdComparison::EQ), end).unwrap();
        many.branch(BranchOpcode::GotoW, end).unwrap();
        many.mark_label(end).unwrap();
        assert_eq!(
            bytes(many),
            vec![0x99, 0x00, 0x08, 0xc8, 0x00, 0x00, 0x00, 0x05]
        );
    }

    #[test]
    fn forward_jump_out_of_range_fails_at_mark() {
        // Exactly 32767 bytes forward still fits
        let mut stream = InstructionStream::new();
        let far = stream.define_label();
        stream.branch(BranchOpcode::Goto, far).unwrap();
        for _ in 0..32767 - 3 {
            stream.emit(Instruction::Nop).unwrap();
        }
        stream.mark_label(far).unwrap();
        let code = stream.finish().unwrap();
        assert_eq!(code.to_vec_range(0, 3).unwrap(), vec![0xa7, 0x7f, 0xff]);

        // One byte further does not
        let mut stream = InstructionStream::new();
        let far = stream.define_label();
        stream.branch(BranchOpcode::Goto, far).unwrap();
        for _ in 0..32768 - 3 {
            stream.emit(Instruction::Nop).unwrap();
        }
        let err = stream.mark_label(far).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Logic);
        assert!(matches!(
            err,
            Error::BranchOffsetOutOfRange {
                offset: 32768,
                width: JumpWidth::Regular,
                ..
            }
        ));
    }

    #[test]
    fn backward_jump_out_of_range_fails_immediately() {
        let mut stream = InstructionStream::new();
        let top = stream.define_label();
        stream.mark_label(top).unwrap();
        for _ in 0..32769 {
            stream.emit(Instruction::Nop).unwrap();
        }
        let err = stream.branch(BranchOpcode::Goto, top).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Logic);

        // The wide form reaches
        stream.branch(BranchOpcode::GotoW, top).unwrap();
    }

    #[test]
    fn rejected_branch_writes_nothing() {
        let mut stream = InstructionStream::new();
        let top = stream.define_label();
        stream.mark_label(top).unwrap();
        for _ in 0..40000 {
            stream.emit(Instruction::Nop).unwrap();
        }
        assert!(stream.branch(BranchOpcode::Goto, top).is_err());
        assert_eq!(stream.offset(), 40000);

        let code = stream.finish().unwrap().to_vec().unwrap();
        assert_eq!(code.len(), 40000);
        assert!(code.iter().all(|byte| *byte == 0x00));
    }

    #[test]
    fn failed_mark_leaves_label_unmarked() {
        // One jump too far and one in reach, both waiting on the same label
        let mut stream = InstructionStream::new();
        let target = stream.define_label();
        stream.branch(BranchOpcode::Goto, target).unwrap();
        for _ in 0..32770 {
            stream.emit(Instruction::Nop).unwrap();
        }
        stream.branch(BranchOpcode::Goto, target).unwrap();

        let err = stream.mark_label(target).unwrap_err();
        assert!(matches!(
            err,
            Error::BranchOffsetOutOfRange {
                offset: 32776,
                width: JumpWidth::Regular,
                ..
            }
        ));
        assert_eq!(stream.label_offset(target).unwrap(), None);
        assert!(matches!(stream.finish(), Err(Error::UnmarkedLabel(label)) if label == target));
    }

    #[test]
    fn label_misuse() {
        let mut stream = InstructionStream::new();
        let label = stream.define_label();
        stream.mark_label(label).unwrap();
        assert!(matches!(
            stream.mark_label(label),
            Err(Error::LabelAlreadyMarked(_))
        ));

        let mut other = InstructionStream::new();
        other.define_label();
        let foreign = other.define_label();
        assert!(matches!(
            stream.branch(BranchOpcode::Goto, foreign),
            Err(Error::UndefinedLabel(_))
        ));

        let mut stream = InstructionStream::new();
        let never = stream.define_label();
        stream.branch(BranchOpcode::Goto, never).unwrap();
        assert!(matches!(stream.finish(), Err(Error::UnmarkedLabel(l)) if l == never));
    }

    #[test]
    fn table_switch_counts_cases() {
        let mut stream = InstructionStream::new();
        stream.emit(Instruction::ILoad(0)).unwrap();
        let default = stream.define_label();
        let one = stream.define_label();
        let two = stream.define_label();
        {
            let mut switch = stream.table_switch(default, 10).unwrap();
            switch.case(two).unwrap();
            switch.case(one).unwrap();
            switch.case(two).unwrap();
            assert_eq!(switch.case_count(), 3);
        }
        stream.mark_label(one).unwrap();
        stream.mark_label(two).unwrap();
        stream.mark_label(default).unwrap();
        stream.emit(Instruction::Return).unwrap();

        // iload_0, tableswitch at 1, padding to 4, then default/low/high/3 offsets
        let code = bytes(stream);
        assert_eq!(code.len(), 4 + 4 * 6 + 1);
        assert_eq!(&code[..4], &[0x1a, 0xaa, 0, 0]);
        assert_eq!(&code[4..8], &27i32.to_be_bytes());
        assert_eq!(&code[8..12], &10i32.to_be_bytes());
        assert_eq!(&code[12..16], &12i32.to_be_bytes());
        assert_eq!(&code[16..20], &27i32.to_be_bytes());
        assert_eq!(&code[20..24], &27i32.to_be_bytes());
    }

    #[test]
    fn empty_table_switch_has_high_below_low() {
        let mut stream = InstructionStream::new();
        let default = stream.define_label();
        stream.table_switch(default, 0).unwrap();
        stream.mark_label(default).unwrap();
        let code = bytes(stream);
        assert_eq!(&code[8..12], &0i32.to_be_bytes());
        assert_eq!(&code[12..16], &(-1i32).to_be_bytes());
    }

    #[test]
    fn lookup_switch_keeps_npairs_and_order() {
        let mut stream = InstructionStream::new();
        let default = stream.define_label();
        let target = stream.define_label();
        {
            let mut switch = stream.lookup_switch(default).unwrap();
            switch.case(-5, target).unwrap();
            switch.case(-5, target).unwrap();
            switch.case(100, target).unwrap();
            let err = switch.case(99, target).unwrap_err();
            assert!(matches!(
                err,
                Error::LookupSwitchKeyOrder {
                    previous: 100,
                    key: 99
                }
            ));
            assert_eq!(switch.case_count(), 3);
        }
        stream.mark_label(default).unwrap();
        stream.mark_label(target).unwrap();

        let code = bytes(stream);
        assert_eq!(&code[..4], &[0xab, 0, 0, 0]);
        assert_eq!(&code[8..12], &3u32.to_be_bytes());
        assert_eq!(&code[12..16], &(-5i32).to_be_bytes());
        assert_eq!(code.len(), 12 + 3 * 8);
    }

    #[test]
    fn exception_handler_from_labels() {
        let mut stream = InstructionStream::new();
        let start = stream.define_label();
        let end = stream.define_label();
        let handler = stream.define_label();
        stream.mark_label(start).unwrap();
        stream.emit(Instruction::Nop).unwrap();
        stream.mark_label(end).unwrap();
        stream.emit(Instruction::Return).unwrap();

        assert!(matches!(
            stream.exception_handler(start, end, handler, None),
            Err(Error::UnmarkedLabel(_))
        ));
        stream.mark_label(handler).unwrap();
        let entry = stream.exception_handler(start, end, handler, None).unwrap();
        assert_eq!((entry.start_pc, entry.end_pc, entry.handler_pc), (0, 1, 2));
    }
}
