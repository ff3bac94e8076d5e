use crate::buffer::{Blob, BufferChain};
use crate::jvm::Error;
use std::convert::TryFrom;

/// Handle to a position in the code array which may not be known yet
///
/// Labels are only meaningful for the [`LabelTable`] (or stream) that defined them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u32);

/// Width of a relative jump operand
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JumpWidth {
    /// Signed 16-bit offset, used by almost all branch instructions
    Regular,

    /// Signed 32-bit offset, used by `goto_w`, `jsr_w`, and switches
    Wide,
}

impl JumpWidth {
    pub fn bytes(self) -> usize {
        match self {
            JumpWidth::Regular => 2,
            JumpWidth::Wide => 4,
        }
    }
}

/// Reserved jump operand waiting for its label to be marked
#[derive(Debug)]
struct Fixup {
    operand: Blob,

    /// Offset of the instruction the jump is relative to
    from: usize,

    width: JumpWidth,
}

#[derive(Debug, Default)]
struct LabelState {
    offset: Option<usize>,
    fixups: Vec<Fixup>,
}

/// Positions of labels along with the jump operands still waiting on them
///
/// Every jump operand referring to a label is either written immediately (if the label is
/// already marked) or reserved and patched in place once the label gets marked. There is no
/// separate pass over the code to resolve jumps.
#[derive(Debug, Default)]
pub struct LabelTable {
    labels: Vec<LabelState>,
}

impl LabelTable {
    pub fn new() -> LabelTable {
        LabelTable::default()
    }

    pub fn define(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(LabelState::default());
        label
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn state(&self, label: Label) -> Result<&LabelState, Error> {
        self.labels
            .get(label.0 as usize)
            .ok_or(Error::UndefinedLabel(label))
    }

    fn state_mut(&mut self, label: Label) -> Result<&mut LabelState, Error> {
        self.labels
            .get_mut(label.0 as usize)
            .ok_or(Error::UndefinedLabel(label))
    }

    /// Offset of the label, if it has been marked
    pub fn offset(&self, label: Label) -> Result<Option<usize>, Error> {
        Ok(self.state(label)?.offset)
    }

    /// Place the label at `offset` and patch every jump waiting on it
    ///
    /// If any waiting jump can't reach `offset`, nothing is patched and the label stays
    /// unmarked, so the stream can't be finished with a dangling operand.
    pub fn mark(
        &mut self,
        label: Label,
        offset: usize,
        code: &mut BufferChain,
    ) -> Result<(), Error> {
        let state = self.state_mut(label)?;
        if state.offset.is_some() {
            return Err(Error::LabelAlreadyMarked(label));
        }
        for fixup in &state.fixups {
            check_relative(label, offset as i64 - fixup.from as i64, fixup.width)?;
        }
        state.offset = Some(offset);

        let fixups = std::mem::take(&mut state.fixups);
        if !fixups.is_empty() {
            log::trace!("{:?} at {}: patching {} jumps", label, offset, fixups.len());
        }
        for fixup in fixups {
            let relative = offset as i64 - fixup.from as i64;
            write_relative(code, &fixup.operand, label, relative, fixup.width)?;
        }
        Ok(())
    }

    /// Check that a jump from `from` could refer to `label`, without writing anything
    ///
    /// Only marked labels can be out of reach: the range of a jump to an unmarked label is
    /// checked when the label is marked.
    pub fn check_reference(
        &self,
        label: Label,
        width: JumpWidth,
        from: usize,
    ) -> Result<(), Error> {
        match self.state(label)?.offset {
            Some(offset) => check_relative(label, offset as i64 - from as i64, width),
            None => Ok(()),
        }
    }

    /// Write a jump operand to `label`, relative to the instruction at `from`
    ///
    /// If the label isn't marked yet, the operand is reserved and gets filled in by
    /// [`LabelTable::mark`]. Nothing is written if the label is out of reach.
    pub fn reference(
        &mut self,
        label: Label,
        width: JumpWidth,
        from: usize,
        code: &mut BufferChain,
    ) -> Result<(), Error> {
        self.check_reference(label, width, from)?;
        let state = self.state_mut(label)?;
        let operand = code.reserve_bytes(width.bytes())?;
        match state.offset {
            Some(offset) => {
                let relative = offset as i64 - from as i64;
                write_relative(code, &operand, label, relative, width)
            }
            None => {
                state.fixups.push(Fixup {
                    operand,
                    from,
                    width,
                });
                Ok(())
            }
        }
    }

    /// First label (if any) which has jumps waiting on it
    pub fn first_unresolved(&self) -> Option<Label> {
        self.labels
            .iter()
            .position(|state| !state.fixups.is_empty())
            .map(|index| Label(index as u32))
    }
}

fn check_relative(label: Label, relative: i64, width: JumpWidth) -> Result<(), Error> {
    let fits = match width {
        JumpWidth::Regular => i16::try_from(relative).is_ok(),
        JumpWidth::Wide => i32::try_from(relative).is_ok(),
    };
    if fits {
        Ok(())
    } else {
        Err(Error::BranchOffsetOutOfRange {
            label,
            offset: relative,
            width,
        })
    }
}

fn write_relative(
    code: &mut BufferChain,
    operand: &Blob,
    label: Label,
    relative: i64,
    width: JumpWidth,
) -> Result<(), Error> {
    check_relative(label, relative, width)?;
    match width {
        JumpWidth::Regular => code.patch_i16(operand, relative as i16),
        JumpWidth::Wide => code.patch_i32(operand, relative as i32),
    }
}
