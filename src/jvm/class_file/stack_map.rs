use super::AttributeLike;
use crate::buffer::BufferChain;
use crate::jvm::{ClassConstantIndex, Error, Serialize};

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMapTable(pub Vec<StackMapFrame>);

impl AttributeLike for StackMapTable {
    const NAME: &'static str = "StackMapTable";
}

impl Serialize for StackMapTable {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

/// Frame of a stack map table
///
/// The compact and extended forms of the `same` and `same_locals_1_stack_item` frames are the
/// same variant here: the compact encoding is picked whenever `offset_delta` fits in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    /// Frame has the same locals as the previous frame and number of stack items is zero
    /// Tags: 0-63 or 251
    SameLocalsNoStack { offset_delta: u16 },

    /// Frame has the same locals as the previous frame and number of stack items is one
    /// Tags: 64-127 or 247
    SameLocalsOneStack {
        offset_delta: u16,
        stack: VerificationType,
    },

    /// Frame is like the previous frame, but without the last `chopped_k` locals
    ///
    /// Note: `chopped_k` must be in the range 1 to 3 inclusive
    /// Tags: 248-250
    ChopLocalsNoStack { offset_delta: u16, chopped_k: u8 },

    /// Frame is like the previous frame, but with 1 to 3 extra locals
    /// Tags: 252-254
    AppendLocalsNoStack {
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },

    /// Frame has exactly the locals and stack specified
    /// Tag: 255
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl StackMapFrame {
    pub const SAME_EXTENDED: u8 = 251;
    pub const SAME_LOCALS_1_STACK_ITEM_EXTENDED: u8 = 247;
    pub const FULL: u8 = 255;

    pub fn offset_delta(&self) -> u16 {
        match self {
            StackMapFrame::SameLocalsNoStack { offset_delta }
            | StackMapFrame::SameLocalsOneStack { offset_delta, .. }
            | StackMapFrame::ChopLocalsNoStack { offset_delta, .. }
            | StackMapFrame::AppendLocalsNoStack { offset_delta, .. }
            | StackMapFrame::Full { offset_delta, .. } => *offset_delta,
        }
    }
}

impl Serialize for StackMapFrame {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        match self {
            // `same_frame` and `same_frame_extended`
            StackMapFrame::SameLocalsNoStack { offset_delta } => {
                if offset_delta <= 63 {
                    (offset_delta as u8).serialize(out)?;
                } else {
                    StackMapFrame::SAME_EXTENDED.serialize(out)?;
                    offset_delta.serialize(out)?;
                }
            }

            // `same_locals_1_stack_item_frame` and `same_locals_1_stack_item_frame_extended`
            StackMapFrame::SameLocalsOneStack {
                offset_delta,
                stack,
            } => {
                if offset_delta <= 63 {
                    (offset_delta as u8 + 64).serialize(out)?;
                } else {
                    StackMapFrame::SAME_LOCALS_1_STACK_ITEM_EXTENDED.serialize(out)?;
                    offset_delta.serialize(out)?;
                }
                stack.serialize(out)?;
            }

            // `chop_frame`
            StackMapFrame::ChopLocalsNoStack {
                offset_delta,
                chopped_k,
            } => {
                if !(1..=3).contains(&chopped_k) {
                    return Err(Error::InvalidStackMapFrame("chop frames remove 1-3 locals"));
                }
                (251 - chopped_k).serialize(out)?;
                offset_delta.serialize(out)?;
            }

            // `append_frame`
            StackMapFrame::AppendLocalsNoStack {
                offset_delta,
                locals,
            } => {
                let added_k = locals.len();
                if !(1..=3).contains(&added_k) {
                    return Err(Error::InvalidStackMapFrame("append frames add 1-3 locals"));
                }
                (251 + added_k as u8).serialize(out)?;
                offset_delta.serialize(out)?;
                for local in locals {
                    local.serialize(out)?;
                }
            }

            // `full_frame`
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                StackMapFrame::FULL.serialize(out)?;
                offset_delta.serialize(out)?;
                locals.serialize(out)?;
                stack.serialize(out)?;
            }
        };
        Ok(())
    }
}

/// Type of a local or stack slot, as recorded in stack map frames
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,

    /// In the constructor, the `this` parameter starts with this type then turns into an object
    /// type after `<init>` is called
    UninitializedThis,

    /// Object type
    Object(ClassConstantIndex),

    /// State of an object after `new` has been called but `<init>` hasn't, identified by the
    /// offset of the `new` instruction from the start of the method body
    Uninitialized(u16),
}

impl VerificationType {
    /// Tag byte preceding the type in the class file
    pub fn tag(&self) -> u8 {
        match self {
            VerificationType::Top => 0,
            VerificationType::Integer => 1,
            VerificationType::Float => 2,
            VerificationType::Double => 3,
            VerificationType::Long => 4,
            VerificationType::Null => 5,
            VerificationType::UninitializedThis => 6,
            VerificationType::Object(_) => 7,
            VerificationType::Uninitialized(_) => 8,
        }
    }

    /// Number of local variable slots taken up
    pub fn width(&self) -> usize {
        match self {
            VerificationType::Double | VerificationType::Long => 2,
            _ => 1,
        }
    }

    /// Is this type is a reference type?
    pub fn is_reference(&self) -> bool {
        match self {
            VerificationType::Top
            | VerificationType::Integer
            | VerificationType::Float
            | VerificationType::Double
            | VerificationType::Long => false,

            VerificationType::Null
            | VerificationType::UninitializedThis
            | VerificationType::Object(_)
            | VerificationType::Uninitialized(_) => true,
        }
    }
}

impl Serialize for VerificationType {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.tag().serialize(out)?;
        match self {
            VerificationType::Object(cls) => cls.serialize(out),
            VerificationType::Uninitialized(offset) => offset.serialize(out),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{ConstantIndex, ErrorKind};

    fn encode(frame: StackMapFrame) -> Result<Vec<u8>, Error> {
        let mut out = BufferChain::new();
        frame.serialize(&mut out)?;
        out.to_vec()
    }

    #[test]
    fn same_frames_pick_compact_form() {
        let same = |offset_delta| StackMapFrame::SameLocalsNoStack { offset_delta };
        assert_eq!(encode(same(0)).unwrap(), vec![0]);
        assert_eq!(encode(same(63)).unwrap(), vec![63]);
        assert_eq!(encode(same(64)).unwrap(), vec![251, 0, 64]);

        let one = |offset_delta| StackMapFrame::SameLocalsOneStack {
            offset_delta,
            stack: VerificationType::Integer,
        };
        assert_eq!(encode(one(5)).unwrap(), vec![69, 1]);
        assert_eq!(encode(one(300)).unwrap(), vec![247, 1, 44, 1]);
    }

    #[test]
    fn chop_and_append_frames() {
        let chop = StackMapFrame::ChopLocalsNoStack {
            offset_delta: 3,
            chopped_k: 2,
        };
        assert_eq!(encode(chop).unwrap(), vec![249, 0, 3]);

        let object = VerificationType::Object(ClassConstantIndex(ConstantIndex(4)));
        let append = StackMapFrame::AppendLocalsNoStack {
            offset_delta: 7,
            locals: vec![VerificationType::Long, object],
        };
        assert_eq!(encode(append).unwrap(), vec![253, 0, 7, 4, 7, 0, 4]);

        let bad_chop = StackMapFrame::ChopLocalsNoStack {
            offset_delta: 0,
            chopped_k: 4,
        };
        assert_eq!(encode(bad_chop).unwrap_err().kind(), ErrorKind::Logic);
        let bad_append = StackMapFrame::AppendLocalsNoStack {
            offset_delta: 0,
            locals: vec![],
        };
        assert_eq!(encode(bad_append).unwrap_err().kind(), ErrorKind::Logic);
    }

    #[test]
    fn full_frame_counts_entries() {
        let full = StackMapFrame::Full {
            offset_delta: 12,
            locals: vec![VerificationType::Double, VerificationType::UninitializedThis],
            stack: vec![VerificationType::Uninitialized(9)],
        };
        assert_eq!(
            encode(full).unwrap(),
            vec![255, 0, 12, 0, 2, 3, 6, 0, 1, 8, 0, 9]
        );
    }
}
