use super::Error;
use crate::buffer::BufferChain;
use std::convert::TryFrom;

/// Utility trait for serializing data inside class files
///
/// Java class files have some peculiarities that make it useful to define an extra trait (instead
/// of just using `serde`):
///
///   - tags are always `u8`
///   - when serializing a sequence, the length of the sequence is usually `u16`
///
/// Serializing consumes the value: structures which own a [`BufferChain`] (eg. the body of an
/// attribute) splice it into the output instead of copying it.
pub trait Serialize {
    /// Serialize construct onto the end of a buffer chain
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error>;
}

impl Serialize for u8 {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        out.write_u8(self)
    }
}

impl Serialize for u16 {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        out.write_u16(self)
    }
}

impl Serialize for u32 {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        out.write_u32(self)
    }
}

impl Serialize for i32 {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        out.write_i32(self)
    }
}

/// Already encoded bytes get spliced in as they are
impl Serialize for BufferChain {
    fn serialize(mut self, out: &mut BufferChain) -> Result<(), Error> {
        out.link_suffix(&mut self)
    }
}

/// Size in `u16` is the first thing serialized
impl<A: Serialize> Serialize for Vec<A> {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        out.write_u16(table_len(std::any::type_name::<A>(), self.len())?)?;
        for elem in self {
            elem.serialize(out)?;
        }
        Ok(())
    }
}

/// Check that a table size fits in the `u16` length prefix it gets serialized with
pub fn table_len(table: &'static str, size: usize) -> Result<u16, Error> {
    u16::try_from(size).map_err(|_| Error::TableOverflow { table, size })
}

/// Check that the length of an attribute body fits in its `u32` length prefix
pub fn attribute_len(size: usize) -> Result<u32, Error> {
    u32::try_from(size).map_err(|_| Error::TableOverflow {
        table: "attribute body",
        size,
    })
}
