use super::ReadError;
use byteorder::{BigEndian, ByteOrder};

/// Big-endian reading position in a class file
///
/// A cursor can be narrowed to a sub-range (eg. the body of an attribute) with
/// [`ClassCursor::split`], in which case offsets stay relative to the start of the whole input.
#[derive(Clone, Debug)]
pub struct ClassCursor<'a> {
    bytes: &'a [u8],
    position: usize,
    end: usize,
}

impl<'a> ClassCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> ClassCursor<'a> {
        ClassCursor {
            bytes,
            position: 0,
            end: bytes.len(),
        }
    }

    /// Offset of the next byte to be read
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.end - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position == self.end
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        if len > self.remaining() {
            return Err(ReadError::Truncated {
                offset: self.position,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.bytes[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ReadError> {
        self.read_bytes(len).map(|_| ())
    }

    /// Take the next `len` bytes as a separate cursor
    pub fn split(&mut self, len: usize) -> Result<ClassCursor<'a>, ReadError> {
        let start = self.position;
        self.skip(len)?;
        Ok(ClassCursor {
            bytes: self.bytes,
            position: start,
            end: start + len,
        })
    }

    pub fn read_u1(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u2(&mut self) -> Result<u16, ReadError> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u4(&mut self) -> Result<u32, ReadError> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u8(&mut self) -> Result<u64, ReadError> {
        Ok(BigEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_i1(&mut self) -> Result<i8, ReadError> {
        Ok(self.read_u1()? as i8)
    }

    pub fn read_i2(&mut self) -> Result<i16, ReadError> {
        Ok(BigEndian::read_i16(self.read_bytes(2)?))
    }

    pub fn read_i4(&mut self) -> Result<i32, ReadError> {
        Ok(BigEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_i8(&mut self) -> Result<i64, ReadError> {
        Ok(BigEndian::read_i64(self.read_bytes(8)?))
    }

    /// Read a `float`, keeping its exact bits (including NaN payloads)
    pub fn read_f4(&mut self) -> Result<f32, ReadError> {
        Ok(f32::from_bits(self.read_u4()?))
    }

    pub fn read_f8(&mut self) -> Result<f64, ReadError> {
        Ok(f64::from_bits(self.read_u8()?))
    }

    /// Read a `u16` count followed by that many entries
    pub fn read_table<T, F>(&mut self, mut read_entry: F) -> Result<Vec<T>, ReadError>
    where
        F: FnMut(&mut ClassCursor<'a>) -> Result<T, ReadError>,
    {
        let count = self.read_u2()?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(read_entry(self)?);
        }
        Ok(entries)
    }
}
