use super::Attribute;
use crate::buffer::BufferChain;
use crate::jvm::{Error, FieldAccessFlags, Serialize, Utf8ConstantIndex};

/// Field declared by a class or interface
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.5
#[derive(Debug)]
pub struct Field {
    pub access_flags: FieldAccessFlags,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,
    pub attributes: Vec<Attribute>,
}

impl Serialize for Field {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.access_flags.serialize(out)?;
        self.name_index.serialize(out)?;
        self.descriptor_index.serialize(out)?;
        self.attributes.serialize(out)?;
        Ok(())
    }
}
