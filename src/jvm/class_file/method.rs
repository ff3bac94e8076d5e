use super::Attribute;
use crate::buffer::BufferChain;
use crate::jvm::{Error, MethodAccessFlags, Serialize, Utf8ConstantIndex};

/// Method declared by a class or interface
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.6
#[derive(Debug)]
pub struct Method {
    pub access_flags: MethodAccessFlags,
    pub name_index: Utf8ConstantIndex,
    pub descriptor_index: Utf8ConstantIndex,
    pub attributes: Vec<Attribute>,
}

impl Serialize for Method {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.access_flags.serialize(out)?;
        self.name_index.serialize(out)?;
        self.descriptor_index.serialize(out)?;
        self.attributes.serialize(out)?;
        Ok(())
    }
}
