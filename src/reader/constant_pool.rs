use super::{ClassCursor, ReadError};
use crate::jvm::{
    decode_modified_utf8, ClassConstantIndex, Constant, ConstantIndex, HandleKind,
    Mutf8Variant, NameAndTypeConstantIndex, Utf8ConstantIndex,
};

/// Constant pool of a parsed class file
///
/// Slot `0` and the slot after every `Long` or `Double` are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    slots: Vec<Option<Constant>>,
}

impl ConstantPool {
    /// Parse `constant_pool_count` and the constants that follow it
    pub fn parse(
        cursor: &mut ClassCursor<'_>,
        variant: Mutf8Variant,
    ) -> Result<ConstantPool, ReadError> {
        let count = cursor.read_u2()?;
        let mut slots = Vec::with_capacity(count as usize);
        slots.push(None);
        while slots.len() < count as usize {
            let constant = read_constant(cursor, variant)?;
            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            slots.push(Some(constant));
            if wide {
                slots.push(None);
            }
        }

        // A wide constant in the last slot spills over the declared count
        if slots.len() > count as usize && count > 0 {
            return Err(ReadError::BadConstantIndex(count));
        }
        log::debug!("parsed constant pool with {} slots", slots.len());
        Ok(ConstantPool { slots })
    }

    /// Value of `constant_pool_count`
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Populated entries in index order
    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &Constant)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|constant| (ConstantIndex(index as u16), constant))
        })
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ReadError> {
        self.slots
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ReadError::BadConstantIndex(index))
    }

    /// Check that the index refers to some constant
    pub fn any_index(&self, index: u16) -> Result<ConstantIndex, ReadError> {
        self.get(index).map(|_| ConstantIndex(index))
    }

    pub fn utf8_index(&self, index: u16) -> Result<Utf8ConstantIndex, ReadError> {
        self.utf8(index)
            .map(|_| Utf8ConstantIndex(ConstantIndex(index)))
    }

    pub fn class_index(&self, index: u16) -> Result<ClassConstantIndex, ReadError> {
        self.class_name(index)
            .map(|_| ClassConstantIndex(ConstantIndex(index)))
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ReadError> {
        match self.get(index)? {
            Constant::Utf8(text) => Ok(text),
            _ => Err(ReadError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Internal name of a `Class` constant (eg. `java/lang/Object`)
    pub fn class_name(&self, index: u16) -> Result<&str, ReadError> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8(name.0 .0),
            _ => Err(ReadError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    /// Name and descriptor of a `NameAndType` constant
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ReadError> {
        match self.get(index)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.utf8(name.0 .0)?, self.utf8(descriptor.0 .0)?))
            }
            _ => Err(ReadError::UnexpectedConstant {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Class, name, and descriptor of a `Fieldref`, `Methodref`, or `InterfaceMethodref`
    pub fn member_ref(&self, index: u16) -> Result<(&str, &str, &str), ReadError> {
        match self.get(index)? {
            Constant::FieldRef {
                class,
                name_and_type,
            }
            | Constant::MethodRef {
                class,
                name_and_type,
            }
            | Constant::InterfaceMethodRef {
                class,
                name_and_type,
            } => {
                let class = self.class_name(class.0 .0)?;
                let (name, descriptor) = self.name_and_type(name_and_type.0 .0)?;
                Ok((class, name, descriptor))
            }
            _ => Err(ReadError::UnexpectedConstant {
                index,
                expected: "member reference",
            }),
        }
    }
}

fn read_constant(
    cursor: &mut ClassCursor<'_>,
    variant: Mutf8Variant,
) -> Result<Constant, ReadError> {
    let offset = cursor.position();
    let utf8 = |cursor: &mut ClassCursor<'_>| -> Result<Utf8ConstantIndex, ReadError> {
        Ok(Utf8ConstantIndex(ConstantIndex(cursor.read_u2()?)))
    };
    let class = |cursor: &mut ClassCursor<'_>| -> Result<ClassConstantIndex, ReadError> {
        Ok(ClassConstantIndex(ConstantIndex(cursor.read_u2()?)))
    };
    let name_and_type =
        |cursor: &mut ClassCursor<'_>| -> Result<NameAndTypeConstantIndex, ReadError> {
            Ok(NameAndTypeConstantIndex(ConstantIndex(cursor.read_u2()?)))
        };

    let tag = cursor.read_u1()?;
    let constant = match tag {
        Constant::UTF8_TAG => {
            let len = cursor.read_u2()? as usize;
            let start = cursor.position();
            let bytes = cursor.read_bytes(len)?;
            let text = decode_modified_utf8(bytes, variant).map_err(|err| match err {
                ReadError::BadModifiedUtf8 { offset } => ReadError::BadModifiedUtf8 {
                    offset: start + offset,
                },
                other => other,
            })?;
            Constant::Utf8(text)
        }
        Constant::INTEGER_TAG => Constant::Integer(cursor.read_i4()?),
        Constant::FLOAT_TAG => Constant::Float(cursor.read_f4()?),
        Constant::LONG_TAG => Constant::Long(cursor.read_i8()?),
        Constant::DOUBLE_TAG => Constant::Double(cursor.read_f8()?),
        Constant::CLASS_TAG => Constant::Class(utf8(cursor)?),
        Constant::STRING_TAG => Constant::String(utf8(cursor)?),
        Constant::FIELD_REF_TAG => Constant::FieldRef {
            class: class(cursor)?,
            name_and_type: name_and_type(cursor)?,
        },
        Constant::METHOD_REF_TAG => Constant::MethodRef {
            class: class(cursor)?,
            name_and_type: name_and_type(cursor)?,
        },
        Constant::INTERFACE_METHOD_REF_TAG => Constant::InterfaceMethodRef {
            class: class(cursor)?,
            name_and_type: name_and_type(cursor)?,
        },
        Constant::NAME_AND_TYPE_TAG => Constant::NameAndType {
            name: utf8(cursor)?,
            descriptor: utf8(cursor)?,
        },
        Constant::METHOD_HANDLE_TAG => {
            let kind = cursor.read_u1()?;
            let handle_kind = HandleKind::from_reference_kind(kind)
                .ok_or(ReadError::BadConstantTag { offset, tag })?;
            Constant::MethodHandle {
                handle_kind,
                member: ConstantIndex(cursor.read_u2()?),
            }
        }
        Constant::METHOD_TYPE_TAG => Constant::MethodType {
            descriptor: utf8(cursor)?,
        },
        Constant::DYNAMIC_TAG => Constant::Dynamic {
            bootstrap_method: cursor.read_u2()?,
            name_and_type: name_and_type(cursor)?,
        },
        Constant::INVOKE_DYNAMIC_TAG => Constant::InvokeDynamic {
            bootstrap_method: cursor.read_u2()?,
            name_and_type: name_and_type(cursor)?,
        },
        Constant::MODULE_TAG => Constant::Module(utf8(cursor)?),
        Constant::PACKAGE_TAG => Constant::Package(utf8(cursor)?),
        _ => return Err(ReadError::BadConstantTag { offset, tag }),
    };
    Ok(constant)
}
