use super::{read_attributes, AttributeData, AttributeInfo, ClassCursor, ConstantPool, ReadError};
use crate::jvm::class_file::MAGIC;
use crate::jvm::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags, Version};
use byteorder::{BigEndian, ByteOrder};

/// Parsed class file
///
/// Constant pool references are kept as indices, except for the names and descriptors of
/// fields and methods which are resolved while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub version: Version,
    pub constants: ConstantPool,
    pub access_flags: ClassAccessFlags,
    pub this_class: u16,

    /// `None` only for `java/lang/Object` and module descriptors
    pub super_class: Option<u16>,

    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

/// Field or method of a parsed class
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo<F> {
    pub access_flags: F,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<AttributeInfo>,
}

pub type FieldInfo = MemberInfo<FieldAccessFlags>;
pub type MethodInfo = MemberInfo<MethodAccessFlags>;

impl<F> MemberInfo<F> {
    pub fn attribute(&self, name: &str) -> Option<&AttributeData> {
        find_attribute(&self.attributes, name)
    }
}

fn find_attribute<'a>(attributes: &'a [AttributeInfo], name: &str) -> Option<&'a AttributeData> {
    attributes
        .iter()
        .find(|attribute| attribute.name == name)
        .map(|attribute| &attribute.data)
}

impl ClassFile {
    /// Parse a whole class file
    pub fn parse(bytes: &[u8]) -> Result<ClassFile, ReadError> {
        let mut cursor = ClassCursor::new(bytes);

        let magic = cursor.read_u4()?;
        if magic != BigEndian::read_u32(&MAGIC) {
            return Err(ReadError::BadMagic(magic));
        }
        let minor_version = cursor.read_u2()?;
        let major_version = cursor.read_u2()?;
        let version = Version::new(major_version, minor_version);

        let constants = ConstantPool::parse(&mut cursor, version.mutf8_variant())?;

        let access_flags = ClassAccessFlags::from_bits_truncate(cursor.read_u2()?);
        let this_class = cursor.read_u2()?;
        constants.class_name(this_class)?;
        let super_class = match cursor.read_u2()? {
            0 => None,
            index => {
                constants.class_name(index)?;
                Some(index)
            }
        };
        let interfaces = cursor.read_table(|cursor| {
            let index = cursor.read_u2()?;
            constants.class_name(index)?;
            Ok(index)
        })?;

        let fields = cursor.read_table(|cursor| {
            read_member(cursor, &constants, FieldAccessFlags::from_bits_truncate)
        })?;
        let methods = cursor.read_table(|cursor| {
            read_member(cursor, &constants, MethodAccessFlags::from_bits_truncate)
        })?;
        let attributes = read_attributes(&mut cursor, &constants)?;

        if !cursor.is_at_end() {
            return Err(ReadError::TrailingBytes {
                offset: cursor.position(),
            });
        }

        log::debug!(
            "parsed class {}: {} fields, {} methods",
            constants.class_name(this_class)?,
            fields.len(),
            methods.len()
        );
        Ok(ClassFile {
            version,
            constants,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn this_class_name(&self) -> Result<&str, ReadError> {
        self.constants.class_name(self.this_class)
    }

    pub fn super_class_name(&self) -> Result<Option<&str>, ReadError> {
        self.super_class
            .map(|index| self.constants.class_name(index))
            .transpose()
    }

    pub fn interface_names(&self) -> Result<Vec<&str>, ReadError> {
        self.interfaces
            .iter()
            .map(|index| self.constants.class_name(*index))
            .collect()
    }

    /// First method with the given name (and descriptor, if specified)
    pub fn method(&self, name: &str, descriptor: Option<&str>) -> Option<&MethodInfo> {
        self.methods.iter().find(|method| {
            method.name == name && descriptor.map_or(true, |d| method.descriptor == d)
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeData> {
        find_attribute(&self.attributes, name)
    }
}

fn read_member<F>(
    cursor: &mut ClassCursor<'_>,
    constants: &ConstantPool,
    flags: impl FnOnce(u16) -> F,
) -> Result<MemberInfo<F>, ReadError> {
    let access_flags = flags(cursor.read_u2()?);
    let name = constants.utf8(cursor.read_u2()?)?.to_owned();
    let descriptor = constants.utf8(cursor.read_u2()?)?.to_owned();
    let attributes = read_attributes(cursor, constants)?;
    Ok(MemberInfo {
        access_flags,
        name,
        descriptor,
        attributes,
    })
}
