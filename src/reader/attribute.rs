use super::{ClassCursor, ConstantPool, ReadError};
use crate::jvm::class_file::{
    Annotation, BootstrapMethod, ElementValue, ElementValuePair, ExceptionHandler, InnerClass,
    LineNumber, StackMapFrame, VerificationType,
};
use crate::jvm::{
    ClassConstantIndex, ConstantIndex, InnerClassAccessFlags, MethodHandleConstantIndex,
    Utf8ConstantIndex,
};

/// Attribute as found in a class file, with its body decoded if the name is recognized
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub data: AttributeData,
}

/// Decoded body of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Code(CodeData),
    ConstantValue(ConstantIndex),
    Exceptions(Vec<ClassConstantIndex>),
    SourceFile(Utf8ConstantIndex),
    Signature(Utf8ConstantIndex),
    LineNumberTable(Vec<LineNumber>),
    StackMapTable(Vec<StackMapFrame>),
    BootstrapMethods(Vec<BootstrapMethod>),
    InnerClasses(Vec<InnerClass>),
    NestHost(ClassConstantIndex),
    NestMembers(Vec<ClassConstantIndex>),
    RuntimeVisibleAnnotations(Vec<Annotation>),
    RuntimeInvisibleAnnotations(Vec<Annotation>),

    /// Raw body of an attribute this reader doesn't decode
    Unknown(Vec<u8>),
}

/// Body of a `Code` attribute
#[derive(Debug, Clone, PartialEq)]
pub struct CodeData {
    pub max_stack: u16,
    pub max_locals: u16,

    /// Raw code array (see [`super::decode_instructions`])
    pub code: Vec<u8>,

    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<AttributeInfo>,
}

/// Read an `attributes_count` followed by that many attributes
pub fn read_attributes(
    cursor: &mut ClassCursor<'_>,
    pool: &ConstantPool,
) -> Result<Vec<AttributeInfo>, ReadError> {
    cursor.read_table(|cursor| read_attribute(cursor, pool))
}

fn read_attribute(
    cursor: &mut ClassCursor<'_>,
    pool: &ConstantPool,
) -> Result<AttributeInfo, ReadError> {
    let name = pool.utf8(cursor.read_u2()?)?.to_owned();
    let length = cursor.read_u4()? as usize;
    let mut body = cursor.split(length)?;

    let data = match name.as_str() {
        "Code" => AttributeData::Code(read_code(&mut body, pool)?),
        "ConstantValue" => AttributeData::ConstantValue(pool.any_index(body.read_u2()?)?),
        "Exceptions" => AttributeData::Exceptions(read_classes(&mut body, pool)?),
        "SourceFile" => AttributeData::SourceFile(pool.utf8_index(body.read_u2()?)?),
        "Signature" => AttributeData::Signature(pool.utf8_index(body.read_u2()?)?),
        "LineNumberTable" => AttributeData::LineNumberTable(body.read_table(|cursor| {
            Ok(LineNumber {
                start_pc: cursor.read_u2()?,
                line_number: cursor.read_u2()?,
            })
        })?),
        "StackMapTable" => AttributeData::StackMapTable(
            body.read_table(|cursor| read_frame(cursor, pool))
                .map_err(|err| malformed(err, &name))?,
        ),
        "BootstrapMethods" => AttributeData::BootstrapMethods(body.read_table(|cursor| {
            Ok(BootstrapMethod {
                bootstrap_method: MethodHandleConstantIndex(pool.any_index(cursor.read_u2()?)?),
                bootstrap_arguments: cursor
                    .read_table(|cursor| pool.any_index(cursor.read_u2()?))?,
            })
        })?),
        "InnerClasses" => AttributeData::InnerClasses(body.read_table(|cursor| {
            Ok(InnerClass {
                inner_class: pool.class_index(cursor.read_u2()?)?,
                outer_class: optional(cursor.read_u2()?, |index| pool.class_index(index))?,
                inner_name: optional(cursor.read_u2()?, |index| pool.utf8_index(index))?,
                access_flags: InnerClassAccessFlags::from_bits_truncate(cursor.read_u2()?),
            })
        })?),
        "NestHost" => AttributeData::NestHost(pool.class_index(body.read_u2()?)?),
        "NestMembers" => AttributeData::NestMembers(read_classes(&mut body, pool)?),
        "RuntimeVisibleAnnotations" => AttributeData::RuntimeVisibleAnnotations(
            body.read_table(|cursor| read_annotation(cursor, pool))
                .map_err(|err| malformed(err, &name))?,
        ),
        "RuntimeInvisibleAnnotations" => AttributeData::RuntimeInvisibleAnnotations(
            body.read_table(|cursor| read_annotation(cursor, pool))
                .map_err(|err| malformed(err, &name))?,
        ),
        _ => AttributeData::Unknown(body.read_bytes(length)?.to_vec()),
    };

    if !body.is_at_end() {
        return Err(ReadError::BadAttribute {
            name,
            reason: "body is longer than its contents",
        });
    }
    Ok(AttributeInfo { name, data })
}

/// Fill in the attribute name of errors raised while reading its body
fn malformed(err: ReadError, name: &str) -> ReadError {
    match err {
        ReadError::BadAttribute { reason, .. } => ReadError::BadAttribute {
            name: name.to_owned(),
            reason,
        },
        other => other,
    }
}

fn bad(reason: &'static str) -> ReadError {
    ReadError::BadAttribute {
        name: String::new(),
        reason,
    }
}

/// Index where `0` stands for nothing
fn optional<T>(
    index: u16,
    resolve: impl FnOnce(u16) -> Result<T, ReadError>,
) -> Result<Option<T>, ReadError> {
    if index == 0 {
        Ok(None)
    } else {
        resolve(index).map(Some)
    }
}

fn read_classes(
    cursor: &mut ClassCursor<'_>,
    pool: &ConstantPool,
) -> Result<Vec<ClassConstantIndex>, ReadError> {
    cursor.read_table(|cursor| pool.class_index(cursor.read_u2()?))
}

fn read_code(cursor: &mut ClassCursor<'_>, pool: &ConstantPool) -> Result<CodeData, ReadError> {
    let max_stack = cursor.read_u2()?;
    let max_locals = cursor.read_u2()?;
    let code_length = cursor.read_u4()? as usize;
    let code = cursor.read_bytes(code_length)?.to_vec();
    let exception_table = cursor.read_table(|cursor| {
        Ok(ExceptionHandler {
            start_pc: cursor.read_u2()?,
            end_pc: cursor.read_u2()?,
            handler_pc: cursor.read_u2()?,
            catch_type: optional(cursor.read_u2()?, |index| pool.class_index(index))?,
        })
    })?;
    let attributes = read_attributes(cursor, pool)?;
    Ok(CodeData {
        max_stack,
        max_locals,
        code,
        exception_table,
        attributes,
    })
}

fn read_verification_type(
    cursor: &mut ClassCursor<'_>,
    pool: &ConstantPool,
) -> Result<VerificationType, ReadError> {
    Ok(match cursor.read_u1()? {
        0 => VerificationType::Top,
        1 => VerificationType::Integer,
        2 => VerificationType::Float,
        3 => VerificationType::Double,
        4 => VerificationType::Long,
        5 => VerificationType::Null,
        6 => VerificationType::UninitializedThis,
        7 => VerificationType::Object(pool.class_index(cursor.read_u2()?)?),
        8 => VerificationType::Uninitialized(cursor.read_u2()?),
        _ => return Err(bad("unknown verification type tag")),
    })
}

fn read_frame(cursor: &mut ClassCursor<'_>, pool: &ConstantPool) -> Result<StackMapFrame, ReadError> {
    let frame_type = cursor.read_u1()?;
    Ok(match frame_type {
        0..=63 => StackMapFrame::SameLocalsNoStack {
            offset_delta: frame_type as u16,
        },
        64..=127 => StackMapFrame::SameLocalsOneStack {
            offset_delta: frame_type as u16 - 64,
            stack: read_verification_type(cursor, pool)?,
        },
        StackMapFrame::SAME_LOCALS_1_STACK_ITEM_EXTENDED => StackMapFrame::SameLocalsOneStack {
            offset_delta: cursor.read_u2()?,
            stack: read_verification_type(cursor, pool)?,
        },
        248..=250 => StackMapFrame::ChopLocalsNoStack {
            offset_delta: cursor.read_u2()?,
            chopped_k: 251 - frame_type,
        },
        StackMapFrame::SAME_EXTENDED => StackMapFrame::SameLocalsNoStack {
            offset_delta: cursor.read_u2()?,
        },
        252..=254 => {
            let offset_delta = cursor.read_u2()?;
            let locals = (0..frame_type - 251)
                .map(|_| read_verification_type(cursor, pool))
                .collect::<Result<_, _>>()?;
            StackMapFrame::AppendLocalsNoStack {
                offset_delta,
                locals,
            }
        }
        StackMapFrame::FULL => StackMapFrame::Full {
            offset_delta: cursor.read_u2()?,
            locals: cursor.read_table(|cursor| read_verification_type(cursor, pool))?,
            stack: cursor.read_table(|cursor| read_verification_type(cursor, pool))?,
        },
        _ => return Err(bad("reserved stack map frame type")),
    })
}

fn read_annotation(
    cursor: &mut ClassCursor<'_>,
    pool: &ConstantPool,
) -> Result<Annotation, ReadError> {
    Ok(Annotation {
        type_index: pool.utf8_index(cursor.read_u2()?)?,
        element_value_pairs: cursor.read_table(|cursor| {
            Ok(ElementValuePair {
                element_name: pool.utf8_index(cursor.read_u2()?)?,
                value: read_element_value(cursor, pool)?,
            })
        })?,
    })
}

fn read_element_value(
    cursor: &mut ClassCursor<'_>,
    pool: &ConstantPool,
) -> Result<ElementValue, ReadError> {
    let tag = cursor.read_u1()?;
    let constant = |cursor: &mut ClassCursor<'_>| pool.any_index(cursor.read_u2()?);
    Ok(match tag {
        b'B' => ElementValue::Byte(constant(cursor)?),
        b'C' => ElementValue::Char(constant(cursor)?),
        b'D' => ElementValue::Double(constant(cursor)?),
        b'F' => ElementValue::Float(constant(cursor)?),
        b'I' => ElementValue::Int(constant(cursor)?),
        b'J' => ElementValue::Long(constant(cursor)?),
        b'S' => ElementValue::Short(constant(cursor)?),
        b'Z' => ElementValue::Boolean(constant(cursor)?),
        b's' => ElementValue::String(pool.utf8_index(cursor.read_u2()?)?),
        b'e' => ElementValue::Enum {
            type_name: pool.utf8_index(cursor.read_u2()?)?,
            const_name: pool.utf8_index(cursor.read_u2()?)?,
        },
        b'c' => ElementValue::Class(pool.utf8_index(cursor.read_u2()?)?),
        b'@' => ElementValue::Annotation(Box::new(read_annotation(cursor, pool)?)),
        b'[' => ElementValue::Array(cursor.read_table(|cursor| read_element_value(cursor, pool))?),
        _ => return Err(bad("unknown element value tag")),
    })
}
