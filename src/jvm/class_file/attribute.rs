use crate::buffer::BufferChain;
use crate::jvm::{
    attribute_len, ClassConstantIndex, ConstantIndex, Error, InnerClassAccessFlags,
    MethodHandleConstantIndex, Serialize, Utf8ConstantIndex,
};

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// The representation is designed to be easily extended with custom attributes: the body is
/// whatever bytes got encoded into `info`. Use [`crate::jvm::SymbolTable::get_attribute`] to
/// turn anything implementing [`AttributeLike`] into an attribute.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub info: BufferChain,
}

impl Serialize for Attribute {
    fn serialize(mut self, out: &mut BufferChain) -> Result<(), Error> {
        self.name_index.serialize(out)?;

        // Attribute info length is 4 bytes
        out.write_u32(attribute_len(self.info.count())?)?;
        out.link_suffix(&mut self.info)
    }
}

/// Attributes are all stored in the same way (see `Attribute`), but internally
/// they represent very different things. This trait is implemented by things
/// which can be turned into attributes.
pub trait AttributeLike: Serialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// Write a constant index which may be absent (`0` stands for no constant)
pub(crate) fn optional_index<I: Into<ConstantIndex>>(
    index: Option<I>,
    out: &mut BufferChain,
) -> Result<(), Error> {
    match index {
        Some(index) => index.into().serialize(out),
        None => out.write_u16(0),
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.2
#[derive(Debug)]
pub struct ConstantValue(pub ConstantIndex);

impl Serialize for ConstantValue {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

impl AttributeLike for ConstantValue {
    const NAME: &'static str = "ConstantValue";
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,

    /// Encoded instructions, usually from [`crate::jvm::code::InstructionStream::finish`]
    pub code: BufferChain,

    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

impl Serialize for Code {
    fn serialize(mut self, out: &mut BufferChain) -> Result<(), Error> {
        self.max_stack.serialize(out)?;
        self.max_locals.serialize(out)?;
        out.write_u32(attribute_len(self.code.count())?)?;
        out.link_suffix(&mut self.code)?;
        self.exception_table.serialize(out)?;
        self.attributes.serialize(out)?;
        Ok(())
    }
}

impl AttributeLike for Code {
    const NAME: &'static str = "Code";
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start_pc: u16,

    /// End of exception handler range (exclusive)
    pub end_pc: u16,

    /// Start of the exception handler
    pub handler_pc: u16,

    /// Class of exceptions caught, or everything if `None`
    pub catch_type: Option<ClassConstantIndex>,
}

impl Serialize for ExceptionHandler {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.start_pc.serialize(out)?;
        self.end_pc.serialize(out)?;
        self.handler_pc.serialize(out)?;
        optional_index(self.catch_type, out)
    }
}

/// Checked exceptions a method may throw
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.5
#[derive(Debug)]
pub struct Exceptions(pub Vec<ClassConstantIndex>);

impl AttributeLike for Exceptions {
    const NAME: &'static str = "Exceptions";
}

impl Serialize for Exceptions {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.10
#[derive(Debug)]
pub struct SourceFile(pub Utf8ConstantIndex);

impl AttributeLike for SourceFile {
    const NAME: &'static str = "SourceFile";
}

impl Serialize for SourceFile {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.9
#[derive(Debug)]
pub struct Signature {
    pub signature: Utf8ConstantIndex,
}

impl AttributeLike for Signature {
    const NAME: &'static str = "Signature";
}

impl Serialize for Signature {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.signature.serialize(out)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.12
#[derive(Debug)]
pub struct LineNumberTable(pub Vec<LineNumber>);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LineNumber {
    /// Offset in the code array where the line starts
    pub start_pc: u16,
    pub line_number: u16,
}

impl AttributeLike for LineNumberTable {
    const NAME: &'static str = "LineNumberTable";
}

impl Serialize for LineNumberTable {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

impl Serialize for LineNumber {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.start_pc.serialize(out)?;
        self.line_number.serialize(out)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.23
#[derive(Debug)]
pub struct BootstrapMethods(pub Vec<BootstrapMethod>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    pub bootstrap_method: MethodHandleConstantIndex,
    pub bootstrap_arguments: Vec<ConstantIndex>,
}

impl AttributeLike for BootstrapMethods {
    const NAME: &'static str = "BootstrapMethods";
}

impl Serialize for BootstrapMethods {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

impl Serialize for BootstrapMethod {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.bootstrap_method.serialize(out)?;
        self.bootstrap_arguments.serialize(out)?;
        Ok(())
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.28
#[derive(Debug)]
pub struct NestHost(pub ClassConstantIndex);

impl AttributeLike for NestHost {
    const NAME: &'static str = "NestHost";
}

impl Serialize for NestHost {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.29
#[derive(Debug)]
pub struct NestMembers(pub Vec<ClassConstantIndex>);

impl AttributeLike for NestMembers {
    const NAME: &'static str = "NestMembers";
}

impl Serialize for NestMembers {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.6
#[derive(Debug)]
pub struct InnerClasses(pub Vec<InnerClass>);

impl AttributeLike for InnerClasses {
    const NAME: &'static str = "InnerClasses";
}

impl Serialize for InnerClasses {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClass {
    pub inner_class: ClassConstantIndex,

    /// `None` for local and anonymous classes
    pub outer_class: Option<ClassConstantIndex>,

    /// `None` for anonymous classes
    pub inner_name: Option<Utf8ConstantIndex>,

    pub access_flags: InnerClassAccessFlags,
}

impl Serialize for InnerClass {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.inner_class.serialize(out)?;
        optional_index(self.outer_class, out)?;
        optional_index(self.inner_name, out)?;
        self.access_flags.serialize(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{SymbolTable, Version};

    fn body<A: AttributeLike>(attribute: A) -> Vec<u8> {
        let mut out = BufferChain::new();
        attribute.serialize(&mut out).unwrap();
        out.to_vec().unwrap()
    }

    #[test]
    fn attribute_gets_name_and_length() {
        let mut constants = SymbolTable::new(Version::JAVA8);
        let source = constants.get_or_add_utf8("Foo.java").unwrap();
        let attribute = constants.get_attribute(SourceFile(source)).unwrap();
        assert_eq!(attribute.name_index.0, ConstantIndex(2));

        let mut out = BufferChain::new();
        attribute.serialize(&mut out).unwrap();
        assert_eq!(out.to_vec().unwrap(), vec![0, 2, 0, 0, 0, 2, 0, 1]);
    }

    #[test]
    fn code_layout() {
        let mut code = BufferChain::new();
        code.write_bytes(&[0x2a, 0xb1]).unwrap();
        let handler = ExceptionHandler {
            start_pc: 0,
            end_pc: 1,
            handler_pc: 1,
            catch_type: None,
        };
        let bytes = body(Code {
            max_stack: 1,
            max_locals: 2,
            code,
            exception_table: vec![handler],
            attributes: vec![],
        });
        assert_eq!(
            bytes,
            vec![
                0, 1, 0, 2, // max stack and locals
                0, 0, 0, 2, 0x2a, 0xb1, // code array
                0, 1, 0, 0, 0, 1, 0, 1, 0, 0, // exception table
                0, 0, // attributes
            ]
        );
    }

    #[test]
    fn inner_class_with_missing_parts() {
        let inner = ClassConstantIndex(ConstantIndex(7));
        let bytes = body(InnerClasses(vec![InnerClass {
            inner_class: inner,
            outer_class: None,
            inner_name: None,
            access_flags: InnerClassAccessFlags::PRIVATE | InnerClassAccessFlags::STATIC,
        }]));
        assert_eq!(bytes, vec![0, 1, 0, 7, 0, 0, 0, 0, 0, 0x0a]);
    }

    #[test]
    fn small_attributes() {
        let handle = MethodHandleConstantIndex(ConstantIndex(3));
        assert_eq!(
            body(BootstrapMethods(vec![BootstrapMethod {
                bootstrap_method: handle,
                bootstrap_arguments: vec![ConstantIndex(4), ConstantIndex(5)],
            }])),
            vec![0, 1, 0, 3, 0, 2, 0, 4, 0, 5]
        );
        assert_eq!(
            body(LineNumberTable(vec![
                LineNumber {
                    start_pc: 0,
                    line_number: 10
                },
                LineNumber {
                    start_pc: 4,
                    line_number: 11
                },
            ])),
            vec![0, 2, 0, 0, 0, 10, 0, 4, 0, 11]
        );
        let class = ClassConstantIndex(ConstantIndex(9));
        assert_eq!(body(NestHost(class)), vec![0, 9]);
        assert_eq!(body(NestMembers(vec![class, class])), vec![0, 2, 0, 9, 0, 9]);
        assert_eq!(body(Exceptions(vec![])), vec![0, 0]);
    }
}
