use super::AttributeLike;
use crate::buffer::BufferChain;
use crate::jvm::{ConstantIndex, Error, Serialize, Utf8ConstantIndex};

/// Annotations visible through reflection
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeVisibleAnnotations(pub Vec<Annotation>);

impl AttributeLike for RuntimeVisibleAnnotations {
    const NAME: &'static str = "RuntimeVisibleAnnotations";
}

impl Serialize for RuntimeVisibleAnnotations {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

/// Annotations kept in the class file but not visible through reflection
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.17
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInvisibleAnnotations(pub Vec<Annotation>);

impl AttributeLike for RuntimeInvisibleAnnotations {
    const NAME: &'static str = "RuntimeInvisibleAnnotations";
}

impl Serialize for RuntimeInvisibleAnnotations {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.0.serialize(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface (eg. `Ljava/lang/Deprecated;`)
    pub type_index: Utf8ConstantIndex,

    pub element_value_pairs: Vec<ElementValuePair>,
}

impl Serialize for Annotation {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.type_index.serialize(out)?;
        self.element_value_pairs.serialize(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    pub element_name: Utf8ConstantIndex,
    pub value: ElementValue,
}

impl Serialize for ElementValuePair {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.element_name.serialize(out)?;
        self.value.serialize(out)
    }
}

/// Value of an annotation element
///
/// Primitive values refer to `Integer`, `Long`, `Float`, or `Double` constants (`byte`, `char`,
/// `short`, and `boolean` values are all stored as `Integer` constants). Strings refer to a
/// `Utf8` constant directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Byte(ConstantIndex),
    Char(ConstantIndex),
    Double(ConstantIndex),
    Float(ConstantIndex),
    Int(ConstantIndex),
    Long(ConstantIndex),
    Short(ConstantIndex),
    Boolean(ConstantIndex),
    String(Utf8ConstantIndex),
    Enum {
        type_name: Utf8ConstantIndex,
        const_name: Utf8ConstantIndex,
    },

    /// Return descriptor of the class (eg. `V` for `void.class`)
    Class(Utf8ConstantIndex),

    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub fn tag(&self) -> u8 {
        match self {
            ElementValue::Byte(_) => b'B',
            ElementValue::Char(_) => b'C',
            ElementValue::Double(_) => b'D',
            ElementValue::Float(_) => b'F',
            ElementValue::Int(_) => b'I',
            ElementValue::Long(_) => b'J',
            ElementValue::Short(_) => b'S',
            ElementValue::Boolean(_) => b'Z',
            ElementValue::String(_) => b's',
            ElementValue::Enum { .. } => b'e',
            ElementValue::Class(_) => b'c',
            ElementValue::Annotation(_) => b'@',
            ElementValue::Array(_) => b'[',
        }
    }
}

impl Serialize for ElementValue {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        self.tag().serialize(out)?;
        match self {
            ElementValue::Byte(index)
            | ElementValue::Char(index)
            | ElementValue::Double(index)
            | ElementValue::Float(index)
            | ElementValue::Int(index)
            | ElementValue::Long(index)
            | ElementValue::Short(index)
            | ElementValue::Boolean(index) => index.serialize(out),
            ElementValue::String(index) | ElementValue::Class(index) => index.serialize(out),
            ElementValue::Enum {
                type_name,
                const_name,
            } => {
                type_name.serialize(out)?;
                const_name.serialize(out)
            }
            ElementValue::Annotation(annotation) => annotation.serialize(out),
            ElementValue::Array(values) => values.serialize(out),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{SymbolTable, Version};

    #[test]
    fn nested_annotation_layout() {
        let mut constants = SymbolTable::new(Version::JAVA8);
        let retention = constants.get_or_add_utf8("Lfoo/Meta;").unwrap(); // 1
        let value = constants.get_or_add_utf8("value").unwrap(); // 2
        let answer = constants.get_or_add_integer(42).unwrap(); // 3
        let policy = constants.get_or_add_utf8("Lfoo/Policy;").unwrap(); // 4
        let runtime = constants.get_or_add_utf8("RUNTIME").unwrap(); // 5

        let inner = Annotation {
            type_index: retention,
            element_value_pairs: vec![],
        };
        let annotation = Annotation {
            type_index: retention,
            element_value_pairs: vec![ElementValuePair {
                element_name: value,
                value: ElementValue::Array(vec![
                    ElementValue::Int(answer),
                    ElementValue::Enum {
                        type_name: policy,
                        const_name: runtime,
                    },
                    ElementValue::Annotation(Box::new(inner)),
                ]),
            }],
        };

        let mut out = BufferChain::new();
        RuntimeVisibleAnnotations(vec![annotation])
            .serialize(&mut out)
            .unwrap();
        assert_eq!(
            out.to_vec().unwrap(),
            vec![
                0, 1, // annotation count
                0, 1, 0, 1, // type and pair count
                0, 2, b'[', 0, 3, // `value` is an array of 3
                b'I', 0, 3, // int
                b'e', 0, 4, 0, 5, // enum
                b'@', 0, 1, 0, 0, // nested annotation
            ]
        );
    }
}
