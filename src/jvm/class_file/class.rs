use super::{optional_index, Attribute, AttributeLike, Field, Method};
use crate::buffer::{Blob, BufferChain, ChunkPool, DEFAULT_CHUNK_SIZE};
use crate::jvm::{
    table_len, ClassAccessFlags, ClassConstantIndex, Error, FieldAccessFlags, MethodAccessFlags,
    Serialize, SymbolTable, Version,
};
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Magic header bytes that go at the front of the serialized class file
pub const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Number of free chunks the pool of a class builder holds on to
const POOLED_CHUNKS: usize = 64;

/// Table of the class file (eg. the methods) whose entries get encoded as they are added
///
/// The table starts with a reserved `u16` count which gets filled in at the end.
#[derive(Debug)]
struct Section {
    name: &'static str,
    chain: BufferChain,
    count_blob: Blob,
    count: usize,
}

impl Section {
    fn new(name: &'static str, mut chain: BufferChain) -> Result<Section, Error> {
        let count_blob = chain.reserve_bytes(2)?;
        Ok(Section {
            name,
            chain,
            count_blob,
            count: 0,
        })
    }

    /// Encode one more entry. An entry that fails to encode leaves the table untouched.
    fn push<A: Serialize>(&mut self, entry: A) -> Result<(), Error> {
        table_len(self.name, self.count + 1)?;
        let mut encoded = self.chain.sibling();
        entry.serialize(&mut encoded)?;
        self.chain.append(&mut encoded)?;
        self.count += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<BufferChain, Error> {
        let count = table_len(self.name, self.count)?;
        self.chain.patch_u16(&self.count_blob, count)?;
        Ok(self.chain)
    }
}

/// Builder for the [`class` file format of the JVM][0]
///
/// Every part of the class is encoded as soon as it is added: constants go into the
/// [`SymbolTable`], interfaces/fields/methods/attributes each into their own chain. Finishing
/// the class writes the header and splices all of these together without copying.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html
#[derive(Debug)]
pub struct ClassBuilder {
    /// Constants pool
    pub constants: SymbolTable,

    version: Version,
    access_flags: ClassAccessFlags,
    this_class: ClassConstantIndex,
    super_class: Option<ClassConstantIndex>,

    interfaces: Section,
    fields: Section,
    methods: Section,
    attributes: Section,

    pool: Rc<ChunkPool>,
}

impl ClassBuilder {
    /// Create a new class builder
    ///
    /// Only `java/lang/Object` (and module descriptors) should have no super class.
    pub fn new(
        version: Version,
        access_flags: ClassAccessFlags,
        this_class: &str,
        super_class: Option<&str>,
    ) -> Result<ClassBuilder, Error> {
        let pool = ChunkPool::new(DEFAULT_CHUNK_SIZE, POOLED_CHUNKS);
        ClassBuilder::with_pool(version, access_flags, this_class, super_class, pool)
    }

    /// Create a new class builder whose chains all draw chunks from `pool`
    pub fn with_pool(
        version: Version,
        access_flags: ClassAccessFlags,
        this_class: &str,
        super_class: Option<&str>,
        pool: Rc<ChunkPool>,
    ) -> Result<ClassBuilder, Error> {
        let chain = || BufferChain::with_pool(pool.clone());

        let mut constants = SymbolTable::with_buffer(version, chain());
        let this_class_index = constants.get_or_add_class_named(this_class)?;
        let super_class = super_class
            .map(|name| constants.get_or_add_class_named(name))
            .transpose()?;

        let interfaces = Section::new("interfaces", chain())?;
        let fields = Section::new("fields", chain())?;
        let methods = Section::new("methods", chain())?;
        let attributes = Section::new("class attributes", chain())?;

        Ok(ClassBuilder {
            constants,
            version,
            access_flags,
            this_class: this_class_index,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            pool,
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn this_class(&self) -> ClassConstantIndex {
        self.this_class
    }

    pub fn super_class(&self) -> Option<ClassConstantIndex> {
        self.super_class
    }

    /// Make an empty chain sharing the chunk pool of this class (eg. for a code array)
    pub fn new_chain(&self) -> BufferChain {
        BufferChain::with_pool(self.pool.clone())
    }

    /// Add an interface implemented by the class
    pub fn add_interface(&mut self, name: &str) -> Result<ClassConstantIndex, Error> {
        let interface = self.constants.get_or_add_class_named(name)?;
        self.interfaces.push(interface)?;
        Ok(interface)
    }

    /// Add a field to the class
    pub fn add_field(
        &mut self,
        access_flags: FieldAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> Result<(), Error> {
        let name_index = self.constants.get_or_add_utf8(name)?;
        let descriptor_index = self.constants.get_or_add_utf8(descriptor)?;
        self.fields.push(Field {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    /// Add a method to the class
    ///
    /// Methods which aren't `abstract` or `native` need a `Code` attribute (see
    /// [`ClassBuilder::attribute`]).
    pub fn add_method(
        &mut self,
        access_flags: MethodAccessFlags,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> Result<(), Error> {
        let name_index = self.constants.get_or_add_utf8(name)?;
        let descriptor_index = self.constants.get_or_add_utf8(descriptor)?;
        self.methods.push(Method {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    /// Encode an attribute, for use on a field, method, or `Code` attribute
    pub fn attribute(&mut self, attribute: impl AttributeLike) -> Result<Attribute, Error> {
        self.constants.get_attribute(attribute)
    }

    /// Add an attribute to the class
    pub fn add_attribute(&mut self, attribute: impl AttributeLike) -> Result<(), Error> {
        let attribute = self.constants.get_attribute(attribute)?;
        self.attributes.push(attribute)
    }

    /// Consume the builder and return the encoded class file
    pub fn finish(mut self) -> Result<BufferChain, Error> {
        let mut out = BufferChain::with_pool(self.pool.clone());
        out.write_bytes(&MAGIC)?;
        self.version.serialize(&mut out)?;
        self.constants.serialize(&mut out)?;
        self.access_flags.serialize(&mut out)?;
        self.this_class.serialize(&mut out)?;
        optional_index(self.super_class, &mut out)?;

        let (interfaces, fields, methods) = (
            self.interfaces.count,
            self.fields.count,
            self.methods.count,
        );
        for section in [self.interfaces, self.fields, self.methods, self.attributes] {
            let mut section = section.finish()?;
            out.link_suffix(&mut section)?;
        }

        log::debug!(
            "assembled class: {} bytes, {} constants, {} interfaces, {} fields, {} methods",
            out.count(),
            self.constants.len(),
            interfaces,
            fields,
            methods
        );
        Ok(out)
    }

    /// Finish the class and save it to disk
    pub fn save_to_path<P: AsRef<Path>>(
        self,
        path: P,
        create_missing_directories: bool,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        if create_missing_directories {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        let class = self.finish()?;
        let mut class_file = fs::File::create(path)?;
        class.write_content_to(&mut class_file)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::ConstantIndex;

    #[test]
    fn empty_class_layout() {
        let class = ClassBuilder::new(
            Version::JAVA8,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            "A",
            Some("java/lang/Object"),
        )
        .unwrap();
        let bytes = class.finish().unwrap().to_vec().unwrap();

        let mut expected = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52, 0, 5];
        expected.extend_from_slice(&[1, 0, 1, b'A', 7, 0, 1, 1, 0, 16]);
        expected.extend_from_slice(b"java/lang/Object");
        expected.extend_from_slice(&[7, 0, 3]);
        expected.extend_from_slice(&[0, 0x21, 0, 2, 0, 4]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(bytes, expected);
    }

    struct Truncated;

    impl Serialize for Truncated {
        fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
            out.write_u16(0xDEAD)?;
            Err(Error::MethodCodeOverflow(70000))
        }
    }

    #[test]
    fn failed_entry_leaves_section_unchanged() {
        let mut section = Section::new("methods", BufferChain::new()).unwrap();
        section.push(7u16).unwrap();
        assert!(section.push(Truncated).is_err());
        section.push(9u16).unwrap();

        let bytes = section.finish().unwrap().to_vec().unwrap();
        assert_eq!(bytes, vec![0, 2, 0, 7, 0, 9]);
    }

    #[test]
    fn sections_count_their_entries() {
        let mut class = ClassBuilder::new(
            Version::JAVA8,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
            "I",
            Some("java/lang/Object"),
        )
        .unwrap();
        let runnable = class.add_interface("java/lang/Runnable").unwrap();
        class.add_interface("java/io/Serializable").unwrap();
        assert_eq!(runnable.0, ConstantIndex(6));
        class
            .add_field(
                FieldAccessFlags::PUBLIC | FieldAccessFlags::STATIC | FieldAccessFlags::FINAL,
                "X",
                "I",
                vec![],
            )
            .unwrap();
        class
            .add_method(
                MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT,
                "run",
                "()V",
                vec![],
            )
            .unwrap();
        let bytes = class.finish().unwrap().to_vec().unwrap();

        // Pool: I, class I, Object, class Object, Runnable, class Runnable, Serializable,
        // class Serializable, X, run, ()V (the field descriptor `I` is shared)
        assert_eq!(&bytes[8..10], &[0, 12]);

        let tail = &bytes[bytes.len() - 34..];
        assert_eq!(
            tail,
            &[
                0x06, 0x01, 0, 2, 0, 4, // flags, this, super
                0, 2, 0, 6, 0, 8, // interfaces
                0, 1, 0, 0x19, 0, 9, 0, 1, 0, 0, // fields
                0, 1, 0x04, 0x01, 0, 10, 0, 11, 0, 0, // methods
                0, 0, // attributes
            ][..]
        );
    }
}
