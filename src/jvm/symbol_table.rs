use super::class_file::{Attribute, AttributeLike};
use super::{encode_modified_utf8, Error, Mutf8Variant, Serialize, Version};
use crate::buffer::BufferChain;
use std::collections::HashMap;

/// Class file constants pool builder
///
/// The pool is append only. Every constant is encoded into the table's own [`BufferChain`] as
/// soon as it is added, so serializing the pool at the end is just a matter of splicing that
/// chain into the class file (see [`SymbolTable::serialize`]).
///
/// Each kind of constant has two entry points:
///
///   - `add_*` always inserts a new entry (remembering it for later lookups if nothing equal
///     was remembered yet)
///   - `get_or_add_*` returns the index of an equal entry if there is one
///
/// Composite constants (eg. `NameAndType`) are looked up by the indices of their parts, and
/// numeric constants by their exact bits. This means `0.0` and `-0.0` are different constants,
/// while two NaNs with the same payload are the same constant.
#[derive(Debug)]
pub struct SymbolTable {
    entries: Vec<(ConstantIndex, Constant)>,

    /// Index the next constant will get
    next_index: u16,

    encoded: BufferChain,
    variant: Mutf8Variant,

    utf8s: HashMap<String, Utf8ConstantIndex>,
    integers: HashMap<i32, ConstantIndex>,
    floats: HashMap<u32, ConstantIndex>,
    longs: HashMap<i64, ConstantIndex>,
    doubles: HashMap<u64, ConstantIndex>,
    classes: HashMap<Utf8ConstantIndex, ClassConstantIndex>,
    strings: HashMap<Utf8ConstantIndex, StringConstantIndex>,
    field_refs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), FieldRefConstantIndex>,
    method_refs: HashMap<(ClassConstantIndex, NameAndTypeConstantIndex), MethodRefConstantIndex>,
    interface_method_refs: HashMap<
        (ClassConstantIndex, NameAndTypeConstantIndex),
        InterfaceMethodRefConstantIndex,
    >,
    name_and_types: HashMap<(Utf8ConstantIndex, Utf8ConstantIndex), NameAndTypeConstantIndex>,
    method_handles: HashMap<(HandleKind, ConstantIndex), MethodHandleConstantIndex>,
    method_types: HashMap<Utf8ConstantIndex, MethodTypeConstantIndex>,
    dynamics: HashMap<(u16, NameAndTypeConstantIndex), DynamicConstantIndex>,
    invoke_dynamics: HashMap<(u16, NameAndTypeConstantIndex), InvokeDynamicConstantIndex>,
    modules: HashMap<Utf8ConstantIndex, ModuleConstantIndex>,
    packages: HashMap<Utf8ConstantIndex, PackageConstantIndex>,
}

/// Generate the `add_*`/`get_or_add_*` pair for a kind of constant whose cache key is `Copy`
macro_rules! constant_kind {
    (
        $(#[$attr:meta])*
        fn $add:ident / $get_or_add:ident($($param:ident: $param_ty:ty),*) -> $index:ident
        in $cache:ident[$key:expr] = $constant:expr;
    ) => {
        $(#[$attr])*
        pub fn $add(&mut self, $($param: $param_ty),*) -> Result<$index, Error> {
            let index = $index::from(self.push_constant($constant)?);
            self.$cache.entry($key).or_insert(index);
            Ok(index)
        }

        $(#[$attr])*
        pub fn $get_or_add(&mut self, $($param: $param_ty),*) -> Result<$index, Error> {
            match self.$cache.get(&$key) {
                Some(index) => Ok(*index),
                None => self.$add($($param),*),
            }
        }
    };
}

impl SymbolTable {
    /// Make a fresh empty constants pool for a class of the given version
    pub fn new(version: Version) -> SymbolTable {
        SymbolTable::with_buffer(version, BufferChain::new())
    }

    /// Make a fresh empty constants pool which encodes its entries into `encoded`
    pub fn with_buffer(version: Version, encoded: BufferChain) -> SymbolTable {
        SymbolTable {
            entries: vec![],
            next_index: 1,
            encoded,
            variant: version.mutf8_variant(),
            utf8s: HashMap::new(),
            integers: HashMap::new(),
            floats: HashMap::new(),
            longs: HashMap::new(),
            doubles: HashMap::new(),
            classes: HashMap::new(),
            strings: HashMap::new(),
            field_refs: HashMap::new(),
            method_refs: HashMap::new(),
            interface_method_refs: HashMap::new(),
            name_and_types: HashMap::new(),
            method_handles: HashMap::new(),
            method_types: HashMap::new(),
            dynamics: HashMap::new(),
            invoke_dynamics: HashMap::new(),
            modules: HashMap::new(),
            packages: HashMap::new(),
        }
    }

    /// Number of slots used so far (`Long` and `Double` constants use two)
    pub fn slot_count(&self) -> u16 {
        self.next_index - 1
    }

    /// Number of constants added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mutf8_variant(&self) -> Mutf8Variant {
        self.variant
    }

    /// Constants in the order they were added
    pub fn entries(&self) -> impl Iterator<Item = (ConstantIndex, &Constant)> + '_ {
        self.entries
            .iter()
            .map(|(index, constant)| (*index, constant))
    }

    pub fn get(&self, index: ConstantIndex) -> Option<&Constant> {
        self.entries
            .binary_search_by_key(&index.0, |(entry_index, _)| entry_index.0)
            .ok()
            .map(|position| &self.entries[position].1)
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65534, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        let offset = self.next_index;

        // Detect if the next constant would overflow the pool
        let next_index = match offset.checked_add(constant.width()) {
            Some(next_index) => next_index,
            None => {
                return Err(Error::ConstantPoolOverflow {
                    constant,
                    offset: offset as u32,
                })
            }
        };

        constant.encode(&mut self.encoded, self.variant)?;
        log::trace!("constant #{}: {:?}", offset, constant);
        self.entries.push((ConstantIndex(offset), constant));
        self.next_index = next_index;
        Ok(ConstantIndex(offset))
    }

    /// Insert a utf8 constant into the constant pool
    pub fn add_utf8(&mut self, text: &str) -> Result<Utf8ConstantIndex, Error> {
        let index = Utf8ConstantIndex(self.push_constant(Constant::Utf8(text.to_owned()))?);
        if !self.utf8s.contains_key(text) {
            self.utf8s.insert(text.to_owned(), index);
        }
        Ok(index)
    }

    /// Get or insert a utf8 constant from the constant pool
    pub fn get_or_add_utf8(&mut self, text: &str) -> Result<Utf8ConstantIndex, Error> {
        match self.utf8s.get(text) {
            Some(index) => Ok(*index),
            None => self.add_utf8(text),
        }
    }

    constant_kind! {
        /// Constant primitive of type `int`
        fn add_integer / get_or_add_integer(value: i32) -> ConstantIndex
        in integers[value] = Constant::Integer(value);
    }

    constant_kind! {
        /// Constant primitive of type `float`, compared by bits
        fn add_float / get_or_add_float(value: f32) -> ConstantIndex
        in floats[value.to_bits()] = Constant::Float(value);
    }

    constant_kind! {
        /// Constant primitive of type `long` (uses two slots)
        fn add_long / get_or_add_long(value: i64) -> ConstantIndex
        in longs[value] = Constant::Long(value);
    }

    constant_kind! {
        /// Constant primitive of type `double`, compared by bits (uses two slots)
        fn add_double / get_or_add_double(value: f64) -> ConstantIndex
        in doubles[value.to_bits()] = Constant::Double(value);
    }

    constant_kind! {
        /// Class or an interface
        fn add_class / get_or_add_class(name: Utf8ConstantIndex) -> ClassConstantIndex
        in classes[name] = Constant::Class(name);
    }

    constant_kind! {
        /// Constant object of type `java.lang.String`
        fn add_string / get_or_add_string(utf8: Utf8ConstantIndex) -> StringConstantIndex
        in strings[utf8] = Constant::String(utf8);
    }

    constant_kind! {
        /// Name and a type (eg. for a field or a method)
        fn add_name_and_type / get_or_add_name_and_type(
            name: Utf8ConstantIndex,
            descriptor: Utf8ConstantIndex
        ) -> NameAndTypeConstantIndex
        in name_and_types[(name, descriptor)] = Constant::NameAndType { name, descriptor };
    }

    constant_kind! {
        fn add_field_ref / get_or_add_field_ref(
            class: ClassConstantIndex,
            name_and_type: NameAndTypeConstantIndex
        ) -> FieldRefConstantIndex
        in field_refs[(class, name_and_type)] = Constant::FieldRef { class, name_and_type };
    }

    constant_kind! {
        fn add_method_ref / get_or_add_method_ref(
            class: ClassConstantIndex,
            name_and_type: NameAndTypeConstantIndex
        ) -> MethodRefConstantIndex
        in method_refs[(class, name_and_type)] = Constant::MethodRef { class, name_and_type };
    }

    constant_kind! {
        fn add_interface_method_ref / get_or_add_interface_method_ref(
            class: ClassConstantIndex,
            name_and_type: NameAndTypeConstantIndex
        ) -> InterfaceMethodRefConstantIndex
        in interface_method_refs[(class, name_and_type)] =
            Constant::InterfaceMethodRef { class, name_and_type };
    }

    constant_kind! {
        /// Constant object of type `java.lang.invoke.MethodHandle`
        fn add_method_handle / get_or_add_method_handle(
            handle_kind: HandleKind,
            member: ConstantIndex
        ) -> MethodHandleConstantIndex
        in method_handles[(handle_kind, member)] = Constant::MethodHandle { handle_kind, member };
    }

    constant_kind! {
        fn add_method_type / get_or_add_method_type(
            descriptor: Utf8ConstantIndex
        ) -> MethodTypeConstantIndex
        in method_types[descriptor] = Constant::MethodType { descriptor };
    }

    constant_kind! {
        /// Dynamically-computed constant
        fn add_dynamic / get_or_add_dynamic(
            bootstrap_method: u16,
            name_and_type: NameAndTypeConstantIndex
        ) -> DynamicConstantIndex
        in dynamics[(bootstrap_method, name_and_type)] =
            Constant::Dynamic { bootstrap_method, name_and_type };
    }

    constant_kind! {
        /// Dynamically-computed call site
        fn add_invoke_dynamic / get_or_add_invoke_dynamic(
            bootstrap_method: u16,
            name_and_type: NameAndTypeConstantIndex
        ) -> InvokeDynamicConstantIndex
        in invoke_dynamics[(bootstrap_method, name_and_type)] =
            Constant::InvokeDynamic { bootstrap_method, name_and_type };
    }

    constant_kind! {
        fn add_module / get_or_add_module(name: Utf8ConstantIndex) -> ModuleConstantIndex
        in modules[name] = Constant::Module(name);
    }

    constant_kind! {
        fn add_package / get_or_add_package(name: Utf8ConstantIndex) -> PackageConstantIndex
        in packages[name] = Constant::Package(name);
    }

    /// Get or insert a class constant by its binary name (eg. `java/lang/Object`)
    pub fn get_or_add_class_named(&mut self, name: &str) -> Result<ClassConstantIndex, Error> {
        let name = self.get_or_add_utf8(name)?;
        self.get_or_add_class(name)
    }

    /// Get or insert a `java.lang.String` constant with the given contents
    pub fn get_or_add_string_literal(&mut self, text: &str) -> Result<StringConstantIndex, Error> {
        let utf8 = self.get_or_add_utf8(text)?;
        self.get_or_add_string(utf8)
    }

    pub fn get_or_add_name_and_type_named(
        &mut self,
        name: &str,
        descriptor: &str,
    ) -> Result<NameAndTypeConstantIndex, Error> {
        let name = self.get_or_add_utf8(name)?;
        let descriptor = self.get_or_add_utf8(descriptor)?;
        self.get_or_add_name_and_type(name, descriptor)
    }

    pub fn get_or_add_field_ref_named(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<FieldRefConstantIndex, Error> {
        let class = self.get_or_add_class_named(class)?;
        let name_and_type = self.get_or_add_name_and_type_named(name, descriptor)?;
        self.get_or_add_field_ref(class, name_and_type)
    }

    pub fn get_or_add_method_ref_named(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<MethodRefConstantIndex, Error> {
        let class = self.get_or_add_class_named(class)?;
        let name_and_type = self.get_or_add_name_and_type_named(name, descriptor)?;
        self.get_or_add_method_ref(class, name_and_type)
    }

    pub fn get_or_add_interface_method_ref_named(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<InterfaceMethodRefConstantIndex, Error> {
        let class = self.get_or_add_class_named(class)?;
        let name_and_type = self.get_or_add_name_and_type_named(name, descriptor)?;
        self.get_or_add_interface_method_ref(class, name_and_type)
    }

    /// Encode an attribute, interning its name in the constant pool
    pub fn get_attribute<A: AttributeLike>(&mut self, attribute: A) -> Result<Attribute, Error> {
        let name_index = self.get_or_add_utf8(A::NAME)?;
        let mut info = self.encoded.sibling();
        attribute.serialize(&mut info)?;
        Ok(Attribute { name_index, info })
    }

    /// Write the `constant_pool_count` followed by all of the constants
    ///
    /// The encoded constants get spliced onto `out`, so the table can't accept new constants
    /// after this.
    pub fn serialize(&mut self, out: &mut BufferChain) -> Result<(), Error> {
        log::debug!(
            "constant pool: {} constants in {} slots ({} bytes)",
            self.entries.len(),
            self.slot_count(),
            self.encoded.count()
        );
        out.write_u16(self.next_index)?;
        out.link_suffix(&mut self.encoded)
    }
}

/// Constants as in the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),

    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),

    Class(Utf8ConstantIndex),
    String(Utf8ConstantIndex),

    FieldRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
    },
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
    },
    InterfaceMethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
    },

    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    MethodHandle {
        handle_kind: HandleKind,

        /// Depending on the method kind, this points to different things:
        ///
        ///   - `FieldRef` for `GetField`, `GetStatic`, `PutField`, `PutStatic`
        ///   - `MethodRef` or `InterfaceMethodRef` for the rest
        member: ConstantIndex,
    },

    MethodType {
        descriptor: Utf8ConstantIndex,
    },

    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: NameAndTypeConstantIndex,
    },

    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: NameAndTypeConstantIndex,
    },

    Module(Utf8ConstantIndex),
    Package(Utf8ConstantIndex),
}

impl Constant {
    pub const UTF8_TAG: u8 = 1;
    pub const INTEGER_TAG: u8 = 3;
    pub const FLOAT_TAG: u8 = 4;
    pub const LONG_TAG: u8 = 5;
    pub const DOUBLE_TAG: u8 = 6;
    pub const CLASS_TAG: u8 = 7;
    pub const STRING_TAG: u8 = 8;
    pub const FIELD_REF_TAG: u8 = 9;
    pub const METHOD_REF_TAG: u8 = 10;
    pub const INTERFACE_METHOD_REF_TAG: u8 = 11;
    pub const NAME_AND_TYPE_TAG: u8 = 12;
    pub const METHOD_HANDLE_TAG: u8 = 15;
    pub const METHOD_TYPE_TAG: u8 = 16;
    pub const DYNAMIC_TAG: u8 = 17;
    pub const INVOKE_DYNAMIC_TAG: u8 = 18;
    pub const MODULE_TAG: u8 = 19;
    pub const PACKAGE_TAG: u8 = 20;

    pub fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) => Constant::UTF8_TAG,
            Constant::Integer(_) => Constant::INTEGER_TAG,
            Constant::Float(_) => Constant::FLOAT_TAG,
            Constant::Long(_) => Constant::LONG_TAG,
            Constant::Double(_) => Constant::DOUBLE_TAG,
            Constant::Class(_) => Constant::CLASS_TAG,
            Constant::String(_) => Constant::STRING_TAG,
            Constant::FieldRef { .. } => Constant::FIELD_REF_TAG,
            Constant::MethodRef { .. } => Constant::METHOD_REF_TAG,
            Constant::InterfaceMethodRef { .. } => Constant::INTERFACE_METHOD_REF_TAG,
            Constant::NameAndType { .. } => Constant::NAME_AND_TYPE_TAG,
            Constant::MethodHandle { .. } => Constant::METHOD_HANDLE_TAG,
            Constant::MethodType { .. } => Constant::METHOD_TYPE_TAG,
            Constant::Dynamic { .. } => Constant::DYNAMIC_TAG,
            Constant::InvokeDynamic { .. } => Constant::INVOKE_DYNAMIC_TAG,
            Constant::Module(_) => Constant::MODULE_TAG,
            Constant::Package(_) => Constant::PACKAGE_TAG,
        }
    }

    /// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`.
    /// Quoting JVMS §4.4.5:
    ///
    /// > All 8-byte constants take up two entries in the constant_pool table of the class file.
    /// > If a CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the
    /// > constant_pool table at index n, then the next usable item in the pool is located at
    /// > index n+2. The constant_pool index n+1 must be valid but is considered unusable.
    pub fn width(&self) -> u16 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    /// Write the tag and body of the constant
    fn encode(&self, out: &mut BufferChain, variant: Mutf8Variant) -> Result<(), Error> {
        match self {
            Constant::Utf8(text) => {
                let bytes = encode_modified_utf8(text, variant);
                let len = super::table_len("Utf8 constant", bytes.len())?;
                out.write_u8(self.tag())?;
                out.write_u16(len)?;
                out.write_bytes(&bytes)?;
            }
            Constant::Integer(integer) => {
                out.write_u8(self.tag())?;
                out.write_i32(*integer)?;
            }
            Constant::Float(float) => {
                out.write_u8(self.tag())?;
                out.write_f32(*float)?;
            }
            Constant::Long(long) => {
                out.write_u8(self.tag())?;
                out.write_i64(*long)?;
            }
            Constant::Double(double) => {
                out.write_u8(self.tag())?;
                out.write_f64(*double)?;
            }
            Constant::Class(name)
            | Constant::String(name)
            | Constant::MethodType { descriptor: name }
            | Constant::Module(name)
            | Constant::Package(name) => {
                out.write_u8(self.tag())?;
                name.serialize(out)?;
            }
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
                out.write_u8(self.tag())?;
                class.serialize(out)?;
                name_and_type.serialize(out)?;
            }
            Constant::NameAndType { name, descriptor } => {
                out.write_u8(self.tag())?;
                name.serialize(out)?;
                descriptor.serialize(out)?;
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                out.write_u8(self.tag())?;
                out.write_u8(handle_kind.reference_kind())?;
                member.serialize(out)?;
            }
            Constant::Dynamic {
                bootstrap_method,
                name_and_type,
            }
            | Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                out.write_u8(self.tag())?;
                out.write_u16(*bootstrap_method)?;
                name_and_type.serialize(out)?;
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Debug)]
pub struct ConstantIndex(pub u16);

impl Serialize for ConstantIndex {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        out.write_u16(self.0)
    }
}

macro_rules! typed_constant_indices {
    ($($(#[$attr:meta])* $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
            pub struct $name(pub ConstantIndex);

            impl From<ConstantIndex> for $name {
                fn from(index: ConstantIndex) -> $name {
                    $name(index)
                }
            }

            impl From<$name> for ConstantIndex {
                fn from(index: $name) -> ConstantIndex {
                    index.0
                }
            }

            impl Serialize for $name {
                fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
                    self.0.serialize(out)
                }
            }
        )*
    };
}

typed_constant_indices! {
    Utf8ConstantIndex;
    ClassConstantIndex;
    StringConstantIndex;
    FieldRefConstantIndex;
    MethodRefConstantIndex;
    InterfaceMethodRefConstantIndex;
    NameAndTypeConstantIndex;
    MethodHandleConstantIndex;
    MethodTypeConstantIndex;
    DynamicConstantIndex;
    InvokeDynamicConstantIndex;
    ModuleConstantIndex;
    PackageConstantIndex;
}

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    /// Value of the `reference_kind` byte
    pub fn reference_kind(self) -> u8 {
        match self {
            HandleKind::GetField => 1,
            HandleKind::GetStatic => 2,
            HandleKind::PutField => 3,
            HandleKind::PutStatic => 4,
            HandleKind::InvokeVirtual => 5,
            HandleKind::InvokeStatic => 6,
            HandleKind::InvokeSpecial => 7,
            HandleKind::NewInvokeSpecial => 8,
            HandleKind::InvokeInterface => 9,
        }
    }

    pub fn from_reference_kind(kind: u8) -> Option<HandleKind> {
        Some(match kind {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::ErrorKind;

    fn serialized(mut table: SymbolTable) -> Vec<u8> {
        let mut out = BufferChain::new();
        table.serialize(&mut out).unwrap();
        out.to_vec().unwrap()
    }

    #[test]
    fn utf8_is_deduplicated() {
        let mut table = SymbolTable::new(Version::JAVA8);
        let first = table.get_or_add_utf8("x").unwrap();
        let second = table.get_or_add_utf8("x").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Utf8ConstantIndex(ConstantIndex(1)));
        assert_eq!(serialized(table), vec![0, 2, 1, 0, 1, b'x']);
    }

    #[test]
    fn add_always_inserts() {
        let mut table = SymbolTable::new(Version::JAVA8);
        let first = table.add_utf8("dup").unwrap();
        let second = table.add_utf8("dup").unwrap();
        assert_ne!(first, second);

        // Lookups keep returning the first entry
        assert_eq!(table.get_or_add_utf8("dup").unwrap(), first);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn signed_zeroes_are_distinct() {
        let mut table = SymbolTable::new(Version::JAVA8);
        let positive = table.get_or_add_double(0.0).unwrap();
        let negative = table.get_or_add_double(-0.0).unwrap();
        assert_ne!(positive, negative);
        assert_eq!(table.get_or_add_double(-0.0).unwrap(), negative);

        let positive = table.get_or_add_float(0.0).unwrap();
        let negative = table.get_or_add_float(-0.0).unwrap();
        assert_ne!(positive, negative);
    }

    #[test]
    fn floats_are_compared_by_bits() {
        let mut table = SymbolTable::new(Version::JAVA8);
        let nan = table.get_or_add_float(f32::NAN).unwrap();
        assert_eq!(table.get_or_add_float(f32::from_bits(f32::NAN.to_bits())).unwrap(), nan);

        let other_nan = f32::from_bits(f32::NAN.to_bits() | 1);
        assert_ne!(table.get_or_add_float(other_nan).unwrap(), nan);
        assert_eq!(table.get_or_add_float(1.5).unwrap(), table.get_or_add_float(1.5).unwrap());
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let mut table = SymbolTable::new(Version::JAVA8);
        assert_eq!(table.add_long(7).unwrap(), ConstantIndex(1));
        assert_eq!(table.add_double(2.5).unwrap(), ConstantIndex(3));
        assert_eq!(table.add_integer(9).unwrap(), ConstantIndex(5));
        assert_eq!(table.slot_count(), 5);
        assert_eq!(table.get(ConstantIndex(3)), Some(&Constant::Double(2.5)));
        assert_eq!(table.get(ConstantIndex(2)), None);

        let bytes = serialized(table);
        assert_eq!(&bytes[..2], &[0, 6]);
        assert_eq!(&bytes[2..11], &[5, 0, 0, 0, 0, 0, 0, 0, 7]);
    }

    #[test]
    fn composite_constants_share_parts() {
        let mut table = SymbolTable::new(Version::JAVA8);
        let out = table
            .get_or_add_field_ref_named("java/lang/System", "out", "Ljava/io/PrintStream;")
            .unwrap();
        let err = table
            .get_or_add_field_ref_named("java/lang/System", "err", "Ljava/io/PrintStream;")
            .unwrap();
        assert_ne!(out, err);
        assert_eq!(
            table
                .get_or_add_field_ref_named("java/lang/System", "out", "Ljava/io/PrintStream;")
                .unwrap(),
            out
        );

        // utf8 x4 (class name, out, descriptor, err), class, 2 name and types, 2 field refs
        assert_eq!(table.len(), 9);
        let classes = table
            .entries()
            .filter(|(_, constant)| matches!(constant, Constant::Class(_)))
            .count();
        assert_eq!(classes, 1);
    }

    #[test]
    fn method_and_interface_method_refs_are_separate() {
        let mut table = SymbolTable::new(Version::JAVA8);
        let method = table
            .get_or_add_method_ref_named("java/util/List", "size", "()I")
            .unwrap();
        let interface_method = table
            .get_or_add_interface_method_ref_named("java/util/List", "size", "()I")
            .unwrap();
        assert_ne!(ConstantIndex::from(method), ConstantIndex::from(interface_method));
        assert_eq!(
            table.get(interface_method.into()).map(Constant::tag),
            Some(Constant::INTERFACE_METHOD_REF_TAG)
        );
    }

    #[test]
    fn legacy_versions_use_four_byte_utf8() {
        let mut table = SymbolTable::new(Version::JAVA1_1);
        table.add_utf8("\u{1F600}").unwrap();
        assert_eq!(serialized(table), vec![0, 2, 1, 0, 4, 0xF0, 0x9F, 0x98, 0x80]);
    }

    #[test]
    fn pool_overflow() {
        let mut table = SymbolTable::new(Version::JAVA8);
        for value in 0..65533 {
            table.add_integer(value).unwrap();
        }
        assert_eq!(table.slot_count(), 65533);

        let err = table.add_double(1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeExceeded);

        assert_eq!(table.add_integer(-1).unwrap(), ConstantIndex(65534));
        let err = table.add_integer(-2).unwrap_err();
        assert!(matches!(err, Error::ConstantPoolOverflow { offset: 65535, .. }));
    }

    #[test]
    fn no_constants_after_serialize() {
        let mut table = SymbolTable::new(Version::JAVA8);
        table.add_integer(1).unwrap();
        table.serialize(&mut BufferChain::new()).unwrap();
        let err = table.add_integer(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
