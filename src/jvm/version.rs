use super::{Error, Mutf8Variant, Serialize};
use crate::buffer::BufferChain;

/// Version of the class file, which is used to verify that the JVM has the
/// necessary features to interpret the class
///
/// Apart from being written in the header, the version only affects how `Utf8` constants are
/// encoded (see [`Mutf8Variant`]).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Version {
    pub major_version: u16,
    pub minor_version: u16,
}

impl Version {
    /// JDK 1.1
    pub const JAVA1_1: Version = Version {
        major_version: 45,
        minor_version: 3,
    };

    /// J2SE 1.4, the first version using surrogate pairs for supplementary characters
    pub const JAVA1_4: Version = Version {
        major_version: 48,
        minor_version: 0,
    };

    /// JVM class file version corresponding to Java SE 8 (released March 2014)
    pub const JAVA8: Version = Version {
        major_version: 52,
        minor_version: 0,
    };

    pub const JAVA11: Version = Version {
        major_version: 55,
        minor_version: 0,
    };

    pub const JAVA17: Version = Version {
        major_version: 61,
        minor_version: 0,
    };

    pub fn new(major_version: u16, minor_version: u16) -> Version {
        Version {
            major_version,
            minor_version,
        }
    }

    /// Flavour of modified UTF-8 used for `Utf8` constants in this version
    pub fn mutf8_variant(&self) -> Mutf8Variant {
        if self.major_version >= Version::JAVA1_4.major_version {
            Mutf8Variant::Standard
        } else {
            Mutf8Variant::Legacy
        }
    }
}

impl Serialize for Version {
    fn serialize(self, out: &mut BufferChain) -> Result<(), Error> {
        out.write_u16(self.minor_version)?;
        out.write_u16(self.major_version)?;
        Ok(())
    }
}
