use crate::reader::ReadError;

/// Flavour of modified UTF-8 used in `Utf8` constants
///
/// Both flavours encode `\u{0000}` in 2-byte format and BMP characters the same way as UTF-8.
/// They differ in how supplementary characters are encoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mutf8Variant {
    /// Supplementary characters are represented as surrogate pairs (major version 48 and up)
    Standard,

    /// Supplementary characters are written as 4-byte UTF-8 (older class files)
    Legacy,
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str, variant: Mutf8Variant) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(string.len());
    for c in string.chars() {
        let code = c as u32;
        match c.len_utf8() {
            _ if code == 0 => buffer.extend_from_slice(&[0xC0, 0x80]),
            1 => buffer.push(code as u8),
            2 | 3 => push_bmp(&mut buffer, code),
            _ if variant == Mutf8Variant::Legacy => {
                let mut utf8 = [0u8; 4];
                buffer.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
            _ => {
                let offset = code - 0x10000;
                push_bmp(&mut buffer, 0xD800 + (offset >> 10));
                push_bmp(&mut buffer, 0xDC00 + (offset & 0x3FF));
            }
        }
    }
    buffer
}

/// Push the 2 or 3 byte encoding of a code unit below `0x10000`
fn push_bmp(buffer: &mut Vec<u8>, code: u32) {
    if code < 0x800 {
        buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
        buffer.push((code & 0x3F) as u8 | 0b1000_0000);
    } else {
        buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
        buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
        buffer.push((code & 0x3F) as u8 | 0b1000_0000);
    }
}

/// Inverse of [`encode_modified_utf8`]
///
/// Raw `00` bytes, truncated or malformed sequences, and unpaired surrogates are rejected. The
/// legacy variant additionally accepts 4-byte sequences.
pub fn decode_modified_utf8(bytes: &[u8], variant: Mutf8Variant) -> Result<String, ReadError> {
    let mut string = String::with_capacity(bytes.len());
    let mut offset = 0;
    while offset < bytes.len() {
        let start = offset;
        let bad = || ReadError::BadModifiedUtf8 { offset: start };
        let (mut code, len) = decode_sequence(bytes, offset, variant)?;
        offset += len;

        if (0xD800..0xDC00).contains(&code) {
            let (low, low_len) = decode_sequence(bytes, offset, variant).map_err(|_| bad())?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(bad());
            }
            offset += low_len;
            code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
        }

        string.push(char::from_u32(code).ok_or_else(bad)?);
    }
    Ok(string)
}

/// Decode one code unit starting at `offset`, returning it along with its encoded length
fn decode_sequence(
    bytes: &[u8],
    offset: usize,
    variant: Mutf8Variant,
) -> Result<(u32, usize), ReadError> {
    let bad = || ReadError::BadModifiedUtf8 { offset };
    let lead = *bytes.get(offset).ok_or_else(bad)?;
    let (initial, len) = match lead {
        0x01..=0x7F => return Ok((lead as u32, 1)),
        0xC0..=0xDF => ((lead & 0x1F) as u32, 2),
        0xE0..=0xEF => ((lead & 0x0F) as u32, 3),
        0xF0..=0xF7 if variant == Mutf8Variant::Legacy => ((lead & 0x07) as u32, 4),
        _ => return Err(bad()),
    };

    let mut code = initial;
    for index in offset + 1..offset + len {
        match bytes.get(index) {
            Some(byte) if byte & 0b1100_0000 == 0b1000_0000 => {
                code = code << 6 | (byte & 0x3F) as u32;
            }
            _ => return Err(bad()),
        }
    }
    Ok((code, len))
}

#[cfg(test)]
mod test {
    use super::*;
    use Mutf8Variant::*;

    #[test]
    fn null_character_is_two_bytes() {
        assert_eq!(encode_modified_utf8("x\0y", Standard), vec![0x78, 0xC0, 0x80, 0x79]);
        assert_eq!(encode_modified_utf8("\0", Legacy), vec![0xC0, 0x80]);
    }

    #[test]
    fn ascii_is_unchanged() {
        assert_eq!(
            encode_modified_utf8("java/lang/Object", Standard),
            b"java/lang/Object".to_vec()
        );
    }

    #[test]
    fn two_and_three_byte_encodings() {
        assert_eq!(encode_modified_utf8("é", Standard), vec![0xC3, 0xA9]);
        assert_eq!(encode_modified_utf8("ǞӒ", Standard), vec![199, 158, 211, 146]);
        assert_eq!(
            encode_modified_utf8("अ€", Standard),
            vec![0xE0, 0xA4, 0x85, 0xE2, 0x82, 0xAC]
        );
    }

    #[test]
    fn supplementary_characters_as_surrogate_pairs() {
        assert_eq!(
            encode_modified_utf8("\u{10000}\u{dffff}", Standard),
            vec![237, 160, 128, 237, 176, 128, 237, 172, 191, 237, 191, 191]
        );
    }

    #[test]
    fn supplementary_characters_in_legacy_variant() {
        assert_eq!(
            encode_modified_utf8("a\u{1F600}", Legacy),
            vec![0x61, 0xF0, 0x9F, 0x98, 0x80]
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let text = "nul\0 é € \u{1F600} \u{10FFFF}";
        for variant in [Standard, Legacy] {
            let bytes = encode_modified_utf8(text, variant);
            assert_eq!(decode_modified_utf8(&bytes, variant).unwrap(), text);
        }
    }

    #[test]
    fn decode_rejects_malformed_input() {
        let reject = |bytes: &[u8], variant| decode_modified_utf8(bytes, variant).unwrap_err();

        assert!(matches!(reject(&[0x61, 0x00], Standard), ReadError::BadModifiedUtf8 { offset: 1 }));
        assert!(matches!(reject(&[0xE2, 0x82], Standard), ReadError::BadModifiedUtf8 { offset: 0 }));
        assert!(matches!(reject(&[0x80], Standard), ReadError::BadModifiedUtf8 { .. }));

        // Unpaired surrogates
        assert!(matches!(reject(&[237, 160, 128], Standard), ReadError::BadModifiedUtf8 { .. }));
        assert!(matches!(reject(&[237, 176, 128], Standard), ReadError::BadModifiedUtf8 { .. }));

        // 4-byte sequences only exist in the legacy variant
        assert!(matches!(
            reject(&[0xF0, 0x9F, 0x98, 0x80], Standard),
            ReadError::BadModifiedUtf8 { .. }
        ));
    }
}
