use log::debug;

/// A text encoding recognized by the reader.
///
/// The writer always emits UTF-8; this enumeration governs how input bytes
/// are decoded into Unicode scalars.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// UTF-8, the default.
    Utf8,
    /// UTF-16, little endian.
    Utf16Le,
    /// UTF-16, big endian.
    Utf16Be,
    /// UTF-32, little endian.
    Utf32Le,
    /// UTF-32, big endian.
    Utf32Be,
    /// Strict 7-bit ASCII. Any byte with its high bit set is rejected.
    Ascii,
}

impl Encoding {
    /// The byte-order mark for this encoding, when one exists.
    pub fn bom(&self) -> &'static [u8] {
        match *self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16Be => &[0xFE, 0xFF],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            Encoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Encoding::Ascii => &[],
        }
    }
}

/// The outcome of sniffing the leading bytes of an input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Detection {
    /// The detected encoding, or `None` when the prefix is neither a BOM
    /// nor valid UTF-8.
    pub encoding: Option<Encoding>,
    /// The number of leading bytes consumed by a BOM. `0` when no BOM was
    /// found.
    pub bom_len: usize,
}

/// Inspect the leading bytes of an input and choose an encoding.
///
/// At most four leading bytes are considered for a BOM. UTF-32-LE wins
/// over UTF-16-LE when the longer mark is present. Without a BOM, the
/// whole prefix is classified as ASCII when every byte has its high bit
/// clear, and is otherwise validated as UTF-8. A prefix that fails UTF-8
/// validation yields `encoding: None`, and the caller must fall back to a
/// presumed encoding or report a configuration error.
///
/// The prefix may end mid-scalar; an incomplete trailing sequence is not
/// treated as a validation failure.
pub fn detect(prefix: &[u8]) -> Detection {
    // Longest BOMs first: FF FE 00 00 must be checked before FF FE.
    const BOMS: &[(Encoding, &[u8])] = &[
        (Encoding::Utf32Be, &[0x00, 0x00, 0xFE, 0xFF]),
        (Encoding::Utf32Le, &[0xFF, 0xFE, 0x00, 0x00]),
        (Encoding::Utf8, &[0xEF, 0xBB, 0xBF]),
        (Encoding::Utf16Be, &[0xFE, 0xFF]),
        (Encoding::Utf16Le, &[0xFF, 0xFE]),
    ];
    for &(encoding, bom) in BOMS {
        if prefix.starts_with(bom) {
            debug!("detected {:?} from byte-order mark", encoding);
            return Detection { encoding: Some(encoding), bom_len: bom.len() };
        }
    }
    if prefix.iter().all(|&b| b < 0x80) {
        return Detection { encoding: Some(Encoding::Ascii), bom_len: 0 };
    }
    let encoding = if validate_utf8_prefix(prefix) {
        Some(Encoding::Utf8)
    } else {
        debug!("input prefix is neither a BOM nor valid UTF-8");
        None
    };
    Detection { encoding, bom_len: 0 }
}

/// Validates `prefix` as UTF-8, permitting a truncated final sequence.
fn validate_utf8_prefix(prefix: &[u8]) -> bool {
    let mut i = 0;
    while i < prefix.len() {
        let rest = &prefix[i..];
        match decode_utf8(rest) {
            Utf8Step::Scalar { len, .. } => i += len,
            Utf8Step::Incomplete => return true,
            Utf8Step::Invalid => return false,
        }
    }
    true
}

pub(crate) enum Utf8Step {
    Scalar { scalar: char, len: usize },
    Incomplete,
    Invalid,
}

/// Decode a single scalar from the front of `bytes`.
///
/// Standard rules: 2/3/4-byte lead bytes with 10xxxxxx continuations;
/// overlong forms, surrogate code points and values above U+10FFFF are
/// invalid.
pub(crate) fn decode_utf8(bytes: &[u8]) -> Utf8Step {
    let b0 = match bytes.first() {
        None => return Utf8Step::Incomplete,
        Some(&b) => b,
    };
    let len = match b0 {
        0x00..=0x7F => {
            return Utf8Step::Scalar { scalar: b0 as char, len: 1 };
        }
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        // 0x80..=0xBF are bare continuations; 0xC0/0xC1 and 0xF5..=0xFF
        // can only start overlong or out-of-range sequences.
        _ => return Utf8Step::Invalid,
    };
    if bytes.len() < len {
        // Only incomplete if every present continuation byte is plausible.
        for &b in &bytes[1..] {
            if b & 0b1100_0000 != 0b1000_0000 {
                return Utf8Step::Invalid;
            }
        }
        return Utf8Step::Incomplete;
    }
    let mut value = (b0 as u32) & (0x7F >> len);
    for &b in &bytes[1..len] {
        if b & 0b1100_0000 != 0b1000_0000 {
            return Utf8Step::Invalid;
        }
        value = (value << 6) | (b as u32 & 0b0011_1111);
    }
    let overlong = match len {
        2 => value < 0x80,
        3 => value < 0x800,
        _ => value < 0x1_0000,
    };
    if overlong || (0xD800..=0xDFFF).contains(&value) || value > 0x10_FFFF {
        return Utf8Step::Invalid;
    }
    // The range checks above are exactly the scalar-value invariant.
    let scalar = std::char::from_u32(value).unwrap();
    Utf8Step::Scalar { scalar, len }
}

#[cfg(test)]
mod tests {
    use super::{detect, Detection, Encoding};

    macro_rules! detects {
        ($name:ident, $bytes:expr, $enc:expr, $bom:expr) => {
            #[test]
            fn $name() {
                let expected =
                    Detection { encoding: $enc, bom_len: $bom };
                assert_eq!(expected, detect($bytes));
            }
        };
    }

    detects!(utf8_bom, b"\xEF\xBB\xBFa,b", Some(Encoding::Utf8), 3);
    detects!(utf16_be_bom, b"\xFE\xFF\x00a", Some(Encoding::Utf16Be), 2);
    detects!(utf16_le_bom, b"\xFF\xFEa\x00", Some(Encoding::Utf16Le), 2);
    detects!(
        utf32_be_bom,
        b"\x00\x00\xFE\xFF\x00\x00\x00a",
        Some(Encoding::Utf32Be),
        4
    );
    detects!(
        utf32_le_bom,
        b"\xFF\xFE\x00\x00a\x00\x00\x00",
        Some(Encoding::Utf32Le),
        4
    );
    // The UTF-32-LE BOM starts with the UTF-16-LE BOM; the longer match
    // must win.
    detects!(
        utf32_le_beats_utf16_le,
        b"\xFF\xFE\x00\x00",
        Some(Encoding::Utf32Le),
        4
    );
    detects!(utf16_le_short, b"\xFF\xFE", Some(Encoding::Utf16Le), 2);

    detects!(ascii, b"a,b,c\n1,2,3\n", Some(Encoding::Ascii), 0);
    detects!(empty, b"", Some(Encoding::Ascii), 0);
    detects!(utf8_no_bom, "α,β\n".as_bytes(), Some(Encoding::Utf8), 0);
    detects!(utf8_truncated_tail, b"a,\xCE", Some(Encoding::Utf8), 0);

    detects!(invalid_continuation, b"a,\xCE\xCE", None, 0);
    detects!(overlong_two_byte, b"\xC0\xAF", None, 0);
    detects!(surrogate, b"\xED\xA0\x80", None, 0);
    detects!(above_max_scalar, b"\xF5\x80\x80\x80", None, 0);
    detects!(bare_continuation, b"\x80abc", None, 0);
}
