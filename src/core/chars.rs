//! Character Classification and UTF-8 Decoding
//!
//! Answers three questions per code point (XML 1.0, 4th edition classes):
//! - is it a legal XML Char
//! - may it start a Name
//! - may it appear inside a Name
//!
//! Code points below `CHAR_TABLE_SIZE` are looked up in a table built at
//! compile time. Without the `full-char-table` feature only Latin-1 is
//! tabled and any legal character above it is accepted as a name character.

use crate::error::ErrorKind;

/// Number of code points classified by table lookup
#[cfg(not(feature = "full-char-table"))]
pub const CHAR_TABLE_SIZE: u32 = 0x100;

#[cfg(feature = "full-char-table")]
pub const CHAR_TABLE_SIZE: u32 = 0x11_0000;

/// Bit set of character classes for one code point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharClass(u8);

impl CharClass {
    pub const NONE: CharClass = CharClass(0);
    /// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
    pub const XML_CHAR: CharClass = CharClass(1);
    /// Letter | '_' | ':'
    pub const NAME_START: CharClass = CharClass(2);
    /// Letter | Digit | '.' | '-' | '_' | ':' | CombiningChar | Extender
    pub const NAME_CHAR: CharClass = CharClass(4);

    #[inline]
    pub const fn contains(self, other: CharClass) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: CharClass) -> CharClass {
        CharClass(self.0 | other.0)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

static LATIN1: [u8; 256] = build_latin1_table();

const fn build_latin1_table() -> [u8; 256] {
    let xml = CharClass::XML_CHAR.0;
    let start = CharClass::NAME_START.0;
    let name = CharClass::NAME_CHAR.0;

    let mut table = [0u8; 256];
    let mut c = 0usize;
    while c < 256 {
        let mut bits = 0u8;
        if c == 0x9 || c == 0xA || c == 0xD || c >= 0x20 {
            bits |= xml;
        }
        let letter = matches!(c, 0x41..=0x5A | 0x61..=0x7A | 0xC0..=0xD6 | 0xD8..=0xF6 | 0xF8..=0xFF);
        if letter || c == b'_' as usize || c == b':' as usize {
            bits |= start | name;
        }
        // Digits, '.', '-' and the Latin-1 extender (middle dot)
        if matches!(c, 0x30..=0x39 | 0x2D | 0x2E | 0xB7) {
            bits |= name;
        }
        table[c] = bits;
        c += 1;
    }
    table
}

/// Check if a code point is a legal XML 1.0 Char
#[inline]
pub fn is_xml_char(cp: u32) -> bool {
    matches!(cp,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Classify a code point
pub fn char_class(cp: u32) -> CharClass {
    if cp < 0x100 {
        return CharClass(LATIN1[cp as usize]);
    }
    if !is_xml_char(cp) {
        return CharClass::NONE;
    }

    #[cfg(feature = "full-char-table")]
    {
        classify_unicode(cp)
    }

    // Above the Latin-1 table every legal character counts as a letter
    #[cfg(not(feature = "full-char-table"))]
    {
        CharClass::XML_CHAR
            .union(CharClass::NAME_START)
            .union(CharClass::NAME_CHAR)
    }
}

#[cfg(feature = "full-char-table")]
fn classify_unicode(cp: u32) -> CharClass {
    let mut class = CharClass::XML_CHAR;
    if is_base_char(cp) || is_ideographic(cp) {
        class = class.union(CharClass::NAME_START).union(CharClass::NAME_CHAR);
    } else if is_digit_codepoint(cp) || is_combining_char(cp) || is_extender(cp) {
        class = class.union(CharClass::NAME_CHAR);
    }
    class
}

#[inline]
pub fn is_name_start_char(cp: u32) -> bool {
    char_class(cp).contains(CharClass::NAME_START)
}

#[inline]
pub fn is_name_char(cp: u32) -> bool {
    char_class(cp).contains(CharClass::NAME_CHAR)
}

/// Decode one code point starting at `*pos`, advancing past it.
///
/// On malformed input returns `InvalidEncoding` and advances past the lead
/// byte and any continuation bytes that were consumed, never past the end
/// of `input`, so a caller can keep scanning. Surrogate code points decode
/// normally and are left for `is_xml_char` to reject.
pub fn next_unicode_char(input: &[u8], pos: &mut usize) -> Result<u32, ErrorKind> {
    let start = *pos;
    let Some(&lead) = input.get(start) else {
        return Err(ErrorKind::InvalidEncoding);
    };

    if lead < 0x80 {
        *pos = start + 1;
        return Ok(lead as u32);
    }

    let (len, init, min) = match lead {
        0xC2..=0xDF => (2, (lead & 0x1F) as u32, 0x80),
        0xE0..=0xEF => (3, (lead & 0x0F) as u32, 0x800),
        0xF0..=0xF4 => (4, (lead & 0x07) as u32, 0x10000),
        // Stray continuation byte, overlong 2-byte lead, or out of range lead
        _ => {
            *pos = start + 1;
            return Err(ErrorKind::InvalidEncoding);
        }
    };

    let mut cp = init;
    let mut i = 1;
    while i < len {
        match input.get(start + i) {
            Some(&b) if b & 0xC0 == 0x80 => cp = (cp << 6) | (b & 0x3F) as u32,
            _ => {
                *pos = start + i;
                return Err(ErrorKind::InvalidEncoding);
            }
        }
        i += 1;
    }

    *pos = start + len;
    if cp < min || cp > 0x10FFFF {
        return Err(ErrorKind::InvalidEncoding);
    }
    Ok(cp)
}

/// Append the UTF-8 encoding of `cp` to `out`.
///
/// Returns false (and appends nothing) for surrogates and values beyond
/// U+10FFFF.
pub fn encode_utf8(cp: u32, out: &mut Vec<u8>) -> bool {
    match char::from_u32(cp) {
        Some(c) => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            true
        }
        None => false,
    }
}

/// Scan a buffer of supposed UTF-8 XML text.
///
/// The first problem found (lowest offset) decides the error.
pub fn check_text(input: &[u8]) -> Result<(), ErrorKind> {
    let mut pos = 0;
    while pos < input.len() {
        let b = input[pos];
        if b < 0x80 {
            if b < 0x20 && b != 0x09 && b != 0x0A && b != 0x0D {
                return Err(ErrorKind::NonXmlCharacter);
            }
            pos += 1;
            continue;
        }
        let cp = next_unicode_char(input, &mut pos)?;
        if !is_xml_char(cp) {
            return Err(ErrorKind::NonXmlCharacter);
        }
    }
    Ok(())
}

// =============================================================================
// XML 1.0 (4th edition) Unicode tables
// =============================================================================

/// Check if codepoint is an XML 1.0 BaseChar
#[cfg(feature = "full-char-table")]
fn is_base_char(cp: u32) -> bool {
    matches!(cp,
        0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x00D6 | 0x00D8..=0x00F6 |
        0x00F8..=0x00FF | 0x0100..=0x0131 | 0x0134..=0x013E | 0x0141..=0x0148 |
        0x014A..=0x017E | 0x0180..=0x01C3 | 0x01CD..=0x01F0 | 0x01F4..=0x01F5 |
        0x01FA..=0x0217 | 0x0250..=0x02A8 | 0x02BB..=0x02C1 | 0x0386 |
        0x0388..=0x038A | 0x038C | 0x038E..=0x03A1 | 0x03A3..=0x03CE |
        0x03D0..=0x03D6 | 0x03DA | 0x03DC | 0x03DE | 0x03E0 | 0x03E2..=0x03F3 |
        0x0401..=0x040C | 0x040E..=0x044F | 0x0451..=0x045C | 0x045E..=0x0481 |
        0x0490..=0x04C4 | 0x04C7..=0x04C8 | 0x04CB..=0x04CC | 0x04D0..=0x04EB |
        0x04EE..=0x04F5 | 0x04F8..=0x04F9 | 0x0531..=0x0556 | 0x0559 |
        0x0561..=0x0586 | 0x05D0..=0x05EA | 0x05F0..=0x05F2 | 0x0621..=0x063A |
        0x0641..=0x064A | 0x0671..=0x06B7 | 0x06BA..=0x06BE | 0x06C0..=0x06CE |
        0x06D0..=0x06D3 | 0x06D5 | 0x06E5..=0x06E6 | 0x0905..=0x0939 | 0x093D |
        0x0958..=0x0961 | 0x0985..=0x098C | 0x098F..=0x0990 | 0x0993..=0x09A8 |
        0x09AA..=0x09B0 | 0x09B2 | 0x09B6..=0x09B9 | 0x09DC..=0x09DD |
        0x09DF..=0x09E1 | 0x09F0..=0x09F1 | 0x0A05..=0x0A0A | 0x0A0F..=0x0A10 |
        0x0A13..=0x0A28 | 0x0A2A..=0x0A30 | 0x0A32..=0x0A33 | 0x0A35..=0x0A36 |
        0x0A38..=0x0A39 | 0x0A59..=0x0A5C | 0x0A5E | 0x0A72..=0x0A74 |
        0x0A85..=0x0A8B | 0x0A8D | 0x0A8F..=0x0A91 | 0x0A93..=0x0AA8 |
        0x0AAA..=0x0AB0 | 0x0AB2..=0x0AB3 | 0x0AB5..=0x0AB9 | 0x0ABD | 0x0AE0 |
        0x0B05..=0x0B0C | 0x0B0F..=0x0B10 | 0x0B13..=0x0B28 | 0x0B2A..=0x0B30 |
        0x0B32..=0x0B33 | 0x0B36..=0x0B39 | 0x0B3D | 0x0B5C..=0x0B5D |
        0x0B5F..=0x0B61 | 0x0B85..=0x0B8A | 0x0B8E..=0x0B90 | 0x0B92..=0x0B95 |
        0x0B99..=0x0B9A | 0x0B9C | 0x0B9E..=0x0B9F | 0x0BA3..=0x0BA4 |
        0x0BA8..=0x0BAA | 0x0BAE..=0x0BB5 | 0x0BB7..=0x0BB9 | 0x0C05..=0x0C0C |
        0x0C0E..=0x0C10 | 0x0C12..=0x0C28 | 0x0C2A..=0x0C33 | 0x0C35..=0x0C39 |
        0x0C60..=0x0C61 | 0x0C85..=0x0C8C | 0x0C8E..=0x0C90 | 0x0C92..=0x0CA8 |
        0x0CAA..=0x0CB3 | 0x0CB5..=0x0CB9 | 0x0CDE | 0x0CE0..=0x0CE1 |
        0x0D05..=0x0D0C | 0x0D0E..=0x0D10 | 0x0D12..=0x0D28 | 0x0D2A..=0x0D39 |
        0x0D60..=0x0D61 | 0x0E01..=0x0E2E | 0x0E30 | 0x0E32..=0x0E33 |
        0x0E40..=0x0E45 | 0x0E81..=0x0E82 | 0x0E84 | 0x0E87..=0x0E88 | 0x0E8A |
        0x0E8D | 0x0E94..=0x0E97 | 0x0E99..=0x0E9F | 0x0EA1..=0x0EA3 | 0x0EA5 |
        0x0EA7 | 0x0EAA..=0x0EAB | 0x0EAD..=0x0EAE | 0x0EB0 | 0x0EB2..=0x0EB3 |
        0x0EBD | 0x0EC0..=0x0EC4 | 0x0F40..=0x0F47 | 0x0F49..=0x0F69 |
        0x10A0..=0x10C5 | 0x10D0..=0x10F6 | 0x1100 | 0x1102..=0x1103 |
        0x1105..=0x1107 | 0x1109 | 0x110B..=0x110C | 0x110E..=0x1112 | 0x113C |
        0x113E | 0x1140 | 0x114C | 0x114E | 0x1150 | 0x1154..=0x1155 | 0x1159 |
        0x115F..=0x1161 | 0x1163 | 0x1165 | 0x1167 | 0x1169 | 0x116D..=0x116E |
        0x1172..=0x1173 | 0x1175 | 0x119E | 0x11A8 | 0x11AB | 0x11AE..=0x11AF |
        0x11B7..=0x11B8 | 0x11BA | 0x11BC..=0x11C2 | 0x11EB | 0x11F0 | 0x11F9 |
        0x1E00..=0x1E9B | 0x1EA0..=0x1EF9 | 0x1F00..=0x1F15 | 0x1F18..=0x1F1D |
        0x1F20..=0x1F45 | 0x1F48..=0x1F4D | 0x1F50..=0x1F57 | 0x1F59 | 0x1F5B |
        0x1F5D | 0x1F5F..=0x1F7D | 0x1F80..=0x1FB4 | 0x1FB6..=0x1FBC | 0x1FBE |
        0x1FC2..=0x1FC4 | 0x1FC6..=0x1FCC | 0x1FD0..=0x1FD3 | 0x1FD6..=0x1FDB |
        0x1FE0..=0x1FEC | 0x1FF2..=0x1FF4 | 0x1FF6..=0x1FFC | 0x2126 |
        0x212A..=0x212B | 0x212E | 0x2180..=0x2182 | 0x3041..=0x3094 |
        0x30A1..=0x30FA | 0x3105..=0x312C | 0xAC00..=0xD7A3
    )
}

/// Check if codepoint is an XML 1.0 Ideographic character
#[cfg(feature = "full-char-table")]
fn is_ideographic(cp: u32) -> bool {
    matches!(cp, 0x4E00..=0x9FA5 | 0x3007 | 0x3021..=0x3029)
}

/// Check if codepoint is an XML 1.0 CombiningChar
#[cfg(feature = "full-char-table")]
fn is_combining_char(cp: u32) -> bool {
    matches!(cp,
        0x0300..=0x0345 | 0x0360..=0x0361 | 0x0483..=0x0486 | 0x0591..=0x05A1 |
        0x05A3..=0x05B9 | 0x05BB..=0x05BD | 0x05BF | 0x05C1..=0x05C2 | 0x05C4 |
        0x064B..=0x0652 | 0x0670 | 0x06D6..=0x06DC | 0x06DD..=0x06DF |
        0x06E0..=0x06E4 | 0x06E7..=0x06E8 | 0x06EA..=0x06ED | 0x0901..=0x0903 |
        0x093C | 0x093E..=0x094C | 0x094D | 0x0951..=0x0954 | 0x0962..=0x0963 |
        0x0981..=0x0983 | 0x09BC | 0x09BE | 0x09BF | 0x09C0..=0x09C4 |
        0x09C7..=0x09C8 | 0x09CB..=0x09CD | 0x09D7 | 0x09E2..=0x09E3 | 0x0A02 |
        0x0A3C | 0x0A3E | 0x0A3F | 0x0A40..=0x0A42 | 0x0A47..=0x0A48 |
        0x0A4B..=0x0A4D | 0x0A70..=0x0A71 | 0x0A81..=0x0A83 | 0x0ABC |
        0x0ABE..=0x0AC5 | 0x0AC7..=0x0AC9 | 0x0ACB..=0x0ACD | 0x0B01..=0x0B03 |
        0x0B3C | 0x0B3E..=0x0B43 | 0x0B47..=0x0B48 | 0x0B4B..=0x0B4D |
        0x0B56..=0x0B57 | 0x0B82..=0x0B83 | 0x0BBE..=0x0BC2 | 0x0BC6..=0x0BC8 |
        0x0BCA..=0x0BCD | 0x0BD7 | 0x0C01..=0x0C03 | 0x0C3E..=0x0C44 |
        0x0C46..=0x0C48 | 0x0C4A..=0x0C4D | 0x0C55..=0x0C56 | 0x0C82..=0x0C83 |
        0x0CBE..=0x0CC4 | 0x0CC6..=0x0CC8 | 0x0CCA..=0x0CCD | 0x0CD5..=0x0CD6 |
        0x0D02..=0x0D03 | 0x0D3E..=0x0D43 | 0x0D46..=0x0D48 | 0x0D4A..=0x0D4D |
        0x0D57 | 0x0E31 | 0x0E34..=0x0E3A | 0x0E47..=0x0E4E | 0x0EB1 |
        0x0EB4..=0x0EB9 | 0x0EBB..=0x0EBC | 0x0EC8..=0x0ECD | 0x0F18..=0x0F19 |
        0x0F35 | 0x0F37 | 0x0F39 | 0x0F3E | 0x0F3F | 0x0F71..=0x0F84 |
        0x0F86..=0x0F8B | 0x0F90..=0x0F95 | 0x0F97 | 0x0F99..=0x0FAD |
        0x0FB1..=0x0FB7 | 0x0FB9 | 0x20D0..=0x20DC | 0x20E1 | 0x302A..=0x302F |
        0x3099 | 0x309A
    )
}

/// Check if codepoint is an XML 1.0 Digit
#[cfg(feature = "full-char-table")]
fn is_digit_codepoint(cp: u32) -> bool {
    matches!(cp,
        0x0030..=0x0039 | 0x0660..=0x0669 | 0x06F0..=0x06F9 | 0x0966..=0x096F |
        0x09E6..=0x09EF | 0x0A66..=0x0A6F | 0x0AE6..=0x0AEF | 0x0B66..=0x0B6F |
        0x0BE7..=0x0BEF | 0x0C66..=0x0C6F | 0x0CE6..=0x0CEF | 0x0D66..=0x0D6F |
        0x0E50..=0x0E59 | 0x0ED0..=0x0ED9 | 0x0F20..=0x0F29
    )
}

/// Check if codepoint is an XML 1.0 Extender
#[cfg(feature = "full-char-table")]
fn is_extender(cp: u32) -> bool {
    matches!(cp,
        0x00B7 | 0x02D0 | 0x02D1 | 0x0387 | 0x0640 | 0x0E46 | 0x0EC6 | 0x3005 |
        0x3031..=0x3035 | 0x309D..=0x309E | 0x30FC..=0x30FE
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<Result<u32, ErrorKind>> {
        let mut pos = 0;
        let mut out = Vec::new();
        while pos < input.len() {
            out.push(next_unicode_char(input, &mut pos));
        }
        out
    }

    #[test]
    fn test_xml_char_ranges() {
        assert!(is_xml_char(0x9));
        assert!(is_xml_char(0xA));
        assert!(is_xml_char(0xD));
        assert!(!is_xml_char(0x0));
        assert!(!is_xml_char(0x1F));
        assert!(is_xml_char(0x20));
        assert!(is_xml_char(0xD7FF));
        assert!(!is_xml_char(0xD800));
        assert!(!is_xml_char(0xDFFF));
        assert!(is_xml_char(0xE000));
        assert!(!is_xml_char(0xFFFE));
        assert!(!is_xml_char(0xFFFF));
        assert!(is_xml_char(0x10000));
        assert!(is_xml_char(0x10FFFF));
        assert!(!is_xml_char(0x110000));
    }

    #[test]
    fn test_ascii_classes() {
        assert!(is_name_start_char(b'a' as u32));
        assert!(is_name_start_char(b'_' as u32));
        assert!(is_name_start_char(b':' as u32));
        assert!(!is_name_start_char(b'1' as u32));
        assert!(!is_name_start_char(b'-' as u32));
        assert!(!is_name_start_char(b'.' as u32));
        assert!(is_name_char(b'1' as u32));
        assert!(is_name_char(b'-' as u32));
        assert!(is_name_char(b'.' as u32));
        assert!(!is_name_char(b' ' as u32));
        assert!(!is_name_char(b'<' as u32));
        assert_eq!(char_class(0x1), CharClass::NONE);
    }

    #[test]
    fn test_latin1_classes() {
        // e-acute is a letter, multiplication sign is not, middle dot extends names
        assert!(is_name_start_char(0xE9));
        assert!(!is_name_char(0xD7));
        assert!(char_class(0xD7).contains(CharClass::XML_CHAR));
        assert!(is_name_char(0xB7));
        assert!(!is_name_start_char(0xB7));
    }

    #[cfg(not(feature = "full-char-table"))]
    #[test]
    fn test_small_table_accepts_high_code_points() {
        // Combining grave accent is not a name start per XML 1.0, but is not tabled here
        assert!(is_name_start_char(0x0300));
        assert!(!is_name_char(0xFFFE));
        let letter = CharClass::XML_CHAR
            .union(CharClass::NAME_START)
            .union(CharClass::NAME_CHAR);
        assert_eq!(char_class(0x100), letter);
        assert_eq!(char_class(0x2000), letter);
        assert_eq!(char_class(0x10FFFF), letter);
        assert_eq!(char_class(0xD800), CharClass::NONE);
        assert_eq!(CHAR_TABLE_SIZE, 0x100);
    }

    #[cfg(feature = "full-char-table")]
    #[test]
    fn test_full_table_classes() {
        assert!(is_name_start_char(0x0410)); // Cyrillic A
        assert!(is_name_start_char(0x4E00)); // CJK ideograph
        assert!(!is_name_start_char(0x0300));
        assert!(is_name_char(0x0300)); // combining
        assert!(is_name_char(0x0660)); // Arabic-Indic digit
        assert!(!is_name_char(0x2000));
    }

    #[test]
    fn test_decode_multibyte() {
        assert_eq!(decode_all("aé€😀".as_bytes()), vec![Ok(0x61), Ok(0xE9), Ok(0x20AC), Ok(0x1F600)]);
    }

    #[test]
    fn test_decode_stray_continuation() {
        let mut pos = 0;
        assert_eq!(next_unicode_char(&[0x80, b'a'], &mut pos), Err(ErrorKind::InvalidEncoding));
        assert_eq!(pos, 1);
        assert_eq!(next_unicode_char(&[0x80, b'a'], &mut pos), Ok(0x61));
    }

    #[test]
    fn test_decode_bad_continuation_stops_before_it() {
        // 3-byte lead, one good continuation, then ASCII
        let input = [0xE2, 0x82, b'x'];
        let mut pos = 0;
        assert_eq!(next_unicode_char(&input, &mut pos), Err(ErrorKind::InvalidEncoding));
        assert_eq!(pos, 2);
        assert_eq!(next_unicode_char(&input, &mut pos), Ok(b'x' as u32));
    }

    #[test]
    fn test_decode_truncated_never_passes_end() {
        let input = [0xF0, 0x9F];
        let mut pos = 0;
        assert_eq!(next_unicode_char(&input, &mut pos), Err(ErrorKind::InvalidEncoding));
        assert_eq!(pos, 2);
    }

    #[test]
    fn test_decode_overlong_and_out_of_range() {
        let mut pos = 0;
        assert_eq!(next_unicode_char(&[0xC0, 0xAF], &mut pos), Err(ErrorKind::InvalidEncoding));
        let mut pos = 0;
        assert_eq!(next_unicode_char(&[0xE0, 0x80, 0xAF], &mut pos), Err(ErrorKind::InvalidEncoding));
        assert_eq!(pos, 3);
        let mut pos = 0;
        assert_eq!(next_unicode_char(&[0xF4, 0x90, 0x80, 0x80], &mut pos), Err(ErrorKind::InvalidEncoding));
    }

    #[test]
    fn test_decode_surrogate_is_not_xml_char() {
        // CESU-style encoded U+D800
        let input = [0xED, 0xA0, 0x80];
        let mut pos = 0;
        assert_eq!(next_unicode_char(&input, &mut pos), Ok(0xD800));
        assert_eq!(check_text(&input), Err(ErrorKind::NonXmlCharacter));
    }

    #[test]
    fn test_encode_utf8() {
        let mut out = Vec::new();
        assert!(encode_utf8(0x20AC, &mut out));
        assert_eq!(out, "€".as_bytes());
        assert!(!encode_utf8(0xD800, &mut out));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_check_text() {
        assert_eq!(check_text(b"hello\tworld\r\n"), Ok(()));
        assert_eq!(check_text("ünïcödé".as_bytes()), Ok(()));
        assert_eq!(check_text(b"bad\x01"), Err(ErrorKind::NonXmlCharacter));
        assert_eq!(check_text(&[b'a', 0xFF]), Err(ErrorKind::InvalidEncoding));
        assert_eq!(check_text("\u{FFFE}".as_bytes()), Err(ErrorKind::NonXmlCharacter));
    }

    #[test]
    fn test_check_text_first_problem_wins() {
        // Control char comes before the broken sequence
        assert_eq!(check_text(&[0x01, 0xFF]), Err(ErrorKind::NonXmlCharacter));
        assert_eq!(check_text(&[0xFF, 0x01]), Err(ErrorKind::InvalidEncoding));
    }
}
