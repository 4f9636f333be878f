//! XML Escaping and Scrubbing
//!
//! Escapes text and attribute values for output while validating that
//! every byte sequence is well-formed UTF-8 made of legal XML characters.
//!
//! Text content: `&` `<` `>` are replaced by entity references and a
//! carriage return by `&#xD;` (a raw CR would be normalized away by a
//! parser). `>` is escaped everywhere rather than only after `]]`, which
//! keeps escaping independent of what earlier calls wrote.
//!
//! Attribute values additionally escape `"`, tab and newline so the value
//! survives attribute-value normalization.
//!
//! Uses Cow so untouched input is returned without copying.

use memchr::{memchr, memchr3};
use std::borrow::Cow;

use super::chars::{check_text, is_xml_char, next_unicode_char};
use crate::error::ErrorKind;

#[inline]
fn text_replacement(b: u8) -> Option<&'static [u8]> {
    match b {
        b'&' => Some(b"&amp;"),
        b'<' => Some(b"&lt;"),
        b'>' => Some(b"&gt;"),
        b'\r' => Some(b"&#xD;"),
        _ => None,
    }
}

#[inline]
fn attribute_replacement(b: u8) -> Option<&'static [u8]> {
    match b {
        b'"' => Some(b"&quot;"),
        b'\t' => Some(b"&#x9;"),
        b'\n' => Some(b"&#xA;"),
        _ => text_replacement(b),
    }
}

/// Escape `input` and append it to `out`, validating as it goes.
///
/// On error `out` may hold a partial result; callers that care truncate it
/// back to its previous length.
fn escape_into(
    input: &[u8],
    out: &mut Vec<u8>,
    replacement: fn(u8) -> Option<&'static [u8]>,
) -> Result<(), ErrorKind> {
    let mut pos = 0;
    let mut run_start = 0;

    while pos < input.len() {
        let b = input[pos];

        if let Some(rep) = replacement(b) {
            out.extend_from_slice(&input[run_start..pos]);
            out.extend_from_slice(rep);
            pos += 1;
            run_start = pos;
            continue;
        }

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

    out.extend_from_slice(&input[run_start..]);
    Ok(())
}

/// Escape character data, appending to `out`
pub fn escape_text_into(input: &[u8], out: &mut Vec<u8>) -> Result<(), ErrorKind> {
    escape_into(input, out, text_replacement)
}

/// Escape an attribute value, appending to `out`
pub fn escape_attribute_into(input: &[u8], out: &mut Vec<u8>) -> Result<(), ErrorKind> {
    escape_into(input, out, attribute_replacement)
}

/// Escape character data for element content
///
/// Returns Borrowed if nothing needed escaping.
pub fn escape_text(input: &[u8]) -> Result<Cow<'_, [u8]>, ErrorKind> {
    check_text(input)?;
    if memchr3(b'&', b'<', b'>', input).is_none() && memchr(b'\r', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    let mut out = Vec::with_capacity(input.len() + 16);
    escape_text_into(input, &mut out)?;
    Ok(Cow::Owned(out))
}

/// Escape an attribute value (to be written between double quotes)
pub fn escape_attribute_value(input: &[u8]) -> Result<Cow<'_, [u8]>, ErrorKind> {
    check_text(input)?;
    if !input.iter().any(|&b| attribute_replacement(b).is_some()) {
        return Ok(Cow::Borrowed(input));
    }
    let mut out = Vec::with_capacity(input.len() + 16);
    escape_attribute_into(input, &mut out)?;
    Ok(Cow::Owned(out))
}

/// Silently drop everything that is not a legal XML character or not
/// well-formed UTF-8.
///
/// Returns Borrowed if the input was already clean, so
/// `matches!(scrub(x), Cow::Owned(_))` tells whether anything changed.
/// The output is never longer than the input, and scrubbing twice gives
/// the same result as scrubbing once.
pub fn scrub(input: &[u8]) -> Cow<'_, [u8]> {
    if check_text(input).is_ok() {
        return Cow::Borrowed(input);
    }

    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;
    while pos < input.len() {
        let start = pos;
        match next_unicode_char(input, &mut pos) {
            Ok(cp) if is_xml_char(cp) => out.extend_from_slice(&input[start..pos]),
            _ => {}
        }
    }
    Cow::Owned(out)
}
