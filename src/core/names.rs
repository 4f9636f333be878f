//! Name and Markup Validation
//!
//! Checks for everything the writer emits outside of text and attribute
//! values: element/attribute/prefix names, comments, processing
//! instructions and the pieces of the XML and DOCTYPE declarations.

use memchr::{memchr, memmem};

use super::chars::{char_class, check_text, next_unicode_char, CharClass};
use crate::error::ErrorKind;

fn check_name_impl(name: &[u8], allow_colon: bool) -> Result<(), ErrorKind> {
    if name.is_empty() {
        return Err(ErrorKind::InvalidName);
    }

    let mut pos = 0;
    let first = next_unicode_char(name, &mut pos)?;
    let class = char_class(first);
    if !class.contains(CharClass::NAME_START) || (!allow_colon && first == b':' as u32) {
        return Err(ErrorKind::InvalidName);
    }

    while pos < name.len() {
        let cp = next_unicode_char(name, &mut pos)?;
        if !char_class(cp).contains(CharClass::NAME_CHAR) || (!allow_colon && cp == b':' as u32) {
            return Err(ErrorKind::InvalidName);
        }
    }
    Ok(())
}

/// Validate a non-colonized name (local names, prefixes, PI targets)
pub fn check_ncname(name: &[u8]) -> Result<(), ErrorKind> {
    check_name_impl(name, false)
}

/// Validate an XML Name, colons allowed (DOCTYPE root element)
pub fn check_name(name: &[u8]) -> Result<(), ErrorKind> {
    check_name_impl(name, true)
}

/// Validate comment content (no '--', must not end with '-')
pub fn check_comment(text: &[u8]) -> Result<(), ErrorKind> {
    check_text(text)?;
    if memmem::find(text, b"--").is_some() || text.last() == Some(&b'-') {
        return Err(ErrorKind::MalformedComment);
    }
    Ok(())
}

/// Validate a processing instruction target and body
pub fn check_pi(target: &[u8], text: &[u8]) -> Result<(), ErrorKind> {
    check_ncname(target)?;
    if target.eq_ignore_ascii_case(b"xml") {
        return Err(ErrorKind::ReservedPiTarget);
    }
    check_text(text)?;
    if memmem::find(text, b"?>").is_some() {
        return Err(ErrorKind::MalformedPi);
    }
    Ok(())
}

/// Validate the version in an XML declaration: '1.' [0-9]+
pub fn check_version(version: &[u8]) -> Result<(), ErrorKind> {
    if version.is_empty() {
        return Err(ErrorKind::MissingRequiredValue);
    }
    match version.strip_prefix(b"1.") {
        Some(minor) if !minor.is_empty() && minor.iter().all(u8::is_ascii_digit) => Ok(()),
        _ => Err(ErrorKind::InvalidName),
    }
}

/// Validate encoding name per XML spec: [A-Za-z] ([A-Za-z0-9._] | '-')*
pub fn check_encoding_name(name: &[u8]) -> Result<(), ErrorKind> {
    let Some((&first, rest)) = name.split_first() else {
        return Err(ErrorKind::MissingRequiredValue);
    };
    if !first.is_ascii_alphabetic() {
        return Err(ErrorKind::InvalidName);
    }
    if !rest
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
    {
        return Err(ErrorKind::InvalidName);
    }
    Ok(())
}

/// Validate the standalone pseudo-attribute
pub fn check_standalone(value: &[u8]) -> Result<(), ErrorKind> {
    match value {
        b"yes" | b"no" => Ok(()),
        b"" => Err(ErrorKind::MissingRequiredValue),
        _ => Err(ErrorKind::InvalidName),
    }
}

/// Validate Public ID literal per XML spec
/// PubidChar ::= #x20 | #xD | #xA | [a-zA-Z0-9] | [-'()+,./:=?;!*#@$_%]
pub fn check_pubid_literal(pubid: &[u8]) -> Result<(), ErrorKind> {
    let valid = pubid.iter().all(|&b| {
        matches!(b,
            b' ' | b'\r' | b'\n' |
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' |
            b'-' | b'\'' | b'(' | b')' | b'+' | b',' | b'.' |
            b'/' | b':' | b'=' | b'?' | b';' | b'!' | b'*' |
            b'#' | b'@' | b'$' | b'_' | b'%'
        )
    });
    if valid {
        Ok(())
    } else {
        Err(ErrorKind::NonXmlCharacter)
    }
}

/// Pick the quote for a system literal; it cannot contain both kinds
pub fn system_literal_quote(system_id: &[u8]) -> Result<u8, ErrorKind> {
    check_text(system_id)?;
    let has_double = system_id.contains(&b'"');
    let has_single = system_id.contains(&b'\'');
    match (has_double, has_single) {
        (true, true) => Err(ErrorKind::NonXmlCharacter),
        (true, false) => Ok(b'\''),
        _ => Ok(b'"'),
    }
}

/// Validate a DOCTYPE internal subset.
///
/// The subset is written between `[` and `]>`, so a `]` may only appear
/// inside a quoted literal, a comment or a PI. Literals, comments and PIs
/// must be terminated.
pub fn check_internal_subset(subset: &[u8]) -> Result<(), ErrorKind> {
    check_text(subset)?;

    let mut pos = 0;
    while pos < subset.len() {
        let rest = &subset[pos..];
        if rest.starts_with(b"<!--") {
            let body = &rest[4..];
            let end = memmem::find(body, b"-->").ok_or(ErrorKind::MalformedComment)?;
            check_comment(&body[..end])?;
            pos += 4 + end + 3;
        } else if rest.starts_with(b"<?") {
            let end = memmem::find(&rest[2..], b"?>").ok_or(ErrorKind::MalformedPi)?;
            pos += 2 + end + 2;
        } else {
            match rest[0] {
                quote @ (b'"' | b'\'') => {
                    let end = memchr(quote, &rest[1..]).ok_or(ErrorKind::NonXmlCharacter)?;
                    pos += 1 + end + 1;
                }
                b']' => return Err(ErrorKind::NonXmlCharacter),
                _ => pos += 1,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ncname() {
        assert_eq!(check_ncname(b"root"), Ok(()));
        assert_eq!(check_ncname(b"_a-b.c1"), Ok(()));
        assert_eq!(check_ncname("café".as_bytes()), Ok(()));
        assert_eq!(check_ncname(b""), Err(ErrorKind::InvalidName));
        assert_eq!(check_ncname(b"1abc"), Err(ErrorKind::InvalidName));
        assert_eq!(check_ncname(b"-abc"), Err(ErrorKind::InvalidName));
        assert_eq!(check_ncname(b"a b"), Err(ErrorKind::InvalidName));
        assert_eq!(check_ncname(b"p:local"), Err(ErrorKind::InvalidName));
        assert_eq!(check_ncname(&[b'a', 0xFF]), Err(ErrorKind::InvalidEncoding));
    }

    #[test]
    fn test_name_allows_colon() {
        assert_eq!(check_name(b"svg:svg"), Ok(()));
        assert_eq!(check_name(b":x"), Ok(()));
        assert_eq!(check_name(b"a<b"), Err(ErrorKind::InvalidName));
    }

    #[test]
    fn test_comment() {
        assert_eq!(check_comment(b" fine - really "), Ok(()));
        assert_eq!(check_comment(b""), Ok(()));
        assert_eq!(check_comment(b"a--b"), Err(ErrorKind::MalformedComment));
        assert_eq!(check_comment(b"ends with-"), Err(ErrorKind::MalformedComment));
        assert_eq!(check_comment(b"ctl\x07"), Err(ErrorKind::NonXmlCharacter));
    }

    #[test]
    fn test_pi() {
        assert_eq!(check_pi(b"xml-stylesheet", b"href=\"a.css\""), Ok(()));
        assert_eq!(check_pi(b"XmL", b""), Err(ErrorKind::ReservedPiTarget));
        assert_eq!(check_pi(b"xml", b"x"), Err(ErrorKind::ReservedPiTarget));
        assert_eq!(check_pi(b"app", b"a ?> b"), Err(ErrorKind::MalformedPi));
        assert_eq!(check_pi(b"9app", b""), Err(ErrorKind::InvalidName));
    }

    #[test]
    fn test_decl_parts() {
        assert_eq!(check_version(b"1.0"), Ok(()));
        assert_eq!(check_version(b"1.1"), Ok(()));
        assert_eq!(check_version(b""), Err(ErrorKind::MissingRequiredValue));
        assert_eq!(check_version(b"2.0"), Err(ErrorKind::InvalidName));
        assert_eq!(check_version(b"1."), Err(ErrorKind::InvalidName));
        assert_eq!(check_encoding_name(b"UTF-8"), Ok(()));
        assert_eq!(check_encoding_name(b"ISO_8859.1"), Ok(()));
        assert_eq!(check_encoding_name(b"8bit"), Err(ErrorKind::InvalidName));
        assert_eq!(check_encoding_name(b"UTF 8"), Err(ErrorKind::InvalidName));
        assert_eq!(check_standalone(b"yes"), Ok(()));
        assert_eq!(check_standalone(b"maybe"), Err(ErrorKind::InvalidName));
    }

    #[test]
    fn test_pubid_and_system_literal() {
        assert_eq!(check_pubid_literal(b"-//W3C//DTD XHTML 1.0 Strict//EN"), Ok(()));
        assert_eq!(check_pubid_literal(b"bad\"quote"), Err(ErrorKind::NonXmlCharacter));
        assert_eq!(system_literal_quote(b"http://x/a.dtd"), Ok(b'"'));
        assert_eq!(system_literal_quote(b"say \"x\""), Ok(b'\''));
        assert_eq!(system_literal_quote(b"both ' and \""), Err(ErrorKind::NonXmlCharacter));
    }

    #[test]
    fn test_internal_subset() {
        assert_eq!(check_internal_subset(b"<!ENTITY e \"v\">"), Ok(()));
        assert_eq!(
            check_internal_subset(b"<!ENTITY e 'a]b'> <!-- ]> --> <?pi ]>?>"),
            Ok(())
        );
        assert_eq!(
            check_internal_subset(b"]><evil/><!--"),
            Err(ErrorKind::NonXmlCharacter)
        );
        assert_eq!(
            check_internal_subset(b"<!ENTITY e \"open>"),
            Err(ErrorKind::NonXmlCharacter)
        );
        assert_eq!(check_internal_subset(b"<!-- open"), Err(ErrorKind::MalformedComment));
        assert_eq!(check_internal_subset(b"<!-- a--b -->"), Err(ErrorKind::MalformedComment));
        assert_eq!(check_internal_subset(b"<?pi open"), Err(ErrorKind::MalformedPi));
    }
}
