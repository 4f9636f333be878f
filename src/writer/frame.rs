//! Open Element Frames
//!
//! One `Frame` per open element. The innermost element's start tag stays
//! in a `StartTag` until something forces it out, so attributes and
//! namespace declarations can still be added and an empty element can
//! be self-closed.

use std::sync::Arc;

use super::strings::StrId;
use crate::error::ErrorKind;

/// How a start tag is terminated when it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClose {
    /// `>`: content follows
    Open,
    /// `/>`
    SelfClose,
    /// `></name>` (canonical empty element)
    Explicit,
}

/// An open element
#[derive(Debug, Clone)]
pub struct Frame {
    /// Namespace URI (EMPTY for no namespace)
    pub ns: StrId,
    pub name: Arc<str>,
    /// Prefix chosen when the start tag was written
    pub prefix: StrId,
    /// A child element, comment or PI was written inside (the end tag
    /// then goes on its own line when pretty-printing)
    pub has_children: bool,
}

impl Frame {
    pub fn new(ns: StrId, name: Arc<str>) -> Self {
        Frame {
            ns,
            name,
            prefix: super::strings::EMPTY,
            has_children: false,
        }
    }
}

/// An attribute waiting in a start tag; `value` is already escaped
#[derive(Debug, Clone)]
pub struct Attribute {
    pub ns: StrId,
    pub name: Arc<str>,
    pub value: Vec<u8>,
}

/// Start tag of the innermost element, not yet written
#[derive(Debug, Clone, Default)]
pub struct StartTag {
    /// Spaces after a leading newline; None writes the tag inline
    pub indent: Option<usize>,
    pub attributes: Vec<Attribute>,
    /// Attribute opened with start_attribute, value still growing
    pub open: Option<Attribute>,
}

impl StartTag {
    pub fn new(indent: Option<usize>) -> Self {
        StartTag {
            indent,
            attributes: Vec::new(),
            open: None,
        }
    }

    /// Same (namespace, local name) already present, finished or open
    pub fn contains(&self, ns: StrId, name: &str) -> bool {
        self.attributes
            .iter()
            .chain(self.open.iter())
            .any(|a| a.ns == ns && &*a.name == name)
    }
}

/// Newline followed by `spaces` spaces
#[inline]
pub fn push_indent(out: &mut Vec<u8>, spaces: usize) -> Result<(), ErrorKind> {
    let needed = spaces.checked_add(1).ok_or(ErrorKind::AllocationFailure)?;
    out.try_reserve(needed)
        .map_err(|_| ErrorKind::AllocationFailure)?;
    out.push(b'\n');
    out.resize(out.len() + spaces, b' ');
    Ok(())
}

/// `prefix:name`, or just `name` for an empty prefix
#[inline]
pub fn push_qname(out: &mut Vec<u8>, prefix: &str, name: &str) {
    if !prefix.is_empty() {
        out.extend_from_slice(prefix.as_bytes());
        out.push(b':');
    }
    out.extend_from_slice(name.as_bytes());
}
