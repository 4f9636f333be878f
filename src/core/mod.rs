//! Core XML output primitives
//!
//! The building blocks the writer validates and escapes with:
//! - Chars: XML character classes and the UTF-8 decoder/encoder
//! - Escape: text/attribute escaping (Cow, zero-copy when nothing changes)
//!   and the scrubber
//! - Names: name, comment, PI and declaration checks

pub mod chars;
pub mod escape;
pub mod names;
