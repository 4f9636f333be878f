//! RustyXML Writer - Streaming, validating XML output
//!
//! Layers:
//! - `core`: character classes, UTF-8 decoding, escaping, name checks
//! - `Writer`: the document state machine with namespace scoping,
//!   pretty-printing and canonical output
//! - `Serializer`: checked wrapper with qualified names and a single
//!   error shape
//!
//! ```
//! use rustyxml_writer::Serializer;
//!
//! let mut s = Serializer::new(Vec::new(), "books.xml", 0).unwrap();
//! s.start_element("book").unwrap();
//! s.attribute("id", 7).unwrap();
//! s.element_with("title", "Dune & Sons").unwrap();
//! s.end_element().unwrap();
//!
//! let xml = String::from_utf8(s.into_inner().unwrap()).unwrap();
//! assert_eq!(xml, r#"<book id="7"><title>Dune &amp; Sons</title></book>"#);
//! ```

pub mod core;
mod error;
mod qname;
mod serializer;
mod writer;

pub use crate::core::chars::{
    char_class, check_text, next_unicode_char, CharClass, CHAR_TABLE_SIZE,
};
pub use crate::core::escape::{escape_attribute_value, escape_text, scrub};
pub use error::{ErrorKind, Result, SerializationError, WriteError};
pub use qname::QName;
pub use serializer::Serializer;
pub use writer::{
    ns, DeclaredAttribute, DeclaredElement, Namespace, Sink, Writer, WriterConfig,
};
