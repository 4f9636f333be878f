//! Serializer
//!
//! Checked wrapper over [`Writer`]: one document per serializer, qualified
//! names instead of (namespace, name) string pairs, `Display` values as
//! content, and every failure reported as a [`SerializationError`] naming
//! the output.
//!
//! The document starts when the serializer is created and ends (the sink is
//! flushed) as soon as the root element is closed.

use std::fmt::Display;

use crate::error::{ErrorKind, Result, SerializationError};
use crate::qname::QName;
use crate::writer::{
    DeclaredAttribute, DeclaredElement, Namespace, Sink, Writer, WriterConfig,
};

type SerializeResult<T> = std::result::Result<T, SerializationError>;

pub struct Serializer<W: Sink> {
    writer: Writer<W>,
    output_name: String,
    /// Sink of the completed document
    finished: Option<W>,
}

impl<W: Sink> Serializer<W> {
    /// Start a document written to `sink`. `output_name` identifies the
    /// document in errors; `indentation` 0 disables pretty-printing.
    pub fn new(
        sink: W,
        output_name: impl Into<String>,
        indentation: usize,
    ) -> SerializeResult<Self> {
        Self::with_config(
            sink,
            output_name,
            WriterConfig::default().with_indentation(indentation),
        )
    }

    pub fn with_config(
        sink: W,
        output_name: impl Into<String>,
        config: WriterConfig,
    ) -> SerializeResult<Self> {
        let mut serializer = Serializer {
            writer: Writer::with_config(config),
            output_name: output_name.into(),
            finished: None,
        };
        let result = serializer.writer.start_document(sink);
        serializer.check(result)?;
        Ok(serializer)
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    fn check<T>(&self, result: Result<T>) -> SerializeResult<T> {
        result.map_err(|err| SerializationError::from_write(&self.output_name, err))
    }

    /// End the document once the root element has been closed
    fn after_end_element(&mut self) -> SerializeResult<()> {
        if self.writer.depth() == 0 {
            let result = self.writer.end_document();
            self.finished = Some(self.check(result)?);
        }
        Ok(())
    }

    // =========================================================================
    // Elements
    // =========================================================================

    pub fn start_element(&mut self, name: impl Into<QName>) -> SerializeResult<()> {
        let name = name.into();
        self.start_element_ns(name.namespace(), name.name())
    }

    pub fn start_element_ns(&mut self, ns: &str, name: &str) -> SerializeResult<()> {
        let result = self.writer.start_element_literal(ns, name);
        self.check(result)
    }

    pub fn end_element(&mut self) -> SerializeResult<()> {
        let result = self.writer.end_element();
        self.check(result)?;
        self.after_end_element()
    }

    /// End the current element after checking that it is `name`
    pub fn end_element_checked(&mut self, name: impl Into<QName>) -> SerializeResult<()> {
        let name = name.into();
        let result = self
            .writer
            .end_element_checked(name.namespace(), name.name());
        self.check(result)?;
        self.after_end_element()
    }

    /// Content of an already started element, then its end
    pub fn element(&mut self, value: impl Display) -> SerializeResult<()> {
        self.characters_value(value)?;
        self.end_element()
    }

    /// A complete element with simple content
    pub fn element_with(
        &mut self,
        name: impl Into<QName>,
        value: impl Display,
    ) -> SerializeResult<()> {
        self.start_element(name)?;
        self.element(value)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn start_attribute(&mut self, name: impl Into<QName>) -> SerializeResult<()> {
        let name = name.into();
        let result = self
            .writer
            .start_attribute_literal(name.namespace(), name.name());
        self.check(result)
    }

    pub fn end_attribute(&mut self) -> SerializeResult<()> {
        let result = self.writer.end_attribute();
        self.check(result)
    }

    /// End the current attribute after checking that it is `name`
    pub fn end_attribute_checked(&mut self, name: impl Into<QName>) -> SerializeResult<()> {
        let name = name.into();
        let result = self
            .writer
            .end_attribute_checked(name.namespace(), name.name());
        self.check(result)
    }

    pub fn attribute(&mut self, name: impl Into<QName>, value: impl Display) -> SerializeResult<()> {
        let name = name.into();
        let result = self
            .writer
            .add_attribute_literal(name.namespace(), name.name(), value.to_string());
        self.check(result)
    }

    // =========================================================================
    // Characters
    // =========================================================================

    pub fn characters(&mut self, text: &str) -> SerializeResult<()> {
        self.characters_bytes(text.as_bytes())
    }

    /// Raw bytes; must be well-formed UTF-8
    pub fn characters_bytes(&mut self, text: &[u8]) -> SerializeResult<()> {
        let result = self.writer.add_text(text);
        self.check(result)
    }

    pub fn characters_value(&mut self, value: impl Display) -> SerializeResult<()> {
        self.characters(&value.to_string())
    }

    /// Content produced by a caller-supplied formatter
    pub fn characters_with<T, F>(&mut self, value: &T, format: F) -> SerializeResult<()>
    where
        F: FnOnce(&T) -> String,
    {
        self.characters(&format(value))
    }

    // =========================================================================
    // Namespaces and declarations
    // =========================================================================

    /// Declare `ns` under `prefix` on the element just started. An empty
    /// prefix declares the default namespace; both empty writes `xmlns=""`.
    pub fn namespace_decl(&mut self, ns: &str, prefix: &str) -> SerializeResult<()> {
        let result = if ns.is_empty() && prefix.is_empty() {
            self.writer.unset_default_namespace()
        } else {
            self.writer.add_namespace_literal(ns, prefix)
        };
        self.check(result)
    }

    /// XML declaration; empty `encoding` or `standalone` are omitted
    pub fn xml_decl(&mut self, version: &str, encoding: &str, standalone: &str) -> SerializeResult<()> {
        let result = self.writer.xml_declaration(
            version,
            non_empty(encoding),
            non_empty(standalone),
        );
        self.check(result)
    }

    /// DOCTYPE declaration; empty arguments are omitted
    pub fn doctype_decl(
        &mut self,
        root_element: &str,
        public_id: &str,
        system_id: &str,
        internal_subset: &str,
    ) -> SerializeResult<()> {
        let result = self.writer.doctype_declaration(
            root_element,
            non_empty(public_id),
            non_empty(system_id),
            non_empty(internal_subset),
        );
        self.check(result)
    }

    pub fn comment(&mut self, text: &str) -> SerializeResult<()> {
        let result = self.writer.comment(text);
        self.check(result)
    }

    pub fn processing_instruction(&mut self, target: &str, text: &str) -> SerializeResult<()> {
        let result = self.writer.processing_instruction(target, text);
        self.check(result)
    }

    // =========================================================================
    // Declared names
    // =========================================================================

    pub fn declare_namespace(&mut self, ns: &str, prefix: &str) -> SerializeResult<Namespace> {
        let result = self.writer.declare_namespace(ns, prefix);
        self.check(result)
    }

    pub fn declare_element(
        &mut self,
        ns: Option<&Namespace>,
        name: &str,
    ) -> SerializeResult<DeclaredElement> {
        let result = self.writer.declare_element(ns, name);
        self.check(result)
    }

    pub fn declare_attribute(
        &mut self,
        ns: Option<&Namespace>,
        name: &str,
    ) -> SerializeResult<DeclaredAttribute> {
        let result = self.writer.declare_attribute(ns, name);
        self.check(result)
    }

    pub fn start_declared(&mut self, element: &DeclaredElement) -> SerializeResult<()> {
        let result = self.writer.start_element(element);
        self.check(result)
    }

    pub fn attribute_declared(
        &mut self,
        attribute: &DeclaredAttribute,
        value: impl Display,
    ) -> SerializeResult<()> {
        let result = self.writer.add_attribute(attribute, value.to_string());
        self.check(result)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Prefix `ns` is visible under, if any
    pub fn lookup_namespace_prefix(&self, ns: &str) -> Option<&str> {
        self.writer.lookup_prefix(ns)
    }

    pub fn current_element(&self) -> Option<QName> {
        self.writer
            .current_element()
            .map(|(ns, name)| QName::new(ns, name))
    }

    pub fn current_attribute(&self) -> Option<QName> {
        self.writer
            .current_attribute()
            .map(|(ns, name)| QName::new(ns, name))
    }

    pub fn suspend_indentation(&mut self) -> SerializeResult<()> {
        let result = self.writer.suspend_pretty_print();
        self.check(result)
    }

    pub fn resume_indentation(&mut self) -> SerializeResult<()> {
        let result = self.writer.resume_pretty_print();
        self.check(result)
    }

    /// Level (root = 1) at which indentation is suspended, or 0
    pub fn indentation_suspended(&self) -> usize {
        self.writer.pretty_print_suspended()
    }

    /// Has the root element been closed (and the sink flushed)
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Kind of the error the underlying writer is latched on
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.writer.last_error()
    }

    /// The sink: the completed document, or whatever was written so far
    pub fn into_inner(mut self) -> Option<W> {
        self.finished.take().or_else(|| self.writer.reset())
    }
}

#[inline]
fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
