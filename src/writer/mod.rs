//! Streaming XML Writer
//!
//! The engine behind [`Serializer`](crate::Serializer). A `Writer` owns
//! the sink for one document at a time and enforces the document protocol:
//!
//! ```text
//! start_document -> [xml decl] -> [doctype] -> (comment | pi)*
//!     -> root element (attributes, namespaces, content...) -> (comment | pi)*
//!     -> end_document
//! ```
//!
//! Every call is validated completely before any of its bytes reach the
//! sink. The first failing call latches the writer into an error state:
//! from then on every call returns that error until `reset`.
//!
//! Output layout:
//! - start tags are held back until the first content, child, comment or
//!   PI (or the end of the element) so attributes can still be added and
//!   empty elements self-close
//! - namespace prefixes are resolved when the start tag is written; a
//!   namespace that is not visible under a usable prefix is bound on the
//!   spot
//! - pretty-printing puts child elements, comments and PIs on their own
//!   line, indented by depth; canonical mode sorts attributes and never
//!   self-closes

mod declared;
mod frame;
mod namespace;
mod sink;
mod strings;

use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;

use log::{debug, trace, warn};
use lru::LruCache;

use crate::core::chars::{encode_utf8, is_xml_char};
use crate::core::escape::{escape_attribute_into, escape_text_into};
use crate::core::names::{
    check_comment, check_encoding_name, check_internal_subset, check_name, check_ncname, check_pi,
    check_pubid_literal, check_standalone, check_version, system_literal_quote,
};
use crate::error::{ErrorKind, Result, WriteError};

pub use declared::{DeclaredAttribute, DeclaredElement, Namespace};
use frame::{push_indent, push_qname, Attribute, Frame, StartTag, TagClose};
pub use namespace::ns;
use namespace::NamespaceRegistry;
pub use sink::Sink;
use strings::{StrId, EMPTY};

const DEFAULT_NAME_CACHE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Writer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Spaces per nesting level; 0 disables pretty-printing
    pub indentation: usize,
    /// Sorted attributes and explicit end tags
    pub canonical: bool,
    /// How many validated literal names to remember
    pub name_cache_capacity: NonZeroUsize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            indentation: 0,
            canonical: false,
            name_cache_capacity: DEFAULT_NAME_CACHE,
        }
    }
}

impl WriterConfig {
    pub fn with_indentation(mut self, indentation: usize) -> Self {
        self.indentation = indentation;
        self
    }

    pub fn with_canonical(mut self, canonical: bool) -> Self {
        self.canonical = canonical;
        self
    }
}

/// Where the writer is in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sequence {
    /// No document in progress
    NoDocument,
    /// Document started, nothing written yet
    PreDoc,
    /// XML declaration, DOCTYPE, comments or PIs written before the root
    Prolog,
    /// Innermost start tag not yet written
    StartTag,
    /// Attribute value open (start_attribute)
    Attribute,
    /// Inside an element whose start tag is written
    Content,
    /// Root element closed
    PostDoc,
}

/// Streaming, validating XML writer
pub struct Writer<S> {
    id: u64,
    sink: Option<S>,
    seq: Sequence,
    doctype_written: bool,
    frames: Vec<Frame>,
    pending: Option<StartTag>,
    namespaces: NamespaceRegistry,
    indentation: usize,
    canonical: bool,
    /// Depth at which pretty-printing was suspended (0 = not suspended)
    suspended_at: usize,
    error: Option<WriteError>,
    /// Output of the current call, sent to the sink in one piece
    scratch: Vec<u8>,
    bytes_written: u64,
    name_cache: LruCache<Box<str>, ()>,
}

impl<S: Sink> Default for Writer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sink> Writer<S> {
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Writer {
            id: declared::next_writer_id(),
            sink: None,
            seq: Sequence::NoDocument,
            doctype_written: false,
            frames: Vec::with_capacity(16),
            pending: None,
            namespaces: NamespaceRegistry::new(),
            indentation: config.indentation,
            canonical: config.canonical,
            suspended_at: 0,
            error: None,
            scratch: Vec::with_capacity(256),
            bytes_written: 0,
            name_cache: LruCache::new(config.name_cache_capacity),
        }
    }

    // =========================================================================
    // Error latch
    // =========================================================================

    #[inline]
    fn check_state(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn latch<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!("xml writer {}: entering error state: {}", self.id, err);
            self.error = Some(err.clone());
        }
        result
    }

    /// Kind of the error the writer is latched on, if any
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(WriteError::kind)
    }

    pub fn last_error_message(&self) -> Option<&'static str> {
        self.last_error().map(ErrorKind::message)
    }

    // =========================================================================
    // Output plumbing
    // =========================================================================

    fn reserve(&mut self, additional: usize) -> Result<()> {
        self.scratch
            .try_reserve(additional)
            .map_err(|_| WriteError::new(ErrorKind::AllocationFailure))
    }

    /// Send the scratch buffer to the sink
    fn emit(&mut self) -> Result<()> {
        let sink = self
            .sink
            .as_mut()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        sink.send(&self.scratch)?;
        self.bytes_written += self.scratch.len() as u64;
        self.scratch.clear();
        Ok(())
    }

    /// Indentation for an item nested `level` deep, if pretty-printing is on
    #[inline]
    fn indent_for(&self, level: usize) -> Result<Option<usize>> {
        if self.indentation == 0 || self.suspended_at != 0 {
            return Ok(None);
        }
        level
            .checked_mul(self.indentation)
            .map(Some)
            .ok_or_else(|| ErrorKind::AllocationFailure.into())
    }

    /// Render the pending start tag into scratch, resolving prefixes.
    /// Returns false if there was no pending tag.
    fn render_pending(&mut self, close: TagClose) -> Result<bool> {
        let Some(tag) = self.pending.as_ref() else {
            return Ok(false);
        };
        let frame = self
            .frames
            .last_mut()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        let ns = &mut self.namespaces;

        frame.prefix = ns.element_prefix(frame.ns)?;
        let mut attributes: Vec<(StrId, &Attribute)> = Vec::with_capacity(tag.attributes.len());
        for attr in &tag.attributes {
            attributes.push((ns.attribute_prefix(attr.ns)?, attr));
        }
        let mut declarations: Vec<(StrId, StrId)> = ns.pending_declarations().collect();

        if self.canonical {
            declarations.sort_by(|a, b| ns.str(a.0).cmp(ns.str(b.0)));
            attributes.sort_by(|(_, a), (_, b)| {
                (ns.str(a.ns), &*a.name).cmp(&(ns.str(b.ns), &*b.name))
            });
        }

        let out = &mut self.scratch;
        if let Some(spaces) = tag.indent {
            push_indent(out, spaces)?;
        }
        out.push(b'<');
        push_qname(out, ns.str(frame.prefix), &frame.name);

        for (prefix, uri) in declarations {
            out.extend_from_slice(b" xmlns");
            if prefix != EMPTY {
                out.push(b':');
                out.extend_from_slice(ns.str(prefix).as_bytes());
            }
            out.extend_from_slice(b"=\"");
            escape_attribute_into(ns.str(uri).as_bytes(), out)?;
            out.push(b'"');
        }

        for (prefix, attr) in attributes {
            out.push(b' ');
            push_qname(out, ns.str(prefix), &attr.name);
            out.extend_from_slice(b"=\"");
            out.extend_from_slice(&attr.value);
            out.push(b'"');
        }

        match close {
            TagClose::Open => out.push(b'>'),
            TagClose::SelfClose => out.extend_from_slice(b"/>"),
            TagClose::Explicit => {
                out.extend_from_slice(b"></");
                push_qname(out, ns.str(frame.prefix), &frame.name);
                out.push(b'>');
            }
        }
        Ok(true)
    }

    /// Write a comment or PI wherever the document currently is
    fn write_misc<F: FnOnce(&mut Vec<u8>)>(&mut self, body: F) -> Result<()> {
        self.scratch.clear();
        match self.seq {
            Sequence::PreDoc | Sequence::Prolog => {
                body(&mut self.scratch);
                self.scratch.push(b'\n');
                self.emit()?;
                self.seq = Sequence::Prolog;
            }
            Sequence::StartTag | Sequence::Content => {
                self.render_pending(TagClose::Open)?;
                if let Some(spaces) = self.indent_for(self.frames.len())? {
                    push_indent(&mut self.scratch, spaces)?;
                }
                body(&mut self.scratch);
                self.emit()?;
                self.pending = None;
                if let Some(frame) = self.frames.last_mut() {
                    frame.has_children = true;
                }
                self.seq = Sequence::Content;
            }
            Sequence::PostDoc => {
                self.scratch.push(b'\n');
                body(&mut self.scratch);
                self.emit()?;
            }
            Sequence::NoDocument | Sequence::Attribute => {
                return Err(ErrorKind::SequenceError.into());
            }
        }
        Ok(())
    }

    // =========================================================================
    // Document
    // =========================================================================

    /// Begin a document written to `sink`
    pub fn start_document(&mut self, sink: S) -> Result<()> {
        self.check_state()?;
        if self.seq != Sequence::NoDocument {
            return self.latch(Err(ErrorKind::SequenceError.into()));
        }
        self.sink = Some(sink);
        self.seq = Sequence::PreDoc;
        self.doctype_written = false;
        self.bytes_written = 0;
        self.suspended_at = 0;
        self.namespaces.reset_scopes();
        debug!("xml writer {}: document started", self.id);
        Ok(())
    }

    /// Finish the document: the root element must be closed. Flushes the
    /// sink once and hands it back.
    pub fn end_document(&mut self) -> Result<S> {
        self.check_state()?;
        let result = self.finish_document();
        self.latch(result)
    }

    fn finish_document(&mut self) -> Result<S> {
        if self.seq != Sequence::PostDoc {
            return Err(ErrorKind::SequenceError.into());
        }
        self.scratch.clear();
        if self.indentation > 0 {
            self.scratch.push(b'\n');
            self.emit()?;
        }

        let mut sink = self
            .sink
            .take()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        if let Err(err) = sink.flush() {
            self.sink = Some(sink);
            return Err(err.into());
        }
        self.seq = Sequence::NoDocument;
        debug!(
            "xml writer {}: document finished, {} bytes",
            self.id, self.bytes_written
        );
        Ok(sink)
    }

    /// Abandon the current document (if any) and clear the error state.
    ///
    /// Settings and declared namespaces, elements and attributes survive.
    /// Returns the sink of an unfinished document.
    pub fn reset(&mut self) -> Option<S> {
        debug!("xml writer {}: reset", self.id);
        self.seq = Sequence::NoDocument;
        self.doctype_written = false;
        self.frames.clear();
        self.pending = None;
        self.namespaces.reset_scopes();
        self.suspended_at = 0;
        self.error = None;
        self.scratch.clear();
        self.sink.take()
    }

    /// `<?xml version="..." encoding="..." standalone="..."?>`; must be
    /// the first thing in the document. Output is always UTF-8, so the only
    /// encoding accepted is `UTF-8` in any letter case.
    pub fn xml_declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<&str>,
    ) -> Result<()> {
        self.check_state()?;
        let result = self.write_xml_declaration(version, encoding, standalone);
        self.latch(result)
    }

    fn write_xml_declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<&str>,
    ) -> Result<()> {
        if self.seq != Sequence::PreDoc {
            return Err(ErrorKind::SequenceError.into());
        }
        check_version(version.as_bytes())?;
        if let Some(encoding) = encoding {
            check_encoding_name(encoding.as_bytes())?;
            if !encoding.eq_ignore_ascii_case("UTF-8") {
                return Err(ErrorKind::InvalidName.into());
            }
        }
        if let Some(standalone) = standalone {
            check_standalone(standalone.as_bytes())?;
        }

        self.scratch.clear();
        let out = &mut self.scratch;
        out.extend_from_slice(b"<?xml version=\"");
        out.extend_from_slice(version.as_bytes());
        out.push(b'"');
        if let Some(encoding) = encoding {
            out.extend_from_slice(b" encoding=\"");
            out.extend_from_slice(encoding.as_bytes());
            out.push(b'"');
        }
        if let Some(standalone) = standalone {
            out.extend_from_slice(b" standalone=\"");
            out.extend_from_slice(standalone.as_bytes());
            out.push(b'"');
        }
        out.extend_from_slice(b"?>\n");
        self.emit()?;
        self.seq = Sequence::Prolog;
        Ok(())
    }

    /// `<!DOCTYPE root PUBLIC "pub" "sys" [subset]>`; at most once, before
    /// the root element
    pub fn doctype_declaration(
        &mut self,
        root: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<()> {
        self.check_state()?;
        let result = self.write_doctype(root, public_id, system_id, internal_subset);
        self.latch(result)
    }

    fn write_doctype(
        &mut self,
        root: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<()> {
        if !matches!(self.seq, Sequence::PreDoc | Sequence::Prolog) || self.doctype_written {
            return Err(ErrorKind::SequenceError.into());
        }
        if root.is_empty() {
            return Err(ErrorKind::MissingRequiredValue.into());
        }
        check_name(root.as_bytes())?;
        let system_quote = match system_id {
            Some(system) => Some(system_literal_quote(system.as_bytes())?),
            None => None,
        };
        if let Some(public) = public_id {
            if system_id.is_none() {
                return Err(ErrorKind::MissingRequiredValue.into());
            }
            check_pubid_literal(public.as_bytes())?;
        }
        if let Some(subset) = internal_subset {
            check_internal_subset(subset.as_bytes())?;
        }

        self.scratch.clear();
        let out = &mut self.scratch;
        out.extend_from_slice(b"<!DOCTYPE ");
        out.extend_from_slice(root.as_bytes());
        match (public_id, system_id, system_quote) {
            (Some(public), Some(system), Some(quote)) => {
                out.extend_from_slice(b" PUBLIC \"");
                out.extend_from_slice(public.as_bytes());
                out.extend_from_slice(b"\" ");
                out.push(quote);
                out.extend_from_slice(system.as_bytes());
                out.push(quote);
            }
            (None, Some(system), Some(quote)) => {
                out.extend_from_slice(b" SYSTEM ");
                out.push(quote);
                out.extend_from_slice(system.as_bytes());
                out.push(quote);
            }
            _ => {}
        }
        if let Some(subset) = internal_subset {
            out.extend_from_slice(b" [");
            out.extend_from_slice(subset.as_bytes());
            out.push(b']');
        }
        out.extend_from_slice(b">\n");
        self.emit()?;
        self.doctype_written = true;
        self.seq = Sequence::Prolog;
        Ok(())
    }

    /// `<!--text-->`
    pub fn comment(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        self.check_state()?;
        let text = text.as_ref();
        let result = check_comment(text)
            .map_err(WriteError::from)
            .and_then(|()| {
                self.write_misc(|out| {
                    out.extend_from_slice(b"<!--");
                    out.extend_from_slice(text);
                    out.extend_from_slice(b"-->");
                })
            });
        self.latch(result)
    }

    /// `<?target text?>`
    pub fn processing_instruction(&mut self, target: &str, text: impl AsRef<[u8]>) -> Result<()> {
        self.check_state()?;
        let text = text.as_ref();
        let result = check_pi(target.as_bytes(), text)
            .map_err(WriteError::from)
            .and_then(|()| {
                self.write_misc(|out| {
                    out.extend_from_slice(b"<?");
                    out.extend_from_slice(target.as_bytes());
                    if !text.is_empty() {
                        out.push(b' ');
                        out.extend_from_slice(text);
                    }
                    out.extend_from_slice(b"?>");
                })
            });
        self.latch(result)
    }

    // =========================================================================
    // Names and handles
    // =========================================================================

    /// Validate a literal local name, remembering names that passed
    fn literal_name(&mut self, name: &str) -> Result<Arc<str>> {
        if self.name_cache.get(name).is_none() {
            trace!("xml writer {}: validating name {:?}", self.id, name);
            check_ncname(name.as_bytes())?;
            self.name_cache.put(Box::from(name), ());
        }
        Ok(Arc::from(name))
    }

    /// Id of a literal namespace URI, declaring it on first use
    fn literal_namespace(&mut self, uri: &str) -> Result<StrId> {
        if uri.is_empty() {
            return Ok(EMPTY);
        }
        if let Some(id) = self.namespaces.declared_uri(uri) {
            return Ok(id);
        }
        let index = self.namespaces.declare(uri, "")?;
        self.namespaces
            .declaration_uri(index)
            .ok_or_else(|| ErrorKind::InternalInvariantViolation.into())
    }

    #[inline]
    fn check_owner(&self, writer: u64) -> Result<()> {
        if writer == self.id {
            Ok(())
        } else {
            Err(ErrorKind::SequenceError.into())
        }
    }

    fn handle_namespace(&self, ns: Option<Namespace>) -> Result<StrId> {
        match ns {
            None => Ok(EMPTY),
            Some(ns) => {
                self.check_owner(ns.writer)?;
                self.namespaces
                    .declaration_uri(ns.index)
                    .ok_or_else(|| ErrorKind::InternalInvariantViolation.into())
            }
        }
    }

    /// Register a namespace; an empty prefix means "generate one on first use"
    pub fn declare_namespace(&mut self, uri: &str, prefix: &str) -> Result<Namespace> {
        self.check_state()?;
        let result = self
            .namespaces
            .declare(uri, prefix)
            .map(|index| Namespace {
                writer: self.id,
                index,
            })
            .map_err(WriteError::from);
        self.latch(result)
    }

    pub fn declare_element(&mut self, ns: Option<&Namespace>, name: &str) -> Result<DeclaredElement> {
        self.check_state()?;
        let result = self.declare_name(ns, name).map(|(namespace, name)| DeclaredElement {
            writer: self.id,
            namespace,
            name,
        });
        self.latch(result)
    }

    pub fn declare_attribute(
        &mut self,
        ns: Option<&Namespace>,
        name: &str,
    ) -> Result<DeclaredAttribute> {
        self.check_state()?;
        let result = self.declare_name(ns, name).map(|(namespace, name)| DeclaredAttribute {
            writer: self.id,
            namespace,
            name,
        });
        self.latch(result)
    }

    fn declare_name(
        &self,
        ns: Option<&Namespace>,
        name: &str,
    ) -> Result<(Option<Namespace>, Arc<str>)> {
        if let Some(ns) = ns {
            self.check_owner(ns.writer)?;
        }
        check_ncname(name.as_bytes())?;
        Ok((ns.copied(), Arc::from(name)))
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Open an element by literal namespace URI (empty for none) and local name
    pub fn start_element_literal(&mut self, ns: &str, name: &str) -> Result<()> {
        self.check_state()?;
        let result = self
            .literal_name(name)
            .and_then(|name| Ok((self.literal_namespace(ns)?, name)))
            .and_then(|(ns, name)| self.open_element(ns, name));
        self.latch(result)
    }

    /// Open a declared element
    pub fn start_element(&mut self, element: &DeclaredElement) -> Result<()> {
        self.check_state()?;
        let result = self
            .check_owner(element.writer)
            .and_then(|()| self.handle_namespace(element.namespace))
            .and_then(|ns| self.open_element(ns, Arc::clone(&element.name)));
        self.latch(result)
    }

    fn open_element(&mut self, ns: StrId, name: Arc<str>) -> Result<()> {
        let indent = match self.seq {
            Sequence::PreDoc | Sequence::Prolog => None,
            Sequence::StartTag | Sequence::Content => self.indent_for(self.frames.len())?,
            _ => return Err(ErrorKind::SequenceError.into()),
        };

        self.scratch.clear();
        if self.render_pending(TagClose::Open)? {
            self.emit()?;
            self.pending = None;
        }
        if let Some(parent) = self.frames.last_mut() {
            parent.has_children = true;
        }

        self.frames.push(Frame::new(ns, name));
        self.namespaces.push_scope();
        self.pending = Some(StartTag::new(indent));
        self.seq = Sequence::StartTag;
        Ok(())
    }

    /// Close the innermost element
    pub fn end_element(&mut self) -> Result<()> {
        self.check_state()?;
        let result = self.close_element();
        self.latch(result)
    }

    /// Close the innermost element after checking it is `{ns}name`.
    ///
    /// A mismatch is reported as `SequenceError` without writing anything
    /// and without latching the writer.
    pub fn end_element_checked(&mut self, ns: &str, name: &str) -> Result<()> {
        self.check_state()?;
        let matches = self
            .current_element()
            .map(|(open_ns, open_name)| open_ns == ns && open_name == name);
        match matches {
            Some(true) => self.end_element(),
            Some(false) => Err(ErrorKind::SequenceError.into()),
            None => self.latch(Err(ErrorKind::NoOpenElement.into())),
        }
    }

    fn close_element(&mut self) -> Result<()> {
        match self.seq {
            Sequence::StartTag | Sequence::Content => {}
            Sequence::NoDocument | Sequence::Attribute => {
                return Err(ErrorKind::SequenceError.into())
            }
            Sequence::PreDoc | Sequence::Prolog | Sequence::PostDoc => {
                return Err(ErrorKind::NoOpenElement.into())
            }
        }

        let depth = self.frames.len();
        self.scratch.clear();
        let close = if self.canonical {
            TagClose::Explicit
        } else {
            TagClose::SelfClose
        };

        if !self.render_pending(close)? {
            let frame = self
                .frames
                .last()
                .ok_or(ErrorKind::InternalInvariantViolation)?;
            let indent = if frame.has_children {
                self.indent_for(depth - 1)?
            } else {
                None
            };
            if let Some(spaces) = indent {
                push_indent(&mut self.scratch, spaces)?;
            }
            self.scratch.extend_from_slice(b"</");
            push_qname(&mut self.scratch, self.namespaces.str(frame.prefix), &frame.name);
            self.scratch.push(b'>');
        }
        self.emit()?;

        self.pending = None;
        self.frames.pop();
        self.namespaces.pop_scope();
        if self.suspended_at == depth {
            self.suspended_at = 0;
        }
        self.seq = if self.frames.is_empty() {
            Sequence::PostDoc
        } else {
            Sequence::Content
        };
        Ok(())
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Add a complete attribute by literal namespace URI and local name
    pub fn add_attribute_literal(
        &mut self,
        ns: &str,
        name: &str,
        value: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.check_state()?;
        let result = self
            .literal_name(name)
            .and_then(|name| Ok((self.literal_namespace(ns)?, name)))
            .and_then(|(ns, name)| self.push_attribute(ns, name, value.as_ref()));
        self.latch(result)
    }

    /// Add a complete declared attribute
    pub fn add_attribute(
        &mut self,
        attribute: &DeclaredAttribute,
        value: impl AsRef<[u8]>,
    ) -> Result<()> {
        self.check_state()?;
        let result = self
            .check_owner(attribute.writer)
            .and_then(|()| self.handle_namespace(attribute.namespace))
            .and_then(|ns| self.push_attribute(ns, Arc::clone(&attribute.name), value.as_ref()));
        self.latch(result)
    }

    /// Open an attribute whose value is supplied by later text calls
    pub fn start_attribute_literal(&mut self, ns: &str, name: &str) -> Result<()> {
        self.check_state()?;
        let result = self
            .literal_name(name)
            .and_then(|name| Ok((self.literal_namespace(ns)?, name)))
            .and_then(|(ns, name)| self.open_attribute(ns, name));
        self.latch(result)
    }

    pub fn start_attribute(&mut self, attribute: &DeclaredAttribute) -> Result<()> {
        self.check_state()?;
        let result = self
            .check_owner(attribute.writer)
            .and_then(|()| self.handle_namespace(attribute.namespace))
            .and_then(|ns| self.open_attribute(ns, Arc::clone(&attribute.name)));
        self.latch(result)
    }

    /// Close the attribute opened by start_attribute
    pub fn end_attribute(&mut self) -> Result<()> {
        self.check_state()?;
        let result = self.close_attribute();
        self.latch(result)
    }

    /// Close the open attribute after checking it is `{ns}name`; a mismatch
    /// is `SequenceError` and does not latch
    pub fn end_attribute_checked(&mut self, ns: &str, name: &str) -> Result<()> {
        self.check_state()?;
        let matches = self
            .current_attribute()
            .map(|(open_ns, open_name)| open_ns == ns && open_name == name);
        match matches {
            Some(true) => self.end_attribute(),
            Some(false) => Err(ErrorKind::SequenceError.into()),
            None => self.latch(Err(ErrorKind::SequenceError.into())),
        }
    }

    fn check_new_attribute(&self, ns: StrId, name: &str) -> Result<()> {
        if self.seq != Sequence::StartTag {
            return Err(ErrorKind::SequenceError.into());
        }
        if ns == EMPTY && name == "xmlns" {
            return Err(ErrorKind::InvalidNamespaceName.into());
        }
        let tag = self
            .pending
            .as_ref()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        if tag.contains(ns, name) {
            return Err(ErrorKind::DuplicateAttribute.into());
        }
        Ok(())
    }

    fn push_attribute(&mut self, ns: StrId, name: Arc<str>, value: &[u8]) -> Result<()> {
        self.check_new_attribute(ns, &name)?;
        let mut escaped = Vec::new();
        escaped
            .try_reserve(value.len())
            .map_err(|_| WriteError::new(ErrorKind::AllocationFailure))?;
        escape_attribute_into(value, &mut escaped)?;

        let tag = self
            .pending
            .as_mut()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        tag.attributes.push(Attribute {
            ns,
            name,
            value: escaped,
        });
        Ok(())
    }

    fn open_attribute(&mut self, ns: StrId, name: Arc<str>) -> Result<()> {
        self.check_new_attribute(ns, &name)?;
        let tag = self
            .pending
            .as_mut()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        tag.open = Some(Attribute {
            ns,
            name,
            value: Vec::new(),
        });
        self.seq = Sequence::Attribute;
        Ok(())
    }

    fn close_attribute(&mut self) -> Result<()> {
        if self.seq != Sequence::Attribute {
            return Err(ErrorKind::SequenceError.into());
        }
        let tag = self
            .pending
            .as_mut()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        let attr = tag.open.take().ok_or(ErrorKind::InternalInvariantViolation)?;
        tag.attributes.push(attr);
        self.seq = Sequence::StartTag;
        Ok(())
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Write character data; inside an open attribute it extends the value
    pub fn add_text(&mut self, text: impl AsRef<[u8]>) -> Result<()> {
        self.check_state()?;
        let result = self.write_text(text.as_ref());
        self.latch(result)
    }

    /// Write `text[range]` as character data
    pub fn add_bounded_text(&mut self, text: &[u8], range: Range<usize>) -> Result<()> {
        self.check_state()?;
        let result = match text.get(range) {
            Some(slice) => self.write_text(slice),
            None => Err(ErrorKind::SequenceError.into()),
        };
        self.latch(result)
    }

    /// Write a single code point as character data
    pub fn add_character(&mut self, cp: u32) -> Result<()> {
        self.check_state()?;
        let mut buf = Vec::with_capacity(4);
        let result = if is_xml_char(cp) && encode_utf8(cp, &mut buf) {
            self.write_text(&buf)
        } else {
            Err(ErrorKind::NonXmlCharacter.into())
        };
        self.latch(result)
    }

    fn write_text(&mut self, text: &[u8]) -> Result<()> {
        match self.seq {
            Sequence::Attribute => {
                let attr = self
                    .pending
                    .as_mut()
                    .and_then(|tag| tag.open.as_mut())
                    .ok_or(ErrorKind::InternalInvariantViolation)?;
                attr.value
                    .try_reserve(text.len())
                    .map_err(|_| WriteError::new(ErrorKind::AllocationFailure))?;
                let mark = attr.value.len();
                if let Err(kind) = escape_attribute_into(text, &mut attr.value) {
                    attr.value.truncate(mark);
                    return Err(kind.into());
                }
                Ok(())
            }
            Sequence::StartTag | Sequence::Content => {
                self.scratch.clear();
                self.reserve(text.len())?;
                self.render_pending(TagClose::Open)?;
                escape_text_into(text, &mut self.scratch)?;
                self.emit()?;
                self.pending = None;
                self.seq = Sequence::Content;
                Ok(())
            }
            _ => Err(ErrorKind::SequenceError.into()),
        }
    }

    // =========================================================================
    // Namespace bindings
    // =========================================================================

    /// Bind a declared namespace on the element being started. `None`
    /// uses the namespace's own prefix (generating one if it has none);
    /// `Some("")` makes it the default namespace.
    pub fn add_namespace(&mut self, ns: &Namespace, prefix: Option<&str>) -> Result<()> {
        self.check_state()?;
        let result = self.bind_declared(ns, prefix);
        self.latch(result)
    }

    fn bind_declared(&mut self, ns: &Namespace, prefix: Option<&str>) -> Result<()> {
        self.check_owner(ns.writer)?;
        let uri = self
            .namespaces
            .declaration_uri(ns.index)
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        let prefix = match prefix {
            None => self.namespaces.declared_prefix(ns.index)?,
            Some(prefix) => {
                if !prefix.is_empty() {
                    check_ncname(prefix.as_bytes())?;
                }
                self.namespaces.intern(prefix)
            }
        };
        self.bind(uri, prefix)
    }

    /// Bind `prefix` (empty for the default namespace) to `uri` on the
    /// element being started; empty both undeclares the default namespace
    pub fn add_namespace_literal(&mut self, uri: &str, prefix: &str) -> Result<()> {
        self.check_state()?;
        let result = self.bind_literal(uri, prefix);
        self.latch(result)
    }

    fn bind_literal(&mut self, uri: &str, prefix: &str) -> Result<()> {
        if !prefix.is_empty() {
            check_ncname(prefix.as_bytes())?;
        }
        if uri.is_empty() {
            if !prefix.is_empty() {
                return Err(ErrorKind::InvalidNamespaceName.into());
            }
            return self.bind(EMPTY, EMPTY);
        }
        let index = self.namespaces.declare(uri, prefix)?;
        let uri = self
            .namespaces
            .declaration_uri(index)
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        let prefix = self.namespaces.intern(prefix);
        self.bind(uri, prefix)
    }

    /// `xmlns=""` on the element being started
    pub fn unset_default_namespace(&mut self) -> Result<()> {
        self.check_state()?;
        let result = self.bind(EMPTY, EMPTY);
        self.latch(result)
    }

    fn bind(&mut self, uri: StrId, prefix: StrId) -> Result<()> {
        if self.seq != Sequence::StartTag {
            return Err(ErrorKind::SequenceError.into());
        }
        let frame = self
            .frames
            .last()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        if prefix == EMPTY && uri != EMPTY && frame.ns == EMPTY {
            return Err(ErrorKind::InvalidDefaultNamespaceDeclaration.into());
        }
        self.namespaces.bind(uri, prefix)?;
        Ok(())
    }

    /// Prefix `uri` is currently visible under ("" for the default namespace)
    pub fn lookup_prefix(&self, uri: &str) -> Option<&str> {
        if uri.is_empty() {
            return None;
        }
        let id = self.namespaces.strings().find(uri)?;
        let prefix = self.namespaces.lookup(id, true)?;
        Some(self.namespaces.str(prefix))
    }

    /// Preferred or generated prefix of a declared namespace, once known
    pub fn namespace_prefix(&self, ns: &Namespace) -> Option<&str> {
        if ns.writer != self.id {
            return None;
        }
        self.namespaces.declaration_prefix(ns.index)
    }

    // =========================================================================
    // Formatting
    // =========================================================================

    pub fn pretty_print(&self) -> usize {
        self.indentation
    }

    /// Change the indentation width; only outside of the root element
    pub fn set_pretty_print(&mut self, indentation: usize) -> Result<()> {
        self.check_state()?;
        let result = self.outside_root().map(|()| self.indentation = indentation);
        self.latch(result)
    }

    pub fn canonical(&self) -> bool {
        self.canonical
    }

    /// Toggle canonical output; only outside of the root element
    pub fn set_canonical(&mut self, canonical: bool) -> Result<()> {
        self.check_state()?;
        let result = self.outside_root().map(|()| self.canonical = canonical);
        self.latch(result)
    }

    fn outside_root(&self) -> Result<()> {
        if self.frames.is_empty() {
            Ok(())
        } else {
            Err(ErrorKind::SequenceError.into())
        }
    }

    /// Stop pretty-printing inside the current element until it closes or
    /// `resume_pretty_print` is called at the same depth. Ignored while a
    /// suspension is already active.
    pub fn suspend_pretty_print(&mut self) -> Result<()> {
        self.check_state()?;
        if self.frames.is_empty() {
            return self.latch(Err(ErrorKind::SequenceError.into()));
        }
        if self.suspended_at == 0 {
            self.suspended_at = self.frames.len();
        }
        Ok(())
    }

    /// Undo a suspension made at the current depth; ignored elsewhere
    pub fn resume_pretty_print(&mut self) -> Result<()> {
        self.check_state()?;
        if self.frames.is_empty() {
            return self.latch(Err(ErrorKind::SequenceError.into()));
        }
        if self.suspended_at == self.frames.len() {
            self.suspended_at = 0;
        }
        Ok(())
    }

    /// Depth (root = 1) at which pretty-printing is suspended, or 0
    pub fn pretty_print_suspended(&self) -> usize {
        self.suspended_at
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// (namespace URI, local name) of the innermost open element
    pub fn current_element(&self) -> Option<(&str, &str)> {
        self.frames
            .last()
            .map(|frame| (self.namespaces.str(frame.ns), &*frame.name))
    }

    /// (namespace URI, local name) of the attribute opened by start_attribute
    pub fn current_attribute(&self) -> Option<(&str, &str)> {
        self.pending
            .as_ref()
            .and_then(|tag| tag.open.as_ref())
            .map(|attr| (self.namespaces.str(attr.ns), &*attr.name))
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bytes sent to the sink in the current document
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// The sink of the document in progress
    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }
}
