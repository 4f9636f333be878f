//! Namespace Registry
//!
//! Two pieces of state:
//! - declarations: URIs registered with the writer (with a preferred prefix,
//!   or a generated `g-<n>` one picked on first use), living as long as
//!   the writer
//! - bindings: a stack of (prefix, URI) entries for the open elements,
//!   split into per-element runs by `scope_starts`; closing an element truncates the stack back to where the
//!   element started, restoring the parent's visible set
//!
//! A binding is visible within the element that declared it and its
//! descendants until that element closes.

use std::collections::{HashMap, HashSet};

use log::trace;

use super::strings::{StrId, StringPool, EMPTY};
use crate::core::chars::check_text;
use crate::core::names::check_ncname;
use crate::error::ErrorKind;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Index of a declaration in the registry
pub type NsIndex = u32;

#[derive(Debug, Clone)]
struct Declaration {
    uri: StrId,
    /// EMPTY means "generate one when needed"
    preferred: StrId,
    generated: Option<StrId>,
}

/// Namespace binding (prefix -> URI) introduced by one element
#[derive(Debug, Clone, Copy)]
struct Binding {
    prefix: StrId,
    uri: StrId,
    /// Needs an xmlns attribute in the element's start tag
    emit: bool,
}

/// Outcome of a bind request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// A new binding was added on the current element
    Added,
    /// The same mapping was already in effect; nothing to write
    AlreadyVisible,
}

#[derive(Debug)]
pub struct NamespaceRegistry {
    strings: StringPool,
    declarations: Vec<Declaration>,
    by_uri: HashMap<StrId, NsIndex>,
    /// Preferred prefixes of all declarations; never handed out as generated names
    reserved_prefixes: HashSet<StrId>,
    bindings: Vec<Binding>,
    /// Binding stack length at each push_scope
    scope_starts: Vec<usize>,
    next_generated: u32,
    xml_prefix: StrId,
    xmlns_prefix: StrId,
    xml_uri: StrId,
    xmlns_uri: StrId,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceRegistry {
    /// Create a registry with the xml prefix pre-bound
    pub fn new() -> Self {
        let mut strings = StringPool::new();
        let xml_prefix = strings.intern("xml");
        let xmlns_prefix = strings.intern("xmlns");
        let xml_uri = strings.intern(ns::XML);
        let xmlns_uri = strings.intern(ns::XMLNS);

        let mut registry = NamespaceRegistry {
            strings,
            declarations: Vec::new(),
            by_uri: HashMap::new(),
            reserved_prefixes: HashSet::new(),
            bindings: Vec::with_capacity(16),
            scope_starts: Vec::with_capacity(16),
            next_generated: 1,
            xml_prefix,
            xmlns_prefix,
            xml_uri,
            xmlns_uri,
        };

        registry.declarations.push(Declaration {
            uri: xml_uri,
            preferred: xml_prefix,
            generated: None,
        });
        registry.by_uri.insert(xml_uri, 0);
        registry.reserved_prefixes.insert(xml_prefix);
        registry.reset_scopes();
        registry
    }

    /// Drop every binding except the permanent xml one
    pub fn reset_scopes(&mut self) {
        self.bindings.clear();
        self.scope_starts.clear();
        self.bindings.push(Binding {
            prefix: self.xml_prefix,
            uri: self.xml_uri,
            emit: false,
        });
    }

    #[inline]
    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    #[inline]
    pub fn str(&self, id: StrId) -> &str {
        self.strings.get(id)
    }

    /// Intern a URI or prefix
    #[inline]
    pub fn intern(&mut self, s: &str) -> StrId {
        self.strings.intern(s)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Register a namespace URI with an optional preferred prefix.
    ///
    /// Declaring an already known URI returns the existing declaration; a
    /// preferred prefix is recorded only if none was given before.
    pub fn declare(&mut self, uri: &str, preferred: &str) -> Result<NsIndex, ErrorKind> {
        if uri.is_empty() {
            return Err(ErrorKind::InvalidNamespaceName);
        }
        check_text(uri.as_bytes())?;
        if !preferred.is_empty() {
            check_ncname(preferred.as_bytes())?;
        }

        let uri_id = self.strings.intern(uri);
        let prefix_id = self.strings.intern(preferred);
        self.check_reserved(prefix_id, uri_id)?;

        if let Some(&index) = self.by_uri.get(&uri_id) {
            let decl = &mut self.declarations[index as usize];
            if decl.preferred == EMPTY && prefix_id != EMPTY {
                decl.preferred = prefix_id;
                self.reserved_prefixes.insert(prefix_id);
            }
            return Ok(index);
        }

        let index = self.declarations.len() as NsIndex;
        self.declarations.push(Declaration {
            uri: uri_id,
            preferred: prefix_id,
            generated: None,
        });
        self.by_uri.insert(uri_id, index);
        if prefix_id != EMPTY {
            self.reserved_prefixes.insert(prefix_id);
        }
        Ok(index)
    }

    /// Id of `uri` if it has been declared
    pub fn declared_uri(&self, uri: &str) -> Option<StrId> {
        self.strings
            .find(uri)
            .filter(|id| self.by_uri.contains_key(id))
    }

    /// URI of a declaration
    pub fn declaration_uri(&self, index: NsIndex) -> Option<StrId> {
        self.declarations.get(index as usize).map(|d| d.uri)
    }

    /// The prefix a declaration would be written with, if one is known yet
    pub fn declaration_prefix(&self, index: NsIndex) -> Option<&str> {
        let decl = self.declarations.get(index as usize)?;
        if decl.preferred != EMPTY {
            return Some(self.strings.get(decl.preferred));
        }
        decl.generated.map(|id| self.strings.get(id))
    }

    /// Prefix to bind a declaration under when the caller names none:
    /// the preferred one, else its generated one (created on first use)
    pub fn declared_prefix(&mut self, index: NsIndex) -> Result<StrId, ErrorKind> {
        let decl = self
            .declarations
            .get(index as usize)
            .cloned()
            .ok_or(ErrorKind::InternalInvariantViolation)?;
        if decl.preferred != EMPTY {
            return Ok(decl.preferred);
        }
        if let Some(generated) = decl.generated {
            return Ok(generated);
        }
        let generated = self.generate_prefix();
        self.declarations[index as usize].generated = Some(generated);
        Ok(generated)
    }

    /// xml and xmlns are reserved: xml only for its own URI, xmlns never
    fn check_reserved(&self, prefix: StrId, uri: StrId) -> Result<(), ErrorKind> {
        if prefix == self.xmlns_prefix || uri == self.xmlns_uri {
            return Err(ErrorKind::InvalidNamespaceName);
        }
        if prefix == self.xml_prefix && uri != self.xml_uri {
            return Err(ErrorKind::InvalidNamespaceName);
        }
        if uri == self.xml_uri && prefix != self.xml_prefix && prefix != EMPTY {
            return Err(ErrorKind::InvalidNamespaceName);
        }
        Ok(())
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.scope_starts.push(self.bindings.len());
    }

    /// Leave an element scope, removing every binding declared in it
    pub fn pop_scope(&mut self) {
        if let Some(start) = self.scope_starts.pop() {
            self.bindings.truncate(start);
        }
    }

    fn current_bindings(&self) -> &[Binding] {
        let start = self.scope_starts.last().copied().unwrap_or(self.bindings.len());
        &self.bindings[start..]
    }

    /// Resolve a prefix to its URI (EMPTY for an undeclared default namespace)
    pub fn resolve(&self, prefix: StrId) -> Option<StrId> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri)
    }

    /// Nearest visible prefix for `uri`; a binding only counts if its
    /// prefix has not been rebound to something else further in.
    pub fn lookup(&self, uri: StrId, allow_default: bool) -> Option<StrId> {
        self.bindings
            .iter()
            .rev()
            .filter(|b| b.uri == uri && (allow_default || b.prefix != EMPTY))
            .map(|b| b.prefix)
            .find(|&prefix| self.resolve(prefix) == Some(uri))
    }

    /// Bind `prefix` to `uri` on the element whose start tag is open.
    ///
    /// An empty `uri` with an empty `prefix` undeclares the default
    /// namespace (`xmlns=""`).
    pub fn bind(&mut self, uri: StrId, prefix: StrId) -> Result<Bound, ErrorKind> {
        if self.scope_starts.is_empty() {
            return Err(ErrorKind::SequenceError);
        }
        self.check_reserved(prefix, uri)?;
        if uri == EMPTY && prefix != EMPTY {
            return Err(ErrorKind::InvalidNamespaceName);
        }
        if uri == self.xml_uri && prefix == EMPTY {
            return Err(ErrorKind::InvalidNamespaceName);
        }
        if prefix == self.xml_prefix {
            return Ok(Bound::AlreadyVisible);
        }

        for b in self.current_bindings() {
            if b.prefix == prefix {
                return if b.uri == uri {
                    Ok(Bound::AlreadyVisible)
                } else {
                    Err(ErrorKind::DuplicatePrefix)
                };
            }
            if uri != EMPTY && b.uri == uri {
                return Err(ErrorKind::DuplicateNamespace);
            }
        }

        if uri != EMPTY && self.resolve(prefix) == Some(uri) {
            return Ok(Bound::AlreadyVisible);
        }

        self.bindings.push(Binding {
            prefix,
            uri,
            emit: true,
        });
        Ok(Bound::Added)
    }

    /// Bindings added on the current element, in declaration order
    pub fn pending_declarations(&self) -> impl Iterator<Item = (StrId, StrId)> + '_ {
        self.current_bindings()
            .iter()
            .filter(|b| b.emit)
            .map(|b| (b.prefix, b.uri))
    }

    /// Is `uri` bound on the current element under the given kind of prefix
    fn bound_here(&self, uri: StrId, default: bool) -> Option<StrId> {
        self.current_bindings()
            .iter()
            .find(|b| b.uri == uri && (b.prefix == EMPTY) == default)
            .map(|b| b.prefix)
    }

    // =========================================================================
    // Prefix resolution for names being written
    // =========================================================================

    /// Prefix to write an element in `uri` with, adding bindings as needed
    pub fn element_prefix(&mut self, uri: StrId) -> Result<StrId, ErrorKind> {
        if uri == EMPTY {
            // An inherited default namespace would capture this element
            if matches!(self.resolve(EMPTY), Some(default) if default != EMPTY) {
                self.bind(EMPTY, EMPTY)?;
            }
            return Ok(EMPTY);
        }

        if self.bound_here(uri, true).is_some() {
            return Ok(EMPTY);
        }
        if let Some(prefix) = self.bound_here(uri, false) {
            return Ok(prefix);
        }
        if let Some(prefix) = self.lookup(uri, true) {
            return Ok(prefix);
        }
        self.auto_bind(uri)
    }

    /// Prefix to write an attribute in `uri` with, adding bindings as needed
    pub fn attribute_prefix(&mut self, uri: StrId) -> Result<StrId, ErrorKind> {
        if uri == EMPTY {
            return Ok(EMPTY);
        }
        if let Some(prefix) = self.lookup(uri, false) {
            return Ok(prefix);
        }
        if self.bound_here(uri, true).is_some() {
            return Err(ErrorKind::AttributeInDefaultNamespace);
        }
        self.auto_bind(uri)
    }

    fn auto_bind(&mut self, uri: StrId) -> Result<StrId, ErrorKind> {
        let index = match self.by_uri.get(&uri) {
            Some(&index) => index,
            None => return Err(ErrorKind::InternalInvariantViolation),
        };

        let decl = self.declarations[index as usize].clone();
        let candidate = if decl.preferred != EMPTY {
            Some(decl.preferred)
        } else {
            decl.generated
        };

        let prefix = match candidate {
            Some(p) if self.prefix_usable(p, uri) => p,
            _ => {
                let generated = self.generate_prefix();
                if decl.generated.is_none() {
                    self.declarations[index as usize].generated = Some(generated);
                }
                generated
            }
        };

        self.bind(uri, prefix)?;
        Ok(prefix)
    }

    /// A prefix can be bound without shadowing an unrelated visible binding
    fn prefix_usable(&self, prefix: StrId, uri: StrId) -> bool {
        match self.resolve(prefix) {
            None => true,
            Some(bound) => bound == uri,
        }
    }

    /// Next `g-<n>` not preferred by any declaration and not visible in scope
    fn generate_prefix(&mut self) -> StrId {
        loop {
            let name = format!("g-{}", self.next_generated);
            self.next_generated += 1;
            let id = self.strings.intern(&name);
            if self.reserved_prefixes.contains(&id) || self.resolve(id).is_some() {
                trace!("skipping generated prefix {} (already taken)", name);
                continue;
            }
            trace!("generated namespace prefix {}", name);
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_scope() -> NamespaceRegistry {
        let mut reg = NamespaceRegistry::new();
        reg.push_scope();
        reg
    }

    #[test]
    fn test_xml_prefix_prebound() {
        let reg = NamespaceRegistry::new();
        let xml = reg.strings().find("xml").unwrap();
        let uri = reg.strings().find(ns::XML).unwrap();
        assert_eq!(reg.resolve(xml), Some(uri));
    }

    #[test]
    fn test_declare_is_idempotent() {
        let mut reg = NamespaceRegistry::new();
        let a = reg.declare("urn:a", "").unwrap();
        let b = reg.declare("urn:a", "pa").unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.declaration_prefix(a), Some("pa"));
        assert_eq!(reg.declare("urn:a", "other").unwrap(), a);
        assert_eq!(reg.declaration_prefix(a), Some("pa"));
    }

    #[test]
    fn test_declare_rejects_bad_input() {
        let mut reg = NamespaceRegistry::new();
        assert_eq!(reg.declare("", "p"), Err(ErrorKind::InvalidNamespaceName));
        assert_eq!(reg.declare("urn:a", "1p"), Err(ErrorKind::InvalidName));
        assert_eq!(reg.declare("urn:a", "xmlns"), Err(ErrorKind::InvalidNamespaceName));
        assert_eq!(reg.declare("urn:a", "xml"), Err(ErrorKind::InvalidNamespaceName));
        assert_eq!(reg.declare(ns::XMLNS, ""), Err(ErrorKind::InvalidNamespaceName));
        assert_eq!(reg.declare(ns::XML, "x"), Err(ErrorKind::InvalidNamespaceName));
        assert_eq!(reg.declare("urn:\u{1}", ""), Err(ErrorKind::NonXmlCharacter));
    }

    #[test]
    fn test_bind_and_scope_pop() {
        let mut reg = registry_with_scope();
        let p = reg.intern("foo");
        let uri = reg.intern("http://example.com/foo");

        assert_eq!(reg.bind(uri, p), Ok(Bound::Added));
        assert_eq!(reg.resolve(p), Some(uri));

        reg.pop_scope();
        assert_eq!(reg.resolve(p), None);
    }

    #[test]
    fn test_duplicate_prefix_on_one_element() {
        let mut reg = registry_with_scope();
        let p = reg.intern("p");
        let a = reg.intern("urn:a");
        let b = reg.intern("urn:b");
        reg.bind(a, p).unwrap();
        assert_eq!(reg.bind(b, p), Err(ErrorKind::DuplicatePrefix));
        assert_eq!(reg.bind(a, p), Ok(Bound::AlreadyVisible));
    }

    #[test]
    fn test_duplicate_namespace_on_one_element() {
        let mut reg = registry_with_scope();
        let p = reg.intern("p");
        let q = reg.intern("q");
        let a = reg.intern("urn:a");
        reg.bind(a, p).unwrap();
        assert_eq!(reg.bind(a, q), Err(ErrorKind::DuplicateNamespace));
    }

    #[test]
    fn test_shadow_binding() {
        let mut reg = registry_with_scope();
        let p = reg.intern("ns");
        let uri1 = reg.intern("http://example.com/ns1");
        let uri2 = reg.intern("http://example.com/ns2");

        reg.bind(uri1, p).unwrap();
        reg.push_scope();
        reg.bind(uri2, p).unwrap();
        assert_eq!(reg.resolve(p), Some(uri2));
        // uri1 is no longer reachable through "ns"
        assert_eq!(reg.lookup(uri1, true), None);

        reg.pop_scope();
        assert_eq!(reg.resolve(p), Some(uri1));
        assert_eq!(reg.lookup(uri1, true), Some(p));
    }

    #[test]
    fn test_redundant_inherited_binding_not_emitted() {
        let mut reg = registry_with_scope();
        let p = reg.intern("p");
        let a = reg.intern("urn:a");
        reg.bind(a, p).unwrap();
        reg.push_scope();
        assert_eq!(reg.bind(a, p), Ok(Bound::AlreadyVisible));
        assert_eq!(reg.pending_declarations().count(), 0);
    }

    #[test]
    fn test_unset_default() {
        let mut reg = registry_with_scope();
        let a = reg.intern("urn:a");
        reg.bind(a, EMPTY).unwrap();
        assert_eq!(reg.bind(EMPTY, EMPTY), Err(ErrorKind::DuplicatePrefix));

        reg.push_scope();
        assert_eq!(reg.bind(EMPTY, EMPTY), Ok(Bound::Added));
        assert_eq!(reg.resolve(EMPTY), Some(EMPTY));
    }

    #[test]
    fn test_element_prefix_auto_binds_preferred() {
        let mut reg = registry_with_scope();
        let index = reg.declare("urn:a", "a").unwrap();
        let uri = reg.declaration_uri(index).unwrap();
        let prefix = reg.element_prefix(uri).unwrap();
        assert_eq!(reg.str(prefix), "a");
        let decls: Vec<_> = reg.pending_declarations().collect();
        assert_eq!(decls, vec![(prefix, uri)]);
    }

    #[test]
    fn test_element_prefix_generates() {
        let mut reg = registry_with_scope();
        let index = reg.declare("urn:gen", "").unwrap();
        let uri = reg.declaration_uri(index).unwrap();
        let prefix = reg.element_prefix(uri).unwrap();
        assert_eq!(reg.str(prefix), "g-1");
        assert_eq!(reg.declaration_prefix(index), Some("g-1"));
    }

    #[test]
    fn test_generated_prefix_skips_user_prefixes() {
        let mut reg = registry_with_scope();
        reg.declare("urn:user", "g-1").unwrap();
        let index = reg.declare("urn:gen", "").unwrap();
        let uri = reg.declaration_uri(index).unwrap();

        // g-2 is bound by hand in scope, so it is skipped too
        let g2 = reg.intern("g-2");
        let other = reg.intern("urn:other");
        reg.bind(other, g2).unwrap();

        let prefix = reg.element_prefix(uri).unwrap();
        assert_eq!(reg.str(prefix), "g-3");
    }

    #[test]
    fn test_element_in_no_namespace_undeclares_default() {
        let mut reg = registry_with_scope();
        let a = reg.intern("urn:a");
        reg.bind(a, EMPTY).unwrap();
        reg.push_scope();
        assert_eq!(reg.element_prefix(EMPTY), Ok(EMPTY));
        let decls: Vec<_> = reg.pending_declarations().collect();
        assert_eq!(decls, vec![(EMPTY, EMPTY)]);
    }

    #[test]
    fn test_attribute_prefix_needs_non_default() {
        let mut reg = registry_with_scope();
        let index = reg.declare("urn:a", "").unwrap();
        let uri = reg.declaration_uri(index).unwrap();
        reg.bind(uri, EMPTY).unwrap();
        assert_eq!(reg.attribute_prefix(uri), Err(ErrorKind::AttributeInDefaultNamespace));

        // One level down the default is inherited, so a prefix can be added
        reg.push_scope();
        let prefix = reg.attribute_prefix(uri).unwrap();
        assert_ne!(prefix, EMPTY);
    }

    #[test]
    fn test_preferred_prefix_not_used_when_shadowing() {
        let mut reg = registry_with_scope();
        let p = reg.intern("p");
        let other = reg.intern("urn:other");
        reg.bind(other, p).unwrap();

        reg.push_scope();
        let index = reg.declare("urn:a", "p").unwrap();
        let uri = reg.declaration_uri(index).unwrap();
        let prefix = reg.attribute_prefix(uri).unwrap();
        assert_ne!(prefix, p);
        assert_eq!(reg.resolve(p), Some(other));
    }
}
