//! String Interning Pool
//!
//! Deduplicated storage for namespace URIs and prefixes so the namespace
//! scope stack can compare bindings as `u32` ids instead of strings.
//!
//! Id 0 is reserved for the empty string (the default prefix, or "no
//! namespace").

use std::collections::HashMap;

/// Interned string id
pub type StrId = u32;

/// The empty string
pub const EMPTY: StrId = 0;

/// String interning pool
///
/// Memory layout:
/// - `spans`: (offset, len) into `data` for each id
/// - `data`: concatenated string bytes
/// - `index`: content -> id
#[derive(Debug)]
pub struct StringPool {
    spans: Vec<(u32, u32)>,
    data: String,
    index: HashMap<Box<str>, StrId>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        let mut pool = StringPool {
            spans: Vec::with_capacity(32),
            data: String::with_capacity(512),
            index: HashMap::new(),
        };
        // Entry 0 is the empty string
        pool.spans.push((0, 0));
        pool
    }

    /// Intern a string, returning the existing id if already present
    pub fn intern(&mut self, s: &str) -> StrId {
        if s.is_empty() {
            return EMPTY;
        }
        if let Some(&id) = self.index.get(s) {
            return id;
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);
        let id = self.spans.len() as StrId;
        self.spans.push((offset, s.len() as u32));
        self.index.insert(s.into(), id);
        id
    }

    /// Look up an id without interning
    #[inline]
    pub fn find(&self, s: &str) -> Option<StrId> {
        if s.is_empty() {
            return Some(EMPTY);
        }
        self.index.get(s).copied()
    }

    /// Get a string by id (empty for unknown ids)
    pub fn get(&self, id: StrId) -> &str {
        match self.spans.get(id as usize) {
            Some(&(offset, len)) => {
                let start = offset as usize;
                &self.data[start..start + len as usize]
            }
            None => "",
        }
    }

    /// Number of interned strings, including the reserved empty entry
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.spans.len() <= 1
    }
}
