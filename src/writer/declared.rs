//! Declared Handles
//!
//! Names validated once and reused. A handle remembers which writer made
//! it; passing it to a different writer is a `SequenceError`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::namespace::NsIndex;

static NEXT_WRITER_ID: AtomicU64 = AtomicU64::new(1);

/// Fresh id for a new writer
pub(crate) fn next_writer_id() -> u64 {
    NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed)
}

/// A namespace registered with a writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub(crate) writer: u64,
    pub(crate) index: NsIndex,
}

/// An element name validated by a writer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredElement {
    pub(crate) writer: u64,
    pub(crate) namespace: Option<Namespace>,
    pub(crate) name: Arc<str>,
}

impl DeclaredElement {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace
    }
}

/// An attribute name validated by a writer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredAttribute {
    pub(crate) writer: u64,
    pub(crate) namespace: Option<Namespace>,
    pub(crate) name: Arc<str>,
}

impl DeclaredAttribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace
    }
}
