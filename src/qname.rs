//! Qualified Names
//!
//! A (namespace URI, local name) pair. The prefix is not part of the
//! name: the writer chooses it from the namespaces in scope.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: String,
    name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        QName {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// A name in no namespace
    pub fn local(name: impl Into<String>) -> Self {
        QName::new(String::new(), name)
    }

    /// Namespace URI (empty for no namespace)
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty() && self.name.is_empty()
    }

    /// Compare against a borrowed (namespace, name) pair
    #[inline]
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.namespace == namespace && self.name == name
    }
}

/// `namespace#name`, or just `name` when there is no namespace
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}#{}", self.namespace, self.name)
        }
    }
}

impl From<&str> for QName {
    fn from(name: &str) -> Self {
        QName::local(name)
    }
}

impl From<String> for QName {
    fn from(name: String) -> Self {
        QName::local(name)
    }
}

impl From<(&str, &str)> for QName {
    fn from((namespace, name): (&str, &str)) -> Self {
        QName::new(namespace, name)
    }
}

impl From<&QName> for QName {
    fn from(qname: &QName) -> Self {
        qname.clone()
    }
}
