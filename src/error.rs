//! Error Types
//!
//! Two layers:
//! - `WriteError`: what the writer engine returns, carrying an `ErrorKind`
//!   (and the underlying I/O error for sink failures)
//! - `SerializationError`: the serializer's uniform failure, tagged with the
//!   name of the document being written

use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Every condition the writer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Input bytes are not well-formed UTF-8
    InvalidEncoding,
    /// Input decodes to a code point that is not an XML Char
    NonXmlCharacter,
    /// Element, attribute, prefix or PI target is not a valid name
    InvalidName,
    /// A buffer could not grow
    AllocationFailure,
    /// Namespace URI or prefix cannot be used (empty URI, reserved prefix...)
    InvalidNamespaceName,
    /// Writer state is inconsistent
    InternalInvariantViolation,
    /// One prefix bound to two different URIs on the same element
    DuplicatePrefix,
    /// Call made in an illegal state or order
    SequenceError,
    /// `end_element` with no open element
    NoOpenElement,
    /// The sink failed to accept or flush bytes
    IoFailure,
    /// A mandatory value was empty or absent
    MissingRequiredValue,
    /// Comment contains `--` or ends with `-`
    MalformedComment,
    /// PI target is `xml` in any case
    ReservedPiTarget,
    /// PI text contains `?>`
    MalformedPi,
    /// Same qualified attribute name twice on one element
    DuplicateAttribute,
    /// Attribute namespace is only available as the default namespace
    AttributeInDefaultNamespace,
    /// One URI bound under two different prefixes on the same element
    DuplicateNamespace,
    /// Default namespace declared on an element that is in no namespace
    InvalidDefaultNamespaceDeclaration,
}

impl ErrorKind {
    /// Human-readable description of the condition
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidEncoding => "malformed UTF-8",
            ErrorKind::NonXmlCharacter => "character not allowed in XML",
            ErrorKind::InvalidName => "invalid XML name",
            ErrorKind::AllocationFailure => "memory allocation failed",
            ErrorKind::InvalidNamespaceName => "invalid namespace name or prefix",
            ErrorKind::InternalInvariantViolation => "internal writer error",
            ErrorKind::DuplicatePrefix => "prefix bound to more than one namespace on the same element",
            ErrorKind::SequenceError => "call out of sequence",
            ErrorKind::NoOpenElement => "no open element to end",
            ErrorKind::IoFailure => "I/O error",
            ErrorKind::MissingRequiredValue => "required value missing",
            ErrorKind::MalformedComment => "comment contains '--' or ends with '-'",
            ErrorKind::ReservedPiTarget => "'xml' is reserved as a processing instruction target",
            ErrorKind::MalformedPi => "processing instruction contains '?>'",
            ErrorKind::DuplicateAttribute => "duplicate attribute",
            ErrorKind::AttributeInDefaultNamespace => "attribute cannot be in the default namespace",
            ErrorKind::DuplicateNamespace => "namespace bound to more than one prefix on the same element",
            ErrorKind::InvalidDefaultNamespaceDeclaration => {
                "default namespace cannot be declared on an element in no namespace"
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Error returned by the writer engine.
///
/// Cheap to clone so a latched writer can hand back the same error on
/// every later call.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct WriteError {
    kind: ErrorKind,
    #[source]
    source: Option<Arc<io::Error>>,
}

impl WriteError {
    pub fn new(kind: ErrorKind) -> Self {
        WriteError { kind, source: None }
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The sink error behind an `IoFailure`, if any
    pub fn io_error(&self) -> Option<&io::Error> {
        self.source.as_deref()
    }
}

impl From<ErrorKind> for WriteError {
    fn from(kind: ErrorKind) -> Self {
        WriteError::new(kind)
    }
}

impl From<io::Error> for WriteError {
    fn from(err: io::Error) -> Self {
        WriteError {
            kind: ErrorKind::IoFailure,
            source: Some(Arc::new(err)),
        }
    }
}

impl PartialEq<ErrorKind> for WriteError {
    fn eq(&self, other: &ErrorKind) -> bool {
        self.kind == *other
    }
}

pub type Result<T> = std::result::Result<T, WriteError>;

/// Failure reported by [`Serializer`](crate::Serializer).
///
/// Carries the output name given to the serializer so diagnostics can say
/// which document failed, plus the underlying kind for programmatic use.
#[derive(Debug, Clone, Error)]
#[error("{}error: {description}", display_name(.name))]
pub struct SerializationError {
    name: String,
    description: String,
    kind: ErrorKind,
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!("{}: ", name)
    }
}

impl SerializationError {
    pub fn new(name: impl Into<String>, kind: ErrorKind) -> Self {
        SerializationError {
            name: name.into(),
            description: kind.message().to_string(),
            kind,
        }
    }

    /// Same as `new` but with a caller-supplied description
    pub fn with_description(
        name: impl Into<String>,
        kind: ErrorKind,
        description: impl Into<String>,
    ) -> Self {
        SerializationError {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }

    pub(crate) fn from_write(name: &str, err: WriteError) -> Self {
        let description = match err.io_error() {
            Some(io) => format!("{}: {}", err.kind().message(), io),
            None => err.kind().message().to_string(),
        };
        SerializationError::with_description(name, err.kind(), description)
    }

    /// Output name of the document being serialized
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}
