//! Error types for opfbind operations.

use thiserror::Error;

/// Failures raised while turning an element tree into a typed value.
///
/// Every variant names the offending field (where there is one) and a
/// breadcrumb `path` such as `/package/metadata/link`. The first error found
/// aborts the whole document; no partial value is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing required attribute `{name}` at {path}")]
    MissingAttribute { name: String, path: String },

    #[error("missing required element `{name}` at {path}")]
    MissingElement { name: String, path: String },

    #[error("missing required text content at {path}")]
    MissingText { path: String },

    #[error("expected a single `{name}` element at {path}")]
    TooManyMatches { name: String, path: String },

    #[error("unknown element `{name}` at {path}")]
    UnknownVariant { name: String, path: String },

    #[error("invalid number `{raw}` for `{name}` at {path}")]
    InvalidNumber {
        name: String,
        raw: String,
        path: String,
    },

    #[error("invalid value `{raw}` for `{name}` at {path}")]
    InvalidEnumValue {
        name: String,
        raw: String,
        path: String,
    },
}

impl DecodeError {
    /// Breadcrumb path of the element where decoding stopped.
    pub fn path(&self) -> &str {
        match self {
            DecodeError::MissingAttribute { path, .. }
            | DecodeError::MissingElement { path, .. }
            | DecodeError::MissingText { path }
            | DecodeError::TooManyMatches { path, .. }
            | DecodeError::UnknownVariant { path, .. }
            | DecodeError::InvalidNumber { path, .. }
            | DecodeError::InvalidEnumValue { path, .. } => path,
        }
    }
}

/// Authoring mistakes in a hand-written schema table.
///
/// These are programming errors: a correct schema never produces them, no
/// matter what document is fed through it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type `{ty}` declares more than one text field (`{first}` and `{second}`)")]
    DuplicateText {
        ty: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("field `{ty}.{field}` is marked as text but is not a value field")]
    TextOnNonValue {
        ty: &'static str,
        field: &'static str,
    },

    #[error("field `{ty}.{field}` declares a wrapper but is not a list")]
    WrapperOnNonList {
        ty: &'static str,
        field: &'static str,
    },

    #[error("field `{ty}.{field}` was read as {expected} but is declared otherwise")]
    KindMismatch {
        ty: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("field index {index} is out of range for `{ty}`")]
    NoSuchField { ty: &'static str, index: usize },
}

/// Errors that can occur while reading or writing publication parts.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "zip")]
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("unbound namespace prefix `{0}`")]
    UnboundPrefix(String),

    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("part not found: {0}")]
    MissingPart(String),

    #[error("no package document listed in container")]
    NoPackage,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, Error>;
