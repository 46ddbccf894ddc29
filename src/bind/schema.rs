//! Structural descriptors: the static schema tables the engine walks.
//!
//! Each bound type has one `static` [`Descriptor`] listing its fields in
//! declared order. Descriptors reference each other by `&'static`, so
//! recursive types (a collection containing collections) simply point back at
//! their own table.

use std::fmt;
use std::sync::OnceLock;

use super::tag::{self, Tag};
use crate::error::SchemaError;

/// Namespace of a tag or descriptor.
///
/// [`TagNamespace::Inherit`] and [`TagNamespace::Unqualified`] are distinct:
/// the former takes the enclosing element's namespace, the latter is
/// explicitly "no namespace".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagNamespace {
    Inherit,
    Unqualified,
    Uri(&'static str),
}

/// What a repeated field holds.
#[derive(Debug, Clone, Copy)]
pub enum Items {
    /// Every item has the same concrete type.
    Of(&'static Descriptor),
    /// Each item is one of a closed set of types, selected by element name.
    OneOf(&'static [&'static Descriptor]),
}

/// Structural kind of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A primitive or enum, stored in an attribute or the element's text.
    Value,
    /// A single nested element.
    Element(&'static Descriptor),
    /// A repeated element, optionally under a wrapper.
    List(Items),
    /// Collects every attribute not claimed by another field.
    Overflow,
}

/// One field of a bound type.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Declared name; the XML name unless renamed.
    pub name: &'static str,
    pub kind: FieldKind,
    /// The field has a declared default, so it may be absent.
    pub has_default: bool,
    /// Absence stands for "no value".
    pub nullable: bool,
    pub rename: Option<&'static str>,
    pub namespace: TagNamespace,
    /// This field is the element's text content.
    pub text: bool,
    pub wrapper: Option<&'static str>,
    pub elements_name: Option<&'static str>,
    /// Prefix declarations attached to the element this field creates.
    pub namespaces: &'static [(&'static str, &'static str)],
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            has_default: false,
            nullable: false,
            rename: None,
            namespace: TagNamespace::Inherit,
            text: false,
            wrapper: None,
            elements_name: None,
            namespaces: &[],
        }
    }

    /// A primitive or enum field, placed as an attribute.
    pub const fn value(name: &'static str) -> Self {
        Self::new(name, FieldKind::Value)
    }

    /// A primitive or enum field holding the element's text.
    pub const fn text(name: &'static str) -> Self {
        let mut field = Self::new(name, FieldKind::Value);
        field.text = true;
        field
    }

    pub const fn element(name: &'static str, descriptor: &'static Descriptor) -> Self {
        Self::new(name, FieldKind::Element(descriptor))
    }

    pub const fn list(name: &'static str, descriptor: &'static Descriptor) -> Self {
        Self::new(name, FieldKind::List(Items::Of(descriptor)))
    }

    pub const fn variants(name: &'static str, variants: &'static [&'static Descriptor]) -> Self {
        Self::new(name, FieldKind::List(Items::OneOf(variants)))
    }

    pub const fn overflow(name: &'static str) -> Self {
        let mut field = Self::new(name, FieldKind::Overflow);
        field.has_default = true;
        field
    }

    /// The field may be absent and then takes its default.
    pub const fn optional(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// The field may be absent and is then `None`.
    pub const fn nullable(mut self) -> Self {
        self.has_default = true;
        self.nullable = true;
        self
    }

    pub const fn rename(mut self, name: &'static str) -> Self {
        self.rename = Some(name);
        self
    }

    pub const fn namespace(mut self, uri: &'static str) -> Self {
        self.namespace = TagNamespace::Uri(uri);
        self
    }

    pub const fn unqualified(mut self) -> Self {
        self.namespace = TagNamespace::Unqualified;
        self
    }

    /// Nest all items under one `wrapper` element.
    pub const fn wrapped(mut self, wrapper: &'static str) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    pub const fn elements_name(mut self, name: &'static str) -> Self {
        self.elements_name = Some(name);
        self
    }

    /// Mark as text content, whatever the constructor said.
    pub const fn as_text(mut self) -> Self {
        self.text = true;
        self
    }

    pub const fn declare(mut self, namespaces: &'static [(&'static str, &'static str)]) -> Self {
        self.namespaces = namespaces;
        self
    }
}

/// The ordered schema of a bound type.
///
/// `name` and `namespace` name the element when the type appears as a
/// document root or as a variant in a [`Items::OneOf`] list; elsewhere the
/// field's tag decides.
pub struct Descriptor {
    pub name: &'static str,
    pub namespace: TagNamespace,
    pub fields: &'static [Field],
    /// Prefix declarations attached when this type creates a root or variant element.
    pub namespaces: &'static [(&'static str, &'static str)],
    tags: OnceLock<Result<Vec<Tag>, SchemaError>>,
}

impl Descriptor {
    pub const fn new(name: &'static str, namespace: TagNamespace, fields: &'static [Field]) -> Self {
        Self {
            name,
            namespace,
            fields,
            namespaces: &[],
            tags: OnceLock::new(),
        }
    }

    /// Like [`Descriptor::new`], declaring prefixes on the element this type creates.
    pub const fn with_namespaces(
        name: &'static str,
        namespace: TagNamespace,
        fields: &'static [Field],
        namespaces: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            name,
            namespace,
            fields,
            namespaces,
            tags: OnceLock::new(),
        }
    }

    /// Resolved tags for every field, computed once and cached.
    pub fn tags(&self) -> Result<&[Tag], SchemaError> {
        self.tags
            .get_or_init(|| (0..self.fields.len()).map(|i| tag::resolve_tag(self, i)).collect())
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Index of the field with the given declared name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

// Descriptors may be recursive, so only the shallow shape is printed.
impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field(
                "fields",
                &self.fields.iter().map(|field| field.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
