//! Tag resolution: how each field is placed in XML.

use super::schema::{Descriptor, FieldKind, TagNamespace};
use crate::error::SchemaError;

/// Where a field lives relative to its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Attribute,
    Text,
    ChildElement,
    WrappedList,
    UnwrappedList,
    AttributeOverflow,
}

/// Resolved serialization directive for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: &'static str,
    pub namespace: TagNamespace,
    pub placement: Placement,
    pub wrapper_name: Option<&'static str>,
    pub elements_name: Option<&'static str>,
    pub additional_namespaces: &'static [(&'static str, &'static str)],
    /// No declared default: absence is an error.
    pub required: bool,
    pub nullable: bool,
}

impl Tag {
    /// Element name of one list item with a fixed type.
    pub fn item_name(&self) -> &'static str {
        self.elements_name.unwrap_or(self.name)
    }

    /// Name reported when the field's construct is missing.
    pub fn missing_name(&self) -> &'static str {
        match self.placement {
            Placement::WrappedList => self.wrapper_name.unwrap_or(self.name),
            Placement::UnwrappedList => self.item_name(),
            _ => self.name,
        }
    }
}

/// Resolve the tag of field `index` of `descriptor`.
///
/// Pure and deterministic; [`Descriptor::tags`] caches the result for every
/// field. Rejects a type declaring two text fields, a text flag on anything but
/// a value field, and a wrapper on anything but a list.
pub fn resolve_tag(descriptor: &Descriptor, index: usize) -> Result<Tag, SchemaError> {
    let field = descriptor.fields.get(index).ok_or(SchemaError::NoSuchField {
        ty: descriptor.name,
        index,
    })?;

    if field.text {
        if !matches!(field.kind, FieldKind::Value) {
            return Err(SchemaError::TextOnNonValue {
                ty: descriptor.name,
                field: field.name,
            });
        }
        if let Some((other_index, other)) = descriptor
            .fields
            .iter()
            .enumerate()
            .find(|(i, other)| other.text && *i != index)
        {
            let (first, second) = if other_index < index {
                (other.name, field.name)
            } else {
                (field.name, other.name)
            };
            return Err(SchemaError::DuplicateText {
                ty: descriptor.name,
                first,
                second,
            });
        }
    }

    let placement = match field.kind {
        FieldKind::Value if field.text => Placement::Text,
        FieldKind::Value => Placement::Attribute,
        FieldKind::Element(_) => Placement::ChildElement,
        FieldKind::List(_) if field.wrapper.is_some() => Placement::WrappedList,
        FieldKind::List(_) => Placement::UnwrappedList,
        FieldKind::Overflow => Placement::AttributeOverflow,
    };

    if field.wrapper.is_some() && placement != Placement::WrappedList {
        return Err(SchemaError::WrapperOnNonList {
            ty: descriptor.name,
            field: field.name,
        });
    }

    Ok(Tag {
        name: field.rename.unwrap_or(field.name),
        namespace: field.namespace,
        placement,
        wrapper_name: field.wrapper,
        elements_name: field.elements_name,
        additional_namespaces: field.namespaces,
        required: !field.has_default,
        nullable: field.nullable,
    })
}
