//! Encode engine: typed value to element tree.
//!
//! The mirror of [`decode`](super::decode). A field reporting
//! [`Output::Default`] is not written at all; that is how version-specific
//! output is produced without the engine knowing about versions.

use std::borrow::Cow;

use tracing::debug;

use super::namespace::{attach_declarations, attribute_namespace, effective};
use super::schema::{Descriptor, FieldKind, Items};
use super::tag::{Placement, Tag};
use super::value::TextValue;
use super::OtherAttributes;
use crate::error::SchemaError;
use crate::xml::{Document, Element};

/// A type that can be written as an element.
///
/// Object safe, so lists of variants can be encoded through `&dyn Encode`.
pub trait Encode {
    /// Schema of this value; for a variant, the schema of the active member.
    fn schema(&self) -> &'static Descriptor;

    fn encode_field(&self, index: usize) -> Output<'_>;
}

/// Current value of one field, as seen by the encoder.
pub enum Output<'a> {
    /// At its declared default (or `None`): nothing is written.
    Default,
    Text(Cow<'a, str>),
    Element(&'a dyn Encode),
    List(Vec<&'a dyn Encode>),
    Overflow(&'a OtherAttributes),
}

impl<'a> Output<'a> {
    /// A value that is always written.
    pub fn value<V: TextValue>(value: &'a V) -> Self {
        Output::Text(value.to_text())
    }

    /// A value written only when present.
    pub fn nullable<V: TextValue>(value: &'a Option<V>) -> Self {
        match value {
            Some(value) => Output::Text(value.to_text()),
            None => Output::Default,
        }
    }

    /// A value written only when it differs from `V::default()`.
    pub fn unless_default<V: TextValue + Default + PartialEq>(value: &'a V) -> Self {
        if *value == V::default() {
            Output::Default
        } else {
            Output::Text(value.to_text())
        }
    }

    pub fn element<U: Encode>(value: &'a U) -> Self {
        Output::Element(value)
    }

    pub fn nullable_element<U: Encode>(value: &'a Option<U>) -> Self {
        match value {
            Some(value) => Output::Element(value),
            None => Output::Default,
        }
    }

    pub fn list<U: Encode>(items: &'a [U]) -> Self {
        Output::List(items.iter().map(|item| item as &dyn Encode).collect())
    }

    pub fn overflow(other: &'a OtherAttributes) -> Self {
        if other.is_empty() {
            Output::Default
        } else {
            Output::Overflow(other)
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Output::Default => "a default",
            Output::Text(_) => "a value",
            Output::Element(_) => "an element",
            Output::List(_) => "a list",
            Output::Overflow(_) => "overflow attributes",
        }
    }
}

/// Encode a value as a whole document, rooted at its descriptor's name.
pub fn encode_document(value: &dyn Encode) -> Result<Document, SchemaError> {
    let descriptor = value.schema();
    debug!(root = descriptor.name, "encoding document");

    let namespace = effective(descriptor.namespace, None);
    let root = encode_element(value, descriptor.name, namespace, descriptor.namespaces)?;
    Ok(Document::new(root))
}

/// Encode a value as an element with the given name and namespace.
pub fn encode_element(
    value: &dyn Encode,
    name: &str,
    namespace: Option<&str>,
    declarations: &[(&str, &str)],
) -> Result<Element, SchemaError> {
    let mut element = Element::new(name);
    element.namespace = namespace.map(str::to_string);
    attach_declarations(&mut element, declarations);
    encode_fields(value, &mut element)?;
    Ok(element)
}

fn encode_fields(value: &dyn Encode, element: &mut Element) -> Result<(), SchemaError> {
    let descriptor = value.schema();
    let tags = descriptor.tags()?;
    let parent_namespace = element.namespace.clone();
    let parent_namespace = parent_namespace.as_deref();

    for (index, tag) in tags.iter().enumerate() {
        let output = value.encode_field(index);

        match (tag.placement, output) {
            (_, Output::Default) => {}
            (Placement::Attribute, Output::Text(text)) => {
                element.set_attribute(tag.name, attribute_namespace(tag.namespace), text);
            }
            (Placement::Text, Output::Text(text)) => element.text = Some(text.into_owned()),
            (Placement::ChildElement, Output::Element(child)) => {
                let namespace = effective(tag.namespace, parent_namespace);
                let child = encode_element(child, tag.name, namespace, tag.additional_namespaces)?;
                element.children.push(child);
            }
            (Placement::WrappedList, Output::List(items)) => {
                if items.is_empty() && !tag.required {
                    continue;
                }
                let namespace = effective(tag.namespace, parent_namespace);
                let mut wrapper = Element::new(tag.wrapper_name.unwrap_or(tag.name));
                wrapper.namespace = namespace.map(str::to_string);
                attach_declarations(&mut wrapper, tag.additional_namespaces);
                for item in items {
                    let child = encode_item(item, descriptor, index, tag, namespace, &[])?;
                    wrapper.children.push(child);
                }
                element.children.push(wrapper);
            }
            (Placement::UnwrappedList, Output::List(items)) => {
                for item in items {
                    let child = encode_item(
                        item,
                        descriptor,
                        index,
                        tag,
                        parent_namespace,
                        tag.additional_namespaces,
                    )?;
                    element.children.push(child);
                }
            }
            (Placement::AttributeOverflow, Output::Overflow(other)) => {
                for (key, text) in other {
                    let namespace = key.namespace.as_deref();
                    if element.attribute(&key.name, namespace).is_none() {
                        element.set_attribute(&key.name, namespace, text.clone());
                    }
                }
            }
            (_, output) => {
                return Err(SchemaError::KindMismatch {
                    ty: descriptor.name,
                    field: descriptor.fields[index].name,
                    expected: output.label(),
                });
            }
        }
    }

    Ok(())
}

/// One list item: named by the tag for a fixed item type, or by the item's
/// own schema for a variant.
fn encode_item(
    item: &dyn Encode,
    descriptor: &Descriptor,
    index: usize,
    tag: &Tag,
    parent_namespace: Option<&str>,
    declarations: &[(&str, &str)],
) -> Result<Element, SchemaError> {
    match descriptor.fields[index].kind {
        FieldKind::List(Items::OneOf(_)) => {
            let variant = item.schema();
            let namespace = effective(variant.namespace, parent_namespace);
            encode_element(item, variant.name, namespace, variant.namespaces)
        }
        _ => {
            let namespace = effective(tag.namespace, parent_namespace);
            encode_element(item, tag.item_name(), namespace, declarations)
        }
    }
}
