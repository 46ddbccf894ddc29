//! Decode engine: element tree to typed value.
//!
//! `decode_document` → `decode_scope` → list decoding, a recursive walk over
//! the already-parsed tree. Each field is located by its [`Tag`], checked for
//! presence, and handed to the type's [`Decode::decode_field`]. The first error
//! aborts the walk.

use tracing::{debug, trace};

use super::namespace::{effective, find_attribute};
use super::schema::{Descriptor, FieldKind, Items, TagNamespace};
use super::tag::{Placement, Tag};
use super::value::{TextError, TextValue};
use super::{AttributeName, OtherAttributes};
use crate::error::{DecodeError, Result, SchemaError};
use crate::xml::{Attribute, Document, Element};

/// A type that can be built from an element.
///
/// The engine starts from `Default::default()`, so optional fields that are
/// absent keep their declared default. `decode_field` receives each present
/// field in declared order.
pub trait Decode: Default {
    fn descriptor() -> &'static Descriptor;

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()>;
}

/// Constructor entry for one member of a closed variant set.
pub struct Variant<V: 'static> {
    pub descriptor: &'static Descriptor,
    pub decode: fn(&Scope<'_>) -> Result<V>,
}

/// A closed set of element types selected by element name.
pub trait Variants: Sized + 'static {
    fn variants() -> &'static [Variant<Self>];
}

/// Position of the walk: the current element and its ancestors.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    element: &'a Element,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn root(element: &'a Element) -> Self {
        Self {
            element,
            parent: None,
        }
    }

    pub fn child<'b>(&'b self, element: &'b Element) -> Scope<'b> {
        Scope {
            element,
            parent: Some(self),
        }
    }

    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// Breadcrumb such as `/package/metadata/link`.
    pub fn path(&self) -> String {
        let mut names = vec![self.element.name.as_str()];
        let mut current = self.parent;
        while let Some(scope) = current {
            names.push(scope.element.name.as_str());
            current = scope.parent;
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }
}

/// Decode a whole document; the root must carry the descriptor's name.
pub fn decode_document<T: Decode>(doc: &Document) -> Result<T> {
    let descriptor = T::descriptor();
    debug!(root = descriptor.name, "decoding document");

    let root = &doc.root;
    let name_matches = root.name == descriptor.name;
    let namespace_matches = match descriptor.namespace {
        TagNamespace::Inherit => true,
        TagNamespace::Unqualified => root.namespace.is_none(),
        TagNamespace::Uri(uri) => root.namespace.as_deref() == Some(uri),
    };
    if !name_matches || !namespace_matches {
        return Err(DecodeError::MissingElement {
            name: descriptor.name.to_string(),
            path: "/".to_string(),
        }
        .into());
    }

    decode_scope(&Scope::root(root))
}

/// Decode a standalone element, whatever its name.
pub fn decode_element<T: Decode>(element: &Element) -> Result<T> {
    decode_scope(&Scope::root(element))
}

/// Decode the element at `scope` as a `T`.
pub fn decode_scope<T: Decode>(scope: &Scope<'_>) -> Result<T> {
    let descriptor = T::descriptor();
    let tags = descriptor.tags()?;
    let mut value = T::default();

    for (index, tag) in tags.iter().enumerate() {
        match locate(scope, descriptor, index, tags)? {
            Some(located) => value.decode_field(
                index,
                Input {
                    ty: descriptor.name,
                    tag,
                    scope,
                    located,
                },
            )?,
            None if tag.required => return Err(missing(tag, scope).into()),
            None => trace!(field = tag.name, path = %scope.path(), "absent, using default"),
        }
    }

    if tracing::enabled!(tracing::Level::TRACE) {
        trace_ignored(scope, descriptor, tags);
    }
    Ok(value)
}

/// Log attributes and children no field of `descriptor` claimed.
fn trace_ignored(scope: &Scope<'_>, descriptor: &Descriptor, tags: &[Tag]) {
    let element = scope.element();
    if !tags.iter().any(|t| t.placement == Placement::AttributeOverflow) {
        for attr in &element.attributes {
            if !claimed_attribute(attr, element, tags) {
                trace!(attribute = %attr.name, path = %scope.path(), "ignoring attribute");
            }
        }
    }

    let has_variants = descriptor
        .fields
        .iter()
        .any(|f| matches!(f.kind, FieldKind::List(Items::OneOf(_))));
    if has_variants {
        return;
    }
    let parent = element.namespace.as_deref();
    for child in &element.children {
        if !claimed_by_sibling(child, tags, usize::MAX, parent) {
            trace!(element = %child.name, path = %scope.path(), "ignoring element");
        }
    }
}

fn missing(tag: &Tag, scope: &Scope<'_>) -> DecodeError {
    let path = scope.path();
    match tag.placement {
        Placement::Attribute | Placement::AttributeOverflow => DecodeError::MissingAttribute {
            name: tag.name.to_string(),
            path,
        },
        Placement::Text => DecodeError::MissingText { path },
        Placement::ChildElement | Placement::WrappedList | Placement::UnwrappedList => {
            DecodeError::MissingElement {
                name: tag.missing_name().to_string(),
                path,
            }
        }
    }
}

/// Where a present field was found.
enum Located<'a> {
    Text(&'a str),
    Element(&'a Element),
    Items {
        wrapper: Option<&'a Element>,
        items: Vec<&'a Element>,
    },
    Variants {
        wrapper: Option<&'a Element>,
        items: Vec<(&'static Descriptor, &'a Element)>,
    },
    Overflow(OtherAttributes),
}

impl Located<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Located::Items { items, .. } => items.is_empty(),
            Located::Variants { items, .. } => items.is_empty(),
            Located::Overflow(other) => other.is_empty(),
            Located::Text(_) | Located::Element(_) => false,
        }
    }
}

/// Find field `index` under the scope's element; `None` when absent.
fn locate<'a>(
    scope: &Scope<'a>,
    descriptor: &'static Descriptor,
    index: usize,
    tags: &[Tag],
) -> Result<Option<Located<'a>>> {
    let element = scope.element();
    let tag = &tags[index];
    let namespace = effective(tag.namespace, element.namespace.as_deref());

    let located = match tag.placement {
        Placement::Attribute => find_attribute(element, tag.name, tag.namespace)
            .map(|a| Located::Text(a.value.as_str())),
        Placement::Text => element.own_text().map(Located::Text),
        Placement::ChildElement => {
            single_child(scope, tag.name, namespace)?.map(Located::Element)
        }
        Placement::WrappedList => {
            let wrapper_name = tag.wrapper_name.unwrap_or(tag.name);
            match single_child(scope, wrapper_name, namespace)? {
                Some(wrapper) => Some(list_items(
                    wrapper,
                    &scope.child(wrapper),
                    descriptor,
                    index,
                    &[],
                    Some(wrapper),
                )?),
                None => None,
            }
        }
        Placement::UnwrappedList => {
            let located = list_items(element, scope, descriptor, index, tags, None)?;
            (!located.is_empty()).then_some(located)
        }
        Placement::AttributeOverflow => {
            let other: OtherAttributes = element
                .attributes
                .iter()
                .filter(|a| !claimed_attribute(a, element, tags))
                .map(|a| (AttributeName::new(&a.name, a.namespace.as_deref()), a.value.clone()))
                .collect();
            (!other.is_empty()).then_some(Located::Overflow(other))
        }
    };

    Ok(located)
}

/// Whether an attribute-placed tag reads `attr`.
fn claimed_attribute(attr: &Attribute, element: &Element, tags: &[Tag]) -> bool {
    tags.iter().any(|t| {
        t.placement == Placement::Attribute
            && find_attribute(element, t.name, t.namespace).is_some_and(|found| std::ptr::eq(found, attr))
    })
}

/// The single child with this name; more than one is an error.
fn single_child<'a>(
    scope: &Scope<'a>,
    name: &'static str,
    namespace: Option<&str>,
) -> Result<Option<&'a Element>> {
    let mut matches = scope.element().children_named(name, namespace);
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        return Err(DecodeError::TooManyMatches {
            name: name.to_string(),
            path: scope.path(),
        }
        .into());
    }
    Ok(first)
}

/// Collect list items under `container` (the parent, or the wrapper when
/// wrapped); `scope` is the container's position, for error paths.
///
/// `siblings` are the tags of the parent type; in an unwrapped variant list,
/// children claimed by another field are not candidates.
fn list_items<'a>(
    container: &'a Element,
    scope: &Scope<'_>,
    descriptor: &'static Descriptor,
    index: usize,
    siblings: &[Tag],
    wrapper: Option<&'a Element>,
) -> Result<Located<'a>> {
    let tag = &descriptor.tags()?[index];
    let parent_namespace = container.namespace.as_deref();

    match descriptor.fields[index].kind {
        FieldKind::List(Items::Of(_)) => {
            let namespace = effective(tag.namespace, parent_namespace);
            let items = container.children_named(tag.item_name(), namespace).collect();
            Ok(Located::Items { wrapper, items })
        }
        FieldKind::List(Items::OneOf(variants)) => {
            let mut items = Vec::new();
            for child in &container.children {
                if claimed_by_sibling(child, siblings, index, parent_namespace) {
                    continue;
                }
                let variant = variants
                    .iter()
                    .find(|v| child.is(v.name, effective(v.namespace, parent_namespace)))
                    .ok_or_else(|| DecodeError::UnknownVariant {
                        name: child.name.clone(),
                        path: scope.path(),
                    })?;
                items.push((*variant, child));
            }
            Ok(Located::Variants { wrapper, items })
        }
        _ => Err(SchemaError::KindMismatch {
            ty: descriptor.name,
            field: descriptor.fields[index].name,
            expected: "a list",
        }
        .into()),
    }
}

fn claimed_by_sibling(child: &Element, siblings: &[Tag], index: usize, parent: Option<&str>) -> bool {
    siblings.iter().enumerate().any(|(i, t)| {
        if i == index {
            return false;
        }
        let namespace = effective(t.namespace, parent);
        match t.placement {
            Placement::ChildElement => child.is(t.name, namespace),
            Placement::WrappedList => child.is(t.wrapper_name.unwrap_or(t.name), namespace),
            Placement::UnwrappedList => child.is(t.item_name(), namespace),
            _ => false,
        }
    })
}

/// A located field, handed to [`Decode::decode_field`].
///
/// The typed side picks the conversion matching the field's kind.
pub struct Input<'a> {
    ty: &'static str,
    tag: &'a Tag,
    scope: &'a Scope<'a>,
    located: Located<'a>,
}

impl<'a> Input<'a> {
    /// Name of the tag being decoded.
    pub fn name(&self) -> &'static str {
        self.tag.name
    }

    /// Raw attribute or text value.
    pub fn text(self) -> Result<String> {
        self.value()
    }

    /// Attribute or text value parsed strictly.
    pub fn value<V: TextValue>(self) -> Result<V> {
        let Located::Text(raw) = self.located else {
            return Err(self.mismatch("a value"));
        };
        V::parse_text(raw).map_err(|e| {
            let name = self.tag.name.to_string();
            let raw = raw.to_string();
            let path = self.scope.path();
            match e {
                TextError::Number => DecodeError::InvalidNumber { name, raw, path },
                TextError::Enum => DecodeError::InvalidEnumValue { name, raw, path },
            }
            .into()
        })
    }

    /// Nested element decoded as `U`.
    pub fn element<U: Decode>(self) -> Result<U> {
        let Located::Element(element) = self.located else {
            return Err(self.mismatch("an element"));
        };
        decode_scope(&self.scope.child(element))
    }

    /// Repeated elements of one type, in document order.
    pub fn list<U: Decode>(self) -> Result<Vec<U>> {
        let Located::Items { wrapper, items } = &self.located else {
            return Err(self.mismatch("a list"));
        };
        match wrapper {
            Some(wrapper) => {
                let wrapper_scope = self.scope.child(wrapper);
                items
                    .iter()
                    .map(|item| decode_scope(&wrapper_scope.child(item)))
                    .collect()
            }
            None => items
                .iter()
                .map(|item| decode_scope(&self.scope.child(item)))
                .collect(),
        }
    }

    /// Repeated elements of a closed variant set, in document order.
    pub fn variants<V: Variants>(self) -> Result<Vec<V>> {
        let Located::Variants { wrapper, items } = &self.located else {
            return Err(self.mismatch("a variant list"));
        };
        let parent = match wrapper {
            Some(wrapper) => self.scope.child(wrapper),
            None => *self.scope,
        };
        items
            .iter()
            .map(|(descriptor, item)| {
                let variant = V::variants()
                    .iter()
                    .find(|v| std::ptr::eq(v.descriptor, *descriptor))
                    .ok_or_else(|| DecodeError::UnknownVariant {
                        name: item.name.clone(),
                        path: parent.path(),
                    })?;
                (variant.decode)(&parent.child(item))
            })
            .collect()
    }

    /// Attributes no other field claimed.
    pub fn overflow(self) -> Result<OtherAttributes> {
        match self.located {
            Located::Overflow(other) => Ok(other),
            _ => Err(self.mismatch("overflow attributes")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> crate::error::Error {
        SchemaError::KindMismatch {
            ty: self.ty,
            field: self.tag.name,
            expected,
        }
        .into()
    }
}
