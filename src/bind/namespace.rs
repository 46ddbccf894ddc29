//! Namespace resolution for tags.
//!
//! A tag's effective namespace is its own when set, else the enclosing
//! element's. Only one level is consulted; there are no lookups across
//! subtrees.

use super::schema::TagNamespace;
use crate::xml::{Attribute, Element};

/// Effective namespace of an element-placed tag under a parent in `parent`.
pub fn effective<'a>(namespace: TagNamespace, parent: Option<&'a str>) -> Option<&'a str> {
    match namespace {
        TagNamespace::Inherit => parent,
        TagNamespace::Unqualified => None,
        TagNamespace::Uri(uri) => Some(uri),
    }
}

/// Namespace an attribute-placed tag is written in.
///
/// An inheriting attribute belongs to its element's own partition, which XML
/// spells as an unprefixed (unqualified) attribute.
pub fn attribute_namespace(namespace: TagNamespace) -> Option<&'static str> {
    match namespace {
        TagNamespace::Uri(uri) => Some(uri),
        TagNamespace::Inherit | TagNamespace::Unqualified => None,
    }
}

/// Whether `attr` is the attribute named by a tag on `element`.
///
/// An inheriting tag also accepts the attribute spelled with the element's
/// own namespace, e.g. `opf:scheme` on an OPF element.
pub fn attribute_matches(attr: &Attribute, name: &str, namespace: TagNamespace, element: &Element) -> bool {
    if attr.name != name {
        return false;
    }
    match namespace {
        TagNamespace::Inherit => {
            attr.namespace.is_none() || attr.namespace.as_deref() == element.namespace.as_deref()
        }
        TagNamespace::Unqualified => attr.namespace.is_none(),
        TagNamespace::Uri(uri) => attr.namespace.as_deref() == Some(uri),
    }
}

/// The attribute a tag reads on `element`.
///
/// An inheriting tag prefers the unqualified spelling over the one qualified
/// with the element's namespace, whatever their order; the other stays
/// unclaimed.
pub fn find_attribute<'a>(element: &'a Element, name: &str, namespace: TagNamespace) -> Option<&'a Attribute> {
    element
        .attributes
        .iter()
        .filter(|a| attribute_matches(a, name, namespace, element))
        .min_by_key(|a| a.namespace.is_some())
}

/// Attach a tag's extra prefix declarations to the element it created.
pub fn attach_declarations(element: &mut Element, namespaces: &[(&str, &str)]) {
    for (prefix, uri) in namespaces {
        element.declare(prefix, uri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{DC_NS, OPF_NS, XML_NS};

    #[test]
    fn test_effective_namespace() {
        assert_eq!(effective(TagNamespace::Inherit, Some(OPF_NS)), Some(OPF_NS));
        assert_eq!(effective(TagNamespace::Inherit, None), None);
        assert_eq!(effective(TagNamespace::Unqualified, Some(OPF_NS)), None);
        assert_eq!(effective(TagNamespace::Uri(DC_NS), Some(OPF_NS)), Some(DC_NS));
    }

    #[test]
    fn test_attribute_matching() {
        let element = Element::new("identifier").with_namespace(OPF_NS);
        let plain = Attribute::new("scheme", "ISBN");
        let qualified = Attribute::new("scheme", "ISBN").with_namespace(OPF_NS);
        let lang = Attribute::new("lang", "en").with_namespace(XML_NS);

        assert!(attribute_matches(&plain, "scheme", TagNamespace::Inherit, &element));
        assert!(attribute_matches(&qualified, "scheme", TagNamespace::Inherit, &element));
        assert!(attribute_matches(&plain, "scheme", TagNamespace::Unqualified, &element));
        assert!(!attribute_matches(&qualified, "scheme", TagNamespace::Unqualified, &element));
        assert!(attribute_matches(&lang, "lang", TagNamespace::Uri(XML_NS), &element));
        assert!(!attribute_matches(&lang, "lang", TagNamespace::Inherit, &element));
        assert!(!attribute_matches(&plain, "lang", TagNamespace::Inherit, &element));
    }

    #[test]
    fn test_find_attribute_prefers_unqualified() {
        let plain = Attribute::new("scheme", "a");
        let qualified = Attribute::new("scheme", "b").with_namespace(OPF_NS);
        let mut element = Element::new("meta").with_namespace(OPF_NS);

        element.attributes = vec![qualified.clone(), plain.clone()];
        assert_eq!(find_attribute(&element, "scheme", TagNamespace::Inherit), Some(&plain));
        element.attributes = vec![plain.clone(), qualified.clone()];
        assert_eq!(find_attribute(&element, "scheme", TagNamespace::Inherit), Some(&plain));

        element.attributes = vec![qualified.clone()];
        assert_eq!(find_attribute(&element, "scheme", TagNamespace::Inherit), Some(&qualified));
        assert_eq!(find_attribute(&element, "scheme", TagNamespace::Unqualified), None);
    }

    #[test]
    fn test_attribute_namespace() {
        assert_eq!(attribute_namespace(TagNamespace::Inherit), None);
        assert_eq!(attribute_namespace(TagNamespace::Uri(XML_NS)), Some(XML_NS));
    }

    #[test]
    fn test_attach_declarations_skips_duplicates() {
        let mut element = Element::new("metadata");
        attach_declarations(&mut element, &[("dc", DC_NS), ("opf", OPF_NS), ("dc", DC_NS)]);
        assert_eq!(element.declarations.len(), 2);
    }
}
