//! Schema-driven XML data binding.
//!
//! Bound types describe themselves with a static [`Descriptor`]: an ordered
//! list of [`Field`]s, each resolved once into a [`Tag`] that says where the
//! field lives in XML. The two engines walk those tables:
//!
//! - [`decode`] turns an element tree into a value through [`Decode`]
//! - [`encode`] turns a value back into an element tree through [`Encode`]
//!
//! Neither engine knows about EPUB versions. A field at its default is never
//! written, and an absent optional field decodes to its default, so a caller
//! targets a version by clearing the fields that version lacks.
//!
//! ```ignore
//! static LINK: Descriptor = Descriptor::new(
//!     "link",
//!     TagNamespace::Inherit,
//!     &[Field::value("rel"), Field::value("href")],
//! );
//! ```

pub mod decode;
pub mod encode;
pub mod namespace;
pub mod schema;
pub mod tag;
pub mod value;

use std::collections::BTreeMap;

pub use decode::{Decode, Input, Scope, Variant, Variants, decode_document, decode_element, decode_scope};
pub use encode::{Encode, Output, encode_document, encode_element};
pub use schema::{Descriptor, Field, FieldKind, Items, TagNamespace};
pub use tag::{Placement, Tag, resolve_tag};
pub use value::{TextError, TextValue};
pub(crate) use value::xml_enum;

use crate::error::Result;
use crate::xml::{self, WriteOptions};

/// Qualified name of an attribute kept by an overflow field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeName {
    pub name: String,
    pub namespace: Option<String>,
}

impl AttributeName {
    pub fn new(name: &str, namespace: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        }
    }
}

/// Attributes collected by an overflow field, keyed by qualified name.
///
/// Sorted, so the decoded value does not depend on attribute order.
pub type OtherAttributes = BTreeMap<AttributeName, String>;

/// Parse `bytes` and decode the root element as a `T`.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T> {
    let doc = xml::parse_document(bytes)?;
    decode_document(&doc)
}

/// Encode `value` as a document and serialize it.
pub fn to_bytes(value: &dyn Encode, options: &WriteOptions) -> Result<Vec<u8>> {
    let doc = encode_document(value)?;
    Ok(xml::to_bytes(&doc, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, Error};
    use crate::xml::{DC_NS, Element, OPF_NS, XML_NS, parse_document};

    #[derive(Debug, Default, PartialEq)]
    struct Link {
        rel: String,
        href: String,
    }

    static LINK: Descriptor = Descriptor::new(
        "link",
        TagNamespace::Inherit,
        &[Field::value("rel"), Field::value("href")],
    );

    impl Decode for Link {
        fn descriptor() -> &'static Descriptor {
            &LINK
        }

        fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
            match index {
                0 => self.rel = input.text()?,
                1 => self.href = input.text()?,
                _ => {}
            }
            Ok(())
        }
    }

    impl Encode for Link {
        fn schema(&self) -> &'static Descriptor {
            &LINK
        }

        fn encode_field(&self, index: usize) -> Output<'_> {
            match index {
                0 => Output::value(&self.rel),
                1 => Output::value(&self.href),
                _ => Output::Default,
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: Option<String>,
        size: u32,
    }

    static ITEM: Descriptor = Descriptor::new(
        "item",
        TagNamespace::Inherit,
        &[Field::value("id").nullable(), Field::value("size").optional()],
    );

    impl Decode for Item {
        fn descriptor() -> &'static Descriptor {
            &ITEM
        }

        fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
            match index {
                0 => self.id = Some(input.text()?),
                1 => self.size = input.value()?,
                _ => {}
            }
            Ok(())
        }
    }

    impl Encode for Item {
        fn schema(&self) -> &'static Descriptor {
            &ITEM
        }

        fn encode_field(&self, index: usize) -> Output<'_> {
            match index {
                0 => Output::nullable(&self.id),
                1 => Output::unless_default(&self.size),
                _ => Output::Default,
            }
        }
    }

    /// Holds the same items three ways: spliced, wrapped, and as links.
    #[derive(Debug, Default, PartialEq)]
    struct Bag {
        lang: Option<String>,
        items: Vec<Item>,
        boxed: Vec<Item>,
        links: Vec<Link>,
        other: OtherAttributes,
    }

    static BAG: Descriptor = Descriptor::new(
        "bag",
        TagNamespace::Uri(OPF_NS),
        &[
            Field::value("lang").namespace(XML_NS).nullable(),
            Field::list("item", &ITEM).optional(),
            Field::list("boxed", &ITEM).wrapped("items").elements_name("item").optional(),
            Field::list("link", &LINK).optional(),
            Field::overflow("other"),
        ],
    );

    impl Decode for Bag {
        fn descriptor() -> &'static Descriptor {
            &BAG
        }

        fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
            match index {
                0 => self.lang = Some(input.text()?),
                1 => self.items = input.list()?,
                2 => self.boxed = input.list()?,
                3 => self.links = input.list()?,
                4 => self.other = input.overflow()?,
                _ => {}
            }
            Ok(())
        }
    }

    impl Encode for Bag {
        fn schema(&self) -> &'static Descriptor {
            &BAG
        }

        fn encode_field(&self, index: usize) -> Output<'_> {
            match index {
                0 => Output::nullable(&self.lang),
                1 => Output::list(&self.items),
                2 => Output::list(&self.boxed),
                3 => Output::list(&self.links),
                4 => Output::overflow(&self.other),
                _ => Output::Default,
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Named {
        value: String,
    }

    static IDENTIFIER: Descriptor = Descriptor::new("identifier", TagNamespace::Uri(DC_NS), &[Field::text("value")]);
    static TITLE: Descriptor = Descriptor::new("title", TagNamespace::Uri(DC_NS), &[Field::text("value")]);

    #[derive(Debug, PartialEq)]
    enum Entry {
        Identifier(Named),
        Title(Named),
    }

    #[derive(Debug, Default, PartialEq)]
    struct Identifier(Named);

    #[derive(Debug, Default, PartialEq)]
    struct Title(Named);

    macro_rules! named_element {
        ($ty:ident, $descriptor:ident) => {
            impl Decode for $ty {
                fn descriptor() -> &'static Descriptor {
                    &$descriptor
                }

                fn decode_field(&mut self, _index: usize, input: Input<'_>) -> Result<()> {
                    self.0.value = input.text()?;
                    Ok(())
                }
            }
        };
    }

    named_element!(Identifier, IDENTIFIER);
    named_element!(Title, TITLE);

    static ENTRY_VARIANTS: [Variant<Entry>; 2] = [
        Variant {
            descriptor: &IDENTIFIER,
            decode: |scope| decode_scope::<Identifier>(scope).map(|id| Entry::Identifier(id.0)),
        },
        Variant {
            descriptor: &TITLE,
            decode: |scope| decode_scope::<Title>(scope).map(|title| Entry::Title(title.0)),
        },
    ];

    impl Variants for Entry {
        fn variants() -> &'static [Variant<Self>] {
            &ENTRY_VARIANTS
        }
    }

    impl Encode for Entry {
        fn schema(&self) -> &'static Descriptor {
            match self {
                Entry::Identifier(_) => &IDENTIFIER,
                Entry::Title(_) => &TITLE,
            }
        }

        fn encode_field(&self, _index: usize) -> Output<'_> {
            match self {
                Entry::Identifier(named) | Entry::Title(named) => Output::value(&named.value),
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Metadata {
        entries: Vec<Entry>,
        links: Vec<Link>,
    }

    static METADATA: Descriptor = Descriptor::with_namespaces(
        "metadata",
        TagNamespace::Uri(OPF_NS),
        &[
            Field::variants("entries", &[&IDENTIFIER, &TITLE]).optional(),
            Field::list("link", &LINK).optional(),
        ],
        &[("dc", DC_NS)],
    );

    impl Decode for Metadata {
        fn descriptor() -> &'static Descriptor {
            &METADATA
        }

        fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
            match index {
                0 => self.entries = input.variants()?,
                1 => self.links = input.list()?,
                _ => {}
            }
            Ok(())
        }
    }

    impl Encode for Metadata {
        fn schema(&self) -> &'static Descriptor {
            &METADATA
        }

        fn encode_field(&self, index: usize) -> Output<'_> {
            match index {
                0 => Output::list(&self.entries),
                1 => Output::list(&self.links),
                _ => Output::Default,
            }
        }
    }

    fn parse(xml: &str) -> Element {
        parse_document(xml.as_bytes()).unwrap().root
    }

    fn decode_error<T: Decode + std::fmt::Debug>(xml: &str) -> DecodeError {
        match decode_element::<T>(&parse(xml)) {
            Err(Error::Decode(e)) => e,
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_required_attributes() {
        let link: Link = decode_element(&parse(r#"<link rel="nav" href="toc.xhtml"/>"#)).unwrap();
        assert_eq!(link.rel, "nav");
        assert_eq!(link.href, "toc.xhtml");
    }

    #[test]
    fn test_missing_attribute_names_field_and_path() {
        assert_eq!(
            decode_error::<Link>(r#"<link rel="nav"/>"#),
            DecodeError::MissingAttribute {
                name: "href".to_string(),
                path: "/link".to_string(),
            }
        );

        let xml = format!(r#"<bag xmlns="{OPF_NS}"><link rel="nav"/></bag>"#);
        assert_eq!(
            decode_error::<Bag>(&xml),
            DecodeError::MissingAttribute {
                name: "href".to_string(),
                path: "/bag/link".to_string(),
            }
        );
    }

    #[test]
    fn test_encode_unwrapped_list() {
        let bag = Bag {
            items: vec![Item::default(), Item::default()],
            ..Default::default()
        };
        let root = encode_document(&bag).unwrap().root;
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["item", "item"]);
        assert!(root.children.iter().all(|c| c.attributes.is_empty()));
    }

    #[test]
    fn test_encode_wrapped_list() {
        let bag = Bag {
            boxed: vec![Item::default(), Item::default()],
            ..Default::default()
        };
        let root = encode_document(&bag).unwrap().root;
        assert_eq!(root.children.len(), 1);
        let wrapper = &root.children[0];
        assert_eq!(wrapper.name, "items");
        assert_eq!(wrapper.namespace.as_deref(), Some(OPF_NS));
        let names: Vec<_> = wrapper.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["item", "item"]);
    }

    #[test]
    fn test_wrapped_and_unwrapped_lists_decode_apart() {
        let xml = format!(
            r#"<bag xmlns="{OPF_NS}"><item id="a"/><items><item id="b"/><item id="c"/></items><item id="d"/></bag>"#
        );
        let bag: Bag = decode_element(&parse(&xml)).unwrap();
        let ids = |items: &[Item]| items.iter().map(|i| i.id.clone().unwrap()).collect::<Vec<_>>();
        assert_eq!(ids(&bag.items), ["a", "d"]);
        assert_eq!(ids(&bag.boxed), ["b", "c"]);
    }

    #[test]
    fn test_decode_variant_list_in_document_order() {
        let xml = format!(
            r#"<metadata xmlns="{OPF_NS}" xmlns:dc="{DC_NS}"><dc:identifier>urn:isbn:1</dc:identifier><dc:title>Moby Dick</dc:title></metadata>"#
        );
        let metadata: Metadata = decode_element(&parse(&xml)).unwrap();
        assert_eq!(
            metadata.entries,
            vec![
                Entry::Identifier(Named {
                    value: "urn:isbn:1".to_string()
                }),
                Entry::Title(Named {
                    value: "Moby Dick".to_string()
                }),
            ]
        );
    }

    #[test]
    fn test_variant_list_leaves_sibling_fields_alone() {
        let xml = format!(
            r#"<metadata xmlns="{OPF_NS}" xmlns:dc="{DC_NS}"><dc:title>A</dc:title><link rel="r" href="h"/></metadata>"#
        );
        let metadata: Metadata = decode_element(&parse(&xml)).unwrap();
        assert_eq!(metadata.entries.len(), 1);
        assert_eq!(metadata.links.len(), 1);
    }

    #[test]
    fn test_unknown_variant_is_an_error() {
        let xml = format!(
            r#"<metadata xmlns="{OPF_NS}" xmlns:dc="{DC_NS}"><dc:title>A</dc:title><dc:subject>B</dc:subject></metadata>"#
        );
        assert_eq!(
            decode_error::<Metadata>(&xml),
            DecodeError::UnknownVariant {
                name: "subject".to_string(),
                path: "/metadata".to_string(),
            }
        );
    }

    #[test]
    fn test_variant_encoding_uses_each_variant_name() {
        let metadata = Metadata {
            entries: vec![
                Entry::Title(Named { value: "T".to_string() }),
                Entry::Identifier(Named { value: "I".to_string() }),
            ],
            links: Vec::new(),
        };
        let root = encode_document(&metadata).unwrap().root;
        let names: Vec<_> = root
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.namespace.as_deref()))
            .collect();
        assert_eq!(names, [("title", Some(DC_NS)), ("identifier", Some(DC_NS))]);
        assert_eq!(root.declarations.len(), 1);
        assert_eq!(root.children[0].text.as_deref(), Some("T"));
    }

    #[test]
    fn test_defaults_are_not_encoded() {
        let root = encode_document(&Bag {
            items: vec![Item { id: None, size: 0 }],
            ..Default::default()
        })
        .unwrap()
        .root;
        assert!(root.attributes.is_empty());
        assert!(root.children[0].attributes.is_empty());

        let item: Item = decode_element(&root.children[0]).unwrap();
        assert_eq!(item, Item::default());
    }

    #[test]
    fn test_children_inherit_parent_namespace() {
        let bag = Bag {
            items: vec![Item::default()],
            links: vec![Link {
                rel: "r".to_string(),
                href: "h".to_string(),
            }],
            ..Default::default()
        };
        let root = encode_document(&bag).unwrap().root;
        assert!(root.children.iter().all(|c| c.namespace.as_deref() == Some(OPF_NS)));

        let foreign = format!(r#"<bag xmlns="{OPF_NS}"><item xmlns="urn:other" id="x"/></bag>"#);
        let decoded: Bag = decode_element(&parse(&foreign)).unwrap();
        assert!(decoded.items.is_empty());
    }

    #[test]
    fn test_overflow_collects_unclaimed_attributes() {
        let xml = format!(r#"<bag xmlns="{OPF_NS}" xml:lang="en" data-x="1" xmlns:e="urn:e" e:y="2"/>"#);
        let bag: Bag = decode_element(&parse(&xml)).unwrap();
        assert_eq!(bag.lang.as_deref(), Some("en"));
        assert_eq!(bag.other.len(), 2);
        assert_eq!(bag.other[&AttributeName::new("data-x", None)], "1");
        assert_eq!(bag.other[&AttributeName::new("y", Some("urn:e"))], "2");

        let root = encode_document(&bag).unwrap().root;
        assert_eq!(root.attribute("y", Some("urn:e")), Some("2"));
        assert_eq!(root.attribute("lang", Some(XML_NS)), Some("en"));
    }

    #[test]
    fn test_invalid_number_names_raw_text() {
        let xml = format!(r#"<bag xmlns="{OPF_NS}"><item size="12px"/></bag>"#);
        assert_eq!(
            decode_error::<Bag>(&xml),
            DecodeError::InvalidNumber {
                name: "size".to_string(),
                raw: "12px".to_string(),
                path: "/bag/item".to_string(),
            }
        );
    }

    #[test]
    fn test_document_root_must_match() {
        let doc = parse_document(b"<other/>").unwrap();
        let err = decode_document::<Bag>(&doc).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::MissingElement { ref name, .. }) if name == "bag"
        ));
    }

    #[test]
    fn test_bytes_round_trip() {
        let metadata = Metadata {
            entries: vec![Entry::Title(Named {
                value: "Fish & Chips".to_string(),
            })],
            links: vec![Link {
                rel: "nav".to_string(),
                href: "toc.xhtml".to_string(),
            }],
        };
        let bytes = to_bytes(&metadata, &WriteOptions::default()).unwrap();
        let decoded: Metadata = from_bytes(&bytes).unwrap();
        assert_eq!(decoded, metadata);
    }
}
