//! Tree source: raw bytes to an [`Element`] tree.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{NamespaceResolver, PrefixDeclaration, ResolveResult};

use super::{Document, Element, NamespaceDecl};
use crate::error::{Error, Result};

/// Parse a complete XML document into an element tree.
///
/// Prefixes are resolved to namespace URIs; declarations stay recorded on the
/// element that introduced them so a writer can reuse the same prefixes.
/// Comments, processing instructions and the DOCTYPE are dropped.
///
/// Text content is kept exactly as written, surrounding whitespace included.
/// Runs that are whitespace only (indentation between child elements) are
/// dropped, so an element holding nothing but spaces reads as empty.
pub fn parse_document(bytes: &[u8]) -> Result<Document> {
    let content = String::from_utf8(strip_bom(bytes).to_vec())?;
    let mut reader = NsReader::from_str(&content);

    let mut stack: Vec<Open> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = namespace_uri(resolved)?;

        match event {
            Event::Start(e) => {
                let element = open_element(&e, namespace, reader.resolver())?;
                stack.push(Open {
                    element,
                    text: String::new(),
                });
            }
            Event::Empty(e) => {
                let element = open_element(&e, namespace, reader.resolver())?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let Open { mut element, text } = stack
                    .pop()
                    .ok_or_else(|| Error::Malformed("unbalanced end tag".into()))?;
                if !text.trim().is_empty() {
                    element.text = Some(text);
                }
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(open) = stack.last_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    let resolved = resolve_entity(&entity)
                        .ok_or_else(|| Error::Malformed(format!("unknown entity &{entity};")))?;
                    open.text.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::Malformed("unexpected end of document".into()));
    }
    root.map(Document::new)
        .ok_or_else(|| Error::Malformed("document has no root element".into()))
}

struct Open {
    element: Element,
    text: String,
}

fn attach(element: Element, stack: &mut [Open], root: &mut Option<Element>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.element.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Malformed("multiple root elements".into())),
    }
    Ok(())
}

/// Owned namespace URI of a resolved name; an unknown prefix is an error.
fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8(ns.into_inner().to_vec())?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Error::UnboundPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

/// Build an element from a start tag whose scope `resolver` already holds.
///
/// `xmlns` attributes become the element's declarations, never ordinary
/// attributes.
fn open_element(
    start: &BytesStart<'_>,
    namespace: Option<String>,
    resolver: &NamespaceResolver,
) -> Result<Element> {
    let local = String::from_utf8(start.local_name().as_ref().to_vec())?;
    let mut element = Element::new(local);
    element.namespace = namespace;

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Malformed(e.to_string()))?;
        let raw = String::from_utf8(attr.value.to_vec())?;
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| Error::Malformed(e.to_string()))?
            .into_owned();

        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => {
                element.declarations.push(NamespaceDecl::new("", value));
            }
            Some(PrefixDeclaration::Named(prefix)) => {
                let prefix = String::from_utf8(prefix.to_vec())?;
                element.declarations.push(NamespaceDecl::new(prefix, value));
            }
            None => {
                // Unprefixed attributes are never in the default namespace
                let (resolved, local) = resolver.resolve_attribute(attr.key);
                let namespace = namespace_uri(resolved)?;
                let local = String::from_utf8(local.as_ref().to_vec())?;
                element.set_attribute(&local, namespace.as_deref(), value);
            }
        }
    }

    Ok(element)
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{CONTAINER_NS, DC_NS, OPF_NS, XML_NS};

    #[test]
    fn test_strip_bom() {
        let with_bom = &[0xEF, 0xBB, 0xBF, b'h', b'i'];
        assert_eq!(strip_bom(with_bom), b"hi");
        assert_eq!(strip_bom(b"hello"), b"hello");
        assert_eq!(strip_bom(&[]), &[]);

        // Partial BOM (not stripped)
        let partial = &[0xEF, 0xBB, b'x'];
        assert_eq!(strip_bom(partial), partial);
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("apos"), Some("'".to_string()));
        assert_eq!(resolve_entity("amp"), Some("&".to_string()));
        assert_eq!(resolve_entity("#65"), Some("A".to_string()));
        assert_eq!(resolve_entity("#x2019"), Some("\u{2019}".to_string()));
        assert_eq!(resolve_entity("nbsp"), None);
        assert_eq!(resolve_entity("#xZZ"), None);
    }

    #[test]
    fn test_parse_resolves_namespaces() {
        let doc = parse_document(
            br#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" xml:lang="en">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title id="t">Moby Dick</dc:title>
  </metadata>
</package>"#,
        )
        .unwrap();

        let root = &doc.root;
        assert!(root.is("package", Some(OPF_NS)));
        assert_eq!(root.attribute("version", None), Some("3.0"));
        assert_eq!(root.attribute("lang", Some(XML_NS)), Some("en"));
        assert_eq!(root.declarations, vec![NamespaceDecl::new("", OPF_NS)]);

        let metadata = &root.children[0];
        assert!(metadata.is("metadata", Some(OPF_NS)));
        assert_eq!(metadata.text, None);

        let title = &metadata.children[0];
        assert!(title.is("title", Some(DC_NS)));
        assert_eq!(title.attribute("id", None), Some("t"));
        assert_eq!(title.text.as_deref(), Some("Moby Dick"));
    }

    #[test]
    fn test_parse_text_with_entities_keeps_spacing() {
        let doc = parse_document(b"<a>Tom &amp; Jerry &#x2014; <![CDATA[<raw>]]></a>").unwrap();
        assert_eq!(doc.root.text.as_deref(), Some("Tom & Jerry \u{2014} <raw>"));
    }

    #[test]
    fn test_parse_attribute_entities() {
        let doc = parse_document(br#"<a title="x &lt; y"/>"#).unwrap();
        assert_eq!(doc.root.attribute("title", None), Some("x < y"));
    }

    #[test]
    fn test_parse_undeclared_default() {
        let doc = parse_document(
            br#"<container xmlns="urn:oasis:names:tc:opendocument:xmlns:container"><inner xmlns=""/></container>"#,
        )
        .unwrap();
        assert_eq!(doc.root.namespace.as_deref(), Some(CONTAINER_NS));
        assert_eq!(doc.root.children[0].namespace, None);
    }

    #[test]
    fn test_parse_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<root/>");
        let doc = parse_document(&bytes).unwrap();
        assert_eq!(doc.root.name, "root");
    }

    #[test]
    fn test_parse_unbound_prefix() {
        let err = parse_document(b"<dc:title>x</dc:title>").unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix(p) if p == "dc"));
    }

    #[test]
    fn test_parse_attribute_prefix_declared_on_same_tag() {
        let doc = parse_document(
            br#"<meta xmlns="http://www.idpf.org/2007/opf" xmlns:opf="http://www.idpf.org/2007/opf" opf:scheme="x" scheme="y"/>"#,
        )
        .unwrap();
        let root = &doc.root;
        assert!(root.is("meta", Some(OPF_NS)));
        assert_eq!(root.attribute("scheme", Some(OPF_NS)), Some("x"));
        assert_eq!(root.attribute("scheme", None), Some("y"));
        assert_eq!(root.attributes.len(), 2);
        assert_eq!(
            root.declarations,
            vec![NamespaceDecl::new("", OPF_NS), NamespaceDecl::new("opf", OPF_NS)]
        );
    }

    #[test]
    fn test_parse_declarations_do_not_leak_to_siblings() {
        let err = parse_document(br#"<r><a xmlns:p="urn:p"/><p:b/></r>"#).unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix(p) if p == "p"));

        let err = parse_document(br#"<r x:y="1"/>"#).unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix(p) if p == "x"));
    }

    #[test]
    fn test_parse_keeps_surrounding_whitespace() {
        let doc = parse_document(b"<a><b> A </b><c>   </c>\n  <d/>\n</a>").unwrap();
        assert_eq!(doc.root.text, None);
        assert_eq!(doc.root.children[0].text.as_deref(), Some(" A "));
        assert_eq!(doc.root.children[1].text, None);
        assert_eq!(doc.root.children.len(), 3);
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(matches!(
            parse_document(b"<?xml version=\"1.0\"?>"),
            Err(Error::Malformed(_))
        ));
    }
}
