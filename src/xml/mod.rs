//! In-memory XML element tree.
//!
//! The binding engine never touches a concrete XML parser: it walks and builds
//! [`Element`] trees. [`reader`] turns bytes into a tree and [`writer`] turns a
//! tree back into bytes.

pub mod reader;
pub mod writer;

pub use reader::parse_document;
pub use writer::{WriteOptions, to_bytes, write_document};

/// Open Packaging Format (package document) namespace.
pub const OPF_NS: &str = "http://www.idpf.org/2007/opf";
/// Dublin Core elements namespace.
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
/// OCF container namespace (`META-INF/container.xml`).
pub const CONTAINER_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
/// Reserved namespace bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A namespace declaration introduced at an element.
///
/// An empty prefix declares the default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: String,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

/// An attribute keyed by local name and namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` is "no namespace" (the usual case for unprefixed attributes).
    pub namespace: Option<String>,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            value: value.into(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Whether this attribute has the given name and namespace.
    pub fn is(&self, name: &str, namespace: Option<&str>) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }
}

/// An XML element.
///
/// An element carries either child elements or a text payload; mixed content
/// is not modelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// `None` is "no namespace".
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    pub text: Option<String>,
    pub declarations: Vec<NamespaceDecl>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, None, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Look up an attribute value by name and namespace.
    pub fn attribute(&self, name: &str, namespace: Option<&str>) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.is(name, namespace))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing one with the same key in place.
    pub fn set_attribute(&mut self, name: &str, namespace: Option<&str>, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.is(name, namespace)) {
            existing.value = value;
        } else {
            self.attributes.push(Attribute {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
                value,
            });
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&mut self, name: &str, namespace: Option<&str>) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.is(name, namespace))?;
        Some(self.attributes.remove(index).value)
    }

    /// Whether this element has the given local name and namespace.
    pub fn is(&self, name: &str, namespace: Option<&str>) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }

    /// Children with the given local name and namespace, in document order.
    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
        namespace: Option<&'n str>,
    ) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.is(name, namespace))
    }

    /// The element's own text, if it is non-empty.
    pub fn own_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Declare a namespace prefix at this element, unless already declared here.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        if !self.declarations.iter().any(|d| d.prefix == prefix) {
            self.declarations.push(NamespaceDecl::new(prefix, uri));
        }
    }
}

/// A parsed XML document: a single root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }
}
