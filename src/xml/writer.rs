//! Tree sink: an [`Element`] tree to serialized XML.
//!
//! The tree stores resolved namespace URIs, so the writer picks the prefixes.
//! Declarations recorded on an element are written where they appear; any
//! other namespace is declared at the first element that needs it.

use quick_xml::escape::escape;

use super::{DC_NS, Document, Element, NamespaceDecl, OPF_NS, XML_NS};

/// Serialization settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level; `None` writes everything on one line.
    pub indent: Option<usize>,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` first.
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: Some(2),
            declaration: true,
        }
    }
}

impl WriteOptions {
    /// Single-line output without an XML declaration.
    pub fn compact() -> Self {
        Self {
            indent: None,
            declaration: false,
        }
    }
}

/// Serialize a document to a string.
pub fn write_document(doc: &Document, options: &WriteOptions) -> String {
    let mut writer = TreeWriter {
        out: String::new(),
        options,
        scopes: vec![vec![NamespaceDecl::new("xml", XML_NS)]],
        generated: 0,
    };

    if options.declaration {
        writer.out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        writer.newline();
    }
    writer.element(&doc.root, 0);
    if options.indent.is_some() {
        writer.out.push('\n');
    }
    writer.out
}

/// Serialize a document to UTF-8 bytes.
pub fn to_bytes(doc: &Document, options: &WriteOptions) -> Vec<u8> {
    write_document(doc, options).into_bytes()
}

/// Prefixes tried before falling back to generated `ns{n}` names.
fn preferred_prefix(uri: &str) -> Option<&'static str> {
    match uri {
        DC_NS => Some("dc"),
        OPF_NS => Some("opf"),
        _ => None,
    }
}

struct TreeWriter<'a> {
    out: String,
    options: &'a WriteOptions,
    scopes: Vec<Vec<NamespaceDecl>>,
    generated: usize,
}

impl TreeWriter<'_> {
    fn element(&mut self, el: &Element, depth: usize) {
        let frame: Vec<NamespaceDecl> = el
            .declarations
            .iter()
            .filter(|d| self.lookup(&d.prefix) != Some(d.uri.as_str()))
            .cloned()
            .collect();
        self.scopes.push(frame);

        let qname = match &el.namespace {
            Some(uri) => match self.element_prefix(uri) {
                Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", el.name),
                Some(_) => el.name.clone(),
                None => {
                    self.declare("", uri);
                    el.name.clone()
                }
            },
            None => {
                if self.lookup("").is_some_and(|uri| !uri.is_empty()) {
                    self.declare("", "");
                }
                el.name.clone()
            }
        };

        let mut attributes = Vec::with_capacity(el.attributes.len());
        for attr in &el.attributes {
            let name = match attr.namespace.as_deref() {
                None => attr.name.clone(),
                Some(XML_NS) => format!("xml:{}", attr.name),
                Some(uri) => format!("{}:{}", self.attribute_prefix(uri), attr.name),
            };
            attributes.push((name, &attr.value));
        }

        self.indent(depth);
        self.out.push('<');
        self.out.push_str(&qname);
        if let Some(frame) = self.scopes.last() {
            for decl in frame {
                if decl.prefix.is_empty() {
                    self.out.push_str(" xmlns=\"");
                } else {
                    self.out.push_str(" xmlns:");
                    self.out.push_str(&decl.prefix);
                    self.out.push_str("=\"");
                }
                self.out.push_str(&escape(decl.uri.as_str()));
                self.out.push('"');
            }
        }
        for (name, value) in attributes {
            self.out.push(' ');
            self.out.push_str(&name);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value.as_str()));
            self.out.push('"');
        }

        match el.text.as_deref() {
            _ if !el.children.is_empty() => {
                self.out.push('>');
                for child in &el.children {
                    self.newline();
                    self.element(child, depth + 1);
                }
                self.newline();
                self.indent(depth);
                self.close(&qname);
            }
            Some(text) if !text.is_empty() => {
                self.out.push('>');
                self.out.push_str(&escape(text));
                self.close(&qname);
            }
            _ => self.out.push_str("/>"),
        }

        self.scopes.pop();
    }

    fn close(&mut self, qname: &str) {
        self.out.push_str("</");
        self.out.push_str(qname);
        self.out.push('>');
    }

    /// Innermost URI bound to `prefix`.
    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|d| d.prefix == prefix)
            .map(|d| d.uri.as_str())
    }

    /// A prefix currently bound to `uri`, preferring the default namespace.
    fn element_prefix(&self, uri: &str) -> Option<String> {
        if self.lookup("") == Some(uri) {
            return Some(String::new());
        }
        self.bound_prefix(uri)
    }

    fn attribute_prefix(&mut self, uri: &str) -> String {
        if let Some(prefix) = self.bound_prefix(uri) {
            return prefix;
        }
        let prefix = match preferred_prefix(uri) {
            Some(p) if self.lookup(p).is_none() => p.to_string(),
            _ => loop {
                let candidate = format!("ns{}", self.generated);
                self.generated += 1;
                if self.lookup(&candidate).is_none() {
                    break candidate;
                }
            },
        };
        self.declare(&prefix, uri);
        prefix
    }

    /// A non-empty prefix bound to `uri` and not shadowed by an inner scope.
    fn bound_prefix(&self, uri: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .filter(|d| !d.prefix.is_empty() && d.uri == uri)
            .find(|d| self.lookup(&d.prefix) == Some(uri))
            .map(|d| d.prefix.clone())
    }

    fn declare(&mut self, prefix: &str, uri: &str) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.retain(|d| d.prefix != prefix);
            frame.push(NamespaceDecl::new(prefix, uri));
        }
    }

    fn newline(&mut self) {
        if self.options.indent.is_some() {
            self.out.push('\n');
        }
    }

    fn indent(&mut self, depth: usize) {
        if let Some(width) = self.options.indent {
            self.out.extend(std::iter::repeat_n(' ', width * depth));
        }
    }
}
