//! `META-INF/container.xml`: where the package documents live.

use super::package::PACKAGE_MEDIA_TYPE;
use crate::bind::{Decode, Descriptor, Encode, Field, Input, Output, TagNamespace};
use crate::error::Result;
use crate::xml::CONTAINER_NS;

/// Root of the container descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub version: String,
    pub rootfiles: Vec<Rootfile>,
    pub links: Vec<ContainerLink>,
}

static CONTAINER: Descriptor = Descriptor::new(
    "container",
    TagNamespace::Uri(CONTAINER_NS),
    &[
        Field::value("version"),
        Field::list("rootfiles", &ROOTFILE)
            .wrapped("rootfiles")
            .elements_name("rootfile"),
        Field::list("links", &CONTAINER_LINK)
            .wrapped("links")
            .elements_name("link")
            .optional(),
    ],
);

impl Default for Container {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            rootfiles: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl Container {
    /// A container pointing at one package document.
    pub fn new(package_path: impl Into<String>) -> Self {
        Self {
            rootfiles: vec![Rootfile::new(package_path, PACKAGE_MEDIA_TYPE)],
            ..Default::default()
        }
    }

    /// Path of the first package document listed.
    pub fn package_path(&self) -> Option<&str> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == PACKAGE_MEDIA_TYPE)
            .map(|rootfile| rootfile.full_path.as_str())
    }
}

impl Decode for Container {
    fn descriptor() -> &'static Descriptor {
        &CONTAINER
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.version = input.text()?,
            1 => self.rootfiles = input.list()?,
            2 => self.links = input.list()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Container {
    fn schema(&self) -> &'static Descriptor {
        &CONTAINER
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.version),
            1 => Output::list(&self.rootfiles),
            2 => Output::list(&self.links),
            _ => Output::Default,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rootfile {
    /// Path from the root of the container, e.g. `OEBPS/content.opf`.
    pub full_path: String,
    pub media_type: String,
}

static ROOTFILE: Descriptor = Descriptor::new(
    "rootfile",
    TagNamespace::Inherit,
    &[
        Field::value("full_path").rename("full-path"),
        Field::value("media_type").rename("media-type"),
    ],
);

impl Rootfile {
    pub fn new(full_path: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            media_type: media_type.into(),
        }
    }
}

impl Decode for Rootfile {
    fn descriptor() -> &'static Descriptor {
        &ROOTFILE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.full_path = input.text()?,
            1 => self.media_type = input.text()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Rootfile {
    fn schema(&self) -> &'static Descriptor {
        &ROOTFILE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.full_path),
            1 => Output::value(&self.media_type),
            _ => Output::Default,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLink {
    pub href: String,
    pub rel: String,
    pub media_type: Option<String>,
}

static CONTAINER_LINK: Descriptor = Descriptor::new(
    "link",
    TagNamespace::Inherit,
    &[
        Field::value("href"),
        Field::value("rel"),
        Field::value("media_type").rename("mediaType").nullable(),
    ],
);

impl Decode for ContainerLink {
    fn descriptor() -> &'static Descriptor {
        &CONTAINER_LINK
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.href = input.text()?,
            1 => self.rel = input.text()?,
            2 => self.media_type = Some(input.text()?),
            _ => {}
        }
        Ok(())
    }
}

impl Encode for ContainerLink {
    fn schema(&self) -> &'static Descriptor {
        &CONTAINER_LINK
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.href),
            1 => Output::value(&self.rel),
            2 => Output::nullable(&self.media_type),
            _ => Output::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{decode_document, encode_document};
    use crate::error::{DecodeError, Error};
    use crate::xml::parse_document;

    const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    #[test]
    fn test_decode_container() {
        let doc = parse_document(CONTAINER_XML.as_bytes()).unwrap();
        let container: Container = decode_document(&doc).unwrap();
        assert_eq!(container.version, "1.0");
        assert_eq!(container.package_path(), Some("OEBPS/content.opf"));
        assert!(container.links.is_empty());
    }

    #[test]
    fn test_package_path_skips_other_media_types() {
        let mut container = Container::new("book.opf");
        container
            .rootfiles
            .insert(0, Rootfile::new("alt.pdf", "application/pdf"));
        assert_eq!(container.package_path(), Some("book.opf"));
        assert_eq!(Container::default().package_path(), None);
    }

    #[test]
    fn test_missing_rootfiles_wrapper() {
        let xml = format!(r#"<container version="1.0" xmlns="{CONTAINER_NS}"/>"#);
        let doc = parse_document(xml.as_bytes()).unwrap();
        let err = decode_document::<Container>(&doc).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::MissingElement { ref name, ref path })
                if name == "rootfiles" && path == "/container"
        ));
    }

    #[test]
    fn test_encode_wraps_rootfiles() {
        let root = encode_document(&Container::new("OEBPS/content.opf")).unwrap().root;
        assert_eq!(root.namespace.as_deref(), Some(CONTAINER_NS));
        assert_eq!(root.attribute("version", None), Some("1.0"));
        assert_eq!(root.children.len(), 1);

        let rootfiles = &root.children[0];
        assert_eq!(rootfiles.name, "rootfiles");
        assert_eq!(rootfiles.children[0].name, "rootfile");
        assert_eq!(
            rootfiles.children[0].attribute("full-path", None),
            Some("OEBPS/content.opf")
        );
    }
}
