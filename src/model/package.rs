//! The package document (`*.opf`).

use tracing::trace;

use super::metadata::{Direction, METADATA, Metadata};
use super::version::Version;
use crate::bind::{Decode, Descriptor, Encode, Field, Input, Output, TagNamespace, xml_enum};
use crate::error::Result;
use crate::xml::{DC_NS, OPF_NS, XML_NS};

/// Media type of a package document.
pub const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Prefixes declared on `<metadata>` so Dublin Core and `opf:` attributes
/// get their conventional names.
const METADATA_PREFIXES: &[(&str, &str)] = &[("dc", DC_NS), ("opf", OPF_NS)];

xml_enum! {
    /// Whether a spine item is part of the default reading order.
    pub enum Linear {
        #[default]
        Yes => "yes",
        No => "no",
    }
}

xml_enum! {
    /// Spine `page-progression-direction`.
    pub enum PageProgression {
        #[default]
        Default => "default",
        Ltr => "ltr",
        Rtl => "rtl",
    }
}

/// Root of the package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Raw `version` attribute, e.g. `3.0`.
    pub version: String,
    /// `id` of the `dc:identifier` that identifies this publication.
    pub unique_identifier: String,
    /// Prefix mappings (`prefix` attribute), unparsed.
    pub prefix: Option<String>,
    pub lang: Option<String>,
    pub dir: Option<Direction>,
    pub id: Option<String>,
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Spine,
    pub guide: Option<Guide>,
    pub bindings: Option<Bindings>,
    pub collections: Vec<Collection>,
}

static PACKAGE: Descriptor = Descriptor::new(
    "package",
    TagNamespace::Uri(OPF_NS),
    &[
        Field::value("version"),
        Field::value("unique_identifier").rename("unique-identifier"),
        Field::value("prefix").nullable(),
        Field::value("lang").namespace(XML_NS).nullable(),
        Field::value("dir").nullable(),
        Field::value("id").nullable(),
        Field::element("metadata", &METADATA).declare(METADATA_PREFIXES),
        Field::element("manifest", &MANIFEST),
        Field::element("spine", &SPINE),
        Field::element("guide", &GUIDE).nullable(),
        Field::element("bindings", &BINDINGS).nullable(),
        Field::list("collection", &COLLECTION).optional(),
    ],
);

impl Package {
    /// An empty package of the given version.
    pub fn new(version: Version, unique_identifier: impl Into<String>) -> Self {
        Self {
            version: version.as_str().to_string(),
            unique_identifier: unique_identifier.into(),
            ..Default::default()
        }
    }

    /// Format version, when the `version` attribute is one we know.
    pub fn epub_version(&self) -> Option<Version> {
        Version::parse(&self.version)
    }

    /// Manifest item with this `id`.
    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.items.iter().find(|item| item.id == id)
    }

    /// Manifest items in reading order. Itemrefs pointing nowhere are skipped.
    pub fn spine_items(&self) -> impl Iterator<Item = &ManifestItem> {
        self.spine.itemrefs.iter().filter_map(|itemref| {
            let item = self.item(&itemref.idref);
            if item.is_none() {
                trace!(idref = %itemref.idref, "spine entry has no manifest item");
            }
            item
        })
    }

    /// The cover image: the item with the `cover-image` property, else the one
    /// named by `<meta name="cover">`.
    pub fn cover_item(&self) -> Option<&ManifestItem> {
        self.manifest
            .items
            .iter()
            .find(|item| item.has_property("cover-image"))
            .or_else(|| self.metadata.meta_named("cover").and_then(|id| self.item(id)))
    }

    /// The identifier named by `unique-identifier`.
    pub fn unique_identifier_value(&self) -> Option<&str> {
        self.metadata
            .identifier_by_id(&self.unique_identifier)
            .map(|identifier| identifier.value.as_str())
    }
}

impl Decode for Package {
    fn descriptor() -> &'static Descriptor {
        &PACKAGE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.version = input.text()?,
            1 => self.unique_identifier = input.text()?,
            2 => self.prefix = Some(input.text()?),
            3 => self.lang = Some(input.text()?),
            4 => self.dir = Some(input.value()?),
            5 => self.id = Some(input.text()?),
            6 => self.metadata = input.element()?,
            7 => self.manifest = input.element()?,
            8 => self.spine = input.element()?,
            9 => self.guide = Some(input.element()?),
            10 => self.bindings = Some(input.element()?),
            11 => self.collections = input.list()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Package {
    fn schema(&self) -> &'static Descriptor {
        &PACKAGE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.version),
            1 => Output::value(&self.unique_identifier),
            2 => Output::nullable(&self.prefix),
            3 => Output::nullable(&self.lang),
            4 => Output::nullable(&self.dir),
            5 => Output::nullable(&self.id),
            6 => Output::element(&self.metadata),
            7 => Output::element(&self.manifest),
            8 => Output::element(&self.spine),
            9 => Output::nullable_element(&self.guide),
            10 => Output::nullable_element(&self.bindings),
            11 => Output::list(&self.collections),
            _ => Output::Default,
        }
    }
}

/// `<manifest>`: every resource of the publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub id: Option<String>,
    pub items: Vec<ManifestItem>,
}

static MANIFEST: Descriptor = Descriptor::new(
    "manifest",
    TagNamespace::Inherit,
    &[Field::value("id").nullable(), Field::list("item", &ITEM)],
);

impl Decode for Manifest {
    fn descriptor() -> &'static Descriptor {
        &MANIFEST
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.id = Some(input.text()?),
            1 => self.items = input.list()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Manifest {
    fn schema(&self) -> &'static Descriptor {
        &MANIFEST
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::nullable(&self.id),
            1 => Output::list(&self.items),
            _ => Output::Default,
        }
    }
}

/// A manifest `<item>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Relative to the package document.
    pub href: String,
    pub media_type: String,
    pub fallback: Option<String>,
    /// Space-separated property tokens, e.g. `nav cover-image`.
    pub properties: Option<String>,
    pub media_overlay: Option<String>,
    /// EPUB 2 only.
    pub fallback_style: Option<String>,
}

static ITEM: Descriptor = Descriptor::new(
    "item",
    TagNamespace::Inherit,
    &[
        Field::value("id"),
        Field::value("href"),
        Field::value("media_type").rename("media-type"),
        Field::value("fallback").nullable(),
        Field::value("properties").nullable(),
        Field::value("media_overlay").rename("media-overlay").nullable(),
        Field::value("fallback_style").rename("fallback-style").nullable(),
    ],
);

impl ManifestItem {
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    /// Whether `properties` lists `property`.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == property))
    }
}

impl Decode for ManifestItem {
    fn descriptor() -> &'static Descriptor {
        &ITEM
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.id = input.text()?,
            1 => self.href = input.text()?,
            2 => self.media_type = input.text()?,
            3 => self.fallback = Some(input.text()?),
            4 => self.properties = Some(input.text()?),
            5 => self.media_overlay = Some(input.text()?),
            6 => self.fallback_style = Some(input.text()?),
            _ => {}
        }
        Ok(())
    }
}

impl Encode for ManifestItem {
    fn schema(&self) -> &'static Descriptor {
        &ITEM
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.id),
            1 => Output::value(&self.href),
            2 => Output::value(&self.media_type),
            3 => Output::nullable(&self.fallback),
            4 => Output::nullable(&self.properties),
            5 => Output::nullable(&self.media_overlay),
            6 => Output::nullable(&self.fallback_style),
            _ => Output::Default,
        }
    }
}

/// `<spine>`: the default reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spine {
    pub id: Option<String>,
    /// Manifest id of the EPUB 2 NCX.
    pub toc: Option<String>,
    pub page_progression: Option<PageProgression>,
    pub itemrefs: Vec<Itemref>,
}

static SPINE: Descriptor = Descriptor::new(
    "spine",
    TagNamespace::Inherit,
    &[
        Field::value("id").nullable(),
        Field::value("toc").nullable(),
        Field::value("page_progression")
            .rename("page-progression-direction")
            .nullable(),
        Field::list("itemref", &ITEMREF),
    ],
);

impl Decode for Spine {
    fn descriptor() -> &'static Descriptor {
        &SPINE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.id = Some(input.text()?),
            1 => self.toc = Some(input.text()?),
            2 => self.page_progression = Some(input.value()?),
            3 => self.itemrefs = input.list()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Spine {
    fn schema(&self) -> &'static Descriptor {
        &SPINE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::nullable(&self.id),
            1 => Output::nullable(&self.toc),
            2 => Output::nullable(&self.page_progression),
            3 => Output::list(&self.itemrefs),
            _ => Output::Default,
        }
    }
}

/// A spine `<itemref>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Itemref {
    pub idref: String,
    pub linear: Linear,
    pub id: Option<String>,
    pub properties: Option<String>,
}

static ITEMREF: Descriptor = Descriptor::new(
    "itemref",
    TagNamespace::Inherit,
    &[
        Field::value("idref"),
        Field::value("linear").optional(),
        Field::value("id").nullable(),
        Field::value("properties").nullable(),
    ],
);

impl Itemref {
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            ..Default::default()
        }
    }
}

impl Decode for Itemref {
    fn descriptor() -> &'static Descriptor {
        &ITEMREF
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.idref = input.text()?,
            1 => self.linear = input.value()?,
            2 => self.id = Some(input.text()?),
            3 => self.properties = Some(input.text()?),
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Itemref {
    fn schema(&self) -> &'static Descriptor {
        &ITEMREF
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.idref),
            1 => Output::unless_default(&self.linear),
            2 => Output::nullable(&self.id),
            3 => Output::nullable(&self.properties),
            _ => Output::Default,
        }
    }
}

/// EPUB 2 `<guide>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guide {
    pub references: Vec<Reference>,
}

static GUIDE: Descriptor = Descriptor::new(
    "guide",
    TagNamespace::Inherit,
    &[Field::list("reference", &REFERENCE)],
);

impl Decode for Guide {
    fn descriptor() -> &'static Descriptor {
        &GUIDE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        if index == 0 {
            self.references = input.list()?;
        }
        Ok(())
    }
}

impl Encode for Guide {
    fn schema(&self) -> &'static Descriptor {
        &GUIDE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::list(&self.references),
            _ => Output::Default,
        }
    }
}

/// A guide `<reference>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// `type`, e.g. `cover` or `toc`.
    pub kind: String,
    pub title: Option<String>,
    pub href: String,
}

static REFERENCE: Descriptor = Descriptor::new(
    "reference",
    TagNamespace::Inherit,
    &[
        Field::value("kind").rename("type"),
        Field::value("title").nullable(),
        Field::value("href"),
    ],
);

impl Decode for Reference {
    fn descriptor() -> &'static Descriptor {
        &REFERENCE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.kind = input.text()?,
            1 => self.title = Some(input.text()?),
            2 => self.href = input.text()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Reference {
    fn schema(&self) -> &'static Descriptor {
        &REFERENCE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.kind),
            1 => Output::nullable(&self.title),
            2 => Output::value(&self.href),
            _ => Output::Default,
        }
    }
}

/// EPUB 3.0 `<bindings>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pub media_types: Vec<MediaType>,
}

static BINDINGS: Descriptor = Descriptor::new(
    "bindings",
    TagNamespace::Inherit,
    &[Field::list("media_types", &MEDIA_TYPE).elements_name("mediaType")],
);

impl Decode for Bindings {
    fn descriptor() -> &'static Descriptor {
        &BINDINGS
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        if index == 0 {
            self.media_types = input.list()?;
        }
        Ok(())
    }
}

impl Encode for Bindings {
    fn schema(&self) -> &'static Descriptor {
        &BINDINGS
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::list(&self.media_types),
            _ => Output::Default,
        }
    }
}

/// A `<mediaType>` handler binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaType {
    pub media_type: String,
    /// Manifest id of the handler.
    pub handler: String,
}

static MEDIA_TYPE: Descriptor = Descriptor::new(
    "mediaType",
    TagNamespace::Inherit,
    &[
        Field::value("media_type").rename("media-type"),
        Field::value("handler"),
    ],
);

impl Decode for MediaType {
    fn descriptor() -> &'static Descriptor {
        &MEDIA_TYPE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.media_type = input.text()?,
            1 => self.handler = input.text()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for MediaType {
    fn schema(&self) -> &'static Descriptor {
        &MEDIA_TYPE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.media_type),
            1 => Output::value(&self.handler),
            _ => Output::Default,
        }
    }
}

/// EPUB 3 `<collection>`; may nest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub role: String,
    pub id: Option<String>,
    pub lang: Option<String>,
    pub dir: Option<Direction>,
    pub metadata: Option<Metadata>,
    pub collections: Vec<Collection>,
    pub links: Vec<CollectionLink>,
}

static COLLECTION: Descriptor = Descriptor::new(
    "collection",
    TagNamespace::Inherit,
    &[
        Field::value("role"),
        Field::value("id").nullable(),
        Field::value("lang").namespace(XML_NS).nullable(),
        Field::value("dir").nullable(),
        Field::element("metadata", &METADATA)
            .declare(METADATA_PREFIXES)
            .nullable(),
        Field::list("collection", &COLLECTION).optional(),
        Field::list("link", &COLLECTION_LINK).optional(),
    ],
);

impl Decode for Collection {
    fn descriptor() -> &'static Descriptor {
        &COLLECTION
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.role = input.text()?,
            1 => self.id = Some(input.text()?),
            2 => self.lang = Some(input.text()?),
            3 => self.dir = Some(input.value()?),
            4 => self.metadata = Some(input.element()?),
            5 => self.collections = input.list()?,
            6 => self.links = input.list()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Collection {
    fn schema(&self) -> &'static Descriptor {
        &COLLECTION
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.role),
            1 => Output::nullable(&self.id),
            2 => Output::nullable(&self.lang),
            3 => Output::nullable(&self.dir),
            4 => Output::nullable_element(&self.metadata),
            5 => Output::list(&self.collections),
            6 => Output::list(&self.links),
            _ => Output::Default,
        }
    }
}

/// A `<link>` inside a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionLink {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub properties: Option<String>,
}

static COLLECTION_LINK: Descriptor = Descriptor::new(
    "link",
    TagNamespace::Inherit,
    &[
        Field::value("href"),
        Field::value("rel").nullable(),
        Field::value("media_type").rename("media-type").nullable(),
        Field::value("properties").nullable(),
    ],
);

impl Decode for CollectionLink {
    fn descriptor() -> &'static Descriptor {
        &COLLECTION_LINK
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.href = input.text()?,
            1 => self.rel = Some(input.text()?),
            2 => self.media_type = Some(input.text()?),
            3 => self.properties = Some(input.text()?),
            _ => {}
        }
        Ok(())
    }
}

impl Encode for CollectionLink {
    fn schema(&self) -> &'static Descriptor {
        &COLLECTION_LINK
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::value(&self.href),
            1 => Output::nullable(&self.rel),
            2 => Output::nullable(&self.media_type),
            3 => Output::nullable(&self.properties),
            _ => Output::Default,
        }
    }
}
