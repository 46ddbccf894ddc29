//! Publication metadata: Dublin Core elements plus OPF `meta` and `link`.
//!
//! `<metadata>` holds one ordered list of entries drawn from a closed set of
//! element types. Entries keep document order, so refinements stay next to
//! the elements they refine when the document is written back.

use crate::bind::{
    Decode, Descriptor, Encode, Field, Input, OtherAttributes, Output, TagNamespace, Variant,
    Variants, decode_scope, xml_enum,
};
use crate::error::Result;
use crate::xml::{DC_NS, OPF_NS, XML_NS};

xml_enum! {
    /// Base text direction (`dir` attribute).
    pub enum Direction {
        Ltr => "ltr",
        Rtl => "rtl",
        #[default]
        Auto => "auto",
    }
}

/// Generates a Dublin Core element carrying `id`, `xml:lang`, `dir` and text.
macro_rules! dc_text_element {
    ($(#[$meta:meta])* $name:ident, $descriptor:ident, $tag:literal, $text:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub id: Option<String>,
            pub lang: Option<String>,
            pub dir: Option<Direction>,
            pub value: String,
        }

        static $descriptor: Descriptor = Descriptor::new(
            $tag,
            TagNamespace::Uri(DC_NS),
            &[
                Field::value("id").nullable(),
                Field::value("lang").namespace(XML_NS).nullable(),
                Field::value("dir").nullable(),
                $text,
            ],
        );

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self {
                    value: value.into(),
                    ..Default::default()
                }
            }
        }

        impl Decode for $name {
            fn descriptor() -> &'static Descriptor {
                &$descriptor
            }

            fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
                match index {
                    0 => self.id = Some(input.text()?),
                    1 => self.lang = Some(input.text()?),
                    2 => self.dir = Some(input.value()?),
                    3 => self.value = input.text()?,
                    _ => {}
                }
                Ok(())
            }
        }

        impl Encode for $name {
            fn schema(&self) -> &'static Descriptor {
                &$descriptor
            }

            fn encode_field(&self, index: usize) -> Output<'_> {
                match index {
                    0 => Output::nullable(&self.id),
                    1 => Output::nullable(&self.lang),
                    2 => Output::nullable(&self.dir),
                    3 => Output::value(&self.value),
                    _ => Output::Default,
                }
            }
        }
    };
}

dc_text_element!(
    /// `dc:title`.
    Title, TITLE, "title", Field::text("value")
);
dc_text_element!(Coverage, COVERAGE, "coverage", Field::text("value").optional());
dc_text_element!(Description, DESCRIPTION, "description", Field::text("value").optional());
dc_text_element!(Format, FORMAT, "format", Field::text("value").optional());
dc_text_element!(Publisher, PUBLISHER, "publisher", Field::text("value").optional());
dc_text_element!(Relation, RELATION, "relation", Field::text("value").optional());
dc_text_element!(Rights, RIGHTS, "rights", Field::text("value").optional());
dc_text_element!(Source, SOURCE, "source", Field::text("value").optional());
dc_text_element!(Subject, SUBJECT, "subject", Field::text("value").optional());
dc_text_element!(
    /// `dc:type`.
    ResourceType, RESOURCE_TYPE, "type", Field::text("value").optional()
);

/// Generates a creator-like element; EPUB 2 puts the role and sort key in
/// `opf:` attributes.
macro_rules! dc_person_element {
    ($(#[$meta:meta])* $name:ident, $descriptor:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub id: Option<String>,
            pub lang: Option<String>,
            pub dir: Option<Direction>,
            /// `opf:role`, a MARC relator code such as `aut`.
            pub role: Option<String>,
            /// `opf:file-as`.
            pub file_as: Option<String>,
            pub value: String,
        }

        static $descriptor: Descriptor = Descriptor::new(
            $tag,
            TagNamespace::Uri(DC_NS),
            &[
                Field::value("id").nullable(),
                Field::value("lang").namespace(XML_NS).nullable(),
                Field::value("dir").nullable(),
                Field::value("role").namespace(OPF_NS).nullable(),
                Field::value("file_as").rename("file-as").namespace(OPF_NS).nullable(),
                Field::text("value").optional(),
            ],
        );

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self {
                    value: value.into(),
                    ..Default::default()
                }
            }
        }

        impl Decode for $name {
            fn descriptor() -> &'static Descriptor {
                &$descriptor
            }

            fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
                match index {
                    0 => self.id = Some(input.text()?),
                    1 => self.lang = Some(input.text()?),
                    2 => self.dir = Some(input.value()?),
                    3 => self.role = Some(input.text()?),
                    4 => self.file_as = Some(input.text()?),
                    5 => self.value = input.text()?,
                    _ => {}
                }
                Ok(())
            }
        }

        impl Encode for $name {
            fn schema(&self) -> &'static Descriptor {
                &$descriptor
            }

            fn encode_field(&self, index: usize) -> Output<'_> {
                match index {
                    0 => Output::nullable(&self.id),
                    1 => Output::nullable(&self.lang),
                    2 => Output::nullable(&self.dir),
                    3 => Output::nullable(&self.role),
                    4 => Output::nullable(&self.file_as),
                    5 => Output::value(&self.value),
                    _ => Output::Default,
                }
            }
        }
    };
}

dc_person_element!(
    /// `dc:creator`.
    Creator, CREATOR, "creator"
);
dc_person_element!(
    /// `dc:contributor`.
    Contributor, CONTRIBUTOR, "contributor"
);

/// `dc:identifier`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifier {
    pub id: Option<String>,
    /// `opf:scheme` (EPUB 2), e.g. `ISBN`.
    pub scheme: Option<String>,
    pub value: String,
}

static IDENTIFIER: Descriptor = Descriptor::new(
    "identifier",
    TagNamespace::Uri(DC_NS),
    &[
        Field::value("id").nullable(),
        Field::value("scheme").namespace(OPF_NS).nullable(),
        Field::text("value"),
    ],
);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Decode for Identifier {
    fn descriptor() -> &'static Descriptor {
        &IDENTIFIER
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.id = Some(input.text()?),
            1 => self.scheme = Some(input.text()?),
            2 => self.value = input.text()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Identifier {
    fn schema(&self) -> &'static Descriptor {
        &IDENTIFIER
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::nullable(&self.id),
            1 => Output::nullable(&self.scheme),
            2 => Output::value(&self.value),
            _ => Output::Default,
        }
    }
}

/// `dc:language`, a BCP 47 tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Language {
    pub id: Option<String>,
    pub value: String,
}

static LANGUAGE: Descriptor = Descriptor::new(
    "language",
    TagNamespace::Uri(DC_NS),
    &[Field::value("id").nullable(), Field::text("value")],
);

impl Language {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: None,
            value: value.into(),
        }
    }
}

impl Decode for Language {
    fn descriptor() -> &'static Descriptor {
        &LANGUAGE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.id = Some(input.text()?),
            1 => self.value = input.text()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Language {
    fn schema(&self) -> &'static Descriptor {
        &LANGUAGE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::nullable(&self.id),
            1 => Output::value(&self.value),
            _ => Output::Default,
        }
    }
}

/// `dc:date`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Date {
    pub id: Option<String>,
    /// `opf:event` (EPUB 2), e.g. `publication`.
    pub event: Option<String>,
    pub value: String,
}

static DATE: Descriptor = Descriptor::new(
    "date",
    TagNamespace::Uri(DC_NS),
    &[
        Field::value("id").nullable(),
        Field::value("event").namespace(OPF_NS).nullable(),
        Field::text("value").optional(),
    ],
);

impl Decode for Date {
    fn descriptor() -> &'static Descriptor {
        &DATE
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.id = Some(input.text()?),
            1 => self.event = Some(input.text()?),
            2 => self.value = input.text()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Date {
    fn schema(&self) -> &'static Descriptor {
        &DATE
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::nullable(&self.id),
            1 => Output::nullable(&self.event),
            2 => Output::value(&self.value),
            _ => Output::Default,
        }
    }
}

/// OPF `meta`, in either shape.
///
/// EPUB 3 uses `property` (with optional `refines`/`scheme`) and text content;
/// EPUB 2 uses `name`/`content` and no text. The `property` value is kept
/// as written, prefix and all; resolving it is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub id: Option<String>,
    pub property: Option<String>,
    pub refines: Option<String>,
    pub scheme: Option<String>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub lang: Option<String>,
    pub dir: Option<Direction>,
    /// Attributes not listed above, e.g. calibre's private ones.
    pub other: OtherAttributes,
    pub value: String,
}

static META: Descriptor = Descriptor::new(
    "meta",
    TagNamespace::Uri(OPF_NS),
    &[
        Field::value("id").nullable(),
        Field::value("property").nullable(),
        Field::value("refines").nullable(),
        Field::value("scheme").nullable(),
        Field::value("name").nullable(),
        Field::value("content").nullable(),
        Field::value("lang").namespace(XML_NS).nullable(),
        Field::value("dir").nullable(),
        Field::overflow("other"),
        Field::text("value").optional(),
    ],
);

impl Meta {
    /// An EPUB 3 `<meta property="..">value</meta>`.
    pub fn property(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            value: value.into(),
            ..Default::default()
        }
    }

    /// An EPUB 2 `<meta name=".." content=".."/>`.
    pub fn named(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Make this a refinement of the element with `id`.
    pub fn refining(mut self, id: &str) -> Self {
        self.refines = Some(format!("#{id}"));
        self
    }

    /// An EPUB 3 meta, as opposed to the EPUB 2 `name`/`content` form.
    pub fn is_property(&self) -> bool {
        self.property.is_some()
    }
}

impl Decode for Meta {
    fn descriptor() -> &'static Descriptor {
        &META
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.id = Some(input.text()?),
            1 => self.property = Some(input.text()?),
            2 => self.refines = Some(input.text()?),
            3 => self.scheme = Some(input.text()?),
            4 => self.name = Some(input.text()?),
            5 => self.content = Some(input.text()?),
            6 => self.lang = Some(input.text()?),
            7 => self.dir = Some(input.value()?),
            8 => self.other = input.overflow()?,
            9 => self.value = input.text()?,
            _ => {}
        }
        Ok(())
    }
}

impl Encode for Meta {
    fn schema(&self) -> &'static Descriptor {
        &META
    }

    fn encode_field(&self, index: usize) -> Output<'_> {
        match index {
            0 => Output::nullable(&self.id),
            1 => Output::nullable(&self.property),
            2 => Output::nullable(&self.refines),
            3 => Output::nullable(&self.scheme),
            4 => Output::nullable(&self.name),
            5 => Output::nullable(&self.content),
            6 => Output::nullable(&self.lang),
            7 => Output::nullable(&self.dir),
            8 => Output::overflow(&self.other),
            9 => Output::unless_default(&self.value),
            _ => Output::Default,
        }
    }
}

/// OPF `link` inside metadata (EPUB 3), pointing at a related resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub id: Option<String>,
    pub refines: Option<String>,
    pub media_type: Option<String>,
    pub properties: Option<String>,
    pub hreflang: Option<String>,
}

static LINK: Descriptor = Descriptor::new(
    "link",
    TagNamespace::Uri(OPF_NS),
    &[
        Field::value("href"),
        Field::value("rel"),
        Field::value("id").nullable(),
        Field::value("refines").nullable(),
        Field::value("media_type").rename("media-type").nullable(),
        Field::value("properties").nullable(),
        Field::value("hreflang").nullable(),
    ],
);

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            ..Default::default()
        }
    }
}

impl Decode for Link {
    fn descriptor() -> &'static Descriptor {
        &LINK
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        match index {
            0 => self.href = input.text()?,
            1 => self.rel = input.text()?,
            2 => self.id = Some(input.text()?),
            3 => self.refines = Some(input.text()?),
            4 => self.media_type = Some(input.text()?),
            5 => self.properties = Some(input.text()?),
            6 => self.hreflang = Some(input.text()?),
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
            0 => Output::value(&self.href),
            1 => Output::value(&self.rel),
            2 => Output::nullable(&self.id),
            3 => Output::nullable(&self.refines),
            4 => Output::nullable(&self.media_type),
            5 => Output::nullable(&self.properties),
            6 => Output::nullable(&self.hreflang),
            _ => Output::Default,
        }
    }
}

/// Generates [`MetadataEntry`], its lookup table, and the `<metadata>` schema
/// listing the same element types.
macro_rules! metadata_entries {
    ($($variant:ident($ty:ident) => $descriptor:ident),* $(,)?) => {
        /// One child of `<metadata>`.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum MetadataEntry {
            $($variant($ty),)*
        }

        static ENTRY_VARIANTS: &[Variant<MetadataEntry>] = &[
            $(
                Variant {
                    descriptor: &$descriptor,
                    decode: |scope| decode_scope::<$ty>(scope).map(MetadataEntry::$variant),
                },
            )*
        ];

        pub(crate) static METADATA: Descriptor = Descriptor::new(
            "metadata",
            TagNamespace::Inherit,
            &[Field::variants("entries", &[$(&$descriptor),*]).optional()],
        );

        impl Variants for MetadataEntry {
            fn variants() -> &'static [Variant<Self>] {
                ENTRY_VARIANTS
            }
        }

        impl Encode for MetadataEntry {
            fn schema(&self) -> &'static Descriptor {
                match self {
                    $(MetadataEntry::$variant(inner) => inner.schema(),)*
                }
            }

            fn encode_field(&self, index: usize) -> Output<'_> {
                match self {
                    $(MetadataEntry::$variant(inner) => inner.encode_field(index),)*
                }
            }
        }

        $(
            impl From<$ty> for MetadataEntry {
                fn from(value: $ty) -> Self {
                    MetadataEntry::$variant(value)
                }
            }
        )*
    };
}

metadata_entries! {
    Identifier(Identifier) => IDENTIFIER,
    Title(Title) => TITLE,
    Language(Language) => LANGUAGE,
    Contributor(Contributor) => CONTRIBUTOR,
    Coverage(Coverage) => COVERAGE,
    Creator(Creator) => CREATOR,
    Date(Date) => DATE,
    Description(Description) => DESCRIPTION,
    Format(Format) => FORMAT,
    Publisher(Publisher) => PUBLISHER,
    Relation(Relation) => RELATION,
    Rights(Rights) => RIGHTS,
    Source(Source) => SOURCE,
    Subject(Subject) => SUBJECT,
    Type(ResourceType) => RESOURCE_TYPE,
    Meta(Meta) => META,
    Link(Link) => LINK,
}

/// The `<metadata>` element of a package or collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub entries: Vec<MetadataEntry>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping document order.
    pub fn push(&mut self, entry: impl Into<MetadataEntry>) {
        self.entries.push(entry.into());
    }

    pub fn with(mut self, entry: impl Into<MetadataEntry>) -> Self {
        self.push(entry);
        self
    }

    pub fn titles(&self) -> impl Iterator<Item = &Title> {
        self.entries.iter().filter_map(|entry| match entry {
            MetadataEntry::Title(title) => Some(title),
            _ => None,
        })
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter().filter_map(|entry| match entry {
            MetadataEntry::Identifier(identifier) => Some(identifier),
            _ => None,
        })
    }

    pub fn creators(&self) -> impl Iterator<Item = &Creator> {
        self.entries.iter().filter_map(|entry| match entry {
            MetadataEntry::Creator(creator) => Some(creator),
            _ => None,
        })
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.entries.iter().filter_map(|entry| match entry {
            MetadataEntry::Language(language) => Some(language),
            _ => None,
        })
    }

    pub fn metas(&self) -> impl Iterator<Item = &Meta> {
        self.entries.iter().filter_map(|entry| match entry {
            MetadataEntry::Meta(meta) => Some(meta),
            _ => None,
        })
    }

    /// Identifier whose `id` matches, e.g. the package's unique identifier.
    pub fn identifier_by_id(&self, id: &str) -> Option<&Identifier> {
        self.identifiers().find(|identifier| identifier.id.as_deref() == Some(id))
    }

    /// Value of the first top-level meta with this `property`.
    pub fn meta_property(&self, property: &str) -> Option<&str> {
        self.metas()
            .find(|meta| meta.refines.is_none() && meta.property.as_deref() == Some(property))
            .map(|meta| meta.value.as_str())
    }

    /// `content` of the first EPUB 2 meta with this `name`.
    pub fn meta_named(&self, name: &str) -> Option<&str> {
        self.metas()
            .find(|meta| meta.name.as_deref() == Some(name))
            .and_then(|meta| meta.content.as_deref())
    }

    /// Metas refining the element with `id` (`refines="#id"`).
    pub fn refinements<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Meta> + 'a {
        self.metas().filter(move |meta| {
            meta.refines
                .as_deref()
                .and_then(|target| target.strip_prefix('#'))
                == Some(id)
        })
    }
}

impl Decode for Metadata {
    fn descriptor() -> &'static Descriptor {
        &METADATA
    }

    fn decode_field(&mut self, index: usize, input: Input<'_>) -> Result<()> {
        if index == 0 {
            self.entries = input.variants()?;
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
            _ => Output::Default,
        }
    }
}
