//! Typed models of the EPUB XML documents.
//!
//! Each model is a fixed schema fed through the [`bind`](crate::bind) engine:
//! - [`Container`]: `META-INF/container.xml`
//! - [`Package`]: the package document, with its [`Metadata`]
//! - [`Version`]: format versions and [`Package::retain_for`]

pub mod container;
pub mod metadata;
pub mod package;
pub mod version;

pub use container::{Container, ContainerLink, Rootfile};
pub use metadata::{
    Contributor, Coverage, Creator, Date, Description, Direction, Format, Identifier, Language,
    Link, Meta, Metadata, MetadataEntry, Publisher, Relation, ResourceType, Rights, Source,
    Subject, Title,
};
pub use package::{
    Bindings, Collection, CollectionLink, Guide, Itemref, Linear, Manifest, ManifestItem,
    MediaType, PACKAGE_MEDIA_TYPE, Package, PageProgression, Reference, Spine,
};
pub use version::Version;
