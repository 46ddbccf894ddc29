//! EPUB format versions and version-appropriate output.
//!
//! The binding engine writes every field that is not at its default, so
//! targeting a version means clearing what that version does not define
//! before encoding. [`Package::retain_for`] does exactly that.

use std::fmt;

use tracing::debug;

use super::metadata::{Metadata, MetadataEntry};
use super::package::Package;

/// Package document versions with distinct vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    V2,
    V3_0,
    V3_1,
}

impl Version {
    /// Classify a `version` attribute: `2.x` is EPUB 2, `3.0` is 3.0, and
    /// anything later is treated as 3.1.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('.');
        let major: u32 = parts.next()?.parse().ok()?;
        let minor: u32 = match parts.next() {
            Some(minor) => minor.parse().ok()?,
            None => 0,
        };

        match (major, minor) {
            (2, _) => Some(Version::V2),
            (3, 0) => Some(Version::V3_0),
            (3, _) => Some(Version::V3_1),
            (major, _) if major > 3 => Some(Version::V3_1),
            _ => None,
        }
    }

    /// Canonical `version` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V2 => "2.0",
            Version::V3_0 => "3.0",
            Version::V3_1 => "3.1",
        }
    }

    pub fn is_epub3(&self) -> bool {
        *self >= Version::V3_0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Package {
    /// Clear every field `version` does not define, so encoding produces
    /// output valid for that version.
    pub fn retain_for(&mut self, version: Version) {
        debug!(%version, "clearing fields for target version");

        if version == Version::V2 {
            self.prefix = None;
            self.dir = None;
            self.bindings = None;
            self.collections.clear();
            self.spine.page_progression = None;
            for item in &mut self.manifest.items {
                item.properties = None;
                item.media_overlay = None;
            }
            for itemref in &mut self.spine.itemrefs {
                itemref.properties = None;
            }
        } else {
            for item in &mut self.manifest.items {
                item.fallback_style = None;
            }
        }

        if version == Version::V3_1 {
            self.guide = None;
            self.bindings = None;
        }

        self.metadata.retain_for(version);
    }
}

impl Metadata {
    /// Drop entries and attributes `version` does not define.
    pub fn retain_for(&mut self, version: Version) {
        if version == Version::V2 {
            self.entries.retain(|entry| match entry {
                MetadataEntry::Meta(meta) => !meta.is_property() && meta.refines.is_none(),
                MetadataEntry::Link(_) => false,
                _ => true,
            });
        }

        for entry in &mut self.entries {
            if version == Version::V2 {
                clear_direction(entry);
            } else {
                clear_opf_attributes(entry);
            }
        }
    }
}

/// `dir` arrived with EPUB 3.
fn clear_direction(entry: &mut MetadataEntry) {
    macro_rules! clear {
        ($($variant:ident),*) => {
            match entry {
                $(MetadataEntry::$variant(inner) => inner.dir = None,)*
                _ => {}
            }
        };
    }
    clear!(
        Title, Contributor, Coverage, Creator, Description, Format, Publisher, Relation, Rights,
        Source, Subject, Type, Meta
    );
}

/// The `opf:` attributes on Dublin Core elements are EPUB 2 only.
fn clear_opf_attributes(entry: &mut MetadataEntry) {
    match entry {
        MetadataEntry::Identifier(identifier) => identifier.scheme = None,
        MetadataEntry::Creator(person) => {
            person.role = None;
            person.file_as = None;
        }
        MetadataEntry::Contributor(person) => {
            person.role = None;
            person.file_as = None;
        }
        MetadataEntry::Date(date) => date.event = None,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metadata::{Creator, Identifier, Link, Meta, Title};
    use crate::model::package::{Bindings, Guide, ManifestItem, PageProgression};

    #[test]
    fn test_parse_versions() {
        assert_eq!(Version::parse("2.0"), Some(Version::V2));
        assert_eq!(Version::parse("2.0.1"), Some(Version::V2));
        assert_eq!(Version::parse("3.0"), Some(Version::V3_0));
        assert_eq!(Version::parse("3"), Some(Version::V3_0));
        assert_eq!(Version::parse("3.1"), Some(Version::V3_1));
        assert_eq!(Version::parse("3.3"), Some(Version::V3_1));
        assert_eq!(Version::parse("1.0"), None);
        assert_eq!(Version::parse("three"), None);
        assert_eq!(Version::parse(""), None);
    }

    fn sample() -> Package {
        let mut creator = Creator::new("Author");
        creator.role = Some("aut".to_string());
        creator.dir = Some(crate::model::metadata::Direction::Ltr);

        let mut identifier = Identifier::new("urn:isbn:1").with_id("uid");
        identifier.scheme = Some("ISBN".to_string());

        let mut package = Package::new(Version::V3_0, "uid");
        package.prefix = Some("foaf: http://xmlns.com/foaf/spec/".to_string());
        package.metadata = Metadata::new()
            .with(identifier)
            .with(Title::new("T"))
            .with(creator)
            .with(Meta::property("dcterms:modified", "2024-01-01T00:00:00Z"))
            .with(Meta::named("cover", "img"))
            .with(Link::new("record", "record.xml"));
        let mut item = ManifestItem::new("img", "cover.jpg", "image/jpeg").with_properties("cover-image");
        item.fallback_style = Some("css".to_string());
        package.manifest.items.push(item);
        package.spine.page_progression = Some(PageProgression::Rtl);
        package.guide = Some(Guide::default());
        package.bindings = Some(Bindings::default());
        package
    }

    #[test]
    fn test_retain_for_epub2() {
        let mut package = sample();
        package.retain_for(Version::V2);

        assert_eq!(package.prefix, None);
        assert_eq!(package.bindings, None);
        assert!(package.guide.is_some());
        assert_eq!(package.spine.page_progression, None);
        assert_eq!(package.manifest.items[0].properties, None);
        assert_eq!(package.manifest.items[0].fallback_style.as_deref(), Some("css"));

        assert_eq!(package.metadata.entries.len(), 4);
        assert_eq!(package.metadata.meta_named("cover"), Some("img"));
        let identifier = package.metadata.identifiers().next().unwrap();
        assert_eq!(identifier.scheme.as_deref(), Some("ISBN"));
        let creator = package.metadata.creators().next().unwrap();
        assert_eq!(creator.role.as_deref(), Some("aut"));
        assert_eq!(creator.dir, None);
    }

    #[test]
    fn test_retain_for_epub30() {
        let mut package = sample();
        package.retain_for(Version::V3_0);

        assert!(package.prefix.is_some());
        assert!(package.guide.is_some());
        assert!(package.bindings.is_some());
        assert_eq!(package.manifest.items[0].fallback_style, None);
        assert!(package.manifest.items[0].has_property("cover-image"));
        assert_eq!(package.metadata.entries.len(), 6);

        let identifier = package.metadata.identifiers().next().unwrap();
        assert_eq!(identifier.scheme, None);
        let creator = package.metadata.creators().next().unwrap();
        assert_eq!(creator.role, None);
        assert!(creator.dir.is_some());
    }

    #[test]
    fn test_retain_for_epub31() {
        let mut package = sample();
        package.retain_for(Version::V3_1);
        assert_eq!(package.guide, None);
        assert_eq!(package.bindings, None);
        assert_eq!(package.spine.page_progression, Some(PageProgression::Rtl));
    }
}
