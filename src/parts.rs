//! Reading and writing the XML parts of a publication.
//!
//! A publication is a set of named parts. [`PartSource`] and [`PartSink`]
//! abstract over where they live: in memory, or (with the `zip` feature) in a
//! ZIP archive. The functions here locate the package document through the
//! container descriptor and run each part through the binding engine.
//!
//! ```no_run
//! use opfbind::parts::{MemoryParts, read_package};
//!
//! # fn main() -> opfbind::Result<()> {
//! let mut parts = MemoryParts::new();
//! // ... fill `parts` ...
//! let opf = read_package(&mut parts)?;
//! for item in opf.package.spine_items() {
//!     println!("{}", opf.resolve(&item.href));
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::bind::{self, Decode};
use crate::error::{Error, Result};
use crate::model::{Container, Package};
use crate::xml::WriteOptions;

/// Fixed location of the container descriptor.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Something parts can be read from.
pub trait PartSource {
    /// Raw bytes of the part at `path`; [`Error::MissingPart`] when absent.
    fn read_part(&mut self, path: &str) -> Result<Vec<u8>>;
}

/// Something parts can be written to.
pub trait PartSink {
    fn write_part(&mut self, path: &str, bytes: &[u8]) -> Result<()>;
}

/// Parts held in memory, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryParts {
    parts: BTreeMap<String, Vec<u8>>,
}

impl MemoryParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.parts.insert(path.into(), bytes.into());
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(Vec::as_slice)
    }

    /// Stored paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartSource for MemoryParts {
    fn read_part(&mut self, path: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.get(path) {
            return Ok(bytes.to_vec());
        }
        percent_decoded(path)
            .and_then(|decoded| self.get(&decoded))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::MissingPart(path.to_string()))
    }
}

/// `path` with `%XX` escapes decoded, when that changes it.
///
/// Manifest hrefs are URLs, so `chapter%201.xhtml` names the stored part
/// `chapter 1.xhtml`.
fn percent_decoded(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    (decoded != path).then(|| decoded.into_owned())
}

impl PartSink for MemoryParts {
    fn write_part(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.insert(path, bytes);
        Ok(())
    }
}

#[cfg(feature = "zip")]
mod archive {
    use std::io::{Read, Seek, Write};

    use zip::result::ZipError;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipArchive, ZipWriter};

    use super::{PartSink, PartSource, percent_decoded};
    use crate::error::{Error, Result};

    impl<R: Read + Seek> PartSource for ZipArchive<R> {
        fn read_part(&mut self, path: &str) -> Result<Vec<u8>> {
            match self.by_name(path) {
                Ok(file) => return read_entry(file),
                Err(ZipError::FileNotFound) => {}
                Err(e) => return Err(e.into()),
            }

            // Fallback: the percent-decoded name
            let missing = || Error::MissingPart(path.to_string());
            let decoded = percent_decoded(path).ok_or_else(missing)?;
            match self.by_name(&decoded) {
                Ok(file) => read_entry(file),
                Err(ZipError::FileNotFound) => Err(missing()),
                Err(e) => Err(e.into()),
            }
        }
    }

    fn read_entry(mut file: impl Read) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    impl<W: Write + Seek> PartSink for ZipWriter<W> {
        fn write_part(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            self.start_file(path, options)?;
            self.write_all(bytes)?;
            Ok(())
        }
    }
}

/// A decoded package document and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    /// Path of the package document inside the publication.
    pub path: String,
    pub package: Package,
}

impl PackagePart {
    /// Resolve a manifest href against the package document's directory.
    pub fn resolve(&self, href: &str) -> String {
        resolve_href(&self.path, href)
    }
}

/// Read and decode one XML part.
pub fn read_part<T: Decode, S: PartSource + ?Sized>(source: &mut S, path: &str) -> Result<T> {
    debug!(path, "reading part");
    let bytes = source.read_part(path)?;
    bind::from_bytes(&bytes)
}

/// Read `META-INF/container.xml`.
pub fn read_container<S: PartSource + ?Sized>(source: &mut S) -> Result<Container> {
    read_part(source, CONTAINER_PATH)
}

/// Read the container, then the package document it lists first.
pub fn read_package<S: PartSource + ?Sized>(source: &mut S) -> Result<PackagePart> {
    let container = read_container(source)?;
    let path = container.package_path().ok_or(Error::NoPackage)?.to_string();
    let package = read_part(source, &path)?;
    Ok(PackagePart { path, package })
}

/// Write `META-INF/container.xml`.
pub fn write_container<S: PartSink + ?Sized>(
    sink: &mut S,
    container: &Container,
    options: &WriteOptions,
) -> Result<()> {
    debug!(path = CONTAINER_PATH, "writing part");
    let bytes = bind::to_bytes(container, options)?;
    sink.write_part(CONTAINER_PATH, &bytes)
}

/// Write a package document at `path`.
///
/// Fields the package's own `version` does not define are dropped first; a
/// version we cannot classify is written as is.
pub fn write_package<S: PartSink + ?Sized>(
    sink: &mut S,
    path: &str,
    package: &Package,
    options: &WriteOptions,
) -> Result<()> {
    debug!(path, version = %package.version, "writing part");
    let bytes = match package.epub_version() {
        Some(version) => {
            let mut package = package.clone();
            package.retain_for(version);
            bind::to_bytes(&package, options)?
        }
        None => bind::to_bytes(package, options)?,
    };
    sink.write_part(path, &bytes)
}

/// Join `href` onto the directory of `base_path`, folding `.` and `..`.
///
/// Absolute URLs (anything with a scheme) and fragments-only references are
/// returned unchanged. `..` never climbs above the container root.
pub fn resolve_href(base_path: &str, href: &str) -> String {
    if href.contains("://") || href.starts_with('#') {
        return href.to_string();
    }

    let (href, rooted) = match href.strip_prefix('/') {
        Some(rest) => (rest, true),
        None => (href, false),
    };

    let mut components: Vec<&str> = if rooted {
        Vec::new()
    } else {
        match base_path.rfind('/') {
            Some(idx) => base_path[..idx].split('/').filter(|s| !s.is_empty()).collect(),
            None => Vec::new(),
        }
    };

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(segment),
        }
    }

    components.join("/")
}
