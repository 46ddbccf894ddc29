//! # opfbind
//!
//! Typed reading and writing of the XML documents inside an EPUB: the
//! container descriptor and the package document (metadata, manifest, spine
//! and the rest).
//!
//! ## Features
//!
//! - Schema-driven binding between element trees and typed models
//! - EPUB 2, 3.0 and 3.1 package documents from one model
//! - Lossless round trips for every non-default value
//! - Optional ZIP archive access (`zip` feature, on by default)
//!
//! ## Quick Start
//!
//! ```no_run
//! use opfbind::parts::{read_package, write_package};
//! use opfbind::xml::WriteOptions;
//!
//! # fn main() -> opfbind::Result<()> {
//! let file = std::fs::File::open("book.epub")?;
//! let mut archive = zip::ZipArchive::new(file)?;
//! let opf = read_package(&mut archive)?;
//!
//! for title in opf.package.metadata.titles() {
//!     println!("{}", title.value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Binding your own types
//!
//! The models are ordinary users of the [`bind`] engine. A type lists its
//! fields in a static [`Descriptor`](bind::Descriptor) and implements
//! [`Decode`](bind::Decode) and [`Encode`](bind::Encode):
//!
//! ```
//! use opfbind::bind::{Decode, Descriptor, Encode, Field, Input, Output, TagNamespace};
//!
//! #[derive(Default)]
//! struct Link {
//!     rel: String,
//!     href: String,
//! }
//!
//! static LINK: Descriptor = Descriptor::new(
//!     "link",
//!     TagNamespace::Inherit,
//!     &[Field::value("rel"), Field::value("href")],
//! );
//!
//! impl Decode for Link {
//!     fn descriptor() -> &'static Descriptor {
//!         &LINK
//!     }
//!
//!     fn decode_field(&mut self, index: usize, input: Input<'_>) -> opfbind::Result<()> {
//!         match index {
//!             0 => self.rel = input.text()?,
//!             _ => self.href = input.text()?,
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Encode for Link {
//!     fn schema(&self) -> &'static Descriptor {
//!         &LINK
//!     }
//!
//!     fn encode_field(&self, index: usize) -> Output<'_> {
//!         match index {
//!             0 => Output::value(&self.rel),
//!             _ => Output::value(&self.href),
//!         }
//!     }
//! }
//!
//! let link: Link = opfbind::from_bytes(br#"<link rel="nav" href="toc.xhtml"/>"#).unwrap();
//! assert_eq!(link.href, "toc.xhtml");
//! ```

pub mod bind;
pub mod error;
pub mod model;
pub mod parts;
pub mod xml;

pub use bind::{from_bytes, to_bytes};
pub use error::{DecodeError, Error, Result, SchemaError};
pub use model::{Container, Metadata, Package, Version};
