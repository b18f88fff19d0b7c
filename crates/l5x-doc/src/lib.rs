//! Document model for L5X project files.
//!
//! L5X is an XML dialect, but the merge engine never needs general XML: every
//! element is either a container of other elements or a leaf carrying a single
//! text value (often CDATA). This crate models exactly that shape.
//!
//! # Crate layout
//!
//! - [`element`] — the [`Element`] tree: named lookup (case-insensitive on the
//!   `Name` attribute), canonical-order insertion, and in-place replacement.
//! - [`xml`] — [`Document`] parsing and serialization via `quick-xml`, with
//!   BOM stripping, CDATA preservation and CRLF output.
//! - [`error`] — the [`DocError`] enum returned by parsing and I/O.

pub mod element;
pub mod error;
pub mod xml;

pub use element::{Element, Text};
pub use error::DocError;
pub use xml::Document;
