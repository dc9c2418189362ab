//! Error tolerant XML, HTML and DTD parsing.
//!
//! This crate re-exports the parser crates of the workspace and carries the `markup-parser`
//! binary.
pub use markup_shared as shared;
pub use markup_xml::*;
