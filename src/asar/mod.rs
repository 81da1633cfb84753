//! ASAR archive parsing and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: prologue layout, the decoded directory tree and [`FileEntry`]
//! - [`parser`]: header decoding, tree flattening and logical path walks
//! - [`archive`]: [`AsarArchive`], the loaded buffer plus its flattened entries
//! - [`extractor`]: writing entries back onto the filesystem
//!
//! ## ASAR Format Overview
//!
//! ```text
//! bytes[0:4)    4 (payload length of the size pickle)
//! bytes[4:8)    header_size: length of the header pickle
//! bytes[8:16)   pickle length fields (not relied on)
//! bytes[16:8+header_size) JSON directory index, then padding
//! bytes[8+header_size:)   concatenated file contents
//! ```
//!
//! The index looks like `{"files":{"dir":{"files":{...}},"a.txt":{"offset":"0","size":5}}}`,
//! with each `offset` relative to `8 + header_size`.
//!
//! ## Limitations
//!
//! - Read only
//! - Files stored outside the archive (`"unpacked": true`) are not supported
//! - No integrity verification

pub mod archive;
pub mod extractor;
pub mod parser;
pub mod structures;

pub use archive::AsarArchive;
pub use extractor::AsarExtractor;
pub use structures::*;
