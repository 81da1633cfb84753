//! # runasar
//!
//! A Rust reader and extractor for Electron ASAR archives.
//!
//! An ASAR archive is a single file holding a length-prefixed JSON index
//! followed by the concatenated contents of every file it describes. This
//! library loads an archive into memory, exposes its files as a read-only
//! virtual tree, and writes one or all of them back to disk.
//!
//! ## Features
//!
//! - Decode the archive prologue and JSON index
//! - List files with their absolute offsets and sizes
//! - Borrow file contents directly from the loaded buffer
//! - Extract a single file or the whole tree, creating directories as needed
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use runasar::{AsarArchive, AsarExtractor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let archive = AsarArchive::open("app.asar").await?;
//!
//!     for file in archive.entries() {
//!         println!("{} ({} bytes)", file.path, file.size);
//!     }
//!
//!     let extractor = AsarExtractor::new(&archive);
//!     extractor.extract_one("/package.json", Path::new("package.json")).await?;
//!     extractor.extract_all(Path::new("app")).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod asar;
pub mod cli;
pub mod error;
pub mod io;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
pub(crate) mod test_utils;

pub use asar::{AsarArchive, AsarExtractor, FileEntry};
pub use cli::Cli;
pub use error::{Error, Result};
