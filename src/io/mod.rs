//! Filesystem primitives used by the loader and the extractor.

mod local;

pub use local::{read_archive, write_file};
