use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::io::Cursor;

use crate::error::{Error, Result};

/// Width of the size pickle that precedes the header pickle.
///
/// Every payload offset in the index is relative to
/// `header_size + PROLOGUE_WIDTH`.
pub const PROLOGUE_WIDTH: u64 = 8;

/// Maximum directory nesting accepted from an index.
pub const MAX_DEPTH: usize = 48;

/// Fixed 16-byte prologue: the size pickle plus the header pickle's
/// own length fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prologue {
    pub size_pickle_len: u32,
    pub header_size: u32,
    pub header_payload_len: u32,
    pub json_len: u32,
}

impl Prologue {
    pub const SIZE: usize = 16;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::malformed(format!(
                "archive is {} bytes, shorter than the {}-byte prologue",
                data.len(),
                Self::SIZE
            )));
        }

        let mut cursor = Cursor::new(&data[..Self::SIZE]);

        Ok(Self {
            size_pickle_len: cursor.read_u32::<LittleEndian>()?,
            header_size: cursor.read_u32::<LittleEndian>()?,
            header_payload_len: cursor.read_u32::<LittleEndian>()?,
            json_len: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// A leaf of the directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileNode {
    /// Offset relative to the archive's base offset
    pub offset: u64,
    pub size: u64,
    pub executable: bool,
}

/// A decoded directory tree node.
///
/// The variant is decided once while decoding the index: an object with a
/// `"files"` key is a directory, anything else must be a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directory(BTreeMap<String, Node>),
    File(FileNode),
}

impl Node {
    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }
}

/// Decoded archive header
#[derive(Debug, Clone)]
pub struct Header {
    /// Byte length of the header pickle, as stored at bytes 4..8
    pub index_size: u32,
    /// Byte length of the JSON text
    pub json_len: u32,
    /// Absolute position where file payloads begin
    pub base_offset: u64,
    /// Children of the top-level `"files"` object
    pub root: BTreeMap<String, Node>,
}

/// A file inside a loaded archive.
///
/// Two entries are equal only when they come from the same loaded archive
/// and share a path.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub(crate) archive_id: u64,
    /// `/`-prefixed logical path
    pub path: String,
    /// Absolute offset into the archive buffer
    pub offset: u64,
    pub size: u64,
    pub executable: bool,
}

impl FileEntry {
    /// Last path component
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Path without the leading `/`
    pub fn relative_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }
}

impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.archive_id == other.archive_id && self.path == other.path
    }
}

impl Eq for FileEntry {}

impl Hash for FileEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.archive_id.hash(state);
        self.path.hash(state);
    }
}
