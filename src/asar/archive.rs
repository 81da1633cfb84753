use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::io;

use super::parser;
use super::structures::{FileEntry, Header};

/// Distinguishes entries of separately loaded archives.
static NEXT_ARCHIVE_ID: AtomicU64 = AtomicU64::new(0);

/// A loaded ASAR archive.
///
/// Owns the whole archive buffer. Entries are index and length pairs into
/// that buffer, and [`slice`](Self::slice) hands out borrowed ranges of it.
#[derive(Debug)]
pub struct AsarArchive {
    id: u64,
    path: Option<PathBuf>,
    bytes: Vec<u8>,
    header: Header,
    entries: BTreeMap<String, FileEntry>,
}

impl AsarArchive {
    /// Read and parse the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::MalformedIndex`] if it is not a valid archive.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = io::read_archive(path).await?;

        let mut archive = Self::from_bytes(bytes)?;
        archive.path = Some(path.to_path_buf());

        tracing::info!(
            path = %path.display(),
            files = archive.len(),
            "loaded archive"
        );
        Ok(archive)
    }

    /// Parse an archive already held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let header = parser::decode_header(&bytes)?;
        let id = NEXT_ARCHIVE_ID.fetch_add(1, Ordering::Relaxed);

        let entries = parser::flatten(&header.root, header.base_offset, id)?
            .into_iter()
            .map(|entry| (entry.path.clone(), entry))
            .collect();

        Ok(Self {
            id,
            path: None,
            bytes,
            header,
            entries,
        })
    }

    /// Path the archive was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The full archive buffer
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Absolute position where file payloads begin
    pub fn base_offset(&self) -> u64 {
        self.header.base_offset
    }

    /// Every file in the archive, ordered by path.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &FileEntry> + '_ {
        self.entries.values()
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry whose path is exactly `path`.
    ///
    /// No normalization is applied: `/lib/a.js` matches, `lib/a.js` does not.
    pub fn lookup(&self, path: &str) -> Result<&FileEntry> {
        self.entries
            .get(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// Resolve a logical path by walking the directory tree.
    ///
    /// Unlike [`lookup`](Self::lookup) this reports which component failed
    /// and accepts paths with or without the leading `/`.
    pub fn resolve(&self, logical_path: &str) -> Result<&FileEntry> {
        let canonical = parser::resolve_path(&self.header.root, logical_path)?;
        self.lookup(&canonical)
    }

    /// Borrow the bytes of `entry`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `entry` belongs to another archive
    /// - [`Error::OutOfBounds`] if the entry extends past the buffer
    pub fn slice(&self, entry: &FileEntry) -> Result<&[u8]> {
        if entry.archive_id != self.id {
            return Err(Error::NotFound(entry.path.clone()));
        }

        let out_of_bounds = || Error::OutOfBounds {
            path: entry.path.clone(),
            offset: entry.offset,
            size: entry.size,
            len: self.bytes.len(),
        };

        let end = entry
            .offset
            .checked_add(entry.size)
            .filter(|&end| end <= self.bytes.len() as u64)
            .ok_or_else(out_of_bounds)?;

        // Both bounds are at most bytes.len(), so they fit in usize.
        Ok(&self.bytes[entry.offset as usize..end as usize])
    }
}
