use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::io;

use super::archive::AsarArchive;
use super::structures::FileEntry;

/// ASAR file extractor
pub struct AsarExtractor<'a> {
    archive: &'a AsarArchive,
}

impl<'a> AsarExtractor<'a> {
    pub fn new(archive: &'a AsarArchive) -> Self {
        Self { archive }
    }

    pub fn archive(&self) -> &'a AsarArchive {
        self.archive
    }

    /// List all files in the archive
    pub fn list_files(&self) -> impl ExactSizeIterator<Item = &'a FileEntry> + 'a {
        self.archive.entries()
    }

    /// Borrow the contents of an entry
    pub fn read(&self, entry: &FileEntry) -> Result<&'a [u8]> {
        self.archive.slice(entry)
    }

    /// Extract an entry to `output_path`, creating parent directories and
    /// replacing any existing file.
    pub async fn extract_entry(&self, entry: &FileEntry, output_path: &Path) -> Result<()> {
        let data = self.read(entry)?;
        tracing::debug!(
            path = %entry.path,
            size = entry.size,
            output = %output_path.display(),
            "extracting entry"
        );
        io::write_file(output_path, data).await
    }

    /// Extract the file at `logical_path` to `destination`.
    ///
    /// # Errors
    ///
    /// - [`Error::PathNotFound`] naming the first component that does not resolve
    /// - [`Error::NotAFile`] if the path names a directory
    /// - [`Error::OutOfBounds`] if the entry extends past the archive
    /// - [`Error::Io`] if the destination cannot be written
    pub async fn extract_one(&self, logical_path: &str, destination: &Path) -> Result<()> {
        let entry = self.archive.resolve(logical_path)?;
        self.extract_entry(entry, destination).await
    }

    /// Extract every file under `root`, recreating the archive's directory
    /// layout.
    ///
    /// Stops at the first failing entry. Files written before the failure
    /// are left in place.
    ///
    /// # Returns
    ///
    /// The number of files written.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDestination`] if `root` exists and is not a directory
    /// - [`Error::UnsafePath`] if an entry path would escape `root`
    /// - [`Error::OutOfBounds`] or [`Error::Io`] from the failing entry
    pub async fn extract_all(&self, root: &Path) -> Result<usize> {
        match fs::metadata(root).await {
            Ok(meta) if !meta.is_dir() => {
                return Err(Error::InvalidDestination(root.to_path_buf()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(root).await?;
            }
            Err(e) => return Err(e.into()),
        }

        let mut written = 0;
        for entry in self.list_files() {
            let output_path = target_path(root, entry)?;
            self.extract_entry(entry, &output_path).await?;
            written += 1;
        }

        tracing::info!(files = written, root = %root.display(), "extracted archive");
        Ok(written)
    }

    /// Extract file to stdout
    pub async fn extract_to_stdout(&self, entry: &FileEntry) -> Result<()> {
        let data = self.read(entry)?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(data).await?;
        stdout.flush().await?;

        Ok(())
    }
}

/// Join an entry's logical path onto `root`, refusing components that could
/// leave `root`.
pub fn target_path(root: &Path, entry: &FileEntry) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    for component in entry.relative_path().split('/') {
        let unsafe_component = matches!(component, "" | "." | "..")
            || component.contains(['\\', '\0'])
            || Path::new(component).is_absolute();
        if unsafe_component {
            return Err(Error::UnsafePath(entry.path.clone()));
        }
        path.push(component);
    }
    Ok(path)
}
