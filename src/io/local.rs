use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Read an entire archive into memory.
pub async fn read_archive(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path).await?)
}

/// Write `data` to `path`, creating parent directories and replacing any
/// existing file.
pub async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    // create_dir_all succeeds when the directory already exists, including
    // when another writer created it first.
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;

    Ok(())
}
