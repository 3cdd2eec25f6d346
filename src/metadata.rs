//! Metadata queries
//!
//! Thin summaries of `compio::fs` metadata, shaped for service callers that
//! want kind/size/mtime without the full platform surface.

use std::path::Path;
use std::time::SystemTime;

use compio::fs;

use crate::error::{translate_io_error, Result};

/// What kind of filesystem item a path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (only visible with `follow = false`)
    Symlink,
    /// Anything else (device, socket, fifo, ...)
    Other,
}

/// Metadata summary for a filesystem item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemMetadata {
    /// Item kind
    pub kind: ItemKind,
    /// Size in bytes (target size when symlinks are followed)
    pub len: u64,
    /// Last modification time, where the platform reports one
    pub modified: Option<SystemTime>,
}

/// Query metadata for `path`
///
/// With `follow = false` the query uses `symlink_metadata`, so a symlink
/// reports itself rather than its target.
///
/// # Errors
///
/// Returns an error if the path does not exist or the query fails.
pub async fn metadata_at_path(path: &Path, follow: bool) -> Result<ItemMetadata> {
    let raw = if follow {
        fs::metadata(path).await
    } else {
        fs::symlink_metadata(path).await
    }
    .map_err(|e| translate_io_error("stat", path, &e))?;

    let kind = if raw.is_dir() {
        ItemKind::Directory
    } else if raw.is_file() {
        ItemKind::File
    } else if raw.is_symlink() {
        ItemKind::Symlink
    } else {
        ItemKind::Other
    };

    Ok(ItemMetadata {
        kind,
        len: raw.len(),
        modified: raw.modified().ok(),
    })
}

/// Whether `path` exists
///
/// Missing paths are `Ok(false)`; any other failure (permission, I/O) is an
/// error, so absence is never conflated with inaccessibility.
///
/// # Errors
///
/// Returns an error if existence cannot be determined.
pub async fn exists_at_path(path: &Path, follow: bool) -> Result<bool> {
    let raw = if follow {
        fs::metadata(path).await
    } else {
        fs::symlink_metadata(path).await
    };
    match raw {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(translate_io_error("stat", path, &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    #[compio::test]
    async fn file_metadata_reports_kind_and_len() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("f.txt");
        std_fs::write(&path, b"12345")?;

        let meta = metadata_at_path(&path, true).await?;
        assert_eq!(meta.kind, ItemKind::File);
        assert_eq!(meta.len, 5);
        Ok(())
    }

    #[compio::test]
    async fn directory_metadata_reports_kind() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let meta = metadata_at_path(temp_dir.path(), true).await?;
        assert_eq!(meta.kind, ItemKind::Directory);
        Ok(())
    }

    #[cfg(unix)]
    #[compio::test]
    async fn nofollow_sees_the_symlink_itself() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        std_fs::write(&target, b"x")?;
        std::os::unix::fs::symlink(&target, &link)?;

        let followed = metadata_at_path(&link, true).await?;
        assert_eq!(followed.kind, ItemKind::File);

        let unfollowed = metadata_at_path(&link, false).await?;
        assert_eq!(unfollowed.kind, ItemKind::Symlink);
        Ok(())
    }

    #[compio::test]
    async fn exists_distinguishes_absence() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(exists_at_path(temp_dir.path(), true).await?);
        assert!(!exists_at_path(&temp_dir.path().join("absent"), true).await?);
        Ok(())
    }
}
