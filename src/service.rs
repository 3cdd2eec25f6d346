//! The filesystem service object
//!
//! Every operation follows one shape: validate the input path (resolving it
//! against the boundary when one is configured), call the OS primitive,
//! translate the error, log, and return. The service holds nothing but its
//! validated configuration, so it is cheap to clone and safe to share;
//! operations are independent and carry no state between calls.

use std::future::Future;
use std::path::PathBuf;

use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{boundary_error, translate_io_error, Result};
use crate::metadata::{self, ItemMetadata};
use crate::path::{escapes_upward, normalize_path, FilePath};
use crate::stream::{self, FileReadStream, FileWriteStream};
use crate::temp;
#[cfg(unix)]
use crate::xattr;

/// Asynchronous service layer over operating-system file APIs
///
/// Construct one with [`FileSystemService::standard`] for unrestricted
/// operation, [`FileSystemService::bounded`] to confine all paths under a
/// root, or [`FileSystemService::new`] with a custom [`ServiceConfig`].
///
/// # Example
///
/// ```rust,no_run
/// use compio_fs_service::{FilePath, FileSystemService};
///
/// # async fn example() -> compio_fs_service::Result<()> {
/// let service = FileSystemService::standard();
/// let path = FilePath::new("/var/data/report.txt")?;
/// let content = service.read_file(&path).await?;
/// println!("{} bytes", content.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemService {
    config: ServiceConfig,
}

impl FileSystemService {
    /// Create a service from a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a service with default configuration
    #[must_use]
    pub fn standard() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    /// Create a service whose paths are confined under `root`
    ///
    /// Absolute paths outside `root` and relative paths that escape upward
    /// are rejected; relative paths are resolved against `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not an absolute path.
    pub fn bounded(root: impl Into<PathBuf>) -> Result<Self> {
        let config = ServiceConfig {
            boundary: Some(root.into()),
            ..ServiceConfig::default()
        };
        Self::new(config)
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Resolve a path for OS use: normalise, then enforce the boundary
    fn resolve(&self, path: &FilePath) -> Result<PathBuf> {
        let normalized = normalize_path(path.as_path());
        let Some(root) = &self.config.boundary else {
            return Ok(normalized);
        };

        let root = normalize_path(root);
        if normalized.is_absolute() {
            if normalized.starts_with(&root) {
                Ok(normalized)
            } else {
                Err(boundary_error(&format!(
                    "{} is outside {}",
                    normalized.display(),
                    root.display()
                )))
            }
        } else if escapes_upward(&normalized) {
            Err(boundary_error(&format!(
                "{} escapes upward out of {}",
                normalized.display(),
                root.display()
            )))
        } else {
            Ok(root.join(normalized))
        }
    }

    // ------------------------------------------------------------------
    // Path operations (pure pass-throughs to the value object)
    // ------------------------------------------------------------------

    /// Lexically normalise a path
    #[must_use]
    pub fn normalize_path(&self, path: &FilePath) -> FilePath {
        path.normalize()
    }

    /// Join a relative segment onto a path
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is empty, absolute, or contains NUL.
    pub fn join_path(&self, base: &FilePath, segment: &str) -> Result<FilePath> {
        base.join(segment)
    }

    /// Split a path into parent directory and final component name
    #[must_use]
    pub fn split_path(&self, path: &FilePath) -> (Option<FilePath>, Option<String>) {
        path.split()
    }

    // ------------------------------------------------------------------
    // Extended attributes
    // ------------------------------------------------------------------

    /// Get an extended attribute value
    ///
    /// # Errors
    ///
    /// Returns an error if the path fails resolution or the OS call fails.
    #[cfg(unix)]
    pub async fn get_xattr(&self, path: &FilePath, name: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        debug!("get_xattr {name} on {}", target.display());
        xattr::get_xattr_at_path(&target, name, path.security().follow_symlinks).await
    }

    /// Set an extended attribute value
    ///
    /// # Errors
    ///
    /// Returns an error if the path fails resolution or the OS call fails.
    #[cfg(unix)]
    pub async fn set_xattr(&self, path: &FilePath, name: &str, value: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        debug!(
            "set_xattr {name} ({} bytes) on {}",
            value.len(),
            target.display()
        );
        xattr::set_xattr_at_path(&target, name, value, path.security().follow_symlinks).await
    }

    /// List extended attribute names
    ///
    /// # Errors
    ///
    /// Returns an error if the path fails resolution or the OS call fails.
    #[cfg(unix)]
    pub async fn list_xattr(&self, path: &FilePath) -> Result<Vec<String>> {
        let target = self.resolve(path)?;
        debug!("list_xattr on {}", target.display());
        xattr::list_xattr_at_path(&target, path.security().follow_symlinks).await
    }

    /// Remove an extended attribute
    ///
    /// # Errors
    ///
    /// Returns an error if the path fails resolution or the OS call fails.
    #[cfg(unix)]
    pub async fn remove_xattr(&self, path: &FilePath, name: &str) -> Result<()> {
        let target = self.resolve(path)?;
        debug!("remove_xattr {name} on {}", target.display());
        xattr::remove_xattr_at_path(&target, name, path.security().follow_symlinks).await
    }

    // ------------------------------------------------------------------
    // Temporary resources
    //
    // Temporary paths live under the configured temp root, which is
    // service-owned and deliberately not subject to the boundary.
    // ------------------------------------------------------------------

    /// Create a uniquely named temporary file
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn create_temporary_file(&self, extension: Option<&str>) -> Result<FilePath> {
        temp::create_temp_file(
            &self.config.effective_temp_root(),
            &self.config.temp_prefix,
            extension,
        )
        .await
    }

    /// Create a uniquely named temporary directory
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn create_temporary_directory(&self) -> Result<FilePath> {
        temp::create_temp_dir(
            &self.config.effective_temp_root(),
            &self.config.temp_prefix,
        )
        .await
    }

    /// Remove a temporary resource created by this service
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    pub async fn remove_temporary(&self, path: &FilePath) -> Result<()> {
        temp::remove_temp(path).await
    }

    /// Run `op` with a fresh temporary file, removing it afterwards
    ///
    /// Cleanup is guaranteed on success and failure; see the module
    /// documentation of [`crate::temp`] for the full contract.
    ///
    /// # Errors
    ///
    /// Returns `op`'s error, or a cleanup error when `op` succeeded but the
    /// file could not be removed.
    pub async fn with_temporary_file<F, Fut, T>(&self, extension: Option<&str>, op: F) -> Result<T>
    where
        F: FnOnce(FilePath) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        temp::with_temp_file(
            &self.config.effective_temp_root(),
            &self.config.temp_prefix,
            extension,
            op,
        )
        .await
    }

    /// Run `op` with a fresh temporary directory, removing it afterwards
    ///
    /// # Errors
    ///
    /// Returns `op`'s error, or a cleanup error when `op` succeeded but the
    /// directory could not be removed.
    pub async fn with_temporary_directory<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(FilePath) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        temp::with_temp_dir(
            &self.config.effective_temp_root(),
            &self.config.temp_prefix,
            op,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Chunked streaming
    // ------------------------------------------------------------------

    /// Open a chunked read stream over a file
    ///
    /// # Errors
    ///
    /// Returns an error if the path fails resolution or the file cannot be
    /// opened.
    pub async fn open_read_stream(&self, path: &FilePath) -> Result<FileReadStream> {
        let target = self.resolve(path)?;
        FileReadStream::open(&target, self.config.chunk_size).await
    }

    /// Open a chunked write stream, creating or truncating the file
    ///
    /// # Errors
    ///
    /// Returns an error if the path fails resolution or the file cannot be
    /// created.
    pub async fn open_write_stream(&self, path: &FilePath) -> Result<FileWriteStream> {
        let target = self.resolve(path)?;
        FileWriteStream::create(&target, self.config.sync_on_write).await
    }

    /// Drive `sink` with each chunk of the file in order
    ///
    /// Returns the total bytes delivered. The sink's failure aborts the
    /// stream and is propagated.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the sink returns one.
    pub async fn read_file_chunked<F, Fut>(&self, path: &FilePath, mut sink: F) -> Result<u64>
    where
        F: FnMut(Vec<u8>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut reader = self.open_read_stream(path).await?;
        while let Some(chunk) = reader.next_chunk().await? {
            sink(chunk).await?;
        }
        Ok(reader.bytes_read())
    }

    /// Copy a file through a chunked stream pair
    ///
    /// Returns the bytes copied.
    ///
    /// # Errors
    ///
    /// Returns an error if either side fails.
    pub async fn copy_file(&self, src: &FilePath, dst: &FilePath) -> Result<u64> {
        let from = self.resolve(src)?;
        let to = self.resolve(dst)?;
        debug!("copy {} -> {}", from.display(), to.display());
        stream::copy_file_streaming(&from, &to, self.config.chunk_size, self.config.sync_on_write)
            .await
    }

    // ------------------------------------------------------------------
    // File management pass-throughs
    // ------------------------------------------------------------------

    /// Whether the path exists
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    pub async fn exists(&self, path: &FilePath) -> Result<bool> {
        let target = self.resolve(path)?;
        metadata::exists_at_path(&target, path.security().follow_symlinks).await
    }

    /// Metadata summary for the path
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or the query fails.
    pub async fn metadata(&self, path: &FilePath) -> Result<ItemMetadata> {
        let target = self.resolve(path)?;
        metadata::metadata_at_path(&target, path.security().follow_symlinks).await
    }

    /// Read an entire file
    ///
    /// Bounded-memory callers should prefer [`FileSystemService::open_read_stream`];
    /// this convenience accumulates the whole file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub async fn read_file(&self, path: &FilePath) -> Result<Vec<u8>> {
        let mut reader = self.open_read_stream(path).await?;
        let mut content = Vec::with_capacity(usize::try_from(reader.file_size()).unwrap_or(0));
        while let Some(chunk) = reader.next_chunk().await? {
            content.extend_from_slice(&chunk);
        }
        Ok(content)
    }

    /// Write an entire file, creating or truncating it
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub async fn write_file(&self, path: &FilePath, content: Vec<u8>) -> Result<u64> {
        let mut writer = self.open_write_stream(path).await?;
        if !content.is_empty() {
            writer.write_chunk(content).await?;
        }
        writer.finish().await
    }

    /// Create a directory
    ///
    /// With `recursive` set, missing parents are created too and an already
    /// existing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn create_directory(&self, path: &FilePath, recursive: bool) -> Result<()> {
        let target = self.resolve(path)?;
        debug!("create_directory {} (recursive={recursive})", target.display());
        if recursive {
            compio::fs::create_dir_all(&target)
                .await
                .map_err(|e| translate_io_error("create_dir_all", &target, &e))
        } else {
            compio::fs::create_dir(&target)
                .await
                .map_err(|e| translate_io_error("create_dir", &target, &e))
        }
    }

    /// Remove a file
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    pub async fn remove_file(&self, path: &FilePath) -> Result<()> {
        let target = self.resolve(path)?;
        debug!("remove_file {}", target.display());
        compio::fs::remove_file(&target)
            .await
            .map_err(|e| translate_io_error("remove_file", &target, &e))
    }

    /// Remove a directory
    ///
    /// Non-recursive removal requires the directory to be empty.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    pub async fn remove_directory(&self, path: &FilePath, recursive: bool) -> Result<()> {
        let target = self.resolve(path)?;
        debug!("remove_directory {} (recursive={recursive})", target.display());
        if recursive {
            let owned = target.clone();
            compio::runtime::spawn(async move { std::fs::remove_dir_all(&owned) })
                .await
                .map_err(|e| {
                    crate::error::io_error(&format!("spawn failed: {e:?}"))
                })?
                .map_err(|e| translate_io_error("remove_dir_all", &target, &e))
        } else {
            compio::fs::remove_dir(&target)
                .await
                .map_err(|e| translate_io_error("remove_dir", &target, &e))
        }
    }

    /// Move (rename) an item
    ///
    /// Renames within a filesystem; across filesystems (`EXDEV`) files fall
    /// back to copy-then-remove.
    ///
    /// # Errors
    ///
    /// Returns an error if both the rename and the fallback fail, or the
    /// fallback is attempted on a directory.
    pub async fn move_item(&self, src: &FilePath, dst: &FilePath) -> Result<()> {
        let from = self.resolve(src)?;
        let to = self.resolve(dst)?;
        debug!("move {} -> {}", from.display(), to.display());

        let (f, t) = (from.clone(), to.clone());
        let renamed = compio::runtime::spawn(async move { std::fs::rename(&f, &t) })
            .await
            .map_err(|e| crate::error::io_error(&format!("spawn failed: {e:?}")))?;

        match renamed {
            Ok(()) => Ok(()),
            Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
                if src.is_directory() {
                    return Err(crate::error::io_error(&format!(
                        "cannot move directory {} across filesystems",
                        from.display()
                    )));
                }
                debug!(
                    "rename crossed filesystems, falling back to copy for {}",
                    from.display()
                );
                stream::copy_file_streaming(
                    &from,
                    &to,
                    self.config.chunk_size,
                    self.config.sync_on_write,
                )
                .await?;
                compio::fs::remove_file(&from)
                    .await
                    .map_err(|e| translate_io_error("remove after copy", &from, &e))
            }
            Err(e) => Err(translate_io_error("rename", &from, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_rejects_relative_root() {
        assert!(FileSystemService::bounded("not/absolute").is_err());
    }

    #[test]
    fn resolve_passes_paths_through_without_boundary() {
        let service = FileSystemService::standard();
        let path = FilePath::new("/a/b/../c").unwrap();
        assert_eq!(service.resolve(&path).unwrap(), PathBuf::from("/a/c"));
    }

    #[test]
    fn resolve_anchors_relative_paths_at_the_boundary() {
        let service = FileSystemService::bounded("/srv/jail").unwrap();
        let path = FilePath::new("sub/file.txt").unwrap();
        assert_eq!(
            service.resolve(&path).unwrap(),
            PathBuf::from("/srv/jail/sub/file.txt")
        );
    }

    #[test]
    fn resolve_accepts_absolute_paths_inside_the_boundary() {
        let service = FileSystemService::bounded("/srv/jail").unwrap();
        let path = FilePath::new("/srv/jail/x").unwrap();
        assert_eq!(service.resolve(&path).unwrap(), PathBuf::from("/srv/jail/x"));
    }

    #[test]
    fn resolve_rejects_absolute_paths_outside_the_boundary() {
        let service = FileSystemService::bounded("/srv/jail").unwrap();
        let path = FilePath::new("/etc/passwd").unwrap();
        assert!(service.resolve(&path).is_err());
    }

    #[test]
    fn resolve_rejects_upward_escapes() {
        let service = FileSystemService::bounded("/srv/jail").unwrap();
        let path = FilePath::new("sub/../../outside").unwrap();
        assert!(service.resolve(&path).is_err());
    }

    #[test]
    fn resolve_rejects_dotdot_prefix_tricks() {
        let service = FileSystemService::bounded("/srv/jail").unwrap();
        // Normalises to /srv/jail-evil which merely shares a string prefix
        let path = FilePath::new("/srv/jail-evil/x").unwrap();
        assert!(service.resolve(&path).is_err());
    }
}
