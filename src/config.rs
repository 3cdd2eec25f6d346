//! Service configuration
//!
//! Plain data with a `validate()` gate, consumed by
//! [`FileSystemService`](crate::service::FileSystemService) factories.

use std::path::PathBuf;

use crate::error::{config_error, Result};

/// Default bytes transferred per streaming chunk (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest accepted streaming chunk (4 KiB)
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Largest accepted streaming chunk (64 MiB)
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Default name prefix for temporary resources
pub const DEFAULT_TEMP_PREFIX: &str = "fsvc-";

/// Configuration for a [`FileSystemService`](crate::service::FileSystemService)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bytes per chunk for streaming reads and writes
    pub chunk_size: usize,

    /// Base directory for temporary resources (`None` = the OS temp dir)
    pub temp_root: Option<PathBuf>,

    /// Name prefix for temporary files and directories
    pub temp_prefix: String,

    /// Call `fsync` when a write stream is finished
    pub sync_on_write: bool,

    /// Root all service paths must stay under; escaping it is an error
    pub boundary: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            temp_root: None,
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            sync_on_write: false,
            boundary: None,
        }
    }
}

impl ServiceConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `chunk_size` is outside `MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE`
    /// - `temp_prefix` is empty or contains a path separator or NUL
    /// - `boundary` is set but not absolute
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(config_error(&format!(
                "chunk size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE} bytes, got {}",
                self.chunk_size
            )));
        }

        if self.temp_prefix.is_empty() {
            return Err(config_error("temp prefix must not be empty"));
        }
        if self
            .temp_prefix
            .bytes()
            .any(|b| b == 0 || b == b'/' || b == b'\\')
        {
            return Err(config_error(&format!(
                "temp prefix must not contain separators or NUL, got {:?}",
                self.temp_prefix
            )));
        }

        if let Some(boundary) = &self.boundary {
            if !boundary.is_absolute() {
                return Err(config_error(&format!(
                    "boundary must be an absolute path, got {}",
                    boundary.display()
                )));
            }
        }

        Ok(())
    }

    /// The directory temporary resources are created under
    #[must_use]
    pub fn effective_temp_root(&self) -> PathBuf {
        self.temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
