//! Temporary file and directory lifecycle
//!
//! Resources are created with unique names under a configured root and
//! removed either explicitly or by the scoped `with_*` forms, which
//! guarantee cleanup on the success path and the failure path alike. The
//! caller's failure is propagated only after cleanup has run. A drop guard
//! backstops the scoped forms so that a panic or a cancelled future still
//! triggers best-effort removal.

use std::future::Future;
use std::path::{Path, PathBuf};

use compio::fs;
use tracing::{debug, warn};

use crate::error::{temp_error, Result};
use crate::path::FilePath;

/// Attempts at finding a free name before giving up
const CREATE_RETRIES: u32 = 16;

/// Generate a unique resource name: `<prefix><16-hex-random>[.<extension>]`
fn unique_name(prefix: &str, extension: Option<&str>) -> String {
    let token: u64 = rand::random();
    match extension {
        Some(ext) => format!("{prefix}{token:016x}.{ext}"),
        None => format!("{prefix}{token:016x}"),
    }
}

/// Create a uniquely named temporary file under `root`
///
/// The file is created (not merely named) with create-new semantics, so a
/// returned path is guaranteed to be owned by the caller. Name collisions
/// retry with fresh randomness. The root directory is created if missing.
///
/// # Errors
///
/// Returns an error if the root cannot be created, the file cannot be
/// opened, or no free name is found within the retry budget.
pub async fn create_temp_file(
    root: &Path,
    prefix: &str,
    extension: Option<&str>,
) -> Result<FilePath> {
    ensure_root(root).await?;

    for _ in 0..CREATE_RETRIES {
        let candidate = root.join(unique_name(prefix, extension));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => {
                drop(file);
                debug!("created temporary file {}", candidate.display());
                return FilePath::new(candidate);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(temp_error(&format!(
                    "failed to create temporary file {}: {e}",
                    candidate.display()
                )))
            }
        }
    }

    Err(temp_error(&format!(
        "no free temporary file name under {} after {CREATE_RETRIES} attempts",
        root.display()
    )))
}

/// Create a uniquely named temporary directory under `root`
///
/// # Errors
///
/// Returns an error if the root cannot be created, the directory cannot be
/// created, or no free name is found within the retry budget.
pub async fn create_temp_dir(root: &Path, prefix: &str) -> Result<FilePath> {
    ensure_root(root).await?;

    for _ in 0..CREATE_RETRIES {
        let candidate = root.join(unique_name(prefix, None));
        match fs::create_dir(&candidate).await {
            Ok(()) => {
                debug!("created temporary directory {}", candidate.display());
                return FilePath::directory(candidate);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(temp_error(&format!(
                    "failed to create temporary directory {}: {e}",
                    candidate.display()
                )))
            }
        }
    }

    Err(temp_error(&format!(
        "no free temporary directory name under {} after {CREATE_RETRIES} attempts",
        root.display()
    )))
}

/// Remove a temporary resource
///
/// Directory paths are removed recursively; file paths with `remove_file`.
/// The path's directory flag decides which.
///
/// # Errors
///
/// Returns an error if removal fails.
pub async fn remove_temp(path: &FilePath) -> Result<()> {
    if path.is_directory() {
        remove_dir_all(path.as_path()).await
    } else {
        fs::remove_file(path.as_path()).await.map_err(|e| {
            temp_error(&format!(
                "failed to remove temporary file {path}: {e}"
            ))
        })
    }
}

/// Run `op` with a fresh temporary file, removing it afterwards
///
/// Cleanup runs whether `op` succeeds or fails; `op`'s error is propagated
/// unchanged after cleanup. A cleanup failure after a successful `op` is an
/// error; after a failed `op` it is logged and the operation error wins.
///
/// # Errors
///
/// Returns `op`'s error, or a cleanup error when `op` succeeded but the
/// file could not be removed.
pub async fn with_temp_file<F, Fut, T>(
    root: &Path,
    prefix: &str,
    extension: Option<&str>,
    op: F,
) -> Result<T>
where
    F: FnOnce(FilePath) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let path = create_temp_file(root, prefix, extension).await?;
    let mut guard = CleanupGuard::file(path.as_path());

    let outcome = op(path.clone()).await;

    // A file the closure already removed counts as clean
    let cleanup = match fs::remove_file(path.as_path()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(temp_error(&format!(
            "failed to remove temporary file {path}: {e}"
        ))),
    };
    guard.disarm();

    settle(outcome, cleanup, &path)
}

/// Run `op` with a fresh temporary directory, removing it (recursively)
/// afterwards
///
/// Same cleanup contract as [`with_temp_file`].
///
/// # Errors
///
/// Returns `op`'s error, or a cleanup error when `op` succeeded but the
/// directory could not be removed.
pub async fn with_temp_dir<F, Fut, T>(root: &Path, prefix: &str, op: F) -> Result<T>
where
    F: FnOnce(FilePath) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let path = create_temp_dir(root, prefix).await?;
    let mut guard = CleanupGuard::directory(path.as_path());

    let outcome = op(path.clone()).await;

    // A directory the closure already removed counts as clean
    let cleanup = match remove_dir_all_raw(path.as_path()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(temp_error(&format!(
            "failed to remove temporary directory {path}: {e}"
        ))),
    };
    guard.disarm();

    settle(outcome, cleanup, &path)
}

/// Combine the operation outcome with the cleanup outcome
///
/// The operation's error always wins over a cleanup error; the cleanup
/// error is surfaced only when the operation itself succeeded.
fn settle<T>(outcome: Result<T>, cleanup: Result<()>, path: &FilePath) -> Result<T> {
    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(op_err), Ok(())) => Err(op_err),
        (Err(op_err), Err(cleanup_err)) => {
            warn!("cleanup of {path} failed after operation error: {cleanup_err}");
            Err(op_err)
        }
    }
}

async fn ensure_root(root: &Path) -> Result<()> {
    fs::create_dir_all(root).await.map_err(|e| {
        temp_error(&format!(
            "failed to create temporary root {}: {e}",
            root.display()
        ))
    })
}

/// Recursive directory removal
///
/// There is no async counterpart for the full recursive walk, so the
/// blocking call runs on a spawned task.
async fn remove_dir_all_raw(path: &Path) -> std::io::Result<()> {
    let owned = path.to_path_buf();
    compio::runtime::spawn(async move { std::fs::remove_dir_all(&owned) })
        .await
        .map_err(|e| std::io::Error::other(format!("spawn failed: {e:?}")))?
}

async fn remove_dir_all(path: &Path) -> Result<()> {
    remove_dir_all_raw(path).await.map_err(|e| {
        temp_error(&format!(
            "failed to remove temporary directory {}: {e}",
            path.display()
        ))
    })
}

/// Best-effort removal backstop for the scoped forms
///
/// The explicit async cleanup in `with_temp_file`/`with_temp_dir` runs
/// first on both normal paths and disarms the guard; the guard only fires
/// when the closure panicked or the future was dropped mid-flight.
struct CleanupGuard {
    path: PathBuf,
    directory: bool,
    armed: bool,
}

impl CleanupGuard {
    fn file(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            directory: false,
            armed: true,
        }
    }

    fn directory(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            directory: true,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let result = if self.directory {
            std::fs::remove_dir_all(&self.path)
        } else {
            std::fs::remove_file(&self.path)
        };
        if let Err(e) = result {
            warn!(
                "best-effort cleanup of {} failed: {e}",
                self.path.display()
            );
        }
    }
}
