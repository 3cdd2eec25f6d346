//! Path value object and lexical path operations
//!
//! Everything in this module is pure string/component work: normalisation,
//! joining, and splitting never touch the filesystem. Validation happens at
//! construction so that a [`FilePath`] handed to an OS-facing operation is
//! already known to be non-empty and free of interior NUL bytes (the raw
//! bytes eventually cross into C APIs).

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{invalid_path_error, Result};

/// Security options attached to a [`FilePath`]
///
/// These control how the path is handed to the OS, not what the path points
/// at. `follow_symlinks` selects between the follow and no-follow syscall
/// variants for metadata and extended-attribute operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityOptions {
    /// Follow symlinks when the path reaches the OS (default: true)
    pub follow_symlinks: bool,
}

impl Default for SecurityOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
        }
    }
}

impl SecurityOptions {
    /// Options that operate on symlinks themselves instead of their targets
    #[must_use]
    pub const fn nofollow() -> Self {
        Self {
            follow_symlinks: false,
        }
    }
}

/// A validated path value
///
/// Carries the raw path, a flag recording whether the path denotes a
/// directory, and the [`SecurityOptions`] that OS-facing operations consult.
/// The directory flag is authoritative; trailing separators in the raw
/// string are not significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePath {
    path: PathBuf,
    is_directory: bool,
    security: SecurityOptions,
}

impl FilePath {
    /// Create a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or contains an interior NUL
    /// byte.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        validate_os_path(&path)?;
        Ok(Self {
            path,
            is_directory: false,
            security: SecurityOptions::default(),
        })
    }

    /// Create a directory path
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or contains an interior NUL
    /// byte.
    pub fn directory(path: impl Into<PathBuf>) -> Result<Self> {
        let mut fp = Self::new(path)?;
        fp.is_directory = true;
        Ok(fp)
    }

    /// Replace the security options, consuming and returning the path
    #[must_use]
    pub fn with_security(mut self, security: SecurityOptions) -> Self {
        self.security = security;
        self
    }

    /// The underlying path
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Whether this path denotes a directory
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// The security options for this path
    #[must_use]
    pub const fn security(&self) -> SecurityOptions {
        self.security
    }

    /// Lexically normalise the path
    ///
    /// Collapses `.` components and resolves `..` against preceding literal
    /// components. The root is its own parent, so `..` directly under the
    /// root is dropped; on a relative path a leading `..` is preserved
    /// because there is nothing to resolve it against. A relative path that
    /// normalises to nothing becomes `.`.
    ///
    /// Purely lexical: symlinks are not consulted, so `a/link/../b` and
    /// `a/b` normalise identically even when `link` points elsewhere.
    #[must_use]
    pub fn normalize(&self) -> Self {
        Self {
            path: normalize_path(&self.path),
            is_directory: self.is_directory,
            security: self.security,
        }
    }

    /// Append a relative segment
    ///
    /// The receiver is treated as a directory regardless of its flag; the
    /// result is flagged as a file (use [`FilePath::directory`] semantics via
    /// [`FilePath::join_directory`] when the child is a directory).
    ///
    /// # Errors
    ///
    /// Returns an error if the segment is empty, absolute, or contains an
    /// interior NUL byte.
    pub fn join(&self, segment: impl AsRef<Path>) -> Result<Self> {
        let joined = self.join_inner(segment.as_ref())?;
        Ok(Self {
            path: joined,
            is_directory: false,
            security: self.security,
        })
    }

    /// Append a relative segment, flagging the result as a directory
    ///
    /// # Errors
    ///
    /// Same validation as [`FilePath::join`].
    pub fn join_directory(&self, segment: impl AsRef<Path>) -> Result<Self> {
        let joined = self.join_inner(segment.as_ref())?;
        Ok(Self {
            path: joined,
            is_directory: true,
            security: self.security,
        })
    }

    fn join_inner(&self, segment: &Path) -> Result<PathBuf> {
        validate_os_path(segment)?;
        if segment.is_absolute() {
            return Err(invalid_path_error(&format!(
                "cannot join absolute segment {} onto {}",
                segment.display(),
                self.path.display()
            )));
        }
        Ok(self.path.join(segment))
    }

    /// Split into parent directory and final component name
    ///
    /// The parent keeps this path's security options and is flagged as a
    /// directory. Either side can be absent: the root has no parent and no
    /// name, `"file"` has a name but no parent.
    #[must_use]
    pub fn split(&self) -> (Option<Self>, Option<String>) {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| Self {
                path: p.to_path_buf(),
                is_directory: true,
                security: self.security,
            });
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        (parent, name)
    }

    /// The normalised component list
    ///
    /// Root and prefix components are omitted; only named components (and
    /// any unresolvable leading `..`) appear.
    #[must_use]
    pub fn components(&self) -> Vec<String> {
        normalize_path(&self.path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect()
    }

    /// Final component name, if it is valid UTF-8
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Extension of the final component, if any
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl AsRef<Path> for FilePath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Validate raw path input: non-empty, no interior NUL bytes
pub(crate) fn validate_os_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(invalid_path_error("path is empty"));
    }
    if path.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(invalid_path_error(&format!(
            "path contains an interior NUL byte: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Lexical normalisation over `std::path::Component`
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // The root is its own parent
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    let mut normalized = PathBuf::new();
    for component in out {
        normalized.push(component.as_os_str());
    }
    normalized
}

/// True if the normalised relative path begins by escaping upward
pub(crate) fn escapes_upward(path: &Path) -> bool {
    matches!(
        normalize_path(path).components().next(),
        Some(Component::ParentDir)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_path() {
        assert!(FilePath::new("").is_err());
    }

    #[test]
    fn rejects_interior_nul() {
        assert!(FilePath::new("a\0b").is_err());
    }

    #[test]
    fn normalize_collapses_dot_components() {
        let p = FilePath::new("/a/./b/./c").unwrap();
        assert_eq!(p.normalize().as_path(), Path::new("/a/b/c"));
    }

    #[test]
    fn normalize_resolves_parent_components() {
        let p = FilePath::new("/a/b/../c").unwrap();
        assert_eq!(p.normalize().as_path(), Path::new("/a/c"));
    }

    #[test]
    fn normalize_root_is_its_own_parent() {
        let p = FilePath::new("/../a").unwrap();
        assert_eq!(p.normalize().as_path(), Path::new("/a"));
    }

    #[test]
    fn normalize_keeps_leading_parent_on_relative_path() {
        let p = FilePath::new("../a/b").unwrap();
        assert_eq!(p.normalize().as_path(), Path::new("../a/b"));
    }

    #[test]
    fn normalize_of_self_cancelling_path_is_dot() {
        let p = FilePath::new("a/..").unwrap();
        assert_eq!(p.normalize().as_path(), Path::new("."));
    }

    #[test]
    fn join_appends_relative_segment() {
        let dir = FilePath::directory("/srv/data").unwrap();
        let child = dir.join("reports/summary.txt").unwrap();
        assert_eq!(child.as_path(), Path::new("/srv/data/reports/summary.txt"));
        assert!(!child.is_directory());
    }

    #[test]
    fn join_rejects_absolute_segment() {
        let dir = FilePath::directory("/srv/data").unwrap();
        assert!(dir.join("/etc/passwd").is_err());
    }

    #[test]
    fn join_directory_flags_result() {
        let dir = FilePath::directory("/srv").unwrap();
        assert!(dir.join_directory("data").unwrap().is_directory());
    }

    #[test]
    fn join_preserves_security_options() {
        let dir = FilePath::directory("/srv")
            .unwrap()
            .with_security(SecurityOptions::nofollow());
        let child = dir.join("link").unwrap();
        assert!(!child.security().follow_symlinks);
    }

    #[test]
    fn split_returns_parent_and_name() {
        let p = FilePath::new("/a/b/c.txt").unwrap();
        let (parent, name) = p.split();
        let parent = parent.unwrap();
        assert_eq!(parent.as_path(), Path::new("/a/b"));
        assert!(parent.is_directory());
        assert_eq!(name.as_deref(), Some("c.txt"));
    }

    #[test]
    fn split_of_root_has_no_parent_or_name() {
        let p = FilePath::directory("/").unwrap();
        let (parent, name) = p.split();
        assert!(parent.is_none());
        assert!(name.is_none());
    }

    #[test]
    fn split_of_bare_name_has_no_parent() {
        let p = FilePath::new("file.txt").unwrap();
        let (parent, name) = p.split();
        assert!(parent.is_none());
        assert_eq!(name.as_deref(), Some("file.txt"));
    }

    #[test]
    fn components_are_normalised() {
        let p = FilePath::new("/a/./b/../c").unwrap();
        assert_eq!(p.components(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn file_name_and_extension() {
        let p = FilePath::new("/tmp/archive.tar.gz").unwrap();
        assert_eq!(p.file_name(), Some("archive.tar.gz"));
        assert_eq!(p.extension(), Some("gz"));
    }

    #[test]
    fn escapes_upward_detects_leading_parent() {
        assert!(escapes_upward(Path::new("../x")));
        assert!(escapes_upward(Path::new("a/../../x")));
        assert!(!escapes_upward(Path::new("a/../b")));
    }
}
