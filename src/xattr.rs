//! Extended attribute (xattr) pass-through operations
//!
//! # Platform Differences
//!
//! Extended attribute APIs differ between Linux and macOS:
//!
//! ## Linux:
//! - `getxattr(path, name, value, size)` with an `l*` family
//!   (`lgetxattr`, ...) that operates on symlinks themselves
//!
//! ## macOS (BSD API):
//! - `getxattr(path, name, value, size, position, options)` where
//!   `position` offsets reads/writes of large attributes (always 0 here)
//!   and `options` carries flags such as `XATTR_NOFOLLOW`
//!
//! Both shapes are reduced to one API: every operation takes a `follow`
//! flag, mapped to the `l*` variant on Linux and to `XATTR_NOFOLLOW` on
//! macOS. Values are fetched with the usual two-call pattern: query the
//! size with a null buffer, then fetch into a buffer of that size.
//!
//! # Namespaces
//!
//! Attribute names conventionally carry a namespace prefix: `user.*` for
//! application metadata, `system.*`, `security.*`, and `trusted.*` for
//! privileged uses. The service passes names through unchanged; namespace
//! policy is the kernel's business, not ours.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::{xattr_error, Result, ServiceError};

// macOS flag for operating on symlinks instead of their targets
#[cfg(target_os = "macos")]
const XATTR_NOFOLLOW: libc::c_int = 0x0001;

fn path_cstring(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|e| xattr_error(&format!("invalid path {}: {e}", path.display())))
}

fn name_cstring(name: &str) -> Result<CString> {
    if name.is_empty() {
        return Err(xattr_error("attribute name is empty"));
    }
    CString::new(name).map_err(|e| xattr_error(&format!("invalid attribute name {name:?}: {e}")))
}

fn syscall_failed(call: &str, path: &Path, errno: &std::io::Error) -> ServiceError {
    if errno.raw_os_error() == Some(libc::ENOENT) {
        ServiceError::NotFound(path.display().to_string())
    } else {
        xattr_error(&format!("{call} failed for {}: {errno}", path.display()))
    }
}

/// Get an extended attribute value at the given path
///
/// Uses the two-call pattern: query the size first, then fetch the value
/// into a correctly sized buffer. A zero-size attribute yields an empty
/// vector.
///
/// # Arguments
///
/// * `path` - Path to the file
/// * `name` - Name of the extended attribute
/// * `follow` - Follow symlinks (false operates on the symlink itself)
///
/// # Errors
///
/// This function will return an error if:
/// - The path does not exist
/// - The extended attribute doesn't exist
/// - Permission is denied
/// - The operation fails due to I/O errors
pub async fn get_xattr_at_path(path: &Path, name: &str, follow: bool) -> Result<Vec<u8>> {
    let path_cstr = path_cstring(path)?;
    let name_cstr = name_cstring(name)?;

    let size = unsafe { getxattr_raw(&path_cstr, &name_cstr, std::ptr::null_mut(), 0, follow) };
    if size < 0 {
        return Err(syscall_failed(
            "getxattr",
            path,
            &std::io::Error::last_os_error(),
        ));
    }
    if size == 0 {
        return Ok(Vec::new());
    }

    let mut buffer = vec![0u8; size as usize];
    let actual = unsafe {
        getxattr_raw(
            &path_cstr,
            &name_cstr,
            buffer.as_mut_ptr().cast::<libc::c_void>(),
            buffer.len(),
            follow,
        )
    };
    if actual < 0 {
        return Err(syscall_failed(
            "getxattr",
            path,
            &std::io::Error::last_os_error(),
        ));
    }

    buffer.truncate(actual as usize);
    Ok(buffer)
}

/// Set an extended attribute value at the given path
///
/// # Arguments
///
/// * `path` - Path to the file
/// * `name` - Name of the extended attribute
/// * `value` - Value to set (may be empty)
/// * `follow` - Follow symlinks (false operates on the symlink itself)
///
/// # Errors
///
/// This function will return an error if:
/// - The path does not exist
/// - Permission is denied
/// - The operation fails due to I/O errors
pub async fn set_xattr_at_path(path: &Path, name: &str, value: &[u8], follow: bool) -> Result<()> {
    let path_cstr = path_cstring(path)?;
    let name_cstr = name_cstring(name)?;

    let result = unsafe {
        #[cfg(target_os = "macos")]
        {
            libc::setxattr(
                path_cstr.as_ptr(),
                name_cstr.as_ptr(),
                value.as_ptr().cast::<libc::c_void>(),
                value.len(),
                0, // position
                if follow { 0 } else { XATTR_NOFOLLOW },
            )
        }
        #[cfg(not(target_os = "macos"))]
        {
            if follow {
                libc::setxattr(
                    path_cstr.as_ptr(),
                    name_cstr.as_ptr(),
                    value.as_ptr().cast::<libc::c_void>(),
                    value.len(),
                    0, // flags
                )
            } else {
                libc::lsetxattr(
                    path_cstr.as_ptr(),
                    name_cstr.as_ptr(),
                    value.as_ptr().cast::<libc::c_void>(),
                    value.len(),
                    0, // flags
                )
            }
        }
    };

    if result != 0 {
        return Err(syscall_failed(
            "setxattr",
            path,
            &std::io::Error::last_os_error(),
        ));
    }
    Ok(())
}

/// List all extended attribute names at the given path
///
/// The kernel returns a NUL-separated name buffer; names that are not valid
/// UTF-8 are skipped.
///
/// # Arguments
///
/// * `path` - Path to the file
/// * `follow` - Follow symlinks (false operates on the symlink itself)
///
/// # Errors
///
/// This function will return an error if:
/// - The path does not exist
/// - Permission is denied
/// - The operation fails due to I/O errors
pub async fn list_xattr_at_path(path: &Path, follow: bool) -> Result<Vec<String>> {
    let path_cstr = path_cstring(path)?;

    let size = unsafe { listxattr_raw(&path_cstr, std::ptr::null_mut(), 0, follow) };
    if size < 0 {
        return Err(syscall_failed(
            "listxattr",
            path,
            &std::io::Error::last_os_error(),
        ));
    }
    if size == 0 {
        return Ok(Vec::new());
    }

    let mut buffer = vec![0u8; size as usize];
    let actual = unsafe {
        listxattr_raw(
            &path_cstr,
            buffer.as_mut_ptr().cast::<libc::c_char>(),
            buffer.len(),
            follow,
        )
    };
    if actual < 0 {
        return Err(syscall_failed(
            "listxattr",
            path,
            &std::io::Error::last_os_error(),
        ));
    }

    let names = buffer[..actual as usize]
        .split(|&b| b == 0)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| std::str::from_utf8(segment).ok())
        .map(str::to_string)
        .collect();
    Ok(names)
}

/// Remove an extended attribute at the given path
///
/// # Arguments
///
/// * `path` - Path to the file
/// * `name` - Name of the extended attribute to remove
/// * `follow` - Follow symlinks (false operates on the symlink itself)
///
/// # Errors
///
/// This function will return an error if:
/// - The path does not exist
/// - The extended attribute doesn't exist
/// - Permission is denied
/// - The operation fails due to I/O errors
pub async fn remove_xattr_at_path(path: &Path, name: &str, follow: bool) -> Result<()> {
    let path_cstr = path_cstring(path)?;
    let name_cstr = name_cstring(name)?;

    let result = unsafe {
        #[cfg(target_os = "macos")]
        {
            libc::removexattr(
                path_cstr.as_ptr(),
                name_cstr.as_ptr(),
                if follow { 0 } else { XATTR_NOFOLLOW },
            )
        }
        #[cfg(not(target_os = "macos"))]
        {
            if follow {
                libc::removexattr(path_cstr.as_ptr(), name_cstr.as_ptr())
            } else {
                libc::lremovexattr(path_cstr.as_ptr(), name_cstr.as_ptr())
            }
        }
    };

    if result != 0 {
        return Err(syscall_failed(
            "removexattr",
            path,
            &std::io::Error::last_os_error(),
        ));
    }
    Ok(())
}

unsafe fn getxattr_raw(
    path: &CString,
    name: &CString,
    buf: *mut libc::c_void,
    len: usize,
    follow: bool,
) -> libc::ssize_t {
    #[cfg(target_os = "macos")]
    {
        libc::getxattr(
            path.as_ptr(),
            name.as_ptr(),
            buf,
            len,
            0, // position: offset into the value (always from the start)
            if follow { 0 } else { XATTR_NOFOLLOW },
        )
    }
    #[cfg(not(target_os = "macos"))]
    {
        if follow {
            libc::getxattr(path.as_ptr(), name.as_ptr(), buf, len)
        } else {
            libc::lgetxattr(path.as_ptr(), name.as_ptr(), buf, len)
        }
    }
}

unsafe fn listxattr_raw(
    path: &CString,
    buf: *mut libc::c_char,
    len: usize,
    follow: bool,
) -> libc::ssize_t {
    #[cfg(target_os = "macos")]
    {
        libc::listxattr(
            path.as_ptr(),
            buf,
            len,
            if follow { 0 } else { XATTR_NOFOLLOW },
        )
    }
    #[cfg(not(target_os = "macos"))]
    {
        if follow {
            libc::listxattr(path.as_ptr(), buf, len)
        } else {
            libc::llistxattr(path.as_ptr(), buf, len)
        }
    }
}
