//! # compio-fs-service
//!
//! An asynchronous service layer over operating-system file APIs, built on
//! the compio runtime:
//!
//! - Extended attribute get/set/list/remove (follow and no-follow variants)
//! - Path normalisation, joining, and splitting on a validated value object
//! - Temporary file/directory lifecycle with guaranteed cleanup, including
//!   scoped `with_*` forms that clean up on success and failure alike
//! - Chunked, memory-bounded streaming reads and writes with an internal
//!   offset accumulator
//! - The usual file-management pass-throughs: existence, metadata,
//!   whole-file read/write, directory create/remove, copy, move
//!
//! Operations validate their input, call the native primitive, translate
//! the error with path context, and log. An optional boundary confines
//! every path the service touches under a single root.
//!
//! ## Example
//!
//! ```rust,no_run
//! use compio_fs_service::{FilePath, FileSystemService};
//!
//! # async fn example() -> compio_fs_service::Result<()> {
//! let service = FileSystemService::standard();
//!
//! // Scoped temporary file: removed whether the closure succeeds or fails
//! let bytes = service
//!     .with_temporary_file(Some("json"), |path| async move {
//!         let service = FileSystemService::standard();
//!         service.write_file(&path, b"{}".to_vec()).await
//!     })
//!     .await?;
//! assert_eq!(bytes, 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod path;
pub mod service;
pub mod stream;
pub mod temp;
#[cfg(unix)]
pub mod xattr;

// Re-export main types
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use metadata::{ItemKind, ItemMetadata};
pub use path::{FilePath, SecurityOptions};
pub use service::FileSystemService;
pub use stream::{FileReadStream, FileWriteStream};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
