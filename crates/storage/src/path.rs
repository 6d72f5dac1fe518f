//! Storage path validation.
//!
//! Every path handed to a backend is relative to that backend's root. This
//! module makes sure it stays that way.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalizes a storage path and rejects anything that would leave the
/// storage root.
///
/// `.` components, repeated separators and trailing separators disappear,
/// and `..` is resolved lexically. A path that climbs above the root, that
/// carries a null byte or a platform prefix, or that normalizes to nothing
/// is [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use folio_storage::validate_path;
///
/// assert_eq!(validate_path("catalog.sqlite3").unwrap(), Path::new("catalog.sqlite3"));
/// assert_eq!(validate_path("./db//catalog.sqlite3").unwrap(), Path::new("db/catalog.sqlite3"));
/// assert_eq!(validate_path("old/../db/catalog.sqlite3").unwrap(), Path::new("db/catalog.sqlite3"));
/// assert!(validate_path("../catalog.sqlite3").is_err());
/// assert!(validate_path("db\0.sqlite3").is_err());
/// assert!(validate_path("").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix and then
                // truncate the path once it reaches a syscall.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}
