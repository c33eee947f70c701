//! OS access behind the policy check.
//!
//! The executor never inspects `std::io::Error` kinds itself. Instead the
//! [`FsAccess`] trait hands back an [`FsOutcome`] that already separates the
//! fault kinds the tool contract distinguishes.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;

use crate::error::AccessFault;

/// Tagged result of a filesystem call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOutcome<T> {
    Ok(T),
    NotFound,
    PermissionDenied,
    OtherFault(String),
}

impl<T> FsOutcome<T> {
    /// Classify an I/O error.
    pub fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::OtherFault(err.to_string()),
        }
    }

    pub fn into_result(self) -> Result<T, AccessFault> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::NotFound => Err(AccessFault::NotFound),
            Self::PermissionDenied => Err(AccessFault::PermissionDenied),
            Self::OtherFault(detail) => Err(AccessFault::Io(detail)),
        }
    }
}

impl<T> From<std::io::Result<T>> for FsOutcome<T> {
    fn from(result: std::io::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::from_io(e),
        }
    }
}

/// Filesystem operations the mediated tools need.
#[async_trait]
pub trait FsAccess: Send + Sync {
    /// Read a whole file as UTF-8 text.
    async fn read_to_string(&self, path: &Path) -> FsOutcome<String>;

    /// Entry names of a directory, sorted by name.
    async fn list_dir(&self, path: &Path) -> FsOutcome<Vec<String>>;
}

/// [`FsAccess`] backed by the local filesystem via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FsAccess for LocalFs {
    async fn read_to_string(&self, path: &Path) -> FsOutcome<String> {
        tokio::fs::read_to_string(path).await.into()
    }

    async fn list_dir(&self, path: &Path) -> FsOutcome<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) => return FsOutcome::from_io(e),
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Ok(None) => break,
                Err(e) => return FsOutcome::from_io(e),
            }
        }
        names.sort();
        FsOutcome::Ok(names)
    }
}
