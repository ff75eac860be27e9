//! Host storage boundary.
//!
//! The engine needs nothing from the storage layer beyond byte-oriented files
//! and flat directory operations. [`MemVolume`] keeps everything in memory;
//! [`DirVolume`] (`std` feature) maps a host directory.
//!
//! Paths are `/` separated and relative to the volume root. A leading `/` is
//! ignored, so `"/enc/a.cbm"` and `"enc/a.cbm"` name the same file. `.` and
//! `..` components are rejected.

mod mem;
#[cfg(feature = "std")]
mod fs;

pub use mem::{MemFile, MemVolume, VolumeStats};
#[cfg(feature = "std")]
pub use fs::DirVolume;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Errors reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum VolumeError {
    #[error("no such file or directory")]
    NotFound,

    /// Transient or device-level failure. Opens failing this way are retried.
    #[error("{0}")]
    Io(String),

    /// The handle's file was removed underneath it.
    #[error("file handle is stale")]
    Closed,

    #[error("is a directory")]
    IsDirectory,

    /// Path leaves the volume root or names nothing.
    #[error("invalid path: {0:?}")]
    InvalidPath(String),
}

#[cfg(feature = "std")]
impl From<std::io::Error> for VolumeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => VolumeError::NotFound,
            std::io::ErrorKind::IsADirectory => VolumeError::IsDirectory,
            _ => VolumeError::Io(err.to_string()),
        }
    }
}

/// How a file is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, cursor at offset 0.
    Read,
    /// Created when missing; every write lands at the end of the file.
    Append,
}

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// An open file on a [`Volume`].
pub trait VolumeFile {
    /// Read up to `buf.len()` bytes; `Ok(0)` at end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VolumeError>;
    fn write(&mut self, data: &[u8]) -> Result<usize, VolumeError>;
    fn seek(&mut self, pos: u64) -> Result<(), VolumeError>;
    fn position(&mut self) -> Result<u64, VolumeError>;
    fn size(&mut self) -> Result<u64, VolumeError>;
    fn flush(&mut self) -> Result<(), VolumeError> {
        Ok(())
    }
}

/// A storage volume: the only capability the engine consumes from the host.
pub trait Volume {
    type File: VolumeFile;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, VolumeError>;
    fn exists(&self, path: &str) -> bool;
    /// Remove a file or an empty directory.
    fn remove(&mut self, path: &str) -> Result<(), VolumeError>;
    /// Create a directory. Succeeds when it already exists.
    fn create_dir(&mut self, path: &str) -> Result<(), VolumeError>;
    /// List a directory in lexicographic name order.
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, VolumeError>;
}

/// Strip leading/trailing separators so equal paths compare equal.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Normalized `path`, rejecting `.` and `..` components.
pub(crate) fn checked(path: &str) -> Result<&str, VolumeError> {
    let path = normalize(path);
    if path.split('/').any(|part| matches!(part, "." | "..")) {
        return Err(VolumeError::InvalidPath(path.into()));
    }
    Ok(path)
}

/// Join a directory and a name; an empty directory means the root.
pub fn join(dir: &str, name: &str) -> String {
    let dir = normalize(dir);
    if dir.is_empty() {
        return String::from(normalize(name));
    }
    format!("{}/{}", dir, normalize(name))
}

/// Final path component.
pub fn file_name(path: &str) -> &str {
    let path = normalize(path);
    match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    }
}

/// Everything before the final component; empty for root entries.
pub(crate) fn parent(path: &str) -> &str {
    let path = normalize(path);
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

/// Fill `buf` as far as the file allows.
pub(crate) fn read_full<F: VolumeFile>(file: &mut F, buf: &mut [u8]) -> Result<usize, VolumeError> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Write all of `data`, failing if the backend stops accepting bytes.
pub(crate) fn write_all<F: VolumeFile>(file: &mut F, data: &[u8]) -> Result<(), VolumeError> {
    let mut written = 0;
    while written < data.len() {
        match file.write(&data[written..])? {
            0 => return Err(VolumeError::Io("write returned zero bytes".into())),
            n => written += n,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        assert_eq!(normalize("/enc/a.cbm"), "enc/a.cbm");
        assert_eq!(join("/", "a.bmp"), "a.bmp");
        assert_eq!(join("enc/", "/a.cbm"), "enc/a.cbm");
        assert_eq!(file_name("/enc/a.cbm"), "a.cbm");
        assert_eq!(file_name("a.bmp"), "a.bmp");
        assert_eq!(parent("/enc/a.cbm"), "enc");
        assert_eq!(parent("a.bmp"), "");
    }

    #[test]
    fn dot_components_are_rejected() {
        assert_eq!(checked("/enc/a.cbm"), Ok("enc/a.cbm"));
        assert_eq!(checked(""), Ok(""));
        for bad in ["..", "../x", "enc/../../x", "./a", "a/./b"] {
            assert!(
                matches!(checked(bad), Err(VolumeError::InvalidPath(_))),
                "{bad}"
            );
        }
        assert_eq!(checked("..a/b.."), Ok("..a/b.."));
    }
}
